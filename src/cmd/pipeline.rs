//! Pipeline stage commands: `clipforge plan`, `render`, and `publish`.

use anyhow::Result;

use clipforge::channel::OperatorChannel;
use clipforge::collab::{
    CommandRenderer, OpenAiIdeas, OpenAiNarrator, PexelsLibrary, YouTubeHost,
};
use clipforge::config::Config;
use clipforge::stages::{
    PublishOutcome, publish_item, publish_ready, reject_item, run_plan, run_render,
};
use clipforge::store::ItemStore;
use clipforge::ui;

/// Build the operator channel when credentials are configured. Stages that
/// can run without one treat `None` as "work silently".
fn optional_channel(config: &Config) -> Option<OperatorChannel> {
    let (token, chat_id) = config.require_telegram().ok()?;
    Some(OperatorChannel::new(
        &config.telegram_api_base,
        &token,
        &chat_id,
    ))
}

pub async fn cmd_plan(config: &Config) -> Result<()> {
    config.ensure_directories()?;
    let store = ItemStore::new(config.data_dir.clone());

    let openai_key = config.require_openai()?;
    let ideas = OpenAiIdeas::new(&config.openai_api_base, &openai_key);
    let assets = PexelsLibrary::new(&config.pexels_api_base, &config.require_pexels()?);
    let narrator = OpenAiNarrator::new(&config.openai_api_base, &openai_key);

    let report = run_plan(config, &store, &ideas, &assets, &narrator).await?;
    ui::ok(&format!(
        "Plan finished: {} planned, {} skipped, {} failed",
        report.planned, report.skipped, report.failed
    ));
    if report.failed > 0 && report.planned == 0 {
        anyhow::bail!("Every idea failed to plan");
    }
    Ok(())
}

pub async fn cmd_render(config: &Config) -> Result<()> {
    config.ensure_directories()?;
    let store = ItemStore::new(config.data_dir.clone());
    let engine = CommandRenderer::new(&config.render_cmd);
    let channel = optional_channel(config);
    if channel.is_none() {
        ui::warn("Operator channel not configured; approval prompts will not be sent");
    }

    let report = run_render(config, &store, &engine, channel.as_ref()).await?;
    ui::ok(&format!(
        "Render finished: {} rendered, {} failed",
        report.rendered, report.failed
    ));
    if report.failed > 0 && report.rendered == 0 {
        anyhow::bail!("Every planned item failed to render");
    }
    Ok(())
}

/// Publish rendered items, bypassing the gate. With `--id` a single item,
/// otherwise every rendered item in the archive. Meant for recovery when the
/// channel is down; normal publishes go through the operator's approve action.
pub async fn cmd_publish(config: &Config, id: Option<&str>) -> Result<()> {
    let store = ItemStore::new(config.data_dir.clone());
    let host = YouTubeHost::new(
        config.host_secret_file.clone(),
        config.host_token_file.clone(),
    );

    let outcomes = match id {
        Some(id) => vec![(id.to_string(), publish_item(&store, &host, id).await?)],
        None => publish_ready(&store, &host).await?,
    };
    if outcomes.is_empty() {
        ui::dim("Nothing awaiting publish.");
        return Ok(());
    }

    let mut failed = 0u32;
    for (id, outcome) in &outcomes {
        match outcome {
            PublishOutcome::Uploaded { url, .. } => ui::ok(&format!("{id} -> {url}")),
            PublishOutcome::UploadFailed { message } => {
                failed += 1;
                ui::error(&format!("{id}: {message}"));
            }
            other => ui::warn(&format!("{id}: {other:?}")),
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} upload(s) failed");
    }
    Ok(())
}

pub fn cmd_reject(config: &Config, id: &str) -> Result<()> {
    let store = ItemStore::new(config.data_dir.clone());
    if !reject_item(&store, id)? {
        ui::warn(&format!("Nothing to reject for {id}"));
    }
    Ok(())
}
