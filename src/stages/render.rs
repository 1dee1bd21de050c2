//! Render stage: planned items -> rendered artifacts in the archive.
//!
//! Renders sequentially on purpose; the engine is resource-hungry. A
//! successful item gets `rendered` + `final_video_path`, moves from the
//! active collection to the archive, and triggers an approval prompt on the
//! operator channel. A failed item is left untouched in active and is picked
//! up again by the next render run; it never blocks the items after it.

use crate::channel::OperatorChannel;
use crate::collab::RenderEngine;
use crate::config::Config;
use crate::errors::StageError;
use crate::events::StageEvent;
use crate::model::ItemStatus;
use crate::store::{Collection, ItemStore};
use crate::ui;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RenderReport {
    pub rendered: u32,
    pub failed: u32,
}

pub async fn run_render(
    config: &Config,
    store: &ItemStore,
    engine: &dyn RenderEngine,
    channel: Option<&OperatorChannel>,
) -> Result<RenderReport, StageError> {
    let targets: Vec<_> = store
        .load(Collection::Active)?
        .into_iter()
        .filter(|item| item.status == ItemStatus::Planned)
        .collect();

    if targets.is_empty() {
        ui::dim("Nothing planned to render.");
        return Ok(RenderReport::default());
    }

    ui::step(&format!("Rendering {} item(s)", targets.len()));
    let mut report = RenderReport::default();

    for mut item in targets {
        StageEvent::RenderStarted {
            id: item.id.clone(),
        }
        .emit();
        let spinner = ui::item_spinner(&format!("Rendering {} ({})", item.props.title, item.id));

        let out_path = config.out_dir.join(format!("{}.mp4", item.id));
        match engine.render(&item.props, &out_path).await {
            Ok(()) => {
                item.transition(ItemStatus::Rendered);
                item.final_video_path = Some(out_path.clone());
                store.update_in_place(Collection::Active, &item)?;
                store.move_items(&[item.id.as_str()], Collection::Active, Collection::Archive)?;

                spinner.finish_with_message(format!("Rendered {}", out_path.display()));
                StageEvent::ItemRendered {
                    id: item.id.clone(),
                    path: out_path.display().to_string(),
                }
                .emit();
                report.rendered += 1;

                // A prompt send failure is reported but the item stays
                // rendered in the archive; no work is lost.
                if let Some(channel) = channel {
                    let caption = format!(
                        "New video ready: {}\n{}\nUpload it?",
                        item.props.title, item.props.subtitle
                    );
                    if let Err(e) = channel
                        .send_approval_prompt(&out_path, &caption, &item.id)
                        .await
                    {
                        StageEvent::StageError {
                            message: format!("approval prompt failed for {}: {e}", item.id),
                        }
                        .emit();
                        ui::warn(&format!("Could not send approval prompt: {e}"));
                    }
                }
            }
            Err(e) => {
                spinner.finish_with_message(format!("Render failed: {}", item.id));
                StageEvent::StageError {
                    message: format!("render failed for {}: {e}", item.id),
                }
                .emit();
                ui::error(&format!("Render failed for {}: {e}", item.id));
                report.failed += 1;
            }
        }
    }

    StageEvent::StageDone {
        stage: "render".into(),
        ok: report.rendered,
        failed: report.failed,
    }
    .emit();
    Ok(report)
}
