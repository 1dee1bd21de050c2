//! Long-running gate server and host authorization.

use anyhow::Result;
use std::sync::Arc;

use clipforge::channel::OperatorChannel;
use clipforge::collab::{VideoHost, YouTubeHost};
use clipforge::config::Config;
use clipforge::gate::ApprovalGate;
use clipforge::store::ItemStore;
use clipforge::ui;

pub async fn cmd_serve(config: Config) -> Result<()> {
    config.ensure_directories()?;
    let (token, chat_id) = config.require_telegram()?;
    let channel = Arc::new(OperatorChannel::new(
        &config.telegram_api_base,
        &token,
        &chat_id,
    ));
    let store = Arc::new(ItemStore::new(config.data_dir.clone()));
    let host: Arc<dyn VideoHost> = Arc::new(YouTubeHost::new(
        config.host_secret_file.clone(),
        config.host_token_file.clone(),
    ));

    let gate = ApprovalGate::new(Arc::new(config), store, channel, host);
    gate.serve().await
}

pub async fn cmd_auth(config: &Config) -> Result<()> {
    let host = YouTubeHost::new(
        config.host_secret_file.clone(),
        config.host_token_file.clone(),
    );
    host.authorize_interactive().await?;
    ui::ok("Host authorization stored");
    Ok(())
}
