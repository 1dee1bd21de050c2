//! Approval gate.
//!
//! Long-polls the operator channel and reacts to two kinds of input: pressed
//! inline actions (approve or discard a rendered item) and slash commands
//! (`/run` to kick off a pipeline pass, `/status` for a store summary).
//! Actions are acknowledged immediately so the operator's client stops
//! spinning, then the keyboard is cleared so the same prompt cannot be
//! answered twice.

use crate::channel::{ActionKind, OperatorAction, OperatorChannel, Update};
use crate::collab::VideoHost;
use crate::config::Config;
use crate::model::ItemStatus;
use crate::stages::{publish_item, reject_item, PublishOutcome};
use crate::store::{Collection, ItemStore};
use crate::supervisor;
use crate::ui;
use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const POLL_TIMEOUT_SECS: u32 = 30;
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Operator slash commands understood by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateCommand {
    Run,
    Status,
}

impl GateCommand {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "/run" => Some(GateCommand::Run),
            "/status" => Some(GateCommand::Status),
            _ => None,
        }
    }
}

/// Operator-facing line for a publish outcome.
pub fn outcome_message(item_id: &str, outcome: &PublishOutcome) -> String {
    match outcome {
        PublishOutcome::Uploaded { url, .. } => format!("Upload complete: {url}"),
        PublishOutcome::NotFound => format!("No item with id {item_id}."),
        PublishOutcome::NotRendered {
            status: ItemStatus::Uploaded,
        } => format!("{item_id} is already uploaded."),
        PublishOutcome::NotRendered { status } => {
            format!("{item_id} is {status}, not ready to publish.")
        }
        PublishOutcome::UploadFailed { message } => {
            format!("Upload failed for {item_id}: {message}. Press approve to retry.")
        }
    }
}

pub struct ApprovalGate {
    config: Arc<Config>,
    store: Arc<ItemStore>,
    channel: Arc<OperatorChannel>,
    host: Arc<dyn VideoHost>,
    pipeline_running: Arc<AtomicBool>,
}

impl ApprovalGate {
    pub fn new(
        config: Arc<Config>,
        store: Arc<ItemStore>,
        channel: Arc<OperatorChannel>,
        host: Arc<dyn VideoHost>,
    ) -> Self {
        Self {
            config,
            store,
            channel,
            host,
            pipeline_running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Poll for operator input forever. Transient polling failures are logged
    /// and retried after a short delay; the loop never exits on its own.
    pub async fn serve(&self) -> Result<()> {
        ui::step("Approval gate listening for operator input");
        let mut offset = 0i64;
        loop {
            match self.channel.poll_updates(offset, POLL_TIMEOUT_SECS).await {
                Ok((updates, next_offset)) => {
                    offset = next_offset;
                    for update in updates {
                        self.handle_update(update).await;
                    }
                }
                Err(e) => {
                    ui::warn(&format!("Polling failed: {e}"));
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                }
            }
        }
    }

    async fn handle_update(&self, update: Update) {
        match update {
            Update::Action {
                callback_id,
                chat_id,
                message_id,
                data,
            } => {
                self.handle_action(&callback_id, chat_id, message_id, &data)
                    .await;
            }
            Update::Message { text, .. } => match GateCommand::parse(&text) {
                Some(GateCommand::Run) => self.handle_run().await,
                Some(GateCommand::Status) => self.handle_status().await,
                None => {}
            },
        }
    }

    async fn handle_action(&self, callback_id: &str, chat_id: i64, message_id: i64, data: &str) {
        let Some(action) = OperatorAction::parse(data) else {
            ui::warn(&format!("Unrecognized action payload: {data}"));
            let _ = self.channel.acknowledge(callback_id, "Unrecognized action").await;
            return;
        };

        let ack = match action.kind {
            ActionKind::Approve => "Starting upload...",
            ActionKind::Reject => "Discarding...",
        };
        if let Err(e) = self.channel.acknowledge(callback_id, ack).await {
            ui::warn(&format!("Could not acknowledge action: {e}"));
        }
        // Best effort: a stale keyboard is only a cosmetic problem, the
        // status gate refuses a second upload anyway.
        if let Err(e) = self.channel.clear_actions(chat_id, message_id).await {
            ui::warn(&format!("Could not clear prompt keyboard: {e}"));
        }

        let reply = match action.kind {
            ActionKind::Approve => {
                ui::step(&format!("Operator approved {}", action.item_id));
                match publish_item(&self.store, self.host.as_ref(), &action.item_id).await {
                    Ok(outcome) => outcome_message(&action.item_id, &outcome),
                    Err(e) => format!("Upload failed for {}: {e}", action.item_id),
                }
            }
            ActionKind::Reject => {
                ui::step(&format!("Operator rejected {}", action.item_id));
                match reject_item(&self.store, &action.item_id) {
                    Ok(true) => format!("Discarded {}.", action.item_id),
                    Ok(false) => format!("Nothing to discard for {}.", action.item_id),
                    Err(e) => format!("Could not discard {}: {e}", action.item_id),
                }
            }
        };
        if let Err(e) = self.channel.send_message(&reply).await {
            ui::warn(&format!("Could not send reply: {e}"));
        }
    }

    /// `/run`: kick off a plan+render pass in the background. Only one pass
    /// at a time; a second `/run` while one is in flight is refused.
    async fn handle_run(&self) {
        if self.pipeline_running.swap(true, Ordering::SeqCst) {
            let _ = self
                .channel
                .send_message("A pipeline run is already in progress.")
                .await;
            return;
        }

        let _ = self.channel.send_message("Starting pipeline run.").await;
        let channel = Arc::clone(&self.channel);
        let running = Arc::clone(&self.pipeline_running);
        let root_dir = self.config.root_dir.clone();
        tokio::spawn(async move {
            let result = supervisor::run_pipeline(&channel, &root_dir).await;
            running.store(false, Ordering::SeqCst);
            match result {
                Ok(report) if report.success() => {
                    let _ = channel.send_message("Pipeline run finished.").await;
                }
                Ok(_) => {
                    // Per-stage failures were already reported.
                }
                Err(e) => {
                    ui::error(&format!("Pipeline run failed: {e}"));
                    let _ = channel
                        .send_message(&format!("Pipeline run failed: {e}"))
                        .await;
                }
            }
        });
    }

    /// `/status`: counts per lifecycle state across both collections.
    async fn handle_status(&self) {
        let summary = match self.status_summary() {
            Ok(s) => s,
            Err(e) => format!("Could not read item store: {e}"),
        };
        if let Err(e) = self.channel.send_message(&summary).await {
            ui::warn(&format!("Could not send status: {e}"));
        }
    }

    fn status_summary(&self) -> Result<String> {
        let active = self.store.load(Collection::Active)?;
        let archive = self.store.load(Collection::Archive)?;
        let planned = active
            .iter()
            .filter(|i| i.status == ItemStatus::Planned)
            .count();
        let awaiting = archive
            .iter()
            .filter(|i| i.status == ItemStatus::Rendered)
            .count();
        let uploaded = archive
            .iter()
            .filter(|i| i.status == ItemStatus::Uploaded)
            .count();
        let rejected = archive
            .iter()
            .filter(|i| i.status == ItemStatus::Rejected)
            .count();
        Ok(format!(
            "Planned: {planned}\nAwaiting approval: {awaiting}\nUploaded: {uploaded}\nRejected: {rejected}"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_command_parse() {
        assert_eq!(GateCommand::parse("/run"), Some(GateCommand::Run));
        assert_eq!(GateCommand::parse("  /status  "), Some(GateCommand::Status));
        assert_eq!(GateCommand::parse("/unknown"), None);
        assert_eq!(GateCommand::parse("hello"), None);
        assert_eq!(GateCommand::parse(""), None);
    }

    #[test]
    fn test_outcome_messages() {
        let msg = outcome_message(
            "idea_1_aa",
            &PublishOutcome::Uploaded {
                id: "vid123".into(),
                url: "https://youtube.com/shorts/vid123".into(),
            },
        );
        assert!(msg.contains("shorts/vid123"));

        let msg = outcome_message("idea_1_aa", &PublishOutcome::NotFound);
        assert!(msg.contains("idea_1_aa"));

        let msg = outcome_message(
            "idea_1_aa",
            &PublishOutcome::NotRendered {
                status: ItemStatus::Uploaded,
            },
        );
        assert!(msg.contains("already uploaded"));

        let msg = outcome_message(
            "idea_1_aa",
            &PublishOutcome::NotRendered {
                status: ItemStatus::Planned,
            },
        );
        assert!(msg.contains("planned"));

        let msg = outcome_message(
            "idea_1_aa",
            &PublishOutcome::UploadFailed {
                message: "quota exceeded".into(),
            },
        );
        assert!(msg.contains("quota exceeded"));
        assert!(msg.contains("retry"));
    }
}
