//! Publish and reject: the two terminal transitions.
//!
//! Publish looks the item up archive-first (render moves successes there),
//! requires `rendered` status (re-checking before acting is what makes a
//! double approve harmless), and mutates the item in place in whichever
//! collection holds it. Reject is idempotent: rejecting an unknown or
//! already-rejected item is a no-op, never an error.

use crate::collab::VideoHost;
use crate::errors::StageError;
use crate::events::StageEvent;
use crate::model::ItemStatus;
use crate::store::ItemStore;
use crate::ui;

/// What a publish-by-id attempt concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Uploaded { id: String, url: String },
    /// No item with that id in either collection. No store mutation.
    NotFound,
    /// The item exists but is not in a publishable state.
    NotRendered { status: ItemStatus },
    /// The host refused or errored; the item is unchanged and retryable.
    UploadFailed { message: String },
}

pub async fn publish_item(
    store: &ItemStore,
    host: &dyn VideoHost,
    item_id: &str,
) -> Result<PublishOutcome, StageError> {
    let Some((collection, mut item)) = store.find(item_id)? else {
        ui::warn(&format!("No item with id {item_id}"));
        return Ok(PublishOutcome::NotFound);
    };

    // Status gate: publishing anything but a rendered item is refused. This
    // covers the double-approve race: the second attempt sees `uploaded`.
    if item.status != ItemStatus::Rendered {
        return Ok(PublishOutcome::NotRendered {
            status: item.status,
        });
    }

    let Some(video) = item.final_video_path.clone() else {
        return Ok(PublishOutcome::UploadFailed {
            message: format!("item {item_id} has no rendered video path"),
        });
    };

    match host
        .upload(&video, &item.props.title, &item.props.subtitle)
        .await
    {
        Ok(receipt) => {
            item.transition(ItemStatus::Uploaded);
            item.upload_id = Some(receipt.id.clone());
            item.upload_url = Some(receipt.url.clone());
            store.update_in_place(collection, &item)?;

            StageEvent::ItemUploaded {
                id: item.id.clone(),
                url: receipt.url.clone(),
            }
            .emit();
            ui::ok(&format!("Uploaded {} -> {}", item.id, receipt.url));
            Ok(PublishOutcome::Uploaded {
                id: receipt.id,
                url: receipt.url,
            })
        }
        Err(e) => {
            StageEvent::StageError {
                message: format!("upload failed for {item_id}: {e}"),
            }
            .emit();
            ui::error(&format!("Upload failed for {item_id}: {e}"));
            Ok(PublishOutcome::UploadFailed {
                message: e.to_string(),
            })
        }
    }
}

/// Batch publish: every `rendered` item in the archive, one at a time. Used
/// by the `publish` CLI entry point when no approval gate is in the loop.
pub async fn publish_ready(
    store: &ItemStore,
    host: &dyn VideoHost,
) -> Result<Vec<(String, PublishOutcome)>, StageError> {
    let ready: Vec<String> = store
        .load(crate::store::Collection::Archive)?
        .into_iter()
        .filter(|item| item.status == ItemStatus::Rendered)
        .map(|item| item.id)
        .collect();

    if ready.is_empty() {
        ui::dim("Nothing rendered to publish.");
    }

    let mut results = Vec::with_capacity(ready.len());
    let mut ok = 0u32;
    let mut failed = 0u32;
    for id in ready {
        let outcome = publish_item(store, host, &id).await?;
        match outcome {
            PublishOutcome::Uploaded { .. } => ok += 1,
            _ => failed += 1,
        }
        results.push((id, outcome));
    }

    StageEvent::StageDone {
        stage: "publish".into(),
        ok,
        failed,
    }
    .emit();
    Ok(results)
}

/// Mark an item rejected. Returns whether a transition actually happened.
pub fn reject_item(store: &ItemStore, item_id: &str) -> Result<bool, StageError> {
    let Some((collection, mut item)) = store.find(item_id)? else {
        return Ok(false);
    };
    if !item.transition(ItemStatus::Rejected) {
        // Already terminal (or never rendered). Idempotent no-op.
        return Ok(false);
    }
    store.update_in_place(collection, &item)?;
    ui::ok(&format!("Rejected {item_id}"));
    Ok(true)
}
