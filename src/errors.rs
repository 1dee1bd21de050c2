//! Typed error hierarchy for the clipforge coordinator.
//!
//! Four top-level enums cover the four subsystems:
//! - `StoreError`: item store persistence failures
//! - `CollabError`: external collaborator (API/subprocess) failures
//! - `StageError`: per-stage execution failures
//! - `ChannelError`: operator channel transport failures

use thiserror::Error;

/// Errors from the item store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read collection directory {path}: {source}")]
    ReadDir {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write item {id}: {source}")]
    WriteItem {
        id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize item {id}: {source}")]
    SerializeItem {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to move item {id}: {source}")]
    MoveItem {
        id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove item {id}: {source}")]
    RemoveItem {
        id: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from an external collaborator call.
#[derive(Debug, Error)]
pub enum CollabError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("No assets found for keyword \"{keyword}\"")]
    NoAssets { keyword: String },

    #[error("Collaborator returned malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Authorization failed: {0}")]
    Auth(String),

    #[error("Render command exited with code {exit_code}")]
    RenderFailed { exit_code: i32 },

    #[error("Render produced no output at {path}")]
    RenderMissingOutput { path: std::path::PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from a single stage run. Per-item collaborator failures are caught
/// inside the stage loop; these variants are the failures that abort a run.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to read ideas file at {path}: {source}")]
    IdeasReadFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Authorization failed: {0}")]
    Auth(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors from the operator channel transport.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Channel API returned an error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
