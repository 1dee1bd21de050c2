//! Runtime configuration for clipforge.
//!
//! One `Config` is built in `main` from the project root and the environment
//! (a `.env` file is honored), then passed by reference to every stage. No
//! stage reads the environment on its own.

use anyhow::{Context, Result};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub root_dir: PathBuf,
    /// Per-item store directories live under here (`active/`, `archive/`).
    pub data_dir: PathBuf,
    /// One idea per line; whitespace-only lines are ignored.
    pub ideas_file: PathBuf,
    /// Downloaded clips and narration audio.
    pub assets_dir: PathBuf,
    /// Rendered videos.
    pub out_dir: PathBuf,
    /// Host OAuth token, persisted separately from the item store.
    pub host_token_file: PathBuf,
    /// Host OAuth client secret (downloaded from the host's console).
    pub host_secret_file: PathBuf,

    /// Renderer invocation, split on whitespace into program + leading args.
    pub render_cmd: String,
    /// Background clips fetched per item.
    pub clips_per_item: usize,

    pub telegram_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub openai_api_key: Option<String>,
    pub pexels_api_key: Option<String>,

    // API bases are overridable so tests and self-hosted gateways can point
    // elsewhere.
    pub telegram_api_base: String,
    pub openai_api_base: String,
    pub pexels_api_base: String,

    pub verbose: bool,
}

impl Config {
    pub fn new(root_dir: PathBuf, verbose: bool) -> Result<Self> {
        let root_dir = root_dir
            .canonicalize()
            .context("Failed to resolve project root directory")?;

        // Best-effort: a missing .env is fine, credentials may come from the
        // real environment.
        let _ = dotenvy::from_path(root_dir.join(".env"));

        let data_dir = root_dir.join("data");

        Ok(Self {
            ideas_file: data_dir.join("ideas/input.txt"),
            assets_dir: root_dir.join("assets"),
            out_dir: root_dir.join("out"),
            host_token_file: data_dir.join("token.json"),
            host_secret_file: root_dir.join("client_secret.json"),
            data_dir,
            root_dir,
            render_cmd: env_or("CLIPFORGE_RENDER_CMD", "clipforge-render"),
            clips_per_item: std::env::var("CLIPFORGE_CLIPS_PER_ITEM")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
            telegram_token: env_opt("TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: env_opt("TELEGRAM_CHAT_ID"),
            openai_api_key: env_opt("OPENAI_API_KEY"),
            pexels_api_key: env_opt("PEXELS_API_KEY"),
            telegram_api_base: env_or("TELEGRAM_API_BASE", "https://api.telegram.org"),
            openai_api_base: env_or("OPENAI_API_BASE", "https://api.openai.com/v1"),
            pexels_api_base: env_or("PEXELS_API_BASE", "https://api.pexels.com"),
            verbose,
        })
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.assets_dir).context("Failed to create assets directory")?;
        std::fs::create_dir_all(&self.out_dir).context("Failed to create output directory")?;
        if let Some(parent) = self.ideas_file.parent() {
            std::fs::create_dir_all(parent).context("Failed to create ideas directory")?;
        }
        Ok(())
    }

    pub fn require_telegram(&self) -> Result<(String, String)> {
        let token = self
            .telegram_token
            .clone()
            .context("TELEGRAM_BOT_TOKEN is not set")?;
        let chat_id = self
            .telegram_chat_id
            .clone()
            .context("TELEGRAM_CHAT_ID is not set")?;
        Ok((token, chat_id))
    }

    pub fn require_openai(&self) -> Result<String> {
        self.openai_api_key
            .clone()
            .context("OPENAI_API_KEY is not set")
    }

    pub fn require_pexels(&self) -> Result<String> {
        self.pexels_api_key
            .clone()
            .context("PEXELS_API_KEY is not set")
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}
