//! Asset-acquisition collaborator.
//!
//! Searches a Pexels-style stock library for portrait background clips and
//! downloads them into the assets directory. Zero search hits is a failure,
//! not an empty success: an item without footage cannot render.

use crate::errors::CollabError;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[async_trait]
pub trait AssetLibrary: Send + Sync {
    /// Fetch up to `count` clips for `keyword`, written under `dest_dir` with
    /// filenames derived from `item_id`. Returns the local paths in order.
    async fn fetch_clips(
        &self,
        keyword: &str,
        count: usize,
        dest_dir: &Path,
        item_id: &str,
    ) -> Result<Vec<PathBuf>, CollabError>;
}

pub struct PexelsLibrary {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    videos: Vec<VideoHit>,
}

#[derive(Debug, Deserialize)]
struct VideoHit {
    #[serde(default)]
    video_files: Vec<VideoFile>,
}

#[derive(Debug, Deserialize)]
struct VideoFile {
    link: String,
    #[serde(default)]
    height: Option<u32>,
}

impl PexelsLibrary {
    pub fn new(api_base: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<(), CollabError> {
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(CollabError::Api {
                status: resp.status().as_u16(),
                message: format!("asset download failed for {url}"),
            });
        }
        let bytes = resp.bytes().await?;
        tokio::fs::write(dest, &bytes).await?;
        Ok(())
    }
}

/// Prefer an HD-ish file (720-1080p); fall back to the first one offered.
fn pick_file(files: &[VideoFile]) -> Option<&VideoFile> {
    files
        .iter()
        .find(|f| matches!(f.height, Some(h) if (720..=1080).contains(&h)))
        .or_else(|| files.first())
}

#[async_trait]
impl AssetLibrary for PexelsLibrary {
    async fn fetch_clips(
        &self,
        keyword: &str,
        count: usize,
        dest_dir: &Path,
        item_id: &str,
    ) -> Result<Vec<PathBuf>, CollabError> {
        let resp = self
            .client
            .get(format!("{}/videos/search", self.api_base))
            .header("Authorization", &self.api_key)
            .query(&[
                ("query", keyword),
                ("orientation", "portrait"),
                ("per_page", &count.max(1).to_string()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(CollabError::Api {
                status: resp.status().as_u16(),
                message: format!("asset search failed for \"{keyword}\""),
            });
        }

        let search: SearchResponse = resp.json().await?;
        let urls: Vec<String> = search
            .videos
            .iter()
            .filter_map(|hit| pick_file(&hit.video_files).map(|f| f.link.clone()))
            .take(count)
            .collect();

        if urls.is_empty() {
            return Err(CollabError::NoAssets {
                keyword: keyword.to_string(),
            });
        }

        tokio::fs::create_dir_all(dest_dir).await?;
        let mut paths = Vec::with_capacity(urls.len());
        for (n, url) in urls.iter().enumerate() {
            let dest = dest_dir.join(format!("{item_id}_bg{n}.mp4"));
            self.download(url, &dest).await?;
            paths.push(dest);
        }
        Ok(paths)
    }
}
