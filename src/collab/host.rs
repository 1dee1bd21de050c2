//! Publish collaborator: a YouTube-style video host.
//!
//! Publishing requires a one-time interactive OAuth exchange (browser +
//! pasted code) that persists a reusable token in its own file, separate from
//! the item store. Every later upload refreshes the access token
//! non-interactively; when that fails the publish invocation fails and the
//! operator re-runs `clipforge auth`.

use crate::errors::CollabError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const UPLOAD_URL: &str = "https://www.googleapis.com/upload/youtube/v3/videos";
const UPLOAD_SCOPE: &str = "https://www.googleapis.com/auth/youtube.upload";

/// Identifier and public link of a published video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub id: String,
    pub url: String,
}

#[async_trait]
pub trait VideoHost: Send + Sync {
    async fn upload(
        &self,
        video: &Path,
        title: &str,
        description: &str,
    ) -> Result<UploadReceipt, CollabError>;
}

/// OAuth client credentials, as downloaded from the host's console. The file
/// nests them under either `installed` or `web`.
#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    #[serde(default)]
    installed: Option<ClientSecret>,
    #[serde(default)]
    web: Option<ClientSecret>,
}

#[derive(Debug, Clone, Deserialize)]
struct ClientSecret {
    client_id: String,
    client_secret: String,
    redirect_uris: Vec<String>,
}

/// Persisted token material. Lives outside the item store on purpose.
#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

pub struct YouTubeHost {
    client: reqwest::Client,
    secret_file: PathBuf,
    token_file: PathBuf,
}

impl YouTubeHost {
    pub fn new(secret_file: impl Into<PathBuf>, token_file: impl Into<PathBuf>) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_file: secret_file.into(),
            token_file: token_file.into(),
        }
    }

    fn load_secret(&self) -> Result<ClientSecret, CollabError> {
        let text = std::fs::read_to_string(&self.secret_file).map_err(|_| {
            CollabError::Auth(format!(
                "client secret file not found at {}",
                self.secret_file.display()
            ))
        })?;
        let file: ClientSecretFile = serde_json::from_str(&text)
            .map_err(|e| CollabError::Auth(format!("unreadable client secret: {e}")))?;
        file.installed
            .or(file.web)
            .ok_or_else(|| CollabError::Auth("client secret has no installed/web section".into()))
    }

    fn load_token(&self) -> Result<StoredToken, CollabError> {
        let text = std::fs::read_to_string(&self.token_file).map_err(|_| {
            CollabError::Auth("no stored token - run `clipforge auth` first".into())
        })?;
        serde_json::from_str(&text)
            .map_err(|e| CollabError::Auth(format!("unreadable stored token: {e}")))
    }

    fn save_token(&self, token: &StoredToken) -> Result<(), CollabError> {
        if let Some(parent) = self.token_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(token)
            .map_err(|e| CollabError::Auth(format!("unserializable token: {e}")))?;
        std::fs::write(&self.token_file, json)?;
        Ok(())
    }

    /// One-time interactive exchange: open the consent page, let the operator
    /// paste the code, persist the resulting token.
    pub async fn authorize_interactive(&self) -> Result<(), CollabError> {
        let secret = self.load_secret()?;
        let redirect = secret
            .redirect_uris
            .first()
            .cloned()
            .unwrap_or_else(|| "urn:ietf:wg:oauth:2.0:oob".to_string());

        let consent_url = format!(
            "{AUTH_URL}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline",
            secret.client_id, redirect, UPLOAD_SCOPE
        );

        println!("Opening the sign-in page. Pick the channel account to upload with.");
        if open::that(&consent_url).is_err() {
            println!("Could not open a browser. Visit this URL manually:\n{consent_url}");
        }

        let code: String = dialoguer::Input::new()
            .with_prompt("Paste the authorization code")
            .interact_text()
            .map_err(|e| CollabError::Auth(format!("could not read code: {e}")))?;

        let resp: TokenResponse = self
            .client
            .post(TOKEN_URL)
            .form(&[
                ("client_id", secret.client_id.as_str()),
                ("client_secret", secret.client_secret.as_str()),
                ("redirect_uri", redirect.as_str()),
                ("grant_type", "authorization_code"),
                ("code", code.trim()),
            ])
            .send()
            .await?
            .json()
            .await?;

        let access_token = resp.access_token.ok_or_else(|| {
            CollabError::Auth(
                resp.error_description
                    .or(resp.error)
                    .unwrap_or_else(|| "code exchange failed".into()),
            )
        })?;

        self.save_token(&StoredToken {
            access_token,
            refresh_token: resp.refresh_token,
        })
    }

    /// Get a usable access token without interaction: refresh when possible,
    /// otherwise fall back to the stored access token.
    async fn access_token(&self) -> Result<String, CollabError> {
        let stored = self.load_token()?;
        let Some(refresh_token) = stored.refresh_token.clone() else {
            return Ok(stored.access_token);
        };

        let secret = self.load_secret()?;
        let resp: TokenResponse = self
            .client
            .post(TOKEN_URL)
            .form(&[
                ("client_id", secret.client_id.as_str()),
                ("client_secret", secret.client_secret.as_str()),
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
            ])
            .send()
            .await?
            .json()
            .await?;

        match resp.access_token {
            Some(access_token) => {
                self.save_token(&StoredToken {
                    access_token: access_token.clone(),
                    refresh_token: Some(refresh_token),
                })?;
                Ok(access_token)
            }
            None => Err(CollabError::Auth(
                resp.error_description
                    .or(resp.error)
                    .unwrap_or_else(|| "token refresh failed".into()),
            )),
        }
    }
}

#[async_trait]
impl VideoHost for YouTubeHost {
    async fn upload(
        &self,
        video: &Path,
        title: &str,
        description: &str,
    ) -> Result<UploadReceipt, CollabError> {
        let token = self.access_token().await?;

        let metadata = json!({
            "snippet": {
                "title": format!("{title} #Shorts"),
                "description": format!("{description}\n\n#Shorts"),
                "tags": ["Shorts"],
            },
            "status": {
                "privacyStatus": "private",
                "selfDeclaredMadeForKids": false,
            },
        });

        // Resumable upload: register the metadata, then PUT the bytes to the
        // session URL from the Location header.
        let init = self
            .client
            .post(UPLOAD_URL)
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .bearer_auth(&token)
            .json(&metadata)
            .send()
            .await?;

        if init.status().as_u16() == 401 {
            return Err(CollabError::Auth("upload rejected: token expired".into()));
        }
        if !init.status().is_success() {
            return Err(CollabError::Api {
                status: init.status().as_u16(),
                message: init.text().await.unwrap_or_default(),
            });
        }

        let session_url = init
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                CollabError::MalformedPayload("upload session has no location".into())
            })?;

        let bytes = tokio::fs::read(video).await?;
        let resp = self
            .client
            .put(&session_url)
            .bearer_auth(&token)
            .header(reqwest::header::CONTENT_TYPE, "video/mp4")
            .body(bytes)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(CollabError::Api {
                status: resp.status().as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }

        #[derive(Deserialize)]
        struct Uploaded {
            id: String,
        }
        let uploaded: Uploaded = resp.json().await?;
        let url = format!("https://youtube.com/shorts/{}", uploaded.id);
        Ok(UploadReceipt {
            id: uploaded.id,
            url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_client_secret_accepts_installed_or_web() {
        let installed = r#"{"installed": {"client_id": "a", "client_secret": "b", "redirect_uris": ["urn:x"]}}"#;
        let file: ClientSecretFile = serde_json::from_str(installed).unwrap();
        assert_eq!(file.installed.unwrap().client_id, "a");

        let web = r#"{"web": {"client_id": "c", "client_secret": "d", "redirect_uris": []}}"#;
        let file: ClientSecretFile = serde_json::from_str(web).unwrap();
        assert_eq!(file.web.unwrap().client_id, "c");
    }

    #[test]
    fn test_missing_token_is_an_auth_error() {
        let dir = tempdir().unwrap();
        let host = YouTubeHost::new(
            dir.path().join("client_secret.json"),
            dir.path().join("token.json"),
        );
        let err = host.load_token().unwrap_err();
        assert!(matches!(err, CollabError::Auth(_)));
        assert!(err.to_string().contains("clipforge auth"));
    }

    #[test]
    fn test_token_save_load_roundtrip() {
        let dir = tempdir().unwrap();
        let host = YouTubeHost::new(
            dir.path().join("client_secret.json"),
            dir.path().join("nested/token.json"),
        );
        host.save_token(&StoredToken {
            access_token: "acc".into(),
            refresh_token: Some("ref".into()),
        })
        .unwrap();
        let back = host.load_token().unwrap();
        assert_eq!(back.access_token, "acc");
        assert_eq!(back.refresh_token.as_deref(), Some("ref"));
    }

    #[test]
    fn test_missing_secret_names_the_path() {
        let dir = tempdir().unwrap();
        let host = YouTubeHost::new(
            dir.path().join("client_secret.json"),
            dir.path().join("token.json"),
        );
        let err = host.load_secret().unwrap_err();
        assert!(err.to_string().contains("client_secret.json"));
    }
}
