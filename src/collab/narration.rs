//! Narration collaborator.
//!
//! Synthesizes the script into an mp3 and, when the provider supports it,
//! fetches word-level timestamps via a transcription pass. A transcript
//! failure degrades to `None`. Subtitles are nice to have; the narration
//! itself is not.

use crate::errors::CollabError;
use crate::model::{TranscriptWord, validate_transcript};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::path::{Path, PathBuf};

/// Output of a narration call.
#[derive(Debug, Clone)]
pub struct Narration {
    pub audio_path: PathBuf,
    pub transcript: Option<Vec<TranscriptWord>>,
}

#[async_trait]
pub trait Narrator: Send + Sync {
    async fn narrate(&self, script: &str, dest: &Path) -> Result<Narration, CollabError>;
}

pub struct OpenAiNarrator {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    voice: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    words: Vec<TranscriptionWord>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionWord {
    word: String,
    start: f64,
    end: f64,
}

impl OpenAiNarrator {
    pub fn new(api_base: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            voice: "onyx".to_string(),
        }
    }

    async fn synthesize(&self, script: &str, dest: &Path) -> Result<(), CollabError> {
        let body = json!({
            "model": "tts-1",
            "voice": self.voice,
            "input": script,
        });
        let resp = self
            .client
            .post(format!("{}/audio/speech", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(CollabError::Api {
                status: resp.status().as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }

        let bytes = resp.bytes().await?;
        tokio::fs::write(dest, &bytes).await?;
        Ok(())
    }

    async fn transcribe(&self, audio: &Path) -> Result<Vec<TranscriptWord>, CollabError> {
        let bytes = tokio::fs::read(audio).await?;
        let file_name = audio
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "narration.mp3".to_string());

        let form = reqwest::multipart::Form::new()
            .text("model", "whisper-1")
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "word")
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes).file_name(file_name),
            );

        let resp = self
            .client
            .post(format!("{}/audio/transcriptions", self.api_base))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(CollabError::Api {
                status: resp.status().as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }

        let parsed: TranscriptionResponse = resp.json().await?;
        let words: Vec<TranscriptWord> = parsed
            .words
            .into_iter()
            .map(|w| TranscriptWord {
                word: w.word,
                start: w.start,
                end: w.end,
            })
            .collect();

        if !validate_transcript(&words) {
            return Err(CollabError::MalformedPayload(
                "transcript timestamps out of order".into(),
            ));
        }
        Ok(words)
    }
}

#[async_trait]
impl Narrator for OpenAiNarrator {
    async fn narrate(&self, script: &str, dest: &Path) -> Result<Narration, CollabError> {
        self.synthesize(script, dest).await?;

        // Degrade to no transcript rather than failing the item.
        let transcript = match self.transcribe(dest).await {
            Ok(words) if !words.is_empty() => Some(words),
            Ok(_) => None,
            Err(e) => {
                eprintln!("Warning: transcription failed, continuing without subtitles: {e}");
                None
            }
        };

        Ok(Narration {
            audio_path: dest.to_path_buf(),
            transcript,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcription_response_maps_to_model_words() {
        let json = r#"{
            "text": "hello world",
            "words": [
                { "word": "hello", "start": 0.0, "end": 0.42 },
                { "word": "world", "start": 0.42, "end": 0.91 }
            ]
        }"#;
        let parsed: TranscriptionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.words.len(), 2);
        assert_eq!(parsed.words[0].word, "hello");
        assert!(parsed.words[1].start >= parsed.words[0].start);
    }

    #[test]
    fn test_transcription_response_without_words() {
        let parsed: TranscriptionResponse = serde_json::from_str(r#"{"text": "x"}"#).unwrap();
        assert!(parsed.words.is_empty());
    }
}
