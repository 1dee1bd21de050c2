//! Idea-to-outline collaborator.
//!
//! Turns a free-text idea into the structured [`PlanOutline`] the rest of the
//! pipeline consumes, via an OpenAI-style chat-completions call constrained to
//! a JSON object response.

use crate::errors::CollabError;
use crate::model::PlanOutline;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

const OUTLINE_SYSTEM_PROMPT: &str = "You are a short-form video planner. \
For the given topic, answer with a single JSON object:\n\
- title: catchy title, at most 15 words\n\
- subtitle: curiosity-hook subtitle, at most 20 words\n\
- searchKeyword: English stock-footage search phrase (e.g. \"code matrix\", \"calm office\")\n\
- mood: one-word mood for the clip\n\
- script: conversational narration, 2-3 sentences\n\
- color: a fitting hex color (e.g. \"#FF5733\")";

#[async_trait]
pub trait IdeaGenerator: Send + Sync {
    async fn outline(&self, idea: &str) -> Result<PlanOutline, CollabError>;
}

pub struct OpenAiIdeas {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl OpenAiIdeas {
    pub fn new(api_base: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: "gpt-4o".to_string(),
        }
    }
}

#[async_trait]
impl IdeaGenerator for OpenAiIdeas {
    async fn outline(&self, idea: &str) -> Result<PlanOutline, CollabError> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": OUTLINE_SYSTEM_PROMPT },
                { "role": "user", "content": idea },
            ],
            "response_format": { "type": "json_object" },
        });

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
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

        let chat: ChatResponse = resp.json().await?;
        let content = chat
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| CollabError::MalformedPayload("empty choices".into()))?;

        // Models occasionally wrap the object in prose despite the response
        // format constraint; extract the outermost JSON object before parsing.
        let object = extract_json_object(content)
            .ok_or_else(|| CollabError::MalformedPayload("no JSON object in reply".into()))?;
        serde_json::from_str(&object)
            .map_err(|e| CollabError::MalformedPayload(format!("bad outline: {e}")))
    }
}

/// Extract the outermost `{...}` from text that may contain other content.
/// Brace-counting, no regex.
pub(crate) fn extract_json_object(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let mut depth = 0;
    let mut end = start;

    for (i, ch) in text[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    end = start + i + 1;
                    break;
                }
            }
            _ => {}
        }
    }

    if depth == 0 && end > start {
        Some(text[start..end].to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_object_with_prose() {
        let text = r##"Sure! Here is the plan: {"title": "x", "color": "#fff"} hope it helps"##;
        assert_eq!(
            extract_json_object(text),
            Some(r##"{"title": "x", "color": "#fff"}"##.to_string())
        );
    }

    #[test]
    fn test_extract_json_object_nested() {
        let text = r#"{"outer": {"inner": 1}}"#;
        assert_eq!(extract_json_object(text), Some(text.to_string()));
    }

    #[test]
    fn test_extract_json_object_unclosed() {
        assert_eq!(extract_json_object(r#"{"title": "x""#), None);
        assert_eq!(extract_json_object("no json at all"), None);
    }

    #[test]
    fn test_chat_response_parses() {
        let json = r##"{
            "choices": [
                { "message": { "content": "{\"title\":\"T\",\"subtitle\":\"S\",\"searchKeyword\":\"k\",\"mood\":\"calm\",\"script\":\"s\",\"color\":\"#123456\"}" } }
            ]
        }"##;
        let chat: ChatResponse = serde_json::from_str(json).unwrap();
        let outline: crate::model::PlanOutline =
            serde_json::from_str(&chat.choices[0].message.content).unwrap();
        assert_eq!(outline.title, "T");
        assert_eq!(outline.mood, "calm");
    }
}
