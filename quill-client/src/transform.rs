//! Text-transform service (`/api/ai`).
//!
//! Stateless request/response: summarize, continue, title and grammar fixes.
//! The sync engine never calls it; the CLI does.

use async_trait::async_trait;
use quill_sync::ClientError;
use quill_types::TransformAction;
use reqwest::Method;

use crate::config::ClientConfig;
use crate::http::Api;
use crate::wire::{FixGrammarRequest, FixGrammarResponse, GenerateRequest, GenerateResponse};

/// Shortest trimmed input accepted for title generation.
pub const MIN_TITLE_SOURCE_CHARS: usize = 20;

#[async_trait]
pub trait TextTransform: Send + Sync {
    async fn transform(&self, text: &str, action: TransformAction) -> Result<String, ClientError>;
}

/// Reject input the service would only answer with noise.
pub fn check_input(text: &str, action: TransformAction) -> Result<(), ClientError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ClientError::InvalidInput("text is empty".into()));
    }
    if action == TransformAction::Title && trimmed.chars().count() < MIN_TITLE_SOURCE_CHARS {
        return Err(ClientError::InvalidInput(format!(
            "title generation needs at least {MIN_TITLE_SOURCE_CHARS} characters of text"
        )));
    }
    Ok(())
}

/// Strip quote characters from a generated title.
pub fn clean_title(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '"' | '\''))
        .collect::<String>()
        .trim()
        .to_string()
}

#[derive(Debug, Clone)]
pub struct HttpTransform {
    api: Api,
}

impl HttpTransform {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        Ok(Self {
            api: Api::new(config)?,
        })
    }
}

#[async_trait]
impl TextTransform for HttpTransform {
    async fn transform(&self, text: &str, action: TransformAction) -> Result<String, ClientError> {
        check_input(text, action)?;

        if action == TransformAction::FixGrammar {
            let request = self
                .api
                .request(Method::POST, "/api/ai/fix-grammar")
                .json(&FixGrammarRequest { text });
            let response: FixGrammarResponse = self.api.send(request).await?;
            return Ok(response.improved_text);
        }

        let request = self
            .api
            .request(Method::POST, "/api/ai/generate")
            .json(&GenerateRequest {
                text,
                action: action.as_str(),
            });
        let response: GenerateResponse = self.api.send(request).await?;
        Ok(match action {
            TransformAction::Title => clean_title(&response.generated_text),
            _ => response.generated_text,
        })
    }
}
