//! JSON shapes of the `/api` resources and their conversion to the shared
//! model.
//!
//! The server stores the editor tree as a JSON object (`lexical_state`); the
//! engine treats content as an opaque string. Conversion happens here and
//! nowhere else.

use chrono::{DateTime, NaiveDateTime, Utc};
use quill_sync::ClientError;
use quill_types::{DirectoryEntry, DocId, Document, DocumentPatch, DocumentStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A post as returned by `GET /api/posts/` and `GET /api/posts/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct WirePost {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub lexical_state: Option<Value>,
    /// Older rows carry the tree under `content`.
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub is_owner: Option<bool>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl WirePost {
    fn status(&self) -> DocumentStatus {
        self.status
            .as_deref()
            .map(DocumentStatus::parse)
            .unwrap_or_default()
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at.as_deref().and_then(parse_timestamp)
    }

    fn title(&self) -> String {
        self.title.clone().unwrap_or_default()
    }

    pub fn into_document(self) -> Document {
        let status = self.status();
        let updated_at = self.updated_at();
        let title = self.title();
        let content = self
            .lexical_state
            .or(self.content)
            .and_then(content_from_value);
        Document {
            id: DocId::new(self.id),
            title,
            content,
            status,
            updated_at,
            is_owner: self.is_owner.unwrap_or(false),
        }
    }

    pub fn to_entry(&self) -> DirectoryEntry {
        DirectoryEntry {
            id: DocId::new(self.id.clone()),
            title: self.title(),
            status: self.status(),
            updated_at: self.updated_at(),
        }
    }
}

/// Stored tree to opaque content. A JSON string holding a serialized tree is
/// unwrapped; `null` means no content.
fn content_from_value(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Parse an ISO-8601 timestamp. Values without an offset are UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// Body of `PATCH /api/posts/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WirePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lexical_state: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DocumentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl TryFrom<&DocumentPatch> for WirePatch {
    type Error = ClientError;

    fn try_from(patch: &DocumentPatch) -> Result<Self, Self::Error> {
        let lexical_state = patch
            .content
            .as_deref()
            .map(|raw| {
                serde_json::from_str::<Value>(raw)
                    .map_err(|err| ClientError::Encode(format!("content is not valid JSON: {err}")))
            })
            .transpose()?;
        Ok(Self {
            lexical_state,
            status: patch.status,
            title: patch.title.clone(),
        })
    }
}

/// Response of `POST /api/posts/`.
#[derive(Debug, Deserialize)]
pub struct Created {
    #[serde(rename = "_id")]
    pub id: String,
}

/// Response of `POST /api/posts/{id}/publish`.
#[derive(Debug, Deserialize)]
pub struct Published {
    pub status: String,
}

/// Acknowledgement returned by mutating endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

/// Error body. The server sends `{"detail": ...}`; `detail` is a list of
/// issues for validation failures.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        match self.detail {
            Some(Value::String(s)) => Some(s),
            Some(Value::Null) | None => self.message,
            Some(other) => Some(other.to_string()),
        }
    }
}

/// Body of `POST /api/ai/generate`.
#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub text: &'a str,
    pub action: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    pub generated_text: String,
}

/// Body of `POST /api/ai/fix-grammar`.
#[derive(Debug, Serialize)]
pub struct FixGrammarRequest<'a> {
    pub text: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct FixGrammarResponse {
    pub improved_text: String,
}
