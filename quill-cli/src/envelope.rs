//! JSON envelope for machine-consumable output.

use chrono::{DateTime, Utc};
use quill_types::DirectoryEntry;
use serde::Serialize;

pub const SCHEMA_VERSION: &str = "quill-v1";

#[derive(Serialize)]
pub struct Envelope<T> {
    pub schema_version: &'static str,
    pub kind: &'static str,
    pub data: T,
}

pub fn envelope<T>(kind: &'static str, data: T) -> Envelope<T> {
    Envelope {
        schema_version: SCHEMA_VERSION,
        kind,
        data,
    }
}

/// Print `data` wrapped in an envelope.
pub fn print<T: Serialize>(kind: &'static str, data: T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&envelope(kind, data))?);
    Ok(())
}

#[derive(Serialize)]
pub struct LibraryData {
    pub total: usize,
    pub entries: Vec<DirectoryEntry>,
}

#[derive(Serialize)]
pub struct CreatedData {
    pub id: String,
}

pub fn format_timestamp(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}
