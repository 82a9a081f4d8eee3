//! Run text through the text-transform service.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use quill_client::{HttpTransform, TextTransform};
use quill_types::TransformAction;

use crate::settings::Settings;

/// Transform text from `file`, or stdin when no file is given.
pub async fn transform_text(
    settings: &Settings,
    action: TransformAction,
    file: Option<&Path>,
) -> Result<()> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    let service =
        HttpTransform::new(settings.client_config()).context("Failed to initialize HTTP client")?;
    let output = service
        .transform(&text, action)
        .await
        .with_context(|| format!("Transform '{action}' failed"))?;
    println!("{output}");
    Ok(())
}
