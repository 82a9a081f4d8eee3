//! Print the resolved settings.

use anyhow::Result;

use crate::envelope;
use crate::settings::Settings;

pub fn show_config(settings: &Settings, json: bool) -> Result<()> {
    let view = settings.redacted();
    if json {
        return envelope::print("settings", view);
    }

    println!("api_url:              {}", view.api_url);
    println!(
        "token:                {}",
        view.token.as_deref().unwrap_or("(none)")
    );
    println!("quiet_ms:             {}", view.quiet_ms);
    println!("request_timeout_secs: {}", view.request_timeout_secs);
    println!(
        "config_file:          {}",
        view.config_file.as_deref().unwrap_or("(none)")
    );
    Ok(())
}
