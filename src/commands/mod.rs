//! Command-line command handlers for slotwise.
//!
//! Each command lives in its own submodule. Handlers write their result as JSON
//! to stdout; everything else goes through the logger on stderr.

pub mod appliances;
pub mod bucket;
pub mod resolve;
pub mod slots;

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

/// The instant commands run against: `--now` if given, otherwise the wall clock.
pub fn current_time<Tz: TimeZone>(now: Option<&str>, tz: &Tz) -> Result<DateTime<Tz>> {
    match now {
        Some(text) => {
            let parsed = DateTime::parse_from_rfc3339(text.trim())
                .with_context(|| format!("Invalid --now value '{}', expected RFC 3339", text))?;
            Ok(parsed.with_timezone(tz))
        }
        None => Ok(Utc::now().with_timezone(tz)),
    }
}

/// Pretty-print a value as JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", rendered);
    Ok(())
}
