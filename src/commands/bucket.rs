//! Implementation of the `bucket` command.
//!
//! Events are read from a JSON file standing in for the event store. The file
//! holds either a plain list of events or an object mapping user names to
//! their lists.

use anyhow::Result;
use chrono::{DateTime, TimeZone};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::args::BucketArgs;
use crate::events::{EventBuckets, EventRecord};
use crate::logger::Log;
use crate::submission::{CollaboratorError, ErrorBody, EventSource, load_buckets};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EventFile {
    Shared(Vec<EventRecord>),
    PerUser(BTreeMap<String, Vec<EventRecord>>),
}

/// Event store backed by a local JSON file.
#[derive(Debug, Clone)]
pub struct FileEventSource {
    path: PathBuf,
}

impl FileEventSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSource for FileEventSource {
    fn events_for(&self, user: &str) -> std::result::Result<Vec<EventRecord>, CollaboratorError> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            CollaboratorError::Unreachable(format!("{}: {}", self.path.display(), e))
        })?;

        let file: EventFile = serde_json::from_str(&content).map_err(|e| {
            CollaboratorError::Rejected(ErrorBody {
                error: Some(format!("Malformed event file: {}", e)),
                ..ErrorBody::default()
            })
        })?;

        Ok(match file {
            EventFile::Shared(records) => records,
            EventFile::PerUser(mut by_user) => by_user.remove(user).unwrap_or_default(),
        })
    }
}

/// Load and bucket the events for `args.user`, falling back to `$USER`.
pub fn bucket_from_file<Tz: TimeZone>(args: &BucketArgs, now: &DateTime<Tz>) -> Result<EventBuckets> {
    let user = args.user.clone().or_else(|| std::env::var("USER").ok());
    let source = FileEventSource::new(&args.events);
    Ok(load_buckets(&source, user.as_deref(), now)?)
}

pub fn handle_bucket_command<Tz: TimeZone>(args: &BucketArgs, now: &DateTime<Tz>) -> Result<()> {
    let buckets = bucket_from_file(args, now)?;
    Log::log_decorated(&format!(
        "{} today ({} upcoming), {} tomorrow",
        buckets.today.len(),
        buckets.upcoming_today().count(),
        buckets.tomorrow.len()
    ));
    super::print_json(&buckets)
}
