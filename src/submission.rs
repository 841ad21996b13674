//! Submission flow and the external collaborator contracts.
//!
//! The optimizer and the event store live on the other side of a network
//! boundary. This module only defines what is sent and received ([`Scheduler`]
//! and [`EventSource`]) and the local steps around those calls: selection and
//! window checks before anything is sent, error mapping afterwards.
//!
//! A submission fails fast: if the appliance is missing or the preference
//! cannot be resolved, the scheduler is never called.

use chrono::{DateTime, FixedOffset, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::appliance::Appliance;
use crate::error::{Result, SlotwiseError};
use crate::events::{EventBuckets, EventRecord, bucket, events_from_records};
use crate::logger::Log;
use crate::window::{ResolvedWindow, TimePreference, WindowResolver};

/// One appliance run as sent to the optimizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerRequest {
    pub name: String,
    pub runtime_min: u32,
    pub earliest_start: Option<DateTime<FixedOffset>>,
    pub latest_end: Option<DateTime<FixedOffset>>,
}

impl SchedulerRequest {
    pub fn from_window(appliance: &Appliance, window: &ResolvedWindow) -> Self {
        Self {
            name: appliance.name.clone(),
            runtime_min: appliance.runtime_min,
            earliest_start: Some(window.earliest_start),
            latest_end: Some(window.latest_end),
        }
    }
}

/// Optimizer answer: start time per appliance, `None` when it could not be placed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScheduleConfirmation {
    pub starts: BTreeMap<String, Option<DateTime<FixedOffset>>>,
}

impl ScheduleConfirmation {
    pub fn start_for(&self, name: &str) -> Option<DateTime<FixedOffset>> {
        self.starts.get(name).copied().flatten()
    }

    /// Appliances the optimizer reported as infeasible.
    pub fn unschedulable(&self) -> Vec<&str> {
        self.starts
            .iter()
            .filter(|(_, start)| start.is_none())
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Structured error body returned by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub non_field_errors: Vec<String>,
}

impl ErrorBody {
    /// First available message: `error`, then `detail`, then `non_field_errors[0]`.
    pub fn message(&self) -> String {
        self.error
            .as_deref()
            .or(self.detail.as_deref())
            .or(self.non_field_errors.first().map(String::as_str))
            .unwrap_or("Request failed")
            .to_string()
    }
}

/// Failure reported by a collaborator implementation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollaboratorError {
    #[error("unreachable: {0}")]
    Unreachable(String),
    #[error("{}", .0.message())]
    Rejected(ErrorBody),
}

impl From<CollaboratorError> for SlotwiseError {
    fn from(err: CollaboratorError) -> Self {
        match err {
            CollaboratorError::Unreachable(reason) => SlotwiseError::NetworkFailure(reason),
            CollaboratorError::Rejected(body) => SlotwiseError::SchedulerRejected(body.message()),
        }
    }
}

/// The external optimizer.
#[cfg_attr(test, mockall::automock)]
pub trait Scheduler {
    fn schedule(
        &self,
        requests: &[SchedulerRequest],
    ) -> std::result::Result<ScheduleConfirmation, CollaboratorError>;
}

/// The store of already-scheduled events, keyed by user.
#[cfg_attr(test, mockall::automock)]
pub trait EventSource {
    fn events_for(&self, user: &str) -> std::result::Result<Vec<EventRecord>, CollaboratorError>;
}

/// Transient form state for one "add event" submission.
#[derive(Debug, Clone, Default)]
pub struct Submission<'a> {
    pub appliance: Option<&'a Appliance>,
    pub has_time_preference: bool,
    pub preference: TimePreference,
}

/// Validate and resolve a submission into the request the optimizer receives.
pub fn build_request<Tz: TimeZone>(
    resolver: &WindowResolver,
    submission: &Submission<'_>,
    now: &DateTime<Tz>,
) -> Result<SchedulerRequest> {
    let appliance = submission.appliance.ok_or(SlotwiseError::MissingSelection)?;
    let window = resolver.resolve(
        appliance,
        submission.has_time_preference,
        &submission.preference,
        now,
    )?;

    if !window.fits(appliance.runtime_min) {
        Log::log_warning(&format!(
            "{} needs {} minutes but the window is only {} minutes long",
            appliance.name,
            appliance.runtime_min,
            window.duration().num_minutes()
        ));
    }

    Ok(SchedulerRequest::from_window(appliance, &window))
}

/// Resolve a submission and hand it to the optimizer.
///
/// # Errors
/// Resolution errors (`MissingSelection`, `AmbiguousTimePreference`) are
/// returned before the scheduler is contacted. Collaborator failures become
/// `NetworkFailure` or `SchedulerRejected`; the resolved window is dropped.
pub fn submit<S, Tz>(
    scheduler: &S,
    resolver: &WindowResolver,
    submission: &Submission<'_>,
    now: &DateTime<Tz>,
) -> Result<ScheduleConfirmation>
where
    S: Scheduler + ?Sized,
    Tz: TimeZone,
{
    let request = build_request(resolver, submission, now)?;
    let name = request.name.clone();

    let confirmation = scheduler.schedule(std::slice::from_ref(&request)).map_err(|err| {
        Log::log_error(&format!("Scheduling {} failed: {}", name, err));
        SlotwiseError::from(err)
    })?;

    match confirmation.start_for(&name) {
        Some(start) => Log::log_decorated(&format!("{} scheduled for {}", name, start.to_rfc3339())),
        None => Log::log_warning(&format!("The optimizer could not place {}", name)),
    }

    Ok(confirmation)
}

/// Fetch a user's events and bucket them relative to `now`.
///
/// # Errors
/// `MissingUser` when no user identifier is available, collaborator failures
/// as in [`submit`], and `InvalidTimestamp` for unparseable event times.
pub fn load_buckets<E, Tz>(source: &E, user: Option<&str>, now: &DateTime<Tz>) -> Result<EventBuckets>
where
    E: EventSource + ?Sized,
    Tz: TimeZone,
{
    let user = match user.map(str::trim) {
        Some(user) if !user.is_empty() => user,
        _ => return Err(SlotwiseError::MissingUser),
    };

    let records = source.events_for(user)?;
    let events = events_from_records(records, &now.timezone())?;
    Ok(bucket(&events, now))
}
