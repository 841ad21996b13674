//! Implementation of the `resolve` command.
//!
//! Runs the same steps as a real submission up to the point where the request
//! would be sent, then prints the request instead.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone};

use crate::args::ResolveArgs;
use crate::config::Config;
use crate::submission::{SchedulerRequest, Submission, build_request};
use crate::window::{Bound, TimePreference};

fn parse_bound(config: &Config, text: Option<&str>, flag: &str) -> Result<Bound> {
    match text {
        Some(text) => Bound::parse(&config.grid()?, text)
            .with_context(|| format!("Invalid {} value '{}'", flag, text)),
        None => Ok(Bound::default()),
    }
}

/// Resolve command-line inputs into the request the optimizer would receive.
pub fn resolve_request<Tz: TimeZone>(
    config: &Config,
    args: &ResolveArgs,
    now: &DateTime<Tz>,
) -> Result<SchedulerRequest> {
    let catalog = config.catalog();
    let appliance = match args.appliance.as_deref() {
        Some(name) => Some(catalog.select(Some(name))?),
        None => None,
    };

    let submission = Submission {
        appliance,
        has_time_preference: args.has_time_preference,
        preference: TimePreference {
            earliest: parse_bound(config, args.from.as_deref(), "--from")?,
            latest: parse_bound(config, args.until.as_deref(), "--until")?,
        },
    };

    Ok(build_request(&config.resolver()?, &submission, now)?)
}

pub fn handle_resolve_command<Tz: TimeZone>(
    config: &Config,
    args: &ResolveArgs,
    now: &DateTime<Tz>,
) -> Result<()> {
    let request = resolve_request(config, args, now)?;
    super::print_json(&request)
}
