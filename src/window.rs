//! Time-window resolution for appliance runs.
//!
//! Converts a coarse user preference (nothing, a start slot, an end slot, or
//! both, each with a today/tomorrow day token) into an absolute
//! `[earliest_start, latest_end]` pair that the optimizer can schedule into.
//!
//! ## Resolution rules
//! - **No preference**: from "as soon as possible" (now rounded up to the grid)
//!   until the last slot of tomorrow.
//! - **Both bounds**: used as given.
//! - **Start only**: until the last slot of the start's own day.
//! - **End only**: from the first slot of the end's own day.
//! - **Preference on, nothing picked**: depends on [`EmptyPreferencePolicy`].
//!
//! Instants are built with calendar-day arithmetic in the zone of `now`, so a
//! "tomorrow 09:00" is 09:00 on the wall clock even across a DST change.

use chrono::{DateTime, FixedOffset, TimeDelta, TimeZone};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::appliance::Appliance;
use crate::error::{Result, SlotwiseError};
use crate::logger::Log;
use crate::slots::{DayToken, SlotGrid, SlotLabel};
use crate::utils::{instant_on_day, instant_on_day_not_before};

/// What the user did with a time picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotChoice {
    /// The picker was never touched
    #[default]
    Unset,
    /// The picker is present but left on its empty placeholder
    Blank,
    /// A slot was picked
    Set(SlotLabel),
}

impl SlotChoice {
    /// Interpret raw picker input: absent, empty, or a label to validate.
    pub fn from_input(grid: &SlotGrid, raw: Option<&str>) -> Result<Self> {
        match raw.map(str::trim) {
            None => Ok(SlotChoice::Unset),
            Some("") => Ok(SlotChoice::Blank),
            Some(text) => grid.parse_label(text).map(SlotChoice::Set),
        }
    }

    pub fn slot(&self) -> Option<SlotLabel> {
        match self {
            SlotChoice::Set(slot) => Some(*slot),
            SlotChoice::Unset | SlotChoice::Blank => None,
        }
    }
}

/// One side of a time preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bound {
    pub day: DayToken,
    pub slot: SlotChoice,
}

impl Bound {
    pub fn at(day: DayToken, slot: SlotLabel) -> Self {
        Self {
            day,
            slot: SlotChoice::Set(slot),
        }
    }

    /// Parse `DAY@HH:MM`, `HH:MM` (today) or a bare `DAY` (slot left blank).
    pub fn parse(grid: &SlotGrid, text: &str) -> Result<Self> {
        let text = text.trim();
        if let Some((day, slot)) = text.split_once('@') {
            return Ok(Self {
                day: day.parse()?,
                slot: SlotChoice::from_input(grid, Some(slot))?,
            });
        }
        if let Ok(day) = text.parse::<DayToken>() {
            return Ok(Self {
                day,
                slot: SlotChoice::Blank,
            });
        }
        Ok(Self {
            day: DayToken::Today,
            slot: SlotChoice::from_input(grid, Some(text))?,
        })
    }
}

/// Earliest-start and latest-end preferences for one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimePreference {
    pub earliest: Bound,
    pub latest: Bound,
}

/// How to treat a preference that is switched on but has no bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyPreferencePolicy {
    /// Resolve exactly like "no preference"
    #[default]
    #[serde(rename = "no_preference")]
    AsNoPreference,
    /// Fail with `AmbiguousTimePreference`
    Reject,
}

impl EmptyPreferencePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            EmptyPreferencePolicy::AsNoPreference => "no_preference",
            EmptyPreferencePolicy::Reject => "reject",
        }
    }
}

impl FromStr for EmptyPreferencePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "no_preference" => Ok(EmptyPreferencePolicy::AsNoPreference),
            "reject" => Ok(EmptyPreferencePolicy::Reject),
            other => Err(format!(
                "empty_preference must be 'no_preference' or 'reject' (got '{}')",
                other
            )),
        }
    }
}

/// Absolute window handed to the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedWindow {
    pub earliest_start: DateTime<FixedOffset>,
    pub latest_end: DateTime<FixedOffset>,
}

impl ResolvedWindow {
    pub fn duration(&self) -> TimeDelta {
        self.latest_end - self.earliest_start
    }

    pub fn is_empty(&self) -> bool {
        self.latest_end <= self.earliest_start
    }

    /// Whether a run of `runtime_min` minutes fits inside the window.
    pub fn fits(&self, runtime_min: u32) -> bool {
        self.duration() >= TimeDelta::minutes(i64::from(runtime_min))
    }
}

/// Resolves time preferences against a slot grid.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WindowResolver {
    grid: SlotGrid,
    policy: EmptyPreferencePolicy,
}

impl WindowResolver {
    pub fn new(grid: SlotGrid, policy: EmptyPreferencePolicy) -> Self {
        Self { grid, policy }
    }

    pub fn grid(&self) -> &SlotGrid {
        &self.grid
    }

    pub fn policy(&self) -> EmptyPreferencePolicy {
        self.policy
    }

    /// Bounds used when there is no usable preference.
    fn as_soon_as_possible<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
    ) -> ((DayToken, SlotLabel), (DayToken, SlotLabel), bool) {
        (
            self.grid.round_up(now),
            (DayToken::Tomorrow, self.grid.last_slot()),
            true,
        )
    }

    /// Resolve a preference into absolute instants relative to `now`.
    ///
    /// # Arguments
    /// * `appliance` - The appliance being scheduled (used for diagnostics)
    /// * `has_time_preference` - Whether the preference toggle is on
    /// * `preference` - Start and end bounds; ignored when the toggle is off
    /// * `now` - Current instant; its zone defines "today"
    ///
    /// # Errors
    /// `AmbiguousTimePreference` when the toggle is on, no bound is set and the
    /// policy is [`EmptyPreferencePolicy::Reject`].
    pub fn resolve<Tz: TimeZone>(
        &self,
        appliance: &Appliance,
        has_time_preference: bool,
        preference: &TimePreference,
        now: &DateTime<Tz>,
    ) -> Result<ResolvedWindow> {
        use SlotChoice::{Blank, Set, Unset};

        let earliest_day = preference.earliest.day;
        let latest_day = preference.latest.day;

        // Bounds plus whether the start is `now` rounded up
        let (earliest, latest, from_now) = if !has_time_preference {
            self.as_soon_as_possible(now)
        } else {
            match (preference.earliest.slot, preference.latest.slot) {
                (Set(start), Set(end)) => ((earliest_day, start), (latest_day, end), false),
                (Set(start), Unset | Blank) => (
                    (earliest_day, start),
                    (earliest_day, self.grid.last_slot()),
                    false,
                ),
                (Unset | Blank, Set(end)) => (
                    (latest_day, self.grid.first_slot()),
                    (latest_day, end),
                    false,
                ),
                (Unset | Blank, Unset | Blank) => match self.policy {
                    EmptyPreferencePolicy::AsNoPreference => self.as_soon_as_possible(now),
                    EmptyPreferencePolicy::Reject => {
                        return Err(SlotwiseError::AmbiguousTimePreference);
                    }
                },
            }
        };

        let earliest_start = if from_now {
            instant_on_day_not_before(now, earliest.0.day_offset(), earliest.1.time())
        } else {
            instant_on_day(now, earliest.0.day_offset(), earliest.1.time())
        }
        .fixed_offset();
        let mut latest_end = instant_on_day(now, latest.0.day_offset(), latest.1.time()).fixed_offset();

        if latest_end < earliest_start {
            Log::log_warning(&format!(
                "End {} {} is before start {} {} for {}; collapsing the window",
                latest.0, latest.1, earliest.0, earliest.1, appliance.name
            ));
            latest_end = earliest_start;
        }

        Log::log_debug(&format!(
            "Resolved {}: {} {} ({}) → {} {} ({})",
            appliance.name,
            earliest.0,
            earliest.1,
            earliest_start.to_rfc3339(),
            latest.0,
            latest.1,
            latest_end.to_rfc3339()
        ));

        Ok(ResolvedWindow {
            earliest_start,
            latest_end,
        })
    }
}

/// Resolve with the default grid and empty-preference policy.
pub fn resolve<Tz: TimeZone>(
    appliance: &Appliance,
    has_time_preference: bool,
    preference: &TimePreference,
    now: &DateTime<Tz>,
) -> Result<ResolvedWindow> {
    WindowResolver::default().resolve(appliance, has_time_preference, preference, now)
}
