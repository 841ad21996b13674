//! Slot grid generation, slot label parsing and round-up to the grid.
//!
//! The grid is the fixed set of selectable clock times for a day, by default
//! every 30 minutes from `00:00` to `23:30` (48 slots). Labels are always
//! zero-padded `HH:MM` values that sit exactly on a grid line.
//!
//! Rounding an instant up to the grid returns the day token together with the
//! label, so a round-up that crosses midnight can never be paired with the
//! wrong day.

use chrono::{DateTime, NaiveTime, TimeZone, Timelike};
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::constants::{DEFAULT_DAY_END, DEFAULT_DAY_START, DEFAULT_SLOT_STEP_MINUTES, MINUTES_PER_DAY};
use crate::error::{Result, SlotwiseError};
use crate::utils::{format_minutes, minutes_since_midnight};

/// Relative day selector, anchored to the current calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayToken {
    #[default]
    Today,
    Tomorrow,
}

impl DayToken {
    /// Number of calendar days after today.
    pub fn day_offset(self) -> u64 {
        match self {
            DayToken::Today => 0,
            DayToken::Tomorrow => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DayToken::Today => "today",
            DayToken::Tomorrow => "tomorrow",
        }
    }
}

impl fmt::Display for DayToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayToken {
    type Err = SlotwiseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(DayToken::Today),
            "tomorrow" => Ok(DayToken::Tomorrow),
            _ => Err(SlotwiseError::InvalidDayToken(s.to_string())),
        }
    }
}

/// A selectable clock time on the slot grid.
///
/// Only produced by [`SlotGrid`], so every label is known to be on the grid
/// it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotLabel {
    minutes: u32,
}

impl SlotLabel {
    fn from_minutes(minutes: u32) -> Self {
        Self { minutes }
    }

    /// Minutes since midnight.
    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    /// Wall-clock time of the slot.
    pub fn time(&self) -> NaiveTime {
        // minutes < 1440 is guaranteed by construction
        NaiveTime::from_num_seconds_from_midnight_opt(self.minutes * 60, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl fmt::Display for SlotLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_minutes(self.minutes))
    }
}

impl Serialize for SlotLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Compiled once and shared by every label parse.
fn clock_pattern() -> Option<&'static Regex> {
    static CLOCK: OnceLock<Option<Regex>> = OnceLock::new();
    CLOCK
        .get_or_init(|| Regex::new(r"^(\d{2}):(\d{2})$").ok())
        .as_ref()
}

/// Parse a strict `HH:MM` clock string into minutes since midnight.
fn parse_clock(text: &str) -> Option<u32> {
    let captures = clock_pattern()?.captures(text)?;
    let hours: u32 = captures.get(1)?.as_str().parse().ok()?;
    let minutes: u32 = captures.get(2)?.as_str().parse().ok()?;
    if hours >= 24 || minutes >= 60 {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// The set of selectable slots for a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotGrid {
    start: u32,
    end: u32,
    step: u32,
}

impl Default for SlotGrid {
    fn default() -> Self {
        Self {
            start: 0,
            end: MINUTES_PER_DAY - DEFAULT_SLOT_STEP_MINUTES,
            step: DEFAULT_SLOT_STEP_MINUTES,
        }
    }
}

impl SlotGrid {
    /// Build a grid from `HH:MM` bounds and a step in minutes.
    ///
    /// Only the bound format is checked here. A zero step or `start > end`
    /// produce a grid whose [`generate`](Self::generate) output is truncated.
    pub fn new(start: &str, end: &str, step_minutes: u32) -> Result<Self> {
        let start_minutes =
            parse_clock(start).ok_or_else(|| SlotwiseError::InvalidSlotFormat(start.to_string()))?;
        let end_minutes =
            parse_clock(end).ok_or_else(|| SlotwiseError::InvalidSlotFormat(end.to_string()))?;

        Ok(Self {
            start: start_minutes,
            end: end_minutes,
            step: step_minutes,
        })
    }

    pub fn step_minutes(&self) -> u32 {
        self.step
    }

    /// All slots from start to end inclusive.
    pub fn generate(&self) -> Vec<SlotLabel> {
        if self.step == 0 {
            return Vec::new();
        }
        (self.start..=self.end)
            .step_by(self.step as usize)
            .map(SlotLabel::from_minutes)
            .collect()
    }

    /// Start-of-day slot.
    pub fn first_slot(&self) -> SlotLabel {
        SlotLabel::from_minutes(self.start)
    }

    /// End-of-day slot: the last grid line not after the configured end.
    pub fn last_slot(&self) -> SlotLabel {
        if self.step == 0 || self.end < self.start {
            return self.first_slot();
        }
        let steps = (self.end - self.start) / self.step;
        SlotLabel::from_minutes(self.start + steps * self.step)
    }

    fn contains(&self, minutes: u32) -> bool {
        self.step > 0
            && minutes >= self.start
            && minutes <= self.end
            && (minutes - self.start) % self.step == 0
    }

    /// Validate a user-supplied label against this grid.
    pub fn parse_label(&self, text: &str) -> Result<SlotLabel> {
        match parse_clock(text) {
            Some(minutes) if self.contains(minutes) => Ok(SlotLabel::from_minutes(minutes)),
            _ => Err(SlotwiseError::InvalidSlotFormat(text.to_string())),
        }
    }

    /// Round a time of day up to the next grid line.
    ///
    /// Times already exactly on a grid line (zero seconds) are returned as is.
    /// Times before the first slot round to the first slot of the same day;
    /// times past the last slot roll over to the first slot of tomorrow.
    pub fn round_up_time(&self, time: NaiveTime) -> (DayToken, SlotLabel) {
        let step = self.step.max(1);
        let exact = time.second() == 0 && time.nanosecond() == 0;
        let minutes = minutes_since_midnight(time) + u32::from(!exact);

        if minutes <= self.start {
            return (DayToken::Today, self.first_slot());
        }

        let rounded = self.start + (minutes - self.start).div_ceil(step) * step;
        if rounded > self.last_slot().minutes() || rounded >= MINUTES_PER_DAY {
            (DayToken::Tomorrow, self.first_slot())
        } else {
            (DayToken::Today, SlotLabel::from_minutes(rounded))
        }
    }

    /// Round an instant's local time of day up to the grid.
    pub fn round_up<Tz: TimeZone>(&self, instant: &DateTime<Tz>) -> (DayToken, SlotLabel) {
        self.round_up_time(instant.time())
    }
}

/// Generate the labels between two `HH:MM` bounds.
///
/// # Examples
/// ```
/// use slotwise::slots::generate;
/// let slots = generate("00:00", "23:30", 30).unwrap();
/// assert_eq!(slots.len(), 48);
/// assert_eq!(slots[1].to_string(), "00:30");
/// ```
pub fn generate(start: &str, end: &str, step_minutes: u32) -> Result<Vec<SlotLabel>> {
    Ok(SlotGrid::new(start, end, step_minutes)?.generate())
}

/// Grid with the built-in bounds and step.
pub fn default_grid() -> Result<SlotGrid> {
    SlotGrid::new(DEFAULT_DAY_START, DEFAULT_DAY_END, DEFAULT_SLOT_STEP_MINUTES)
}
