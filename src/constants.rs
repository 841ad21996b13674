//! Application constants and default values for slotwise.
//!
//! This module contains the configuration defaults, validation limits, the
//! built-in appliance catalog and other constants used throughout the application.

// ═══ Slot Grid Defaults ═══
// Used when config options are not specified by the user

pub const DEFAULT_DAY_START: &str = "00:00"; // First selectable slot
pub const DEFAULT_DAY_END: &str = "23:30"; // Last selectable slot, also "end of day"
pub const DEFAULT_SLOT_STEP_MINUTES: u32 = 30; // Matches the optimizer's 30-minute slots
pub const DEFAULT_EMPTY_PREFERENCE: &str = "no_preference"; // Toggle on, nothing picked

pub const MINUTES_PER_DAY: u32 = 24 * 60;

// ═══ Validation Limits ═══

pub const MINIMUM_SLOT_STEP_MINUTES: u32 = 5;
pub const MAXIMUM_SLOT_STEP_MINUTES: u32 = 120;
pub const MAXIMUM_RUNTIME_MINUTES: u32 = 24 * 60; // Nothing runs longer than the look-ahead day

// ═══ Appliance Catalog ═══
// (name, typical runtime in minutes)

pub const DEFAULT_APPLIANCES: &[(&str, u32)] = &[
    ("Washing Machine", 120),
    ("Dishwasher", 90),
    ("Dryer", 60),
    ("Electric Vehicle", 240),
    ("Heating System", 180),
    ("Kitchen Appliances", 60),
];

// ═══ Environment ═══

pub const DEBUG_ENV_VAR: &str = "SLOTWISE_DEBUG";
pub const CONFIG_DIR_NAME: &str = "slotwise";
pub const CONFIG_FILE_NAME: &str = "slotwise.toml";

// ═══ Exit Codes ═══

pub const EXIT_FAILURE: i32 = 1;
