//! # Slotwise
//!
//! Time-window resolution for household appliance scheduling.
//!
//! A user picks an appliance and, optionally, a coarse time preference made of
//! a day (today or tomorrow) and a half-hour slot for the earliest start and
//! the latest end. Slotwise turns that into the absolute window an external
//! optimizer schedules into, and splits the optimizer's events back into a
//! today and a tomorrow view.
//!
//! ## Architecture
//!
//! - **slots**: The slot grid, label parsing and rounding to the grid
//! - **window**: Resolution of time preferences into absolute windows
//! - **events**: Today/tomorrow bucketing of scheduled events
//! - **submission**: Collaborator contracts and the submission flow
//! - **appliance**: The appliance catalog
//! - **config**: Configuration loading, validation, and default generation
//! - **args** / **commands**: Command-line parsing and handlers
//! - **constants**: Application-wide constants and defaults
//! - **error**: Domain error type
//! - **logger**: Structured logging with visual formatting
//! - **utils**: Clock arithmetic and zone helpers

pub mod appliance;
pub mod args;
pub mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod logger;
pub mod slots;
pub mod submission;
pub mod utils;
pub mod window;

// Re-export important types for easier access
pub use appliance::{Appliance, ApplianceCatalog};
pub use config::Config;
pub use error::SlotwiseError;
pub use events::{BucketedEvent, EventBuckets, ScheduledEvent, bucket};
pub use logger::{Log, LogLevel};
pub use slots::{DayToken, SlotGrid, SlotLabel};
pub use submission::{EventSource, Scheduler, SchedulerRequest, Submission, load_buckets, submit};
pub use window::{
    Bound, EmptyPreferencePolicy, ResolvedWindow, SlotChoice, TimePreference, WindowResolver,
};
