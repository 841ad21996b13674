//! Implementation of the `slots` command.

use anyhow::Result;
use serde::Serialize;

use crate::config::Config;
use crate::logger::Log;
use crate::slots::{SlotGrid, SlotLabel};

#[derive(Debug, Serialize)]
pub struct SlotListing {
    pub step_minutes: u32,
    pub first: SlotLabel,
    pub last: SlotLabel,
    pub slots: Vec<SlotLabel>,
}

impl SlotListing {
    pub fn from_grid(grid: &SlotGrid) -> Self {
        Self {
            step_minutes: grid.step_minutes(),
            first: grid.first_slot(),
            last: grid.last_slot(),
            slots: grid.generate(),
        }
    }
}

/// Print the configured slot grid.
pub fn handle_slots_command(config: &Config) -> Result<()> {
    let listing = SlotListing::from_grid(&config.grid()?);
    Log::log_decorated(&format!(
        "{} slots from {} to {}",
        listing.slots.len(),
        listing.first,
        listing.last
    ));
    super::print_json(&listing)
}
