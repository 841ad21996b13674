//! Implementation of the `appliances` command.

use anyhow::Result;

use crate::config::Config;
use crate::logger::Log;

/// Print the appliance catalog in effect.
pub fn handle_appliances_command(config: &Config) -> Result<()> {
    let catalog = config.catalog();
    for appliance in catalog.appliances() {
        Log::log_debug(&format!(
            "{}: {} minutes",
            appliance.name, appliance.runtime_min
        ));
    }
    super::print_json(&catalog.appliances())
}
