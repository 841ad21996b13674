//! Appliance reference data.
//!
//! The catalog is fixed for the lifetime of the process: either the built-in
//! list or the `[[appliances]]` table from the config file.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_APPLIANCES;
use crate::error::{Result, SlotwiseError};

/// A schedulable household appliance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appliance {
    pub name: String,
    /// How long one run takes, in minutes (always > 0 once validated)
    pub runtime_min: u32,
}

impl Appliance {
    pub fn new(name: impl Into<String>, runtime_min: u32) -> Self {
        Self {
            name: name.into(),
            runtime_min,
        }
    }
}

/// The list of appliances a user can pick from.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplianceCatalog {
    appliances: Vec<Appliance>,
}

impl Default for ApplianceCatalog {
    fn default() -> Self {
        Self::new(
            DEFAULT_APPLIANCES
                .iter()
                .map(|(name, runtime)| Appliance::new(*name, *runtime))
                .collect(),
        )
    }
}

impl ApplianceCatalog {
    pub fn new(appliances: Vec<Appliance>) -> Self {
        Self { appliances }
    }

    pub fn appliances(&self) -> &[Appliance] {
        &self.appliances
    }

    /// Case-insensitive lookup by name.
    pub fn find(&self, name: &str) -> Option<&Appliance> {
        let wanted = name.trim();
        self.appliances
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(wanted))
    }

    /// Turn the user's (possibly empty) choice into a catalog entry.
    ///
    /// # Errors
    /// - `MissingSelection` when nothing was chosen
    /// - `UnknownAppliance` when the name is not in the catalog
    pub fn select(&self, choice: Option<&str>) -> Result<&Appliance> {
        let name = match choice.map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => return Err(SlotwiseError::MissingSelection),
        };
        self.find(name)
            .ok_or_else(|| SlotwiseError::UnknownAppliance(name.to_string()))
    }
}
