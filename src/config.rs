//! Configuration loading and validation for slotwise.
//!
//! Settings live in `slotwise.toml` under the user config directory. Every field
//! is optional; missing values fall back to the defaults in `constants.rs`. When
//! no config file exists, a commented default one is written on first load.
//!
//! ## Example
//! ```toml
//! timezone = "Europe/London"
//! slot_step_minutes = 30
//! day_start = "00:00"
//! day_end = "23:30"
//! empty_preference = "no_preference"
//!
//! [[appliances]]
//! name = "Dishwasher"
//! runtime_min = 90
//! ```

use anyhow::{Context, Result, bail};
use chrono_tz::Tz;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::appliance::{Appliance, ApplianceCatalog};
use crate::constants::*;
use crate::logger::Log;
use crate::slots::SlotGrid;
use crate::window::{EmptyPreferencePolicy, WindowResolver};

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    pub timezone: Option<String>,
    pub slot_step_minutes: Option<u32>,
    pub day_start: Option<String>,
    pub day_end: Option<String>,
    pub empty_preference: Option<String>,
    pub appliances: Option<Vec<Appliance>>,
}

impl Config {
    pub fn get_config_path() -> Result<PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            Ok(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        } else {
            bail!("Could not determine config directory")
        }
    }

    /// Load from the default location, writing a default file first if needed.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)
                .context("Failed to create default config during load")?;
        }

        Self::load_from_path(&config_path)
    }

    /// Load from an explicit path. The file must exist.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!(
                "Configuration file not found at specified path: {}",
                path.display()
            );
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let mut config: Config = toml::from_str(&content).with_context(|| {
            format!(
                "Failed to parse config from {}. Please check the TOML syntax",
                path.display()
            )
        })?;

        apply_defaults_and_validate_fields(&mut config)?;
        validate_config(&config)?;

        Ok(config)
    }

    pub fn create_default_config(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let mut builder = ConfigBuilder::new()
            .add_section("Slot grid")
            .add_setting(
                "slot_step_minutes",
                &DEFAULT_SLOT_STEP_MINUTES.to_string(),
                &format!(
                    "Minutes between selectable slots ({}-{}, must divide a day)",
                    MINIMUM_SLOT_STEP_MINUTES, MAXIMUM_SLOT_STEP_MINUTES
                ),
            )
            .add_setting(
                "day_start",
                &format!("\"{}\"", DEFAULT_DAY_START),
                "First selectable slot (HH:MM)",
            )
            .add_setting(
                "day_end",
                &format!("\"{}\"", DEFAULT_DAY_END),
                "Last selectable slot (HH:MM)",
            )
            .add_section("Time preferences")
            .add_setting(
                "empty_preference",
                &format!("\"{}\"", DEFAULT_EMPTY_PREFERENCE),
                "Preference on but nothing picked: \"no_preference\" or \"reject\"",
            )
            .add_comment("timezone = \"Europe/London\"  # IANA zone, defaults to the system zone");

        for (name, runtime) in DEFAULT_APPLIANCES {
            builder = builder
                .add_table("appliances")
                .add_setting("name", &format!("\"{}\"", name), "Display name")
                .add_setting("runtime_min", &runtime.to_string(), "Minutes per run");
        }

        fs::write(path, builder.build()).context("Failed to write default config file")?;
        Ok(())
    }

    /// The configured zone, or `None` for the system local zone.
    pub fn time_zone(&self) -> Option<Tz> {
        self.timezone.as_deref().and_then(|name| name.parse().ok())
    }

    pub fn grid(&self) -> Result<SlotGrid> {
        let grid = SlotGrid::new(
            self.day_start.as_deref().unwrap_or(DEFAULT_DAY_START),
            self.day_end.as_deref().unwrap_or(DEFAULT_DAY_END),
            self.slot_step_minutes.unwrap_or(DEFAULT_SLOT_STEP_MINUTES),
        )?;
        Ok(grid)
    }

    pub fn empty_preference_policy(&self) -> Result<EmptyPreferencePolicy> {
        self.empty_preference
            .as_deref()
            .unwrap_or(DEFAULT_EMPTY_PREFERENCE)
            .parse()
            .map_err(anyhow::Error::msg)
    }

    pub fn resolver(&self) -> Result<WindowResolver> {
        Ok(WindowResolver::new(
            self.grid()?,
            self.empty_preference_policy()?,
        ))
    }

    pub fn catalog(&self) -> ApplianceCatalog {
        match &self.appliances {
            Some(appliances) => ApplianceCatalog::new(appliances.clone()),
            None => ApplianceCatalog::default(),
        }
    }

    pub fn log_config(&self, path: Option<&Path>) {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::get_config_path()
                .unwrap_or_else(|_| PathBuf::from("~/.config/slotwise/slotwise.toml")),
        };

        Log::log_block_start(&format!(
            "Loaded configuration from {}",
            crate::utils::path_for_display(&config_path)
        ));

        Log::log_indented(&format!(
            "Time zone: {}",
            self.timezone.as_deref().unwrap_or("system local")
        ));
        Log::log_indented(&format!(
            "Slot grid: {} to {} every {} minutes",
            self.day_start.as_deref().unwrap_or(DEFAULT_DAY_START),
            self.day_end.as_deref().unwrap_or(DEFAULT_DAY_END),
            self.slot_step_minutes.unwrap_or(DEFAULT_SLOT_STEP_MINUTES)
        ));
        Log::log_indented(&format!(
            "Empty preference: {}",
            self.empty_preference
                .as_deref()
                .unwrap_or(DEFAULT_EMPTY_PREFERENCE)
        ));
        Log::log_indented(&format!(
            "Appliances: {}",
            self.catalog().appliances().len()
        ));
    }
}

/// Fill in missing optional fields and normalize string values.
pub fn apply_defaults_and_validate_fields(config: &mut Config) -> Result<()> {
    if config.slot_step_minutes.is_none() {
        config.slot_step_minutes = Some(DEFAULT_SLOT_STEP_MINUTES);
    }

    if config.day_start.is_none() {
        config.day_start = Some(DEFAULT_DAY_START.to_string());
    }

    if config.day_end.is_none() {
        config.day_end = Some(DEFAULT_DAY_END.to_string());
    }

    match config.empty_preference.as_deref().map(str::trim) {
        None | Some("") => config.empty_preference = Some(DEFAULT_EMPTY_PREFERENCE.to_string()),
        Some(value) => config.empty_preference = Some(value.to_lowercase()),
    }

    if let Some(tz) = config.timezone.as_deref().map(str::trim) {
        if tz.is_empty() {
            config.timezone = None;
        } else {
            config.timezone = Some(tz.to_string());
        }
    }

    if let Some(appliances) = config.appliances.as_mut() {
        for appliance in appliances.iter_mut() {
            appliance.name = appliance.name.trim().to_string();
        }
    }

    Ok(())
}

/// Check ranges, the time zone, grid bounds and catalog entries.
pub fn validate_config(config: &Config) -> Result<()> {
    let step = config.slot_step_minutes.unwrap_or(DEFAULT_SLOT_STEP_MINUTES);
    if !(MINIMUM_SLOT_STEP_MINUTES..=MAXIMUM_SLOT_STEP_MINUTES).contains(&step) {
        bail!(
            "slot_step_minutes ({}) must be between {} and {}",
            step,
            MINIMUM_SLOT_STEP_MINUTES,
            MAXIMUM_SLOT_STEP_MINUTES
        );
    }
    if MINUTES_PER_DAY % step != 0 {
        bail!(
            "slot_step_minutes ({}) must divide a day evenly ({} minutes)",
            step,
            MINUTES_PER_DAY
        );
    }

    if let Some(name) = config.timezone.as_deref() {
        if name.parse::<Tz>().is_err() {
            bail!("Unknown time zone '{}'. Use an IANA name such as \"Europe/London\"", name);
        }
    }

    let grid = config.grid().context("Invalid slot grid bounds")?;
    let start = config.day_start.as_deref().unwrap_or(DEFAULT_DAY_START);
    let end = config.day_end.as_deref().unwrap_or(DEFAULT_DAY_END);
    if grid.generate().is_empty() {
        bail!("day_start ({}) must not be after day_end ({})", start, end);
    }

    config
        .empty_preference_policy()
        .context("Invalid empty_preference")?;

    if let Some(appliances) = &config.appliances {
        if appliances.is_empty() {
            bail!("[[appliances]] is present but lists no appliances");
        }

        let mut seen = HashSet::new();
        for appliance in appliances {
            if appliance.name.is_empty() {
                bail!("Appliance names must not be empty");
            }
            if !seen.insert(appliance.name.to_lowercase()) {
                bail!("Appliance '{}' is listed more than once", appliance.name);
            }
            if appliance.runtime_min == 0 || appliance.runtime_min > MAXIMUM_RUNTIME_MINUTES {
                bail!(
                    "Appliance '{}' runtime_min ({}) must be between 1 and {}",
                    appliance.name,
                    appliance.runtime_min,
                    MAXIMUM_RUNTIME_MINUTES
                );
            }
        }
    }

    Ok(())
}

/// Writes aligned `key = value  # comment` lines for the default config.
struct ConfigBuilder {
    entries: Vec<ConfigEntry>,
}

enum ConfigEntry {
    Section(String),
    Table(String),
    Comment(String),
    Setting { line: String, comment: String },
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(ConfigEntry::Section(format!("#[{}]", title)));
        self
    }

    fn add_table(mut self, name: &str) -> Self {
        self.entries.push(ConfigEntry::Table(format!("[[{}]]", name)));
        self
    }

    fn add_comment(mut self, text: &str) -> Self {
        self.entries.push(ConfigEntry::Comment(format!("# {}", text)));
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(ConfigEntry::Setting {
            line: format!("{} = {}", key, value),
            comment: format!("# {}", comment),
        });
        self
    }

    fn build(self) -> String {
        let max_width = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                ConfigEntry::Setting { line, .. } => Some(line.len()),
                _ => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut result = Vec::new();
        for (index, entry) in self.entries.into_iter().enumerate() {
            match entry {
                ConfigEntry::Section(title) | ConfigEntry::Table(title) => {
                    if index > 0 {
                        result.push(String::new());
                    }
                    result.push(title);
                }
                ConfigEntry::Comment(text) => result.push(text),
                ConfigEntry::Setting { line, comment } => {
                    let padding = " ".repeat(max_width - line.len());
                    result.push(format!("{}{}{}", line, padding, comment));
                }
            }
        }

        result.push(String::new());
        result.join("\n")
    }
}
