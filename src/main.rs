use anyhow::{Context, Result};
use chrono::{Local, TimeZone};

use slotwise::args::{CliAction, ParsedArgs, display_help, display_version_info};
use slotwise::commands::{appliances, bucket, current_time, resolve, slots};
use slotwise::config::Config;
use slotwise::constants::*;
use slotwise::logger::Log;

/// Whether debug output was requested through the environment.
fn debug_from_env() -> bool {
    std::env::var(DEBUG_ENV_VAR)
        .map(|value| !matches!(value.trim(), "" | "0" | "false"))
        .unwrap_or(false)
}

fn load_config(parsed: &ParsedArgs) -> Result<Config> {
    let config = match &parsed.config_path {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load().context("Failed to load configuration")?,
    };

    if Log::is_debug() {
        config.log_config(parsed.config_path.as_deref());
    }

    Ok(config)
}

/// Run a command with `now` taken in the given zone.
fn run_in_zone<Tz: TimeZone>(action: &CliAction, config: &Config, tz: &Tz) -> Result<()> {
    match action {
        CliAction::Slots => slots::handle_slots_command(config),
        CliAction::Appliances => appliances::handle_appliances_command(config),
        CliAction::Resolve(args) => {
            let now = current_time(args.now.as_deref(), tz)?;
            resolve::handle_resolve_command(config, args, &now)
        }
        CliAction::Bucket(args) => {
            let now = current_time(args.now.as_deref(), tz)?;
            bucket::handle_bucket_command(args, &now)
        }
        CliAction::ShowHelp | CliAction::ShowVersion | CliAction::ShowHelpDueToError => Ok(()),
    }
}

fn run(parsed: &ParsedArgs) -> Result<()> {
    let config = load_config(parsed)?;

    match config.time_zone() {
        Some(tz) => run_in_zone(&parsed.action, &config, &tz),
        None => run_in_zone(&parsed.action, &config, &Local),
    }
}

fn main() {
    let parsed = ParsedArgs::from_env();

    match parsed.action {
        CliAction::ShowHelp => {
            display_help();
            return;
        }
        CliAction::ShowVersion => {
            display_version_info();
            return;
        }
        CliAction::ShowHelpDueToError => {
            display_help();
            std::process::exit(EXIT_FAILURE);
        }
        _ => {}
    }

    Log::set_debug(parsed.debug_enabled || debug_from_env());
    if Log::is_debug() {
        Log::log_version();
    }

    if let Err(e) = run(&parsed) {
        Log::log_pipe();
        Log::log_error(&format!("{:#}", e));
        Log::log_end();
        std::process::exit(EXIT_FAILURE);
    }
}
