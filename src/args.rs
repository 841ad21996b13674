//! Command-line argument parsing and processing.
//!
//! Arguments are parsed with clap and then flattened into a [`CliAction`] so
//! the rest of the program never touches clap types. Parse failures do not
//! abort the process; they become [`CliAction::ShowHelpDueToError`].

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::logger::Log;

#[derive(Parser, Debug)]
#[command(name = "slotwise", version, disable_help_subcommand = true)]
struct Cli {
    /// Enable detailed debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Use this config file instead of the default location
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the selectable slots
    Slots,
    /// List the appliance catalog
    Appliances,
    /// Resolve a time preference into a scheduler request
    Resolve {
        /// Appliance name from the catalog
        #[arg(short, long)]
        appliance: Option<String>,
        /// Turn the time preference on
        #[arg(short, long)]
        prefer: bool,
        /// Earliest start, e.g. "tomorrow@09:00"
        #[arg(long, value_name = "DAY@HH:MM")]
        from: Option<String>,
        /// Latest end, e.g. "today@18:30"
        #[arg(long, value_name = "DAY@HH:MM")]
        until: Option<String>,
        /// Resolve relative to this instant instead of the current time
        #[arg(long, value_name = "RFC3339")]
        now: Option<String>,
    },
    /// Split scheduled events into today and tomorrow
    Bucket {
        /// JSON file with the scheduled events
        #[arg(short, long, value_name = "FILE")]
        events: PathBuf,
        /// Whose events to show (defaults to $USER)
        #[arg(short, long)]
        user: Option<String>,
        /// Bucket relative to this instant instead of the current time
        #[arg(long, value_name = "RFC3339")]
        now: Option<String>,
    },
}

/// Inputs for the `resolve` command.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolveArgs {
    pub appliance: Option<String>,
    pub has_time_preference: bool,
    pub from: Option<String>,
    pub until: Option<String>,
    pub now: Option<String>,
}

/// Inputs for the `bucket` command.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketArgs {
    pub events: PathBuf,
    pub user: Option<String>,
    pub now: Option<String>,
}

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Print the configured slot grid
    Slots,
    /// Print the appliance catalog
    Appliances,
    /// Resolve a preference and print the scheduler request
    Resolve(ResolveArgs),
    /// Bucket events from a file and print them
    Bucket(BucketArgs),
    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to invalid arguments and exit
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
#[derive(Debug, PartialEq)]
pub struct ParsedArgs {
    pub action: CliAction,
    pub debug_enabled: bool,
    pub config_path: Option<PathBuf>,
}

impl ParsedArgs {
    /// Parse command-line arguments into a structured result.
    ///
    /// # Arguments
    /// * `args` - Iterator over command-line arguments, program name first
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

        let cli = match Cli::try_parse_from(&args) {
            Ok(cli) => cli,
            Err(err) => {
                let action = match err.kind() {
                    ErrorKind::DisplayHelp => CliAction::ShowHelp,
                    ErrorKind::DisplayVersion => CliAction::ShowVersion,
                    _ => {
                        let message = err.to_string();
                        let first_line = message.lines().next().unwrap_or("Invalid arguments");
                        Log::log_warning(first_line.trim_start_matches("error: "));
                        CliAction::ShowHelpDueToError
                    }
                };
                return ParsedArgs {
                    action,
                    debug_enabled: args.iter().any(|a| a == "--debug" || a == "-d"),
                    config_path: None,
                };
            }
        };

        let action = match cli.command {
            None => CliAction::ShowHelp,
            Some(Command::Slots) => CliAction::Slots,
            Some(Command::Appliances) => CliAction::Appliances,
            Some(Command::Resolve {
                appliance,
                prefer,
                from,
                until,
                now,
            }) => CliAction::Resolve(ResolveArgs {
                appliance,
                // Picking either bound implies the preference toggle
                has_time_preference: prefer || from.is_some() || until.is_some(),
                from,
                until,
                now,
            }),
            Some(Command::Bucket { events, user, now }) => {
                CliAction::Bucket(BucketArgs { events, user, now })
            }
        };

        ParsedArgs {
            action,
            debug_enabled: cli.debug,
            config_path: cli.config,
        }
    }

    /// Convenience method to parse from std::env::args()
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    Log::log_version();
    Log::log_pipe();
    eprintln!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Displays custom help message using logger methods.
pub fn display_help() {
    Log::log_version();
    Log::log_block_start(env!("CARGO_PKG_DESCRIPTION"));
    Log::log_block_start("Usage: slotwise [OPTIONS] <COMMAND>");
    Log::log_block_start("Commands:");
    Log::log_indented("slots                      Print the selectable slots");
    Log::log_indented("appliances                 List the appliance catalog");
    Log::log_indented("resolve [--appliance NAME] [--prefer] [--from DAY@HH:MM] [--until DAY@HH:MM]");
    Log::log_indented("                           Resolve a preference into a scheduler request");
    Log::log_indented("bucket --events FILE [--user NAME]");
    Log::log_indented("                           Split scheduled events into today and tomorrow");
    Log::log_block_start("Options:");
    Log::log_indented("-c, --config <PATH>        Use this config file");
    Log::log_indented("-d, --debug                Enable detailed debug output");
    Log::log_indented("    --now <RFC3339>        Pretend the current time is this instant");
    Log::log_indented("-h, --help                 Print help information");
    Log::log_indented("-V, --version              Print version information");
    Log::log_end();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> ParsedArgs {
        let mut full = vec!["slotwise"];
        full.extend_from_slice(args);
        ParsedArgs::parse(full)
    }

    #[test]
    fn test_parse_no_args() {
        let parsed = parse(&[]);
        assert_eq!(parsed.action, CliAction::ShowHelp);
        assert!(!parsed.debug_enabled);
        assert_eq!(parsed.config_path, None);
    }

    #[test]
    fn test_parse_slots() {
        assert_eq!(parse(&["slots"]).action, CliAction::Slots);
        assert_eq!(parse(&["appliances"]).action, CliAction::Appliances);
    }

    #[test]
    fn test_parse_debug_flag_anywhere() {
        assert!(parse(&["--debug", "slots"]).debug_enabled);
        assert!(parse(&["slots", "-d"]).debug_enabled);
    }

    #[test]
    fn test_parse_config_path() {
        let parsed = parse(&["--config", "/tmp/slotwise.toml", "appliances"]);
        assert_eq!(parsed.config_path, Some(PathBuf::from("/tmp/slotwise.toml")));
    }

    #[test]
    fn test_parse_help_flag() {
        assert_eq!(parse(&["--help"]).action, CliAction::ShowHelp);
        assert_eq!(parse(&["-h"]).action, CliAction::ShowHelp);
    }

    #[test]
    fn test_parse_version_flag() {
        assert_eq!(parse(&["--version"]).action, CliAction::ShowVersion);
        assert_eq!(parse(&["-V"]).action, CliAction::ShowVersion);
    }

    #[test]
    fn test_parse_unknown_flag() {
        assert_eq!(parse(&["--unknown"]).action, CliAction::ShowHelpDueToError);
        assert_eq!(parse(&["frobnicate"]).action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_resolve_without_preference() {
        let parsed = parse(&["resolve", "--appliance", "Dishwasher"]);
        assert_eq!(
            parsed.action,
            CliAction::Resolve(ResolveArgs {
                appliance: Some("Dishwasher".to_string()),
                ..ResolveArgs::default()
            })
        );
    }

    #[test]
    fn test_parse_resolve_bounds_imply_preference() {
        let parsed = parse(&[
            "resolve",
            "-a",
            "Dryer",
            "--from",
            "tomorrow@09:00",
            "--now",
            "2024-01-01T14:10:00Z",
        ]);
        match parsed.action {
            CliAction::Resolve(args) => {
                assert!(args.has_time_preference);
                assert_eq!(args.from.as_deref(), Some("tomorrow@09:00"));
                assert_eq!(args.until, None);
                assert_eq!(args.now.as_deref(), Some("2024-01-01T14:10:00Z"));
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_parse_resolve_prefer_alone() {
        match parse(&["resolve", "--prefer"]).action {
            CliAction::Resolve(args) => {
                assert!(args.has_time_preference);
                assert_eq!(args.appliance, None);
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_parse_bucket() {
        let parsed = parse(&["bucket", "--events", "events.json", "--user", "alice"]);
        assert_eq!(
            parsed.action,
            CliAction::Bucket(BucketArgs {
                events: PathBuf::from("events.json"),
                user: Some("alice".to_string()),
                now: None,
            })
        );
    }

    #[test]
    fn test_parse_bucket_requires_events() {
        assert_eq!(parse(&["bucket"]).action, CliAction::ShowHelpDueToError);
    }
}
