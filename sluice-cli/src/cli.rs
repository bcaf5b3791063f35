//! Command-line argument definitions (clap derive)

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Sluice -- condition trees and event pipelines from the command line.
#[derive(Parser, Debug)]
#[command(name = "sluice", version, about, long_about = None)]
pub struct Cli {
    /// Path to the sluice.toml configuration file.
    #[arg(short, long, default_value = "sluice.toml")]
    pub config: PathBuf,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build, evaluate and compare condition trees.
    Condition(ConditionArgs),
    /// Validate or display the configuration file.
    Config(ConfigArgs),
    /// Run a pipeline over JSON lines and print the surviving events.
    Run(RunArgs),
}

#[derive(Args, Debug)]
pub struct ConditionArgs {
    #[command(subcommand)]
    pub action: ConditionAction,
}

#[derive(Subcommand, Debug)]
pub enum ConditionAction {
    /// Build a condition document and report whether it is valid.
    Validate {
        /// Condition document (.json, .yml or .yaml).
        file: PathBuf,
    },
    /// Evaluate a condition against each JSON line of an event file.
    Check {
        /// Condition document (.json, .yml or .yaml).
        file: PathBuf,
        /// JSON lines file with one event per line (stdin if omitted).
        events: Option<PathBuf>,
    },
    /// Report whether two condition documents build structurally equal trees.
    Diff {
        /// First condition document.
        left: PathBuf,
        /// Second condition document.
        right: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Load and validate the configuration file.
    Validate,
    /// Display the effective configuration.
    Show {
        /// Show only one section (general, pipeline).
        #[arg(long)]
        section: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Pipeline file (.json, .yml or .yaml), or the name of a pipeline in `pipeline_dir`.
    pub pipeline: PathBuf,
    /// JSON lines file with one event per line (stdin if omitted).
    pub events: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_debug_assert() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parse_condition_validate() {
        let cli = Cli::try_parse_from(["sluice", "condition", "validate", "cond.json"])
            .expect("parse succeeded");
        match cli.command {
            Commands::Condition(args) => match args.action {
                ConditionAction::Validate { file } => {
                    assert_eq!(file, PathBuf::from("cond.json"));
                }
                _ => panic!("expected Validate action"),
            },
            _ => panic!("expected Condition command"),
        }
    }

    #[test]
    fn test_cli_parse_condition_check_without_events() {
        let cli = Cli::try_parse_from(["sluice", "condition", "check", "cond.yaml"])
            .expect("parse succeeded");
        match cli.command {
            Commands::Condition(args) => match args.action {
                ConditionAction::Check { file, events } => {
                    assert_eq!(file, PathBuf::from("cond.yaml"));
                    assert!(events.is_none(), "events should default to stdin");
                }
                _ => panic!("expected Check action"),
            },
            _ => panic!("expected Condition command"),
        }
    }

    #[test]
    fn test_cli_parse_condition_diff_requires_two_files() {
        let result = Cli::try_parse_from(["sluice", "condition", "diff", "a.json"]);
        assert!(result.is_err(), "diff should require two files");
    }

    #[test]
    fn test_cli_parse_config_show_section() {
        let cli = Cli::try_parse_from(["sluice", "config", "show", "--section", "pipeline"])
            .expect("parse succeeded");
        match cli.command {
            Commands::Config(args) => match args.action {
                ConfigAction::Show { section } => {
                    assert_eq!(section.as_deref(), Some("pipeline"));
                }
                _ => panic!("expected Show action"),
            },
            _ => panic!("expected Config command"),
        }
    }

    #[test]
    fn test_cli_parse_run_with_events() {
        let cli = Cli::try_parse_from(["sluice", "run", "app.yaml", "events.jsonl"])
            .expect("parse succeeded");
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.pipeline, PathBuf::from("app.yaml"));
                assert_eq!(args.events, Some(PathBuf::from("events.jsonl")));
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::try_parse_from([
            "sluice",
            "--config",
            "/etc/sluice/sluice.toml",
            "config",
            "validate",
            "--output",
            "json",
            "--log-level",
            "debug",
        ])
        .expect("parse succeeded");
        assert_eq!(cli.config, PathBuf::from("/etc/sluice/sluice.toml"));
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["sluice", "config", "validate"]).expect("parse succeeded");
        assert_eq!(cli.config, PathBuf::from("sluice.toml"));
        assert_eq!(cli.output, OutputFormat::Text);
        assert!(cli.log_level.is_none());
    }

    #[test]
    fn test_cli_rejects_unknown_output_format() {
        let result = Cli::try_parse_from(["sluice", "--output", "xml", "config", "validate"]);
        assert!(result.is_err(), "unknown output format should be rejected");
    }
}
