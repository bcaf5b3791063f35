//! `sluice config` command handler

use std::io::Write;
use std::path::Path;

use colored::Colorize;
use serde::Serialize;
use tracing::info;

use sluice_core::config::SluiceConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `config` command.
pub async fn execute(
    args: ConfigArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => execute_validate(config_path, writer).await,
        ConfigAction::Show { section } => execute_show(config_path, section, writer).await,
    }
}

/// Execute the config validate subcommand.
///
/// # Errors
///
/// Returns `CliError::Config` if validation fails (parse errors, invalid values).
async fn execute_validate(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    info!(path = %config_path.display(), "validating configuration");

    let report = match SluiceConfig::load(config_path).await {
        Ok(_) => ConfigValidationReport {
            source: config_path.display().to_string(),
            valid: true,
            errors: Vec::new(),
        },
        Err(e) => ConfigValidationReport {
            source: config_path.display().to_string(),
            valid: false,
            errors: vec![e.to_string()],
        },
    };

    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Config("configuration is invalid".to_owned()));
    }

    Ok(())
}

/// Execute the config show subcommand.
///
/// Displays the effective configuration (file + env overrides + defaults).
///
/// # Errors
///
/// Returns `CliError::Core` if loading fails or `CliError::Command` if the section name is unknown.
async fn execute_show(
    config_path: &Path,
    section: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(path = %config_path.display(), "loading configuration");

    let config = SluiceConfig::load(config_path).await?;
    let report = build_config_report(&config, config_path, section.as_deref())?;
    writer.render(&report)
}

fn build_config_report(
    config: &SluiceConfig,
    config_path: &Path,
    section: Option<&str>,
) -> Result<ConfigReport, CliError> {
    let rendered = match section {
        None => toml::to_string_pretty(config),
        Some("general") => toml::to_string_pretty(&config.general),
        Some("pipeline") => toml::to_string_pretty(&config.pipeline),
        Some(other) => {
            return Err(CliError::Command(format!(
                "unknown section: {other} (expected: general, pipeline)"
            )));
        }
    };

    let value = match section {
        Some("general") => serde_json::to_value(&config.general)?,
        Some("pipeline") => serde_json::to_value(&config.pipeline)?,
        _ => serde_json::to_value(config)?,
    };

    Ok(ConfigReport {
        source: config_path.display().to_string(),
        section: section.map(str::to_owned),
        config: value,
        config_toml: rendered.unwrap_or_else(|e| format!("(serialization error: {e})")),
    })
}

/// Configuration validation result.
#[derive(Serialize)]
pub struct ConfigValidationReport {
    pub source: String,
    pub valid: bool,
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "{}", "Configuration Validation".bold())?;
        writeln!(w, "  Source: {}", self.source)?;
        if self.valid {
            writeln!(w, "  Status: {}", "VALID".green().bold())?;
        } else {
            writeln!(w, "  Status: {}", "INVALID".red().bold())?;
            for error in &self.errors {
                writeln!(w, "  Error:  {}", error.red())?;
            }
        }
        Ok(())
    }
}

/// Effective configuration dump.
#[derive(Debug, Serialize)]
pub struct ConfigReport {
    pub source: String,
    pub section: Option<String>,
    pub config: serde_json::Value,
    #[serde(skip)]
    pub config_toml: String,
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        let title = match &self.section {
            Some(section) => format!("Configuration [{section}]"),
            None => "Configuration".to_owned(),
        };
        writeln!(w, "{}", title.bold())?;
        writeln!(w, "  Source: {}", self.source)?;
        writeln!(w)?;
        write!(w, "{}", self.config_toml)?;
        Ok(())
    }
}
