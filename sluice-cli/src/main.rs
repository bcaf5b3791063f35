//! Sluice CLI -- 조건 트리와 이벤트 파이프라인 명령줄 도구

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;

use sluice_core::config::{GeneralConfig, SluiceConfig};

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli).await {
        eprintln!("{} {e:#}", "warning:".yellow().bold());
    }

    let writer = OutputWriter::new(cli.output);
    match dispatch(cli, &writer).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}

/// 설정 파일의 `[general]` 섹션으로 로깅을 초기화합니다.
///
/// 설정 파일이 없으면 warn 레벨 기본값을 씁니다. `--log-level`이 항상 우선합니다.
async fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let mut general = match SluiceConfig::load(&cli.config).await {
        Ok(config) => config.general,
        Err(_) => GeneralConfig {
            log_level: "warn".to_owned(),
            ..GeneralConfig::default()
        },
    };
    if let Some(level) = &cli.log_level {
        general.log_level = level.clone();
    }
    logging::init_tracing(&general)
}

async fn dispatch(cli: Cli, writer: &OutputWriter) -> Result<(), CliError> {
    match cli.command {
        Commands::Condition(args) => commands::condition::execute(args, writer).await,
        Commands::Config(args) => commands::config::execute(args, &cli.config, writer).await,
        Commands::Run(args) => commands::run::execute(args, &cli.config, writer).await,
    }
}
