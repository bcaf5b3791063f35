//! `sluice run` command handler
//!
//! Streams JSON lines through one pipeline's worker pool and prints the
//! surviving events in input order. The pipeline definition is re-read every
//! `reload_interval_secs` and swapped in when its actions changed.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::{Instant, Interval};
use tracing::{info, warn};

use sluice_core::config::SluiceConfig;
use sluice_core::event::Event;
use sluice_core::pipeline::Pipeline;
use sluice_pipeline::loader::PipelineFormat;
use sluice_pipeline::{EventPipeline, EventPipelineBuilder, PipelineConfig, PipelineLoader};

use crate::cli::RunArgs;
use crate::commands::{event_source_name, open_event_reader, parse_event_line};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `run` command.
///
/// Pipeline defaults come from `config_path` when it loads, built-in defaults otherwise.
pub async fn execute(
    args: RunArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let defaults = match SluiceConfig::load(config_path).await {
        Ok(config) => config.pipeline,
        Err(e) => {
            warn!(
                path = %config_path.display(),
                error = %e,
                "configuration not loaded, using pipeline defaults"
            );
            SluiceConfig::default().pipeline
        }
    };

    let source = PipelineSource::resolve(&args.pipeline, &defaults.pipeline_dir);
    let every = Duration::from_secs(defaults.reload_interval_secs);
    let loader = PipelineLoader::new(defaults);
    let config = source.load(&loader).await?;

    let reader = open_event_reader(args.events.as_deref()).await?;
    let reload = (!every.is_zero()).then_some(Reload {
        loader: &loader,
        source: &source,
        every,
    });

    let report = run_pipeline(
        config,
        reader,
        &event_source_name(args.events.as_deref()),
        reload,
    )
    .await?;
    writer.render(&report)
}

/// 파이프라인 정의의 출처
#[derive(Debug, Clone, PartialEq, Eq)]
enum PipelineSource {
    /// 단일 파이프라인 파일
    File(PathBuf),
    /// `pipeline_dir`의 파일들 중 이름으로 지정한 파이프라인
    Named { dir: PathBuf, name: String },
}

impl PipelineSource {
    /// 파이프라인 확장자가 있으면 파일, 없으면 이름으로 취급합니다.
    fn resolve(arg: &Path, pipeline_dir: &str) -> Self {
        if PipelineFormat::from_path(arg).is_some() {
            Self::File(arg.to_path_buf())
        } else {
            Self::Named {
                dir: PathBuf::from(pipeline_dir),
                name: arg.display().to_string(),
            }
        }
    }

    async fn load(&self, loader: &PipelineLoader) -> Result<PipelineConfig, CliError> {
        match self {
            Self::File(path) => Ok(loader.load_file(path).await?),
            Self::Named { dir, name } => loader
                .load_directory(dir)
                .await?
                .into_iter()
                .find(|config| &config.name == name)
                .ok_or_else(|| {
                    CliError::Pipeline(format!(
                        "pipeline '{name}' not found in {}",
                        dir.display()
                    ))
                }),
        }
    }
}

/// 주기적 리로드 설정
struct Reload<'a> {
    loader: &'a PipelineLoader,
    source: &'a PipelineSource,
    every: Duration,
}

async fn run_pipeline<R>(
    config: PipelineConfig,
    reader: R,
    source: &str,
    reload: Option<Reload<'_>>,
) -> Result<RunReport, CliError>
where
    R: AsyncBufRead + Unpin,
{
    let name = config.name.clone();
    let (mut pipeline, output_rx) = EventPipelineBuilder::new().config(config).build()?;
    let mut output_rx = output_rx
        .ok_or_else(|| CliError::Pipeline("pipeline output channel unavailable".to_owned()))?;

    // 출력 채널이 가득 차지 않도록 입력과 동시에 비웁니다.
    let collector = tokio::spawn(async move {
        let mut events = Vec::new();
        while let Some(event) = output_rx.recv().await {
            events.push(event);
        }
        events
    });

    pipeline.start().await?;
    let input = pipeline.sender()?;

    let mut ticker = reload
        .as_ref()
        .map(|r| tokio::time::interval_at(Instant::now() + r.every, r.every));
    let mut lines = reader.lines();
    let mut line_no = 0u64;
    let mut total = 0usize;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                line_no += 1;
                let Some(event) = parse_event_line(line_no, &line)? else { continue };
                total += 1;
                input
                    .send(Event::new(event.fields, source, event.line))
                    .await
                    .map_err(|e| CliError::Pipeline(format!("failed to send event: {e}")))?;
            }
            () = next_tick(&mut ticker) => {
                if let Some(reload) = &reload {
                    reload_pipeline(&mut pipeline, reload).await;
                }
            }
        }
    }

    drop(input);
    pipeline.finish().await?;

    let processed = pipeline.processed_count();
    let discarded = pipeline.discarded_count();
    // 파이프라인이 보유한 출력 송신측까지 drop되어야 수집이 끝납니다.
    drop(pipeline);

    let mut events = collector
        .await
        .map_err(|e| CliError::Pipeline(format!("output collector failed: {e}")))?;
    events.sort_by_key(|e| e.metadata.offset);

    info!(
        pipeline = %name,
        total,
        processed,
        discarded,
        emitted = events.len(),
        "pipeline run completed"
    );

    Ok(RunReport {
        pipeline: name,
        processed,
        discarded,
        events: events.into_iter().map(RunOutput::from).collect(),
    })
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// 실패하면 경고만 남기고 현재 액션 체인을 유지합니다.
async fn reload_pipeline(pipeline: &mut EventPipeline, reload: &Reload<'_>) {
    let result = match reload.source.load(reload.loader).await {
        Ok(config) => pipeline.reload(config).map_err(CliError::from),
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        warn!(
            pipeline = %pipeline.name(),
            error = %e,
            "pipeline reload failed, keeping current actions"
        );
    }
}

/// One surviving event.
#[derive(Serialize)]
pub struct RunOutput {
    /// Input line number.
    pub line: u64,
    pub route: Option<String>,
    pub fields: Value,
}

impl From<Event> for RunOutput {
    fn from(event: Event) -> Self {
        Self {
            line: event.metadata.offset,
            route: event.route,
            fields: event.fields,
        }
    }
}

/// Pipeline run result.
#[derive(Serialize)]
pub struct RunReport {
    pub pipeline: String,
    pub processed: u64,
    pub discarded: u64,
    pub events: Vec<RunOutput>,
}

impl Render for RunReport {
    /// Text output is JSON lines so it can be piped into other tools.
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        for event in &self.events {
            serde_json::to_writer(&mut *w, event)?;
            writeln!(w)?;
        }
        Ok(())
    }
}
