//! Command handlers -- one module per subcommand
//!
//! Shared input helpers for condition documents and JSON-lines event
//! streams live here.

pub mod condition;
pub mod config;
pub mod run;

use std::path::Path;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use sluice_core::event::EVENT_SOURCE_STDIN;

use crate::error::CliError;

/// 조건 문서를 읽어 JSON 값으로 변환합니다.
///
/// `.yml`/`.yaml` 확장자는 YAML로, 그 외는 JSON으로 파싱합니다.
pub(crate) async fn read_condition_document(path: &Path) -> Result<Value, CliError> {
    let content = tokio::fs::read_to_string(path).await?;
    parse_condition_document(&content, path)
}

pub(crate) fn parse_condition_document(content: &str, path: &Path) -> Result<Value, CliError> {
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml" | "yaml")
    );

    if is_yaml {
        serde_yaml::from_str(content).map_err(|e| {
            CliError::Condition(format!("{}: YAML parse error: {e}", path.display()))
        })
    } else {
        serde_json::from_str(content).map_err(|e| {
            CliError::Condition(format!("{}: JSON parse error: {e}", path.display()))
        })
    }
}

/// JSON lines 입력에서 읽은 이벤트 한 줄
#[derive(Debug)]
pub(crate) struct EventLine {
    /// 1부터 시작하는 줄 번호
    pub line: u64,
    pub fields: Value,
}

/// 이벤트 입력의 출처 이름 (파일 경로 또는 stdin)
pub(crate) fn event_source_name(path: Option<&Path>) -> String {
    path.map_or_else(
        || EVENT_SOURCE_STDIN.to_owned(),
        |p| p.display().to_string(),
    )
}

/// 이벤트 입력 스트림
pub(crate) type EventReader = Box<dyn AsyncBufRead + Unpin + Send>;

/// 이벤트 파일을 열거나, 경로가 없으면 stdin을 씁니다.
pub(crate) async fn open_event_reader(path: Option<&Path>) -> Result<EventReader, CliError> {
    Ok(match path {
        Some(path) => Box::new(BufReader::new(tokio::fs::File::open(path).await?)),
        None => Box::new(BufReader::new(tokio::io::stdin())),
    })
}

/// 파일(없으면 stdin)에서 JSON lines 이벤트를 모두 읽습니다.
pub(crate) async fn read_event_lines(path: Option<&Path>) -> Result<Vec<EventLine>, CliError> {
    parse_event_lines(open_event_reader(path).await?).await
}

/// 빈 줄은 건너뜁니다. 파싱에 실패한 줄은 줄 번호와 함께 에러가 됩니다.
pub(crate) async fn parse_event_lines<R>(reader: R) -> Result<Vec<EventLine>, CliError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut events = Vec::new();
    let mut line_no = 0u64;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if let Some(event) = parse_event_line(line_no, &line)? {
            events.push(event);
        }
    }

    Ok(events)
}

/// 한 줄을 이벤트로 파싱합니다. 빈 줄이면 `None`입니다.
pub(crate) fn parse_event_line(line_no: u64, line: &str) -> Result<Option<EventLine>, CliError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let fields = serde_json::from_str(trimmed).map_err(|e| CliError::InvalidEvent {
        line: line_no,
        reason: e.to_string(),
    })?;
    Ok(Some(EventLine {
        line: line_no,
        fields,
    }))
}
