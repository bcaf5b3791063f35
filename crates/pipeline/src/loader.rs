//! 파이프라인 파일 로더 -- JSON/YAML 파이프라인 파일을 디스크에서 로드합니다.
//!
//! 확장자로 형식을 결정합니다 (`.json`, `.yml`, `.yaml`).
//! 로드 시 액션 체인을 한 번 구성해 조건 에러를 시작 전에 드러냅니다.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use sluice_core::config::PipelineDefaults;

use crate::action::ActionChain;
use crate::config::PipelineConfig;
use crate::error::EventPipelineError;

/// 파이프라인 파일 최대 크기
const MAX_PIPELINE_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10MB

/// 파이프라인 파일 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineFormat {
    /// JSON
    Json,
    /// YAML
    Yaml,
}

impl PipelineFormat {
    /// 파일 확장자로 형식을 결정합니다.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(Self::Json),
            "yml" | "yaml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// 디스크상의 파이프라인 파일 형태
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PipelineFile {
    name: String,
    workers: Option<usize>,
    channel_capacity: Option<usize>,
    #[serde(default)]
    actions: Vec<Value>,
}

/// 파이프라인 파일 로더
#[derive(Debug, Clone, Default)]
pub struct PipelineLoader {
    defaults: PipelineDefaults,
}

impl PipelineLoader {
    /// 파일에 값이 없을 때 적용할 기본값으로 로더를 생성합니다.
    pub fn new(defaults: PipelineDefaults) -> Self {
        Self { defaults }
    }

    /// 디렉토리에서 모든 파이프라인 파일을 로드합니다.
    ///
    /// 개별 파일 로딩 실패는 경고 로그를 남기고 건너뜁니다.
    /// 결과는 파일 경로 순으로 정렬됩니다.
    ///
    /// # Errors
    /// - 디렉토리를 읽을 수 없는 경우
    /// - 두 파일이 같은 파이프라인 이름을 쓰는 경우
    pub async fn load_directory(
        &self,
        dir: impl AsRef<Path>,
    ) -> Result<Vec<PipelineConfig>, EventPipelineError> {
        let dir = dir.as_ref();
        let dir_error = |reason: String| EventPipelineError::PipelineLoad {
            path: dir.display().to_string(),
            reason,
        };

        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| dir_error(format!("failed to read directory: {e}")))?;

        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| dir_error(format!("failed to read directory entry: {e}")))?
        {
            let path = entry.path();
            if PipelineFormat::from_path(&path).is_some() {
                paths.push(path);
            }
        }
        paths.sort();

        let mut configs = Vec::new();
        let mut seen_names = HashSet::new();

        for path in paths {
            match self.load_file(&path).await {
                Ok(config) => {
                    if !seen_names.insert(config.name.clone()) {
                        return Err(EventPipelineError::PipelineLoad {
                            path: path.display().to_string(),
                            reason: format!("duplicate pipeline name '{}'", config.name),
                        });
                    }
                    configs.push(config);
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to load pipeline file, skipping"
                    );
                }
            }
        }

        tracing::info!(
            dir = %dir.display(),
            count = configs.len(),
            "loaded pipeline files"
        );

        Ok(configs)
    }

    /// 단일 파이프라인 파일을 로드합니다.
    pub async fn load_file(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<PipelineConfig, EventPipelineError> {
        let path = path.as_ref();
        let source = path.display().to_string();

        let format =
            PipelineFormat::from_path(path).ok_or_else(|| EventPipelineError::PipelineLoad {
                path: source.clone(),
                reason: "unsupported extension, expected .json, .yml or .yaml".to_owned(),
            })?;

        // 파일 크기 검증
        let metadata =
            tokio::fs::metadata(path)
                .await
                .map_err(|e| EventPipelineError::PipelineLoad {
                    path: source.clone(),
                    reason: format!("failed to read file metadata: {e}"),
                })?;

        if metadata.len() > MAX_PIPELINE_FILE_SIZE {
            return Err(EventPipelineError::PipelineLoad {
                path: source,
                reason: format!(
                    "file too large: {} bytes (max: {MAX_PIPELINE_FILE_SIZE})",
                    metadata.len()
                ),
            });
        }

        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| EventPipelineError::PipelineLoad {
                    path: source.clone(),
                    reason: format!("failed to read file: {e}"),
                })?;

        self.parse(&content, format, &source)
    }

    /// 파이프라인 문서를 파싱하고 검증합니다.
    pub fn parse(
        &self,
        content: &str,
        format: PipelineFormat,
        source: &str,
    ) -> Result<PipelineConfig, EventPipelineError> {
        let file: PipelineFile = match format {
            PipelineFormat::Json => {
                serde_json::from_str(content).map_err(|e| EventPipelineError::PipelineLoad {
                    path: source.to_owned(),
                    reason: format!("JSON parse error: {e}"),
                })?
            }
            PipelineFormat::Yaml => {
                serde_yaml::from_str(content).map_err(|e| EventPipelineError::PipelineLoad {
                    path: source.to_owned(),
                    reason: format!("YAML parse error: {e}"),
                })?
            }
        };

        let config = PipelineConfig {
            name: file.name,
            workers: file.workers.unwrap_or(self.defaults.workers),
            channel_capacity: file
                .channel_capacity
                .unwrap_or(self.defaults.channel_capacity),
            actions: file.actions,
        };

        // 유효성 검증
        config.validate()?;
        let chain = ActionChain::from_config(&config.actions)?;

        tracing::debug!(
            pipeline = %config.name,
            actions = chain.len(),
            source,
            "parsed pipeline file"
        );

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML_PIPELINE: &str = r#"
name: app-logs
workers: 2
actions:
  - type: discard
    do_if:
      op: and
      operands:
        - op: equal
          field: level
          values: debug
        - op: byte_len_cmp
          field: msg
          cmp_op: lt
          value: 3
  - type: route
    output: errors
    match_fields:
      level: [error, fatal]
"#;

    #[test]
    fn parse_yaml_pipeline() {
        let config = PipelineLoader::default()
            .parse(YAML_PIPELINE, PipelineFormat::Yaml, "app.yml")
            .unwrap();
        assert_eq!(config.name, "app-logs");
        assert_eq!(config.workers, 2);
        assert_eq!(config.channel_capacity, 1024);
        assert_eq!(config.actions.len(), 2);
        assert_eq!(config.actions[0]["do_if"]["operands"][1]["value"], 3);
    }

    #[test]
    fn yaml_and_json_build_equivalent_chains() {
        let json = r#"{
            "name": "app-logs",
            "workers": 2,
            "actions": [
                {"type": "discard", "do_if": {"op": "and", "operands": [
                    {"op": "equal", "field": "level", "values": "debug"},
                    {"op": "byte_len_cmp", "field": "msg", "cmp_op": "lt", "value": 3}
                ]}},
                {"type": "route", "output": "errors", "match_fields": {"level": ["error", "fatal"]}}
            ]
        }"#;
        let loader = PipelineLoader::default();
        let from_yaml = loader
            .parse(YAML_PIPELINE, PipelineFormat::Yaml, "a.yml")
            .unwrap();
        let from_json = loader.parse(json, PipelineFormat::Json, "a.json").unwrap();

        let a = ActionChain::from_config(&from_yaml.actions).unwrap();
        let b = ActionChain::from_config(&from_json.actions).unwrap();
        assert!(a.is_equivalent(&b));
    }

    #[test]
    fn loader_defaults_fill_missing_values() {
        let loader = PipelineLoader::new(PipelineDefaults {
            workers: 7,
            channel_capacity: 9,
            ..Default::default()
        });
        let config = loader
            .parse(r#"{"name": "p"}"#, PipelineFormat::Json, "p.json")
            .unwrap();
        assert_eq!(config.workers, 7);
        assert_eq!(config.channel_capacity, 9);
    }

    #[test]
    fn condition_errors_surface_at_load() {
        let err = PipelineLoader::default()
            .parse(
                r#"{"name": "p", "actions": [{"type": "discard", "do_if": {"op": "equal"}}]}"#,
                PipelineFormat::Json,
                "p.json",
            )
            .unwrap_err();
        assert!(matches!(err, EventPipelineError::Action { index: 0, .. }));
    }

    #[test]
    fn oversized_channel_capacity_is_rejected() {
        let err = PipelineLoader::default()
            .parse(
                r#"{"name": "p", "channel_capacity": 4611686018427387904}"#,
                PipelineFormat::Json,
                "p.json",
            )
            .unwrap_err();
        assert!(matches!(
            err,
            EventPipelineError::Config { ref field, .. } if field == "channel_capacity"
        ));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = PipelineLoader::default()
            .parse(r#"{"name": "p", "wrokers": 2}"#, PipelineFormat::Json, "p.json")
            .unwrap_err();
        assert!(err.to_string().contains("JSON parse error"));
    }

    #[test]
    fn invalid_yaml_is_error() {
        let result =
            PipelineLoader::default().parse("not: [valid: yaml: {{{", PipelineFormat::Yaml, "b.yml");
        assert!(result.is_err());
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(
            PipelineFormat::from_path(Path::new("a.yaml")),
            Some(PipelineFormat::Yaml)
        );
        assert_eq!(
            PipelineFormat::from_path(Path::new("a.json")),
            Some(PipelineFormat::Json)
        );
        assert_eq!(PipelineFormat::from_path(Path::new("a.toml")), None);
        assert_eq!(PipelineFormat::from_path(Path::new("noext")), None);
    }

    #[tokio::test]
    async fn load_nonexistent_directory_returns_error() {
        let result = PipelineLoader::default()
            .load_directory("/nonexistent/path/pipelines")
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn load_file_rejects_unknown_extension() {
        let err = PipelineLoader::default()
            .load_file("/tmp/pipeline.toml")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unsupported extension"));
    }
}
