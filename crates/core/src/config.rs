//! 설정 관리 — sluice.toml 파싱 및 런타임 설정
//!
//! [`SluiceConfig`]는 프로세스 전역 설정을 담는 최상위 구조체입니다.
//! 액션 단위 설정(조건 트리 포함)은 파이프라인 파일(JSON/YAML)에 있으며
//! `sluice-pipeline`의 로더가 읽습니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`SLUICE_GENERAL_LOG_LEVEL=debug` 형식)
//! 3. 설정 파일 (`sluice.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), sluice_core::error::SluiceError> {
//! use sluice_core::config::SluiceConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = SluiceConfig::load("sluice.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = SluiceConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, SluiceError};

/// 파이프라인당 최대 워커 수
pub const MAX_WORKERS: usize = 256;

/// 파이프라인 채널의 최대 용량
pub const MAX_CHANNEL_CAPACITY: usize = 1_048_576;

/// Sluice 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SluiceConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 파이프라인 기본 설정
    #[serde(default)]
    pub pipeline: PipelineDefaults,
}

impl SluiceConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SluiceError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, SluiceError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SluiceError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                SluiceError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, SluiceError> {
        toml::from_str(toml_str).map_err(|e| {
            SluiceError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `SLUICE_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        override_string(&mut self.general.log_level, "SLUICE_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "SLUICE_GENERAL_LOG_FORMAT");

        override_string(&mut self.pipeline.pipeline_dir, "SLUICE_PIPELINE_DIR");
        override_usize(&mut self.pipeline.workers, "SLUICE_PIPELINE_WORKERS");
        override_usize(
            &mut self.pipeline.channel_capacity,
            "SLUICE_PIPELINE_CHANNEL_CAPACITY",
        );
        override_u64(
            &mut self.pipeline.reload_interval_secs,
            "SLUICE_PIPELINE_RELOAD_INTERVAL_SECS",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), SluiceError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.pipeline.workers == 0 || self.pipeline.workers > MAX_WORKERS {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.workers".to_owned(),
                reason: format!("must be between 1 and {MAX_WORKERS}"),
            }
            .into());
        }

        if self.pipeline.channel_capacity == 0
            || self.pipeline.channel_capacity > MAX_CHANNEL_CAPACITY
        {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.channel_capacity".to_owned(),
                reason: format!("must be between 1 and {MAX_CHANNEL_CAPACITY}"),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 파이프라인 기본 설정
///
/// 파이프라인 파일에 값이 없을 때 적용됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineDefaults {
    /// 파이프라인 파일 디렉토리
    pub pipeline_dir: String,
    /// 파이프라인당 워커 수
    pub workers: usize,
    /// 입력 채널 용량
    pub channel_capacity: usize,
    /// 파이프라인 파일 리로드 확인 주기 (초, 0이면 비활성화)
    pub reload_interval_secs: u64,
}

impl Default for PipelineDefaults {
    fn default() -> Self {
        Self {
            pipeline_dir: "/etc/sluice/pipelines".to_owned(),
            workers: 4,
            channel_capacity: 1024,
            reload_interval_secs: 30,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
