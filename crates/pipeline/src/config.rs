//! 파이프라인 설정
//!
//! [`PipelineConfig`]는 파이프라인 파일 하나의 내용입니다. 워커 수와 채널 용량이
//! 파일에 없으면 core의 [`PipelineDefaults`](sluice_core::config::PipelineDefaults)
//! 값이 적용됩니다.
//!
//! # 파일 예시 (YAML)
//! ```yaml
//! name: app-logs
//! workers: 2
//! actions:
//!   - type: discard
//!     do_if:
//!       op: equal
//!       field: level
//!       values: debug
//!   - type: route
//!     output: errors
//!     match_fields:
//!       level: [error, fatal]
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use sluice_core::config::{MAX_CHANNEL_CAPACITY, MAX_WORKERS, PipelineDefaults};

use crate::error::EventPipelineError;

fn default_workers() -> usize {
    PipelineDefaults::default().workers
}

fn default_channel_capacity() -> usize {
    PipelineDefaults::default().channel_capacity
}

/// 파이프라인 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// 파이프라인 이름 (메트릭/로그 레이블)
    pub name: String,
    /// 워커 수
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// 입력 채널 용량
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// 액션 설정 목록 (순서대로 적용)
    #[serde(default)]
    pub actions: Vec<Value>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: "default".to_owned(),
            workers: default_workers(),
            channel_capacity: default_channel_capacity(),
            actions: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// core 기본값으로 설정을 생성합니다.
    pub fn from_defaults(name: impl Into<String>, defaults: &PipelineDefaults) -> Self {
        Self {
            name: name.into(),
            workers: defaults.workers,
            channel_capacity: defaults.channel_capacity,
            actions: Vec::new(),
        }
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// 액션 내용은 검증하지 않습니다. 액션 체인 구성 시 검증됩니다.
    pub fn validate(&self) -> Result<(), EventPipelineError> {
        if self.name.trim().is_empty() {
            return Err(EventPipelineError::Config {
                field: "name".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(EventPipelineError::Config {
                field: "workers".to_owned(),
                reason: format!("must be 1-{MAX_WORKERS}"),
            });
        }

        if self.channel_capacity == 0 || self.channel_capacity > MAX_CHANNEL_CAPACITY {
            return Err(EventPipelineError::Config {
                field: "channel_capacity".to_owned(),
                reason: format!("must be 1-{MAX_CHANNEL_CAPACITY}"),
            });
        }

        Ok(())
    }
}

/// 파이프라인 설정 빌더
#[derive(Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 이름을 설정합니다.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// 워커 수를 설정합니다.
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// 입력 채널 용량을 설정합니다.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.config.channel_capacity = capacity;
        self
    }

    /// 액션을 추가합니다.
    pub fn action(mut self, action: Value) -> Self {
        self.config.actions.push(action);
        self
    }

    /// 설정을 검증하고 `PipelineConfig`를 생성합니다.
    pub fn build(self) -> Result<PipelineConfig, EventPipelineError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
