#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`condition`]: `do_if` 조건 트리 빌더, 판정기, 구조 비교, 레거시 `match_fields`
//! - [`action`]: 조건 게이트가 붙은 액션과 액션 체인
//! - [`reload`]: 액션 체인 슬롯 (원자적 교체)
//! - [`pipeline`]: 워커 풀 오케스트레이션 (Pipeline trait 구현)
//! - [`config`]: 파이프라인 파일 설정
//! - [`loader`]: JSON/YAML 파이프라인 파일 로더
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! pipeline file -> PipelineLoader -> ActionChain -> ChainSlot
//!                                                      |
//! input mpsc -> workers (load chain, process) -> output mpsc
//! ```

pub mod action;
pub mod condition;
pub mod config;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod reload;

// --- 주요 타입 re-export ---

// 조건 엔진
pub use condition::{Checker, ConditionNode, TreeBuilder, TreeMismatch};

// 액션
pub use action::{ActionChain, ActionGate, ActionKind, ConfiguredAction};

// 파이프라인
pub use pipeline::{EventPipeline, EventPipelineBuilder};
pub use reload::{ChainSlot, ReloadOutcome};

// 설정
pub use config::PipelineConfig;
pub use loader::PipelineLoader;

// 에러
pub use error::{ConditionError, EventPipelineError};
