//! 액션 체인 슬롯 — 리로드 시 원자적 교체
//!
//! 워커는 이벤트마다 [`ChainSlot::load`]로 현재 체인의 `Arc`를 복제해 사용합니다.
//! 교체는 쓰기 잠금 안에서 `Arc` 하나를 바꾸는 것이 전부이므로,
//! 이미 체인을 가져간 워커는 끝까지 이전 체인으로 처리합니다.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use sluice_core::metrics as m;

use crate::action::ActionChain;

/// 리로드 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// 새 체인이 기존 체인과 같아 교체하지 않음
    Unchanged,
    /// 새 체인으로 교체함
    Replaced,
}

impl ReloadOutcome {
    /// 메트릭/로그용 문자열
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Replaced => "replaced",
        }
    }
}

/// 현재 액션 체인을 보관하는 슬롯
#[derive(Debug)]
pub struct ChainSlot {
    pipeline: String,
    current: RwLock<Arc<ActionChain>>,
}

impl ChainSlot {
    /// 초기 체인으로 슬롯을 생성합니다.
    pub fn new(pipeline: impl Into<String>, chain: ActionChain) -> Self {
        Self {
            pipeline: pipeline.into(),
            current: RwLock::new(Arc::new(chain)),
        }
    }

    /// 현재 체인을 반환합니다.
    pub fn load(&self) -> Arc<ActionChain> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// 후보 체인이 현재 체인과 다르면 교체합니다.
    pub fn reload(&self, candidate: ActionChain) -> ReloadOutcome {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);

        let outcome = if current.is_equivalent(&candidate) {
            ReloadOutcome::Unchanged
        } else {
            *current = Arc::new(candidate);
            ReloadOutcome::Replaced
        };
        let actions = current.len();
        drop(current);

        info!(
            pipeline = %self.pipeline,
            outcome = outcome.as_str(),
            actions,
            "pipeline reload"
        );
        metrics::counter!(
            m::PIPELINE_RELOADS_TOTAL,
            m::LABEL_PIPELINE => self.pipeline.clone(),
            m::LABEL_OUTCOME => outcome.as_str()
        )
        .increment(1);

        outcome
    }
}
