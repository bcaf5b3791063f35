//! 파이프라인 trait — 모듈 확장 포인트 정의

use std::fmt;
use std::future::Future;

use crate::error::SluiceError;
use crate::event::Event;

/// 액션 적용 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionResult {
    /// 다음 액션으로 계속 진행
    Pass,
    /// 이벤트를 버림 (이후 액션은 실행되지 않음)
    Discard,
}

/// 이벤트 단위 처리 로직을 구현하는 trait
///
/// 여러 워커가 동시에 `apply`를 호출하므로 구현체는 내부 가변 상태 없이
/// `&self`만으로 동작해야 합니다.
pub trait Action: Send + Sync {
    /// 액션 이름 (설정의 `type` 값)
    fn name(&self) -> &str;

    /// 이벤트에 액션을 적용합니다.
    fn apply(&self, event: &mut Event) -> ActionResult;
}

/// 파이프라인 헬스 상태
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// 정상
    Healthy,
    /// 동작하지만 성능 저하
    Degraded(String),
    /// 비정상
    Unhealthy(String),
}

impl HealthStatus {
    /// 정상 여부
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// 비정상 여부
    pub fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded(reason) => write!(f, "degraded: {reason}"),
            Self::Unhealthy(reason) => write!(f, "unhealthy: {reason}"),
        }
    }
}

/// 생명주기를 가진 파이프라인 trait
///
/// `start` → 실행 중 → `stop` 순서로 관리됩니다.
pub trait Pipeline: Send {
    /// 파이프라인을 시작합니다.
    fn start(&mut self) -> impl Future<Output = Result<(), SluiceError>> + Send;

    /// 파이프라인을 정지합니다.
    fn stop(&mut self) -> impl Future<Output = Result<(), SluiceError>> + Send;

    /// 현재 헬스 상태를 반환합니다.
    fn health_check(&self) -> impl Future<Output = HealthStatus> + Send;
}
