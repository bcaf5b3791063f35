//! 조건 엔진 — `do_if` 조건 트리 구성, 평가, 비교
//!
//! # 구성 요소
//! - [`node`]: 조건 노드 타입과 검증된 생성자
//! - [`TreeBuilder`]: JSON 형태 문서 → 조건 트리
//! - [`Checker`]: 루트를 소유하고 이벤트별 판정과 구조 비교를 수행
//! - [`legacy`]: `match_fields` 단축 표기 추출과 매칭
//!
//! 트리는 구성 이후 불변이며, `Checker`는 `Arc`로 루트를 공유하므로
//! 여러 워커가 잠금 없이 동시에 평가할 수 있습니다.
//!
//! # 사용 예시
//! ```
//! use serde_json::json;
//! use sluice_pipeline::condition::Checker;
//!
//! let checker = Checker::from_document(&json!({
//!     "op": "prefix", "field": "log.msg", "values": ["error"]
//! }))
//! .unwrap();
//!
//! assert!(checker.evaluate(&json!({"log": {"msg": "ERROR: disk full"}})));
//! assert!(!checker.evaluate(&json!({"log": {"msg": "ok"}})));
//! ```

mod builder;
mod equality;
pub mod legacy;
mod matcher;
pub mod node;

use std::sync::Arc;

use serde_json::Value;

use sluice_core::event::EventFields;

pub use builder::{MAX_CONDITION_DEPTH, TreeBuilder};
pub use equality::TreeMismatch;
pub use legacy::{MatchCondition, MatchConditions, MatchMode, extract_match_conditions};
pub use node::{
    ByteLenCmpNode, CmpOp, ConditionNode, FieldOp, FieldOpNode, LogicalNode, LogicalOp,
    MatchValue,
};

pub use crate::error::ConditionError;

/// 조건 판정기
///
/// 루트가 없으면 "조건 없음"으로 모든 이벤트를 통과시킵니다.
#[derive(Debug, Clone, Default)]
pub struct Checker {
    root: Option<Arc<ConditionNode>>,
}

impl Checker {
    /// 루트 노드로 판정기를 생성합니다.
    pub fn new(root: ConditionNode) -> Self {
        Self {
            root: Some(Arc::new(root)),
        }
    }

    /// 조건이 없는 판정기를 생성합니다.
    pub fn empty() -> Self {
        Self::default()
    }

    /// 조건 문서에서 판정기를 생성합니다.
    ///
    /// 최상위가 객체가 아니면 빈 판정기를 반환합니다.
    pub fn from_document(doc: &Value) -> Result<Self, ConditionError> {
        let root = TreeBuilder::new().build(doc)?;
        Ok(Self {
            root: root.map(Arc::new),
        })
    }

    /// 루트 노드
    pub fn root(&self) -> Option<&ConditionNode> {
        self.root.as_deref()
    }

    /// 조건이 없는지 여부
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// 이벤트가 조건을 만족하는지 판정합니다.
    pub fn evaluate<E: EventFields + ?Sized>(&self, event: &E) -> bool {
        self.root.as_ref().is_none_or(|root| root.evaluate(event))
    }

    /// 두 판정기의 트리를 구조적으로 비교하고 첫 번째 차이를 반환합니다.
    pub fn compare(&self, other: &Self) -> Result<(), TreeMismatch> {
        equality::compare_roots(self.root(), other.root())
    }

    /// 두 판정기의 트리가 구조적으로 같은지 여부
    pub fn is_equal_to(&self, other: &Self) -> bool {
        self.compare(other).is_ok()
    }
}

impl PartialEq for Checker {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal_to(other)
    }
}

impl From<ConditionNode> for Checker {
    fn from(root: ConditionNode) -> Self {
        Self::new(root)
    }
}
