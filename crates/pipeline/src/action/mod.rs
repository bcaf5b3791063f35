//! 액션 — 조건 게이트와 내장 액션의 결합
//!
//! 액션 설정은 JSON 형태의 맵입니다.
//!
//! ```json
//! {"type": "discard", "do_if": {"op": "equal", "field": "level", "values": "debug"}}
//! {"type": "set", "field": "meta.env", "value": "prod"}
//! {"type": "route", "output": "errors", "match_fields": {"level": ["error", "fatal"]}}
//! ```
//!
//! 게이트가 열린 이벤트에만 액션이 적용됩니다.

mod builtin;
mod chain;
mod gate;

use serde_json::Value;

use sluice_core::event::Event;
use sluice_core::pipeline::{Action, ActionResult};

use crate::error::{EventPipelineError, json_type_name};

pub use builtin::ActionKind;
pub use chain::ActionChain;
pub use gate::ActionGate;

const KEY_TYPE: &str = "type";

/// 설정에서 구성된 액션
#[derive(Debug, Clone)]
pub struct ConfiguredAction {
    kind: ActionKind,
    gate: ActionGate,
}

impl ConfiguredAction {
    /// 액션과 게이트로 생성합니다.
    pub fn new(kind: ActionKind, gate: ActionGate) -> Self {
        Self { kind, gate }
    }

    /// 액션 설정에서 생성합니다.
    ///
    /// # Errors
    /// 액션 타입, 파라미터, 게이트 중 하나라도 잘못되면
    /// `index`와 타입을 담은 [`EventPipelineError::Action`]
    pub fn from_config(index: usize, config: &Value) -> Result<Self, EventPipelineError> {
        let fail = |kind: &str, reason: String| EventPipelineError::Action {
            index,
            kind: kind.to_owned(),
            reason,
        };

        let Value::Object(map) = config else {
            return Err(fail(
                "?",
                format!("action must be an object, got {}", json_type_name(config)),
            ));
        };
        let Some(Value::String(type_name)) = map.get(KEY_TYPE) else {
            return Err(fail("?", "action requires a string 'type'".to_owned()));
        };

        let kind = ActionKind::from_action_map(type_name, map).map_err(|r| fail(type_name, r))?;
        let gate = ActionGate::from_action_map(map).map_err(|r| fail(type_name, r))?;

        Ok(Self { kind, gate })
    }

    /// 액션 타입과 파라미터
    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    /// 적용 조건
    pub fn gate(&self) -> &ActionGate {
        &self.gate
    }

    /// 타입, 파라미터, 게이트가 모두 같은지 비교합니다.
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.kind == other.kind && self.gate.is_equivalent(&other.gate)
    }
}

impl Action for ConfiguredAction {
    fn name(&self) -> &str {
        self.kind.name()
    }

    fn apply(&self, event: &mut Event) -> ActionResult {
        if self.gate.passes(event) {
            self.kind.apply(event)
        } else {
            ActionResult::Pass
        }
    }
}
