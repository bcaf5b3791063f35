//! 액션 체인 — 순서가 있는 액션 목록

use serde_json::Value;
use tracing::trace;

use sluice_core::event::Event;
use sluice_core::pipeline::{Action, ActionResult};

use super::ConfiguredAction;
use crate::error::EventPipelineError;

/// 액션 체인
///
/// 첫 번째 `Discard`에서 처리를 멈춥니다.
#[derive(Debug, Clone, Default)]
pub struct ActionChain {
    actions: Vec<ConfiguredAction>,
}

impl ActionChain {
    /// 구성된 액션 목록으로 체인을 생성합니다.
    pub fn new(actions: Vec<ConfiguredAction>) -> Self {
        Self { actions }
    }

    /// 액션 설정 목록에서 체인을 구성합니다.
    pub fn from_config(actions: &[Value]) -> Result<Self, EventPipelineError> {
        actions
            .iter()
            .enumerate()
            .map(|(index, config)| ConfiguredAction::from_config(index, config))
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    /// 액션 목록
    pub fn actions(&self) -> &[ConfiguredAction] {
        &self.actions
    }

    /// 액션 개수
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// 액션이 없는지 여부
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// 이벤트를 체인에 통과시킵니다. 버려지면 `None`을 반환합니다.
    pub fn process(&self, mut event: Event) -> Option<Event> {
        for action in &self.actions {
            if action.apply(&mut event) == ActionResult::Discard {
                trace!(event_id = %event.id, action = action.name(), "event discarded");
                return None;
            }
        }
        Some(event)
    }

    /// 두 체인이 같은 동작을 하는지 비교합니다.
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.actions.len() == other.actions.len()
            && self
                .actions
                .iter()
                .zip(&other.actions)
                .all(|(a, b)| a.is_equivalent(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sluice_core::event::EVENT_SOURCE_STDIN;

    fn chain(actions: Value) -> ActionChain {
        let Value::Array(items) = actions else {
            panic!("actions must be an array");
        };
        ActionChain::from_config(&items).unwrap()
    }

    #[test]
    fn empty_chain_passes_event() {
        let event = Event::new(json!({"a": 1}), EVENT_SOURCE_STDIN, 0);
        let out = ActionChain::default().process(event).unwrap();
        assert_eq!(out.fields, json!({"a": 1}));
    }

    #[test]
    fn actions_apply_in_order_and_stop_at_discard() {
        let c = chain(json!([
            {"type": "set", "field": "stage", "value": 1},
            {"type": "discard", "do_if": {"op": "equal", "field": "drop", "values": "yes"}},
            {"type": "set", "field": "stage", "value": 2},
            {"type": "route", "output": "main"}
        ]));

        let kept = c
            .process(Event::new(json!({"drop": "no"}), EVENT_SOURCE_STDIN, 0))
            .unwrap();
        assert_eq!(kept.fields["stage"], json!(2));
        assert_eq!(kept.route.as_deref(), Some("main"));

        assert!(
            c.process(Event::new(json!({"drop": "yes"}), EVENT_SOURCE_STDIN, 1))
                .is_none()
        );
    }

    #[test]
    fn later_actions_see_earlier_changes() {
        let c = chain(json!([
            {"type": "set", "field": "level", "value": "debug"},
            {"type": "discard", "match_fields": {"level": "debug"}}
        ]));
        assert!(c.process(Event::new(json!({}), EVENT_SOURCE_STDIN, 0)).is_none());
    }

    #[test]
    fn first_bad_action_fails_build() {
        let err = ActionChain::from_config(&[
            json!({"type": "discard"}),
            json!({"type": "nope"}),
        ])
        .unwrap_err();
        assert!(err.to_string().starts_with("action 1 (nope)"));
    }

    #[test]
    fn equivalence() {
        let doc = json!([
            {"type": "discard", "do_if": {"op": "byte_len_cmp", "field": "msg", "cmp_op": "gt", "value": 100}},
            {"type": "route", "output": "rest"}
        ]);
        assert!(chain(doc.clone()).is_equivalent(&chain(doc)));

        let shorter = chain(json!([{"type": "route", "output": "rest"}]));
        assert!(!chain(json!([{"type": "discard"}, {"type": "route", "output": "rest"}])).is_equivalent(&shorter));

        let changed = chain(json!([
            {"type": "discard", "do_if": {"op": "byte_len_cmp", "field": "msg", "cmp_op": "gt", "value": 101}},
            {"type": "route", "output": "rest"}
        ]));
        let original = chain(json!([
            {"type": "discard", "do_if": {"op": "byte_len_cmp", "field": "msg", "cmp_op": "gt", "value": 100}},
            {"type": "route", "output": "rest"}
        ]));
        assert!(!original.is_equivalent(&changed));
    }
}
