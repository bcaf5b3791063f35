//! 내장 액션 — discard, set, remove, route

use serde_json::{Map, Value};
use tracing::trace;

use sluice_core::event::{Event, split_field_path};
use sluice_core::pipeline::ActionResult;

/// 액션 타입과 파라미터
#[derive(Debug, Clone, PartialEq)]
pub enum ActionKind {
    /// 이벤트를 버림
    Discard,
    /// 필드에 값을 기록 (중간 객체 생성)
    Set {
        /// 원본 필드명
        field: String,
        /// 분리된 경로
        path: Vec<String>,
        /// 기록할 값
        value: Value,
    },
    /// 필드 삭제
    Remove {
        /// 분리된 경로 목록
        paths: Vec<Vec<String>>,
    },
    /// 출력 이름 지정
    Route {
        /// 출력 이름
        output: String,
    },
}

impl ActionKind {
    /// 지원하는 액션 타입 이름
    pub const NAMES: [&'static str; 4] = ["discard", "set", "remove", "route"];

    /// 액션 설정 맵에서 타입과 파라미터를 읽습니다.
    pub(crate) fn from_action_map(kind: &str, map: &Map<String, Value>) -> Result<Self, String> {
        match kind {
            "discard" => Ok(Self::Discard),
            "set" => {
                let field = non_empty_string(map, "field")?;
                let value = map
                    .get("value")
                    .cloned()
                    .ok_or_else(|| "'set' requires a 'value'".to_owned())?;
                Ok(Self::Set {
                    path: split_field_path(&field),
                    field,
                    value,
                })
            }
            "remove" => {
                let Some(Value::Array(items)) = map.get("fields") else {
                    return Err("'remove' requires a 'fields' array".to_owned());
                };
                if items.is_empty() {
                    return Err("'remove' requires at least one field".to_owned());
                }
                let paths = items
                    .iter()
                    .map(|item| match item {
                        Value::String(name) if !name.is_empty() => Ok(split_field_path(name)),
                        other => Err(format!("'fields' entries must be non-empty strings, got {other}")),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::Remove { paths })
            }
            "route" => Ok(Self::Route {
                output: non_empty_string(map, "output")?,
            }),
            other => Err(format!(
                "unknown action type '{other}', expected one of: {}",
                Self::NAMES.join(", ")
            )),
        }
    }

    /// 액션 타입 이름
    pub fn name(&self) -> &'static str {
        match self {
            Self::Discard => "discard",
            Self::Set { .. } => "set",
            Self::Remove { .. } => "remove",
            Self::Route { .. } => "route",
        }
    }

    /// 이벤트에 액션을 적용합니다.
    pub fn apply(&self, event: &mut Event) -> ActionResult {
        match self {
            Self::Discard => return ActionResult::Discard,
            Self::Set { field, path, value } => {
                if !event.set(path, value.clone()) {
                    trace!(event_id = %event.id, field = %field, "set skipped: path blocked by scalar");
                }
            }
            Self::Remove { paths } => {
                for path in paths {
                    event.remove(path);
                }
            }
            Self::Route { output } => event.set_route(output.as_str()),
        }
        ActionResult::Pass
    }
}

fn non_empty_string(map: &Map<String, Value>, key: &str) -> Result<String, String> {
    match map.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(format!("'{key}' must not be empty")),
        Some(other) => Err(format!("'{key}' must be a string, got {other}")),
        None => Err(format!("missing required '{key}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sluice_core::event::EVENT_SOURCE_STDIN;

    fn kind(name: &str, params: Value) -> Result<ActionKind, String> {
        let Value::Object(map) = params else {
            panic!("params must be an object");
        };
        ActionKind::from_action_map(name, &map)
    }

    fn event(fields: Value) -> Event {
        Event::new(fields, EVENT_SOURCE_STDIN, 0)
    }

    #[test]
    fn discard_returns_discard() {
        let mut e = event(json!({"a": 1}));
        assert_eq!(kind("discard", json!({})).unwrap().apply(&mut e), ActionResult::Discard);
    }

    #[test]
    fn set_creates_nested_field() {
        let action = kind("set", json!({"field": "meta.env", "value": "prod"})).unwrap();
        let mut e = event(json!({"a": 1}));
        assert_eq!(action.apply(&mut e), ActionResult::Pass);
        assert_eq!(e.fields, json!({"a": 1, "meta": {"env": "prod"}}));
    }

    #[test]
    fn set_does_not_clobber_scalar_parent() {
        let action = kind("set", json!({"field": "a.b", "value": 2})).unwrap();
        let mut e = event(json!({"a": 1}));
        assert_eq!(action.apply(&mut e), ActionResult::Pass);
        assert_eq!(e.fields, json!({"a": 1}));
    }

    #[test]
    fn set_requires_field_and_value() {
        assert!(kind("set", json!({"value": 1})).unwrap_err().contains("'field'"));
        assert!(kind("set", json!({"field": "a"})).unwrap_err().contains("'value'"));
        // null은 유효한 값입니다.
        assert!(kind("set", json!({"field": "a", "value": null})).is_ok());
    }

    #[test]
    fn remove_deletes_listed_fields() {
        let action = kind("remove", json!({"fields": ["secret", "log.raw", "missing"]})).unwrap();
        let mut e = event(json!({"secret": "x", "log": {"raw": "y", "msg": "z"}}));
        action.apply(&mut e);
        assert_eq!(e.fields, json!({"log": {"msg": "z"}}));
    }

    #[test]
    fn remove_validates_fields() {
        assert!(kind("remove", json!({})).is_err());
        assert!(kind("remove", json!({"fields": []})).is_err());
        assert!(kind("remove", json!({"fields": [1]})).is_err());
    }

    #[test]
    fn route_tags_event() {
        let action = kind("route", json!({"output": "errors"})).unwrap();
        let mut e = event(json!({}));
        action.apply(&mut e);
        assert_eq!(e.route.as_deref(), Some("errors"));
        assert!(kind("route", json!({"output": ""})).is_err());
    }

    #[test]
    fn unknown_type_lists_choices() {
        let err = kind("explode", json!({})).unwrap_err();
        assert!(err.contains("explode"));
        assert!(err.contains("discard, set, remove, route"));
    }

    #[test]
    fn names_match_config_spelling() {
        for name in ActionKind::NAMES {
            let params = match name {
                "set" => json!({"field": "a", "value": 1}),
                "remove" => json!({"fields": ["a"]}),
                "route" => json!({"output": "o"}),
                _ => json!({}),
            };
            assert_eq!(kind(name, params).unwrap().name(), name);
        }
    }
}
