//! 액션 게이트 — 액션 적용 여부를 결정하는 조건

use serde_json::{Map, Value};

use sluice_core::event::EventFields;

use crate::condition::{Checker, MatchConditions, MatchMode, extract_match_conditions};

const KEY_DO_IF: &str = "do_if";
const KEY_MATCH_FIELDS: &str = "match_fields";
const KEY_MATCH_MODE: &str = "match_mode";

/// 액션 게이트
///
/// `do_if`와 `match_fields`는 함께 쓸 수 없습니다.
#[derive(Debug, Clone, Default)]
pub enum ActionGate {
    /// 항상 적용
    #[default]
    Always,
    /// 조건 트리가 참일 때 적용
    DoIf(Checker),
    /// 레거시 필드 매칭이 참일 때 적용
    Match {
        /// 필드 조건 목록
        conditions: MatchConditions,
        /// 결합 방식
        mode: MatchMode,
    },
}

impl ActionGate {
    /// 액션 설정 맵에서 게이트를 읽습니다.
    ///
    /// 실패 사유는 호출자가 액션 인덱스/타입과 함께 감쌉니다.
    pub(crate) fn from_action_map(map: &Map<String, Value>) -> Result<Self, String> {
        let do_if = map.get(KEY_DO_IF);
        let match_fields = map.get(KEY_MATCH_FIELDS);
        let match_mode = map.get(KEY_MATCH_MODE);

        match (do_if, match_fields) {
            (Some(_), Some(_)) => Err("'do_if' and 'match_fields' are mutually exclusive".to_owned()),
            (Some(doc), None) => {
                if match_mode.is_some() {
                    return Err("'match_mode' requires 'match_fields'".to_owned());
                }
                let checker = Checker::from_document(doc).map_err(|e| format!("do_if: {e}"))?;
                if checker.is_empty() {
                    Ok(Self::Always)
                } else {
                    Ok(Self::DoIf(checker))
                }
            }
            (None, Some(doc)) => {
                let conditions =
                    extract_match_conditions(doc).map_err(|e| format!("match_fields: {e}"))?;
                let mode = parse_mode(match_mode)?;
                Ok(Self::Match { conditions, mode })
            }
            (None, None) => {
                if match_mode.is_some() {
                    return Err("'match_mode' requires 'match_fields'".to_owned());
                }
                Ok(Self::Always)
            }
        }
    }

    /// 이벤트에 대해 게이트가 열리는지 판단합니다.
    pub fn passes<E: EventFields + ?Sized>(&self, event: &E) -> bool {
        match self {
            Self::Always => true,
            Self::DoIf(checker) => checker.evaluate(event),
            Self::Match { conditions, mode } => conditions.matches(event, *mode),
        }
    }

    /// 두 게이트가 같은 조건인지 비교합니다.
    pub fn is_equivalent(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Always, Self::Always) => true,
            (Self::DoIf(a), Self::DoIf(b)) => a.is_equal_to(b),
            (
                Self::Match {
                    conditions: a,
                    mode: mode_a,
                },
                Self::Match {
                    conditions: b,
                    mode: mode_b,
                },
            ) => mode_a == mode_b && a == b,
            _ => false,
        }
    }
}

fn parse_mode(raw: Option<&Value>) -> Result<MatchMode, String> {
    match raw {
        None => Ok(MatchMode::default()),
        Some(Value::String(name)) => MatchMode::from_name(name).ok_or_else(|| {
            format!("unknown match_mode '{name}', expected one of: and, or, and_prefix, or_prefix")
        }),
        Some(other) => Err(format!("'match_mode' must be a string, got {other}")),
    }
}
