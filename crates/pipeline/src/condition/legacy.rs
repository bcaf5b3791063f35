//! 레거시 `match_fields` 단축 표기
//!
//! `{"service": ["api", "web"], "level": "error"}` 형식의 문서를
//! 필드별 조건 목록으로 변환합니다. 항목 간에는 [`MatchMode`]에 따라 결합하고,
//! 한 항목 안의 값들은 OR로 결합합니다.

use serde_json::Value;

use sluice_core::event::{EventFields, split_field_path};

use crate::error::{ConditionError, json_type_name};

/// 항목 결합 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// 모든 항목이 같은 값을 가져야 함
    #[default]
    And,
    /// 한 항목이라도 같은 값을 가지면 됨
    Or,
    /// 모든 항목이 값 중 하나로 시작해야 함
    AndPrefix,
    /// 한 항목이라도 값 중 하나로 시작하면 됨
    OrPrefix,
}

impl MatchMode {
    /// 설정 문자열에서 모드를 파싱합니다.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            "and_prefix" => Some(Self::AndPrefix),
            "or_prefix" => Some(Self::OrPrefix),
            _ => None,
        }
    }

    /// 설정 문자열 표현
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
            Self::AndPrefix => "and_prefix",
            Self::OrPrefix => "or_prefix",
        }
    }

    fn is_prefix(self) -> bool {
        matches!(self, Self::AndPrefix | Self::OrPrefix)
    }
}

/// 단일 필드 조건
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCondition {
    /// 분리된 필드 경로
    pub field: Vec<String>,
    /// 허용 값 목록 (OR)
    pub values: Vec<String>,
}

impl MatchCondition {
    fn matches<E: EventFields + ?Sized>(&self, event: &E, prefix: bool) -> bool {
        let Some(data) = event.field_bytes(&self.field) else {
            return false;
        };
        self.values.iter().any(|value| {
            if prefix {
                data.starts_with(value.as_bytes())
            } else {
                data.as_ref() == value.as_bytes()
            }
        })
    }
}

/// 필드 조건 목록
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchConditions(pub Vec<MatchCondition>);

impl MatchConditions {
    /// 조건 목록
    pub fn as_slice(&self) -> &[MatchCondition] {
        &self.0
    }

    /// 조건 개수
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 조건이 없는지 여부
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 이벤트가 조건을 만족하는지 판단합니다. 조건이 없으면 항상 true입니다.
    pub fn matches<E: EventFields + ?Sized>(&self, event: &E, mode: MatchMode) -> bool {
        if self.0.is_empty() {
            return true;
        }
        let prefix = mode.is_prefix();
        match mode {
            MatchMode::And | MatchMode::AndPrefix => {
                self.0.iter().all(|cond| cond.matches(event, prefix))
            }
            MatchMode::Or | MatchMode::OrPrefix => {
                self.0.iter().any(|cond| cond.matches(event, prefix))
            }
        }
    }
}

/// `match_fields` 문서에서 조건 목록을 추출합니다.
///
/// 키마다 조건 하나를 만들며, 스칼라 값은 원소 하나짜리 목록이 됩니다.
/// 순서는 문서 맵의 순회 순서(키 정렬 순)를 따릅니다.
///
/// # Errors
/// 문서가 객체가 아니거나 값이 스칼라/스칼라 배열이 아닌 경우
pub fn extract_match_conditions(doc: &Value) -> Result<MatchConditions, ConditionError> {
    let Value::Object(map) = doc else {
        return Err(ConditionError::LegacyNotObject {
            found: json_type_name(doc),
        });
    };

    map.iter()
        .map(|(field, value)| {
            let values = match value {
                Value::Array(items) => items
                    .iter()
                    .map(|item| legacy_scalar(field, item))
                    .collect::<Result<Vec<_>, _>>()?,
                scalar => vec![legacy_scalar(field, scalar)?],
            };
            Ok(MatchCondition {
                field: split_field_path(field),
                values,
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(MatchConditions)
}

fn legacy_scalar(field: &str, value: &Value) -> Result<String, ConditionError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(ConditionError::InvalidLegacyValue {
            field: field.to_owned(),
            found: json_type_name(other),
        }),
    }
}
