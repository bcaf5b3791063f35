//! 조건 문서 → 조건 트리 변환
//!
//! 입력은 파싱된 JSON 형태의 문서([`serde_json::Value`])입니다.
//! YAML 파이프라인 파일도 로더에서 같은 값 모델로 변환되므로 여기서는
//! 형식을 구분하지 않습니다.
//!
//! # 문서 형식
//! ```json
//! {"op": "and", "operands": [
//!     {"op": "equal", "field": "service", "values": ["api", null]},
//!     {"op": "byte_len_cmp", "field": "msg", "cmp_op": "gt", "value": 100}
//! ]}
//! ```

use serde_json::{Map, Value};
use tracing::debug;

use super::node::{
    ByteLenCmpNode, CmpOp, ConditionNode, FieldOp, FieldOpNode, LogicalNode, LogicalOp,
    MatchValue,
};
use crate::error::{ConditionError, json_type_name};

/// 허용되는 최대 중첩 깊이
pub const MAX_CONDITION_DEPTH: usize = 64;

const KEY_OP: &str = "op";
const KEY_OPERANDS: &str = "operands";
const KEY_FIELD: &str = "field";
const KEY_VALUES: &str = "values";
const KEY_CASE_SENSITIVE: &str = "case_sensitive";
const KEY_CMP_OP: &str = "cmp_op";
const KEY_VALUE: &str = "value";
const OP_BYTE_LEN_CMP: &str = "byte_len_cmp";

/// 조건 트리 빌더
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    max_depth: usize,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self {
            max_depth: MAX_CONDITION_DEPTH,
        }
    }
}

impl TreeBuilder {
    /// 기본 깊이 제한으로 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 최대 중첩 깊이를 설정합니다.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// 문서에서 조건 트리를 구성합니다.
    ///
    /// 최상위가 객체가 아니면 "조건 없음"으로 보고 `Ok(None)`을 반환합니다.
    ///
    /// # Errors
    /// 문서의 어느 노드든 잘못되었으면 실패 위치를 담은 [`ConditionError`]
    pub fn build(&self, doc: &Value) -> Result<Option<ConditionNode>, ConditionError> {
        let Value::Object(map) = doc else {
            return Ok(None);
        };

        self.build_node(map, 1).map(Some).inspect_err(|e| {
            debug!(error = %e, "rejected condition document");
            metrics::counter!(sluice_core::metrics::CONDITION_BUILD_ERRORS_TOTAL).increment(1);
        })
    }

    fn build_node(
        &self,
        map: &Map<String, Value>,
        depth: usize,
    ) -> Result<ConditionNode, ConditionError> {
        if depth > self.max_depth {
            return Err(ConditionError::TooDeep {
                max: self.max_depth,
            });
        }

        let op = match map.get(KEY_OP) {
            None => return Err(ConditionError::MissingOp),
            Some(Value::String(op)) => op.as_str(),
            Some(other) => {
                return Err(ConditionError::OpNotString {
                    found: json_type_name(other),
                });
            }
        };

        if let Some(logical) = LogicalOp::from_name(op) {
            return self.build_logical(logical, map, depth);
        }
        if let Some(field_op) = FieldOp::from_name(op) {
            return build_field_op(field_op, map);
        }
        if op == OP_BYTE_LEN_CMP {
            return build_byte_len_cmp(map);
        }

        Err(ConditionError::UnknownOp(op.to_owned()))
    }

    fn build_logical(
        &self,
        op: LogicalOp,
        map: &Map<String, Value>,
        depth: usize,
    ) -> Result<ConditionNode, ConditionError> {
        let Some(Value::Array(raw)) = map.get(KEY_OPERANDS) else {
            return Err(ConditionError::MissingOperands { op });
        };

        let operands = raw
            .iter()
            .enumerate()
            .map(|(index, operand)| {
                let built = match operand {
                    Value::Object(child) => self.build_node(child, depth + 1),
                    other => Err(ConditionError::NotAnObject {
                        found: json_type_name(other),
                    }),
                };
                built.map_err(|source| ConditionError::Operand {
                    op,
                    index,
                    source: Box::new(source),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(LogicalNode::new(op, operands)?.into())
    }
}

fn required_field(map: &Map<String, Value>, op: &'static str) -> Result<String, ConditionError> {
    match map.get(KEY_FIELD) {
        Some(Value::String(field)) => Ok(field.clone()),
        _ => Err(ConditionError::MissingField { op }),
    }
}

fn build_field_op(op: FieldOp, map: &Map<String, Value>) -> Result<ConditionNode, ConditionError> {
    let field = required_field(map, op.as_str())?;

    // 스칼라는 대소문자 구분 기본값 true, 배열은 false
    let (raw_values, default_case_sensitive) = match map.get(KEY_VALUES) {
        None => return Err(ConditionError::MissingValues { op }),
        Some(Value::Array(items)) => (items.iter().collect::<Vec<_>>(), false),
        Some(scalar) => (vec![scalar], true),
    };

    let case_sensitive = match map.get(KEY_CASE_SENSITIVE) {
        None => default_case_sensitive,
        Some(Value::Bool(flag)) => *flag,
        Some(other) => {
            return Err(ConditionError::CaseSensitiveNotBool {
                found: json_type_name(other),
            });
        }
    };

    let values = raw_values
        .into_iter()
        .enumerate()
        .map(|(index, value)| match_value(op, index, value))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FieldOpNode::new(op, field, case_sensitive, values)?.into())
}

fn match_value(op: FieldOp, index: usize, value: &Value) -> Result<MatchValue, ConditionError> {
    match value {
        Value::Null => Ok(MatchValue::Absent),
        Value::String(s) => Ok(MatchValue::Bytes(s.as_bytes().to_vec())),
        Value::Number(n) => Ok(MatchValue::Bytes(n.to_string().into_bytes())),
        Value::Bool(b) => Ok(MatchValue::Bytes(b.to_string().into_bytes())),
        other => Err(ConditionError::InvalidValue {
            op,
            index,
            found: json_type_name(other),
        }),
    }
}

fn build_byte_len_cmp(map: &Map<String, Value>) -> Result<ConditionNode, ConditionError> {
    let field = required_field(map, OP_BYTE_LEN_CMP)?;

    let cmp_op = match map.get(KEY_CMP_OP) {
        None => return Err(ConditionError::MissingCmpOp),
        Some(Value::String(name)) => {
            CmpOp::from_name(name).ok_or_else(|| ConditionError::UnknownCmpOp(name.clone()))?
        }
        Some(other) => {
            return Err(ConditionError::CmpOpNotString {
                found: json_type_name(other),
            });
        }
    };

    let threshold = match map.get(KEY_VALUE) {
        None => return Err(ConditionError::MissingCmpValue),
        Some(Value::Number(n)) => {
            if let Some(v) = n.as_u64() {
                usize::try_from(v).map_err(|_| ConditionError::CmpValueNotInteger {
                    found: n.to_string(),
                })?
            } else if let Some(v) = n.as_i64() {
                return Err(ConditionError::NegativeCmpValue(v));
            } else {
                return Err(ConditionError::CmpValueNotInteger {
                    found: n.to_string(),
                });
            }
        }
        Some(other) => {
            return Err(ConditionError::CmpValueNotInteger {
                found: other.to_string(),
            });
        }
    };

    Ok(ByteLenCmpNode::new(field, cmp_op, threshold)?.into())
}
