//! 조건 노드 — 조건 트리의 구성 단위
//!
//! 노드는 세 가지 변형으로 닫혀 있습니다.
//! - [`FieldOpNode`]: 단일 필드에 대한 값 비교 (equal, prefix, suffix, contains, regex)
//! - [`ByteLenCmpNode`]: 필드 바이트 길이와 임계값 비교
//! - [`LogicalNode`]: not / and / or 결합
//!
//! 모든 노드는 생성자에서 검증되며, 생성 이후에는 변경되지 않습니다.

use std::fmt;

use regex::bytes::{Regex, RegexBuilder};

use sluice_core::event::{EventFields, split_field_path};

use super::matcher;
use crate::error::ConditionError;

/// 필드 비교 연산자
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldOp {
    /// 정확히 일치
    Equal,
    /// 접두사 일치
    Prefix,
    /// 접미사 일치
    Suffix,
    /// 부분 문자열 포함
    Contains,
    /// 정규식 매칭
    Regex,
}

impl FieldOp {
    /// 설정 문자열에서 연산자를 파싱합니다.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "equal" => Some(Self::Equal),
            "prefix" => Some(Self::Prefix),
            "suffix" => Some(Self::Suffix),
            "contains" => Some(Self::Contains),
            "regex" => Some(Self::Regex),
            _ => None,
        }
    }

    /// 설정 문자열 표현
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::Prefix => "prefix",
            Self::Suffix => "suffix",
            Self::Contains => "contains",
            Self::Regex => "regex",
        }
    }
}

impl fmt::Display for FieldOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 논리 연산자
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    /// 부정 (operand 정확히 1개)
    Not,
    /// 논리곱 (operand 1개 이상)
    And,
    /// 논리합 (operand 1개 이상)
    Or,
}

impl LogicalOp {
    /// 설정 문자열에서 연산자를 파싱합니다.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "not" => Some(Self::Not),
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            _ => None,
        }
    }

    /// 설정 문자열 표현
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Not => "not",
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 바이트 길이 비교 연산자
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `==`
    Eq,
    /// `!=`
    Ne,
}

impl CmpOp {
    /// 설정 문자열에서 연산자를 파싱합니다.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "lt" => Some(Self::Lt),
            "le" => Some(Self::Le),
            "gt" => Some(Self::Gt),
            "ge" => Some(Self::Ge),
            "eq" => Some(Self::Eq),
            "ne" => Some(Self::Ne),
            _ => None,
        }
    }

    /// 설정 문자열 표현
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::Eq => "eq",
            Self::Ne => "ne",
        }
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 비교 값 — 구체적인 바이트 시퀀스 또는 "필드 없음" 센티널
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MatchValue {
    /// 필드가 없거나 null임을 뜻하는 센티널
    Absent,
    /// 바이트 시퀀스
    Bytes(Vec<u8>),
}

impl MatchValue {
    /// 바이트 값을 반환합니다 (센티널이면 `None`).
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Absent => None,
            Self::Bytes(bytes) => Some(bytes),
        }
    }
}

impl From<&str> for MatchValue {
    fn from(value: &str) -> Self {
        Self::Bytes(value.as_bytes().to_vec())
    }
}

impl From<Option<&str>> for MatchValue {
    fn from(value: Option<&str>) -> Self {
        value.map_or(Self::Absent, Self::from)
    }
}

/// 필드 비교 노드
///
/// 대소문자 무시 노드의 값은 생성 시 ASCII 소문자로 정규화되어 저장됩니다.
/// regex 노드는 값마다 컴파일된 패턴을 같은 순서로 보관합니다.
#[derive(Debug, Clone)]
pub struct FieldOpNode {
    field: String,
    field_path: Vec<String>,
    op: FieldOp,
    case_sensitive: bool,
    values: Vec<MatchValue>,
    patterns: Vec<Regex>,
}

impl FieldOpNode {
    /// 필드 비교 노드를 생성합니다.
    ///
    /// # Errors
    /// - 필드명이 비어 있는 경우
    /// - 값 목록이 비어 있는 경우
    /// - regex 노드에 센티널 값이 있거나 패턴 컴파일에 실패한 경우
    pub fn new(
        op: FieldOp,
        field: impl Into<String>,
        case_sensitive: bool,
        values: Vec<MatchValue>,
    ) -> Result<Self, ConditionError> {
        let field = field.into();
        if field.is_empty() {
            return Err(ConditionError::EmptyField { op: op.as_str() });
        }
        if values.is_empty() {
            return Err(ConditionError::MissingValues { op });
        }

        let (values, patterns) = if op == FieldOp::Regex {
            let patterns = compile_patterns(&values, case_sensitive)?;
            (values, patterns)
        } else if case_sensitive {
            (values, Vec::new())
        } else {
            let folded = values
                .into_iter()
                .map(|value| match value {
                    MatchValue::Bytes(mut bytes) => {
                        bytes.make_ascii_lowercase();
                        MatchValue::Bytes(bytes)
                    }
                    MatchValue::Absent => MatchValue::Absent,
                })
                .collect();
            (folded, Vec::new())
        };

        Ok(Self {
            field_path: split_field_path(&field),
            field,
            op,
            case_sensitive,
            values,
            patterns,
        })
    }

    /// 원본 필드명
    pub fn field(&self) -> &str {
        &self.field
    }

    /// 분리된 필드 경로
    pub fn field_path(&self) -> &[String] {
        &self.field_path
    }

    /// 비교 연산자
    pub fn op(&self) -> FieldOp {
        self.op
    }

    /// 대소문자 구분 여부
    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// 비교 값 목록 (대소문자 무시 노드는 정규화된 값)
    pub fn values(&self) -> &[MatchValue] {
        &self.values
    }

    /// 이벤트에 대해 노드를 평가합니다.
    pub fn evaluate<E: EventFields + ?Sized>(&self, event: &E) -> bool {
        let data = event.field_bytes(&self.field_path);
        let data = data.as_deref();

        match self.op {
            FieldOp::Regex => matcher::match_regex(data, &self.patterns),
            op => matcher::match_values(op, data, &self.values, self.case_sensitive),
        }
    }
}

fn compile_patterns(
    values: &[MatchValue],
    case_sensitive: bool,
) -> Result<Vec<Regex>, ConditionError> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            let bytes = value
                .as_bytes()
                .ok_or(ConditionError::NullRegexValue { index })?;
            let pattern =
                std::str::from_utf8(bytes).map_err(|e| ConditionError::InvalidRegex {
                    pattern: String::from_utf8_lossy(bytes).into_owned(),
                    reason: e.to_string(),
                })?;
            // 대소문자 무시는 다른 연산자와 같이 ASCII 범위만 접습니다.
            RegexBuilder::new(pattern)
                .case_insensitive(!case_sensitive)
                .unicode(case_sensitive)
                .build()
                .map_err(|e| ConditionError::InvalidRegex {
                    pattern: pattern.to_owned(),
                    reason: e.to_string(),
                })
        })
        .collect()
}

/// 논리 결합 노드
#[derive(Debug, Clone)]
pub struct LogicalNode {
    op: LogicalOp,
    operands: Vec<ConditionNode>,
}

impl LogicalNode {
    /// 논리 노드를 생성합니다.
    ///
    /// `not`은 operand가 정확히 1개, `and`/`or`는 1개 이상이어야 합니다.
    pub fn new(op: LogicalOp, operands: Vec<ConditionNode>) -> Result<Self, ConditionError> {
        match op {
            LogicalOp::Not if operands.len() != 1 => Err(ConditionError::OperandCount {
                op,
                expected: "exactly 1",
                got: operands.len(),
            }),
            LogicalOp::And | LogicalOp::Or if operands.is_empty() => {
                Err(ConditionError::OperandCount {
                    op,
                    expected: "at least 1",
                    got: 0,
                })
            }
            _ => Ok(Self { op, operands }),
        }
    }

    /// 논리 연산자
    pub fn op(&self) -> LogicalOp {
        self.op
    }

    /// 하위 노드 목록 (구성 순서 = 평가 순서)
    pub fn operands(&self) -> &[ConditionNode] {
        &self.operands
    }

    /// 이벤트에 대해 노드를 평가합니다. and/or는 단락 평가합니다.
    pub fn evaluate<E: EventFields + ?Sized>(&self, event: &E) -> bool {
        match self.op {
            LogicalOp::Not => !self.operands.iter().all(|operand| operand.evaluate(event)),
            LogicalOp::And => self.operands.iter().all(|operand| operand.evaluate(event)),
            LogicalOp::Or => self.operands.iter().any(|operand| operand.evaluate(event)),
        }
    }
}

/// 바이트 길이 비교 노드
///
/// 필드명은 점으로 분리하지 않고 최상위 키 하나로 조회합니다.
#[derive(Debug, Clone)]
pub struct ByteLenCmpNode {
    field: String,
    field_path: Vec<String>,
    cmp_op: CmpOp,
    threshold: usize,
}

impl ByteLenCmpNode {
    /// 바이트 길이 비교 노드를 생성합니다.
    pub fn new(
        field: impl Into<String>,
        cmp_op: CmpOp,
        threshold: usize,
    ) -> Result<Self, ConditionError> {
        let field = field.into();
        if field.is_empty() {
            return Err(ConditionError::EmptyField { op: "byte_len_cmp" });
        }

        Ok(Self {
            field_path: vec![field.clone()],
            field,
            cmp_op,
            threshold,
        })
    }

    /// 필드명
    pub fn field(&self) -> &str {
        &self.field
    }

    /// 비교 연산자
    pub fn cmp_op(&self) -> CmpOp {
        self.cmp_op
    }

    /// 임계값 (바이트)
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// 이벤트에 대해 노드를 평가합니다. 필드가 없으면 길이 0으로 취급합니다.
    pub fn evaluate<E: EventFields + ?Sized>(&self, event: &E) -> bool {
        let len = event
            .field_bytes(&self.field_path)
            .map_or(0, |data| data.len());
        matcher::compare_len(len, self.cmp_op, self.threshold)
    }
}

/// 조건 트리 노드
#[derive(Debug, Clone)]
pub enum ConditionNode {
    /// 필드 비교 리프
    FieldOp(FieldOpNode),
    /// 논리 결합
    Logical(LogicalNode),
    /// 바이트 길이 비교 리프
    ByteLenCmp(ByteLenCmpNode),
}

impl ConditionNode {
    /// 이벤트에 대해 노드를 평가합니다.
    pub fn evaluate<E: EventFields + ?Sized>(&self, event: &E) -> bool {
        match self {
            Self::FieldOp(node) => node.evaluate(event),
            Self::Logical(node) => node.evaluate(event),
            Self::ByteLenCmp(node) => node.evaluate(event),
        }
    }

    /// 노드 변형 이름 (진단 메시지용)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FieldOp(_) => "field_op",
            Self::Logical(_) => "logical",
            Self::ByteLenCmp(_) => "byte_len_cmp",
        }
    }
}

impl From<FieldOpNode> for ConditionNode {
    fn from(node: FieldOpNode) -> Self {
        Self::FieldOp(node)
    }
}

impl From<LogicalNode> for ConditionNode {
    fn from(node: LogicalNode) -> Self {
        Self::Logical(node)
    }
}

impl From<ByteLenCmpNode> for ConditionNode {
    fn from(node: ByteLenCmpNode) -> Self {
        Self::ByteLenCmp(node)
    }
}
