//! 파이프라인 에러 타입
//!
//! [`ConditionError`]는 조건 트리 구성 단계의 모든 실패를 표현합니다.
//! 평가 단계는 실패하지 않으므로 에러 타입이 없습니다.
//!
//! [`EventPipelineError`]는 액션 구성, 파이프라인 파일 로딩, 워커 실행 중의
//! 에러를 포괄하며 `From<EventPipelineError> for SluiceError` 변환으로
//! 상위 레이어에 `?`로 전파됩니다.

use sluice_core::error::{PipelineError, SluiceError};

use crate::condition::{FieldOp, LogicalOp};

/// 조건 트리 구성 에러
///
/// 설정 로딩 시점에 동기적으로 반환되며, 잘못된 조건은 해당 파이프라인의
/// 시작(또는 리로드)을 중단시킵니다.
#[derive(Debug, thiserror::Error)]
pub enum ConditionError {
    /// 조건 노드가 객체가 아님 (중첩 operand 위치)
    #[error("condition node must be an object, got {found}")]
    NotAnObject {
        /// 실제 JSON 타입명
        found: &'static str,
    },

    /// `op` 키가 없음
    #[error("condition node has no 'op' field")]
    MissingOp,

    /// `op` 값이 문자열이 아님
    #[error("condition 'op' must be a string, got {found}")]
    OpNotString {
        /// 실제 JSON 타입명
        found: &'static str,
    },

    /// 알 수 없는 `op`
    #[error("unknown condition op '{0}'")]
    UnknownOp(String),

    /// 논리 연산자에 `operands` 배열이 없음
    #[error("logical op '{op}' requires an 'operands' array")]
    MissingOperands {
        /// 논리 연산자
        op: LogicalOp,
    },

    /// 논리 연산자의 operand 개수가 잘못됨
    #[error("logical op '{op}' expects {expected} operand(s), got {got}")]
    OperandCount {
        /// 논리 연산자
        op: LogicalOp,
        /// 기대 개수 설명 ("exactly 1", "at least 1")
        expected: &'static str,
        /// 실제 개수
        got: usize,
    },

    /// 하위 operand 구성 실패 (실패 위치를 감쌉니다)
    #[error("operand {index} of '{op}': {source}")]
    Operand {
        /// 상위 논리 연산자
        op: LogicalOp,
        /// operand 인덱스
        index: usize,
        /// 하위 에러
        #[source]
        source: Box<ConditionError>,
    },

    /// 문자열 `field`가 없음
    #[error("'{op}' requires a string 'field'")]
    MissingField {
        /// 노드 연산자명
        op: &'static str,
    },

    /// `field`가 빈 문자열
    #[error("'{op}' field name must not be empty")]
    EmptyField {
        /// 노드 연산자명
        op: &'static str,
    },

    /// `values`가 없거나 빈 배열
    #[error("'{op}' requires at least one value")]
    MissingValues {
        /// 필드 연산자
        op: FieldOp,
    },

    /// `values` 항목의 타입이 잘못됨
    #[error("'{op}' value {index} must be a scalar, got {found}")]
    InvalidValue {
        /// 필드 연산자
        op: FieldOp,
        /// 값 인덱스
        index: usize,
        /// 실제 JSON 타입명
        found: &'static str,
    },

    /// `case_sensitive`가 bool이 아님
    #[error("'case_sensitive' must be a bool, got {found}")]
    CaseSensitiveNotBool {
        /// 실제 JSON 타입명
        found: &'static str,
    },

    /// regex 값 목록에 null이 포함됨
    #[error("regex value {index} must not be null")]
    NullRegexValue {
        /// 값 인덱스
        index: usize,
    },

    /// 정규식 컴파일 실패
    #[error("invalid regex '{pattern}': {reason}")]
    InvalidRegex {
        /// 원본 패턴
        pattern: String,
        /// 실패 사유
        reason: String,
    },

    /// byte_len_cmp에 `cmp_op`가 없음
    #[error("'byte_len_cmp' requires a 'cmp_op'")]
    MissingCmpOp,

    /// `cmp_op`가 문자열이 아님
    #[error("'cmp_op' must be a string, got {found}")]
    CmpOpNotString {
        /// 실제 JSON 타입명
        found: &'static str,
    },

    /// 알 수 없는 `cmp_op`
    #[error("unknown cmp_op '{0}', expected one of: lt, le, gt, ge, eq, ne")]
    UnknownCmpOp(String),

    /// byte_len_cmp에 `value`가 없음
    #[error("'byte_len_cmp' requires a 'value'")]
    MissingCmpValue,

    /// `value`가 정수가 아님
    #[error("'byte_len_cmp' value must be an integer, got {found}")]
    CmpValueNotInteger {
        /// 실제 값 표현
        found: String,
    },

    /// `value`가 음수
    #[error("'byte_len_cmp' value must be non-negative, got {0}")]
    NegativeCmpValue(i64),

    /// 중첩 깊이 초과
    #[error("condition nesting exceeds {max} levels")]
    TooDeep {
        /// 허용 최대 깊이
        max: usize,
    },

    /// 레거시 match_fields 문서가 객체가 아님
    #[error("match_fields must be an object, got {found}")]
    LegacyNotObject {
        /// 실제 JSON 타입명
        found: &'static str,
    },

    /// 레거시 match_fields 값의 타입이 잘못됨
    #[error("match_fields '{field}' must be a scalar or an array of scalars, got {found}")]
    InvalidLegacyValue {
        /// 필드명
        field: String,
        /// 실제 JSON 타입명
        found: &'static str,
    },
}

/// 이벤트 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum EventPipelineError {
    /// 액션 구성 실패
    #[error("action {index} ({kind}): {reason}")]
    Action {
        /// 액션 인덱스
        index: usize,
        /// 액션 타입 (알 수 없으면 "?")
        kind: String,
        /// 실패 사유
        reason: String,
    },

    /// 파이프라인 파일 로딩 실패
    #[error("pipeline load error: {path}: {reason}")]
    PipelineLoad {
        /// 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 채널 통신 에러
    #[error("channel error: {0}")]
    Channel(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<EventPipelineError> for SluiceError {
    fn from(err: EventPipelineError) -> Self {
        match err {
            EventPipelineError::Channel(reason) => {
                SluiceError::Pipeline(PipelineError::ChannelSend(reason))
            }
            EventPipelineError::Io(e) => SluiceError::Io(e),
            other => SluiceError::Pipeline(PipelineError::InitFailed(other.to_string())),
        }
    }
}

/// JSON 값의 타입명을 반환합니다 (에러 메시지용).
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
