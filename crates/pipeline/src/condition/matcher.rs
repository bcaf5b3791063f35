//! 리프 비교 함수
//!
//! 노드에 저장된 값과 이벤트에서 조회한 바이트를 비교합니다.
//! `data == None`은 필드가 없거나 null임을 뜻합니다.

use regex::bytes::Regex;

use super::node::{CmpOp, FieldOp, MatchValue};

/// equal / prefix / suffix / contains 비교를 수행합니다.
///
/// 대소문자 무시 노드의 `values`는 이미 소문자로 정규화되어 있으므로
/// 이벤트 쪽 바이트만 ASCII 대소문자를 무시하고 비교합니다.
pub(crate) fn match_values(
    op: FieldOp,
    data: Option<&[u8]>,
    values: &[MatchValue],
    case_sensitive: bool,
) -> bool {
    let Some(data) = data else {
        // 없는 필드는 equal의 센티널 항목에만 매칭됩니다.
        return op == FieldOp::Equal && values.contains(&MatchValue::Absent);
    };

    values.iter().filter_map(MatchValue::as_bytes).any(|value| match op {
        FieldOp::Equal => bytes_eq(data, value, case_sensitive),
        FieldOp::Prefix => {
            data.len() >= value.len() && bytes_eq(&data[..value.len()], value, case_sensitive)
        }
        FieldOp::Suffix => {
            data.len() >= value.len()
                && bytes_eq(&data[data.len() - value.len()..], value, case_sensitive)
        }
        FieldOp::Contains => contains(data, value, case_sensitive),
        FieldOp::Regex => false,
    })
}

/// 패턴 중 하나라도 매칭되면 true. 없는 필드는 매칭되지 않습니다.
pub(crate) fn match_regex(data: Option<&[u8]>, patterns: &[Regex]) -> bool {
    data.is_some_and(|data| patterns.iter().any(|re| re.is_match(data)))
}

/// `len <cmp_op> threshold`
pub(crate) fn compare_len(len: usize, cmp_op: CmpOp, threshold: usize) -> bool {
    match cmp_op {
        CmpOp::Lt => len < threshold,
        CmpOp::Le => len <= threshold,
        CmpOp::Gt => len > threshold,
        CmpOp::Ge => len >= threshold,
        CmpOp::Eq => len == threshold,
        CmpOp::Ne => len != threshold,
    }
}

fn bytes_eq(data: &[u8], value: &[u8], case_sensitive: bool) -> bool {
    if case_sensitive {
        data == value
    } else {
        data.eq_ignore_ascii_case(value)
    }
}

fn contains(haystack: &[u8], needle: &[u8], case_sensitive: bool) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack
        .windows(needle.len())
        .any(|window| bytes_eq(window, needle, case_sensitive))
}
