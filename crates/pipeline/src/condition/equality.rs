//! 조건 트리 구조 비교
//!
//! 리로드 시 새 트리가 기존 트리와 같은지 판단하는 데 사용합니다.
//! 첫 번째로 다른 위치를 `root.operands[1].values[0]` 형식의 경로로 보고합니다.

use super::node::{ByteLenCmpNode, ConditionNode, FieldOpNode, LogicalNode, MatchValue};

/// 두 조건 트리의 첫 번째 차이
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("condition trees differ at {path}: {reason}")]
pub struct TreeMismatch {
    /// 차이가 발생한 노드 경로
    pub path: String,
    /// 차이 설명
    pub reason: String,
}

impl TreeMismatch {
    fn new(path: &str, reason: impl Into<String>) -> Self {
        Self {
            path: path.to_owned(),
            reason: reason.into(),
        }
    }
}

/// 두 루트(없을 수 있음)를 비교합니다.
pub(crate) fn compare_roots(
    left: Option<&ConditionNode>,
    right: Option<&ConditionNode>,
) -> Result<(), TreeMismatch> {
    match (left, right) {
        (None, None) => Ok(()),
        (Some(l), Some(r)) => compare_nodes(l, r, "root"),
        (Some(_), None) => Err(TreeMismatch::new("root", "right checker has no condition")),
        (None, Some(_)) => Err(TreeMismatch::new("root", "left checker has no condition")),
    }
}

/// 두 노드를 깊이 우선으로 비교합니다.
pub(crate) fn compare_nodes(
    left: &ConditionNode,
    right: &ConditionNode,
    path: &str,
) -> Result<(), TreeMismatch> {
    match (left, right) {
        (ConditionNode::FieldOp(l), ConditionNode::FieldOp(r)) => compare_field_op(l, r, path),
        (ConditionNode::Logical(l), ConditionNode::Logical(r)) => compare_logical(l, r, path),
        (ConditionNode::ByteLenCmp(l), ConditionNode::ByteLenCmp(r)) => {
            compare_byte_len_cmp(l, r, path)
        }
        (l, r) => Err(TreeMismatch::new(
            path,
            format!("node kind {} != {}", l.kind(), r.kind()),
        )),
    }
}

fn compare_field_op(left: &FieldOpNode, right: &FieldOpNode, path: &str) -> Result<(), TreeMismatch> {
    if left.op() != right.op() {
        return Err(TreeMismatch::new(
            path,
            format!("op {} != {}", left.op(), right.op()),
        ));
    }
    if left.field_path() != right.field_path() {
        return Err(TreeMismatch::new(
            path,
            format!("field {:?} != {:?}", left.field(), right.field()),
        ));
    }
    if left.case_sensitive() != right.case_sensitive() {
        return Err(TreeMismatch::new(
            path,
            format!(
                "case_sensitive {} != {}",
                left.case_sensitive(),
                right.case_sensitive()
            ),
        ));
    }
    if left.values().len() != right.values().len() {
        return Err(TreeMismatch::new(
            path,
            format!(
                "value count {} != {}",
                left.values().len(),
                right.values().len()
            ),
        ));
    }

    // regex 노드는 values에 원본 패턴 문자열을 보관하므로 같은 비교로 충분합니다.
    for (index, (l, r)) in left.values().iter().zip(right.values()).enumerate() {
        if l != r {
            return Err(TreeMismatch::new(
                &format!("{path}.values[{index}]"),
                format!("{} != {}", describe(l), describe(r)),
            ));
        }
    }

    Ok(())
}

fn compare_logical(left: &LogicalNode, right: &LogicalNode, path: &str) -> Result<(), TreeMismatch> {
    if left.op() != right.op() {
        return Err(TreeMismatch::new(
            path,
            format!("op {} != {}", left.op(), right.op()),
        ));
    }
    if left.operands().len() != right.operands().len() {
        return Err(TreeMismatch::new(
            path,
            format!(
                "operand count {} != {}",
                left.operands().len(),
                right.operands().len()
            ),
        ));
    }

    left.operands()
        .iter()
        .zip(right.operands())
        .enumerate()
        .try_for_each(|(index, (l, r))| compare_nodes(l, r, &format!("{path}.operands[{index}]")))
}

fn compare_byte_len_cmp(
    left: &ByteLenCmpNode,
    right: &ByteLenCmpNode,
    path: &str,
) -> Result<(), TreeMismatch> {
    if left.field() != right.field() {
        return Err(TreeMismatch::new(
            path,
            format!("field {:?} != {:?}", left.field(), right.field()),
        ));
    }
    if left.cmp_op() != right.cmp_op() {
        return Err(TreeMismatch::new(
            path,
            format!("cmp_op {} != {}", left.cmp_op(), right.cmp_op()),
        ));
    }
    if left.threshold() != right.threshold() {
        return Err(TreeMismatch::new(
            path,
            format!("value {} != {}", left.threshold(), right.threshold()),
        ));
    }
    Ok(())
}

fn describe(value: &MatchValue) -> String {
    match value {
        MatchValue::Absent => "null".to_owned(),
        MatchValue::Bytes(bytes) => format!("{:?}", String::from_utf8_lossy(bytes)),
    }
}

impl PartialEq for ConditionNode {
    fn eq(&self, other: &Self) -> bool {
        compare_nodes(self, other, "root").is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::TreeBuilder;
    use serde_json::{Value, json};

    fn tree(doc: Value) -> ConditionNode {
        TreeBuilder::new().build(&doc).unwrap().unwrap()
    }

    #[test]
    fn identical_documents_are_equal() {
        let doc = json!({"op": "and", "operands": [
            {"op": "equal", "field": "a", "values": [null, "x"]},
            {"op": "byte_len_cmp", "field": "b", "cmp_op": "ge", "value": 3}
        ]});
        assert!(compare_nodes(&tree(doc.clone()), &tree(doc), "root").is_ok());
    }

    #[test]
    fn mismatch_reports_value_path() {
        let left = tree(json!({"op": "or", "operands": [
            {"op": "equal", "field": "a", "values": "1"},
            {"op": "equal", "field": "b", "values": ["x", "y"]}
        ]}));
        let right = tree(json!({"op": "or", "operands": [
            {"op": "equal", "field": "a", "values": "1"},
            {"op": "equal", "field": "b", "values": ["x", "z"]}
        ]}));

        let mismatch = compare_nodes(&left, &right, "root").unwrap_err();
        assert_eq!(mismatch.path, "root.operands[1].values[1]");
        assert!(mismatch.reason.contains("\"y\""));
    }

    #[test]
    fn operand_order_matters() {
        let a = json!({"op": "equal", "field": "a", "values": "1"});
        let b = json!({"op": "equal", "field": "b", "values": "1"});
        let left = tree(json!({"op": "and", "operands": [a.clone(), b.clone()]}));
        let right = tree(json!({"op": "and", "operands": [b, a]}));
        assert!(left != right);
    }

    #[test]
    fn case_flag_difference_is_reported() {
        let left = tree(json!({"op": "equal", "field": "a", "values": "x"}));
        let right = tree(json!({"op": "equal", "field": "a", "values": "x", "case_sensitive": false}));
        let mismatch = compare_nodes(&left, &right, "root").unwrap_err();
        assert_eq!(mismatch.path, "root");
        assert!(mismatch.reason.contains("case_sensitive"));
    }

    #[test]
    fn folded_values_compare_equal() {
        let left = tree(json!({"op": "prefix", "field": "a", "values": ["ABC"]}));
        let right = tree(json!({"op": "prefix", "field": "a", "values": ["abc"]}));
        assert!(left == right);
    }

    #[test]
    fn regex_compares_by_source_text() {
        let left = tree(json!({"op": "regex", "field": "m", "values": ["a+"]}));
        let same = tree(json!({"op": "regex", "field": "m", "values": ["a+"]}));
        let equivalent = tree(json!({"op": "regex", "field": "m", "values": ["aa*"]}));
        assert!(left == same);
        assert!(left != equivalent);
    }

    #[test]
    fn different_kinds_are_reported() {
        let left = tree(json!({"op": "byte_len_cmp", "field": "a", "cmp_op": "eq", "value": 1}));
        let right = tree(json!({"op": "equal", "field": "a", "values": "1"}));
        let mismatch = compare_nodes(&left, &right, "root").unwrap_err();
        assert!(mismatch.reason.contains("byte_len_cmp"));
    }

    #[test]
    fn threshold_difference_is_reported() {
        let left = tree(json!({"op": "byte_len_cmp", "field": "a", "cmp_op": "gt", "value": 100}));
        let right = tree(json!({"op": "byte_len_cmp", "field": "a", "cmp_op": "gt", "value": 101}));
        let mismatch = compare_nodes(&left, &right, "root").unwrap_err();
        assert_eq!(mismatch.reason, "value 100 != 101");
    }

    #[test]
    fn empty_roots() {
        let node = tree(json!({"op": "equal", "field": "a", "values": "1"}));
        assert!(compare_roots(None, None).is_ok());
        assert!(compare_roots(Some(&node), None).is_err());
        assert!(compare_roots(None, Some(&node)).is_err());
    }

    #[test]
    fn mismatch_display() {
        let mismatch = TreeMismatch::new("root.operands[0]", "op and != or");
        assert_eq!(
            mismatch.to_string(),
            "condition trees differ at root.operands[0]: op and != or"
        );
    }
}
