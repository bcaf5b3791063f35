#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use serde_json::{json, Value};

use sluice_pipeline::condition::{Checker, TreeBuilder};

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    tree: FuzzNode,
    /// 평가 대상 이벤트 필드값
    level: Option<String>,
    msg: Option<String>,
    nested: Option<String>,
}

#[derive(Arbitrary, Debug)]
enum FuzzNode {
    Field {
        op: FuzzFieldOp,
        field: FuzzField,
        case_sensitive: bool,
        values: Vec<Option<String>>,
    },
    ByteLen {
        field: FuzzField,
        cmp_op: FuzzCmpOp,
        value: u16,
    },
    Not(Box<FuzzNode>),
    And(Vec<FuzzNode>),
    Or(Vec<FuzzNode>),
}

#[derive(Arbitrary, Debug, Clone, Copy)]
enum FuzzFieldOp {
    Equal,
    Prefix,
    Suffix,
    Contains,
    Regex,
}

#[derive(Arbitrary, Debug, Clone, Copy)]
enum FuzzField {
    Level,
    Msg,
    Nested,
    Missing,
}

#[derive(Arbitrary, Debug, Clone, Copy)]
enum FuzzCmpOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl FuzzField {
    fn as_str(self) -> &'static str {
        match self {
            FuzzField::Level => "level",
            FuzzField::Msg => "msg",
            FuzzField::Nested => "meta.nested",
            FuzzField::Missing => "missing",
        }
    }
}

impl FuzzFieldOp {
    fn as_str(self) -> &'static str {
        match self {
            FuzzFieldOp::Equal => "equal",
            FuzzFieldOp::Prefix => "prefix",
            FuzzFieldOp::Suffix => "suffix",
            FuzzFieldOp::Contains => "contains",
            FuzzFieldOp::Regex => "regex",
        }
    }
}

impl FuzzCmpOp {
    fn as_str(self) -> &'static str {
        match self {
            FuzzCmpOp::Lt => "lt",
            FuzzCmpOp::Le => "le",
            FuzzCmpOp::Gt => "gt",
            FuzzCmpOp::Ge => "ge",
            FuzzCmpOp::Eq => "eq",
            FuzzCmpOp::Ne => "ne",
        }
    }
}

/// 깊이와 폭을 제한해 조건 문서로 변환
fn to_document(node: &FuzzNode, depth: usize) -> Value {
    if depth > 6 {
        return json!({"op": "byte_len_cmp", "field": "msg", "cmp_op": "ge", "value": 0});
    }
    match node {
        FuzzNode::Field {
            op,
            field,
            case_sensitive,
            values,
        } => json!({
            "op": op.as_str(),
            "field": field.as_str(),
            "case_sensitive": case_sensitive,
            "values": values.iter().take(4).collect::<Vec<_>>(),
        }),
        FuzzNode::ByteLen {
            field,
            cmp_op,
            value,
        } => json!({
            "op": "byte_len_cmp",
            "field": field.as_str(),
            "cmp_op": cmp_op.as_str(),
            "value": value,
        }),
        FuzzNode::Not(inner) => json!({"op": "not", "operands": [to_document(inner, depth + 1)]}),
        FuzzNode::And(operands) | FuzzNode::Or(operands) => {
            let op = if matches!(node, FuzzNode::And(_)) { "and" } else { "or" };
            let operands: Vec<Value> = operands
                .iter()
                .take(4)
                .map(|o| to_document(o, depth + 1))
                .collect();
            json!({"op": op, "operands": operands})
        }
    }
}

fuzz_target!(|input: FuzzInput| {
    let doc = to_document(&input.tree, 0);

    // 빈 values, 잘못된 regex 등은 에러로 끝나야 함
    let Ok(checker) = Checker::from_document(&doc) else {
        return;
    };

    let event = json!({
        "level": input.level,
        "msg": input.msg,
        "meta": {"nested": input.nested},
    });
    let verdict = checker.evaluate(&event);

    // not(x)는 항상 x의 반대
    let negated = json!({"op": "not", "operands": [doc]});
    let Ok(Some(root)) = TreeBuilder::new().build(&negated) else {
        panic!("negation of a valid tree must build");
    };
    assert_eq!(root.evaluate(&event), !verdict);
});
