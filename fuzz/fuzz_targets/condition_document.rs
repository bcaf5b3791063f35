#![no_main]

use libfuzzer_sys::fuzz_target;
use sluice_pipeline::condition::{Checker, TreeBuilder};

fuzz_target!(|data: &[u8]| {
    let Ok(doc) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };

    // 구성 실패는 에러로만 끝나야 함
    let Ok(Some(root)) = TreeBuilder::new().build(&doc) else {
        return;
    };

    // 같은 문서로 다시 만든 트리는 항상 동일해야 함
    let again = Checker::from_document(&doc).expect("document built once must build again");
    let checker = Checker::new(root);
    assert!(checker.is_equal_to(&again));

    let _ = checker.evaluate(&doc);
});
