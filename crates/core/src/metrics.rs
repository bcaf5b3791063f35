//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()` 등의 매크로를 호출합니다.
//! 익스포터는 설치하지 않으며, 레코더가 없으면 매크로 호출은 no-op입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `sluice_`
//! - 접미어: `_total` (counter), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(sluice_core::metrics::EVENTS_PROCESSED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 파이프라인 이름 레이블 키
pub const LABEL_PIPELINE: &str = "pipeline";

/// 리로드 결과 레이블 키 (unchanged, replaced)
pub const LABEL_OUTCOME: &str = "outcome";

// ─── 파이프라인 메트릭 ──────────────────────────────────────────────

/// 처리된 이벤트 수 (counter, label: pipeline)
pub const EVENTS_PROCESSED_TOTAL: &str = "sluice_events_processed_total";

/// 액션에 의해 버려진 이벤트 수 (counter, label: pipeline)
pub const EVENTS_DISCARDED_TOTAL: &str = "sluice_events_discarded_total";

/// 조건 트리 구성 실패 수 (counter)
pub const CONDITION_BUILD_ERRORS_TOTAL: &str = "sluice_condition_build_errors_total";

/// 설정 리로드 수 (counter, label: pipeline, outcome)
pub const PIPELINE_RELOADS_TOTAL: &str = "sluice_pipeline_reloads_total";

/// 실행 중인 워커 수 (gauge, label: pipeline)
pub const PIPELINE_WORKERS: &str = "sluice_pipeline_workers";

/// 모든 메트릭의 설명을 등록합니다.
///
/// 레코더 설치 직후 한 번 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    describe_counter!(
        EVENTS_PROCESSED_TOTAL,
        "Total events that went through an action chain"
    );
    describe_counter!(
        EVENTS_DISCARDED_TOTAL,
        "Total events dropped by a discard action"
    );
    describe_counter!(
        CONDITION_BUILD_ERRORS_TOTAL,
        "Total condition documents rejected by the tree builder"
    );
    describe_counter!(
        PIPELINE_RELOADS_TOTAL,
        "Total pipeline reload attempts by outcome"
    );
    describe_gauge!(PIPELINE_WORKERS, "Number of running pipeline workers");
}
