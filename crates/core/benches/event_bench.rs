//! 이벤트 필드 조회 벤치마크
//!
//! 이벤트 파싱과 중첩 필드 조회 성능을 측정합니다.

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use serde_json::json;
use sluice_core::event::{Event, EventFields, split_field_path};

fn create_event() -> Event {
    Event::new(
        json!({
            "service": "checkout-api",
            "kubernetes": {
                "namespace": "payments",
                "pod": {"name": "checkout-api-7d9f", "labels": {"app": "checkout"}}
            },
            "log": {"msg": "GET /api/v1/orders HTTP/1.1 200 OK", "level": "info"},
            "duration_ms": 125
        }),
        "bench",
        0,
    )
}

fn bench_event_parsing(c: &mut Criterion) {
    let raw = serde_json::to_vec(&create_event().fields).unwrap();

    let mut group = c.benchmark_group("event_parsing");
    group.throughput(Throughput::Bytes(raw.len() as u64));
    group.bench_function("from_json", |b| {
        b.iter(|| Event::from_json(black_box(&raw), "bench", 0).unwrap())
    });
    group.finish();
}

fn bench_field_lookup(c: &mut Criterion) {
    let event = create_event();
    let shallow = split_field_path("service");
    let deep = split_field_path("kubernetes.pod.labels.app");
    let numeric = split_field_path("duration_ms");
    let missing = split_field_path("kubernetes.node.name");

    let mut group = c.benchmark_group("field_lookup");
    group.throughput(Throughput::Elements(1));

    group.bench_function("shallow_string", |b| {
        b.iter(|| black_box(&event).field_bytes(black_box(&shallow)))
    });
    group.bench_function("deep_string", |b| {
        b.iter(|| black_box(&event).field_bytes(black_box(&deep)))
    });
    group.bench_function("number_encoded", |b| {
        b.iter(|| black_box(&event).field_bytes(black_box(&numeric)))
    });
    group.bench_function("missing", |b| {
        b.iter(|| black_box(&event).field_bytes(black_box(&missing)))
    });

    group.finish();
}

criterion_group!(benches, bench_event_parsing, bench_field_lookup);
criterion_main!(benches);
