//! Engine 벤치마크
//!
//! 큐 목록 파싱, 필터링, 메트릭 추출 성능 측정

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rabbitmq_zabbix::collector::parse_records;
use rabbitmq_zabbix::transformer::{
    DiscoveryFormatter, EntityKind, FilterSpec, MetricExtractor, SenderFormatter,
};
use serde_json::json;

fn queue_listing(count: usize) -> String {
    let queues: Vec<_> = (0..count)
        .map(|i| {
            json!({
                "vhost": if i % 2 == 0 { "/" } else { "prod" },
                "name": format!("queue-{}", i),
                "node": format!("rabbit@host{}", i % 3),
                "durable": i % 4 != 0,
                "memory": 1024 + i,
                "messages": i,
                "messages_unacknowledged": i / 2,
                "consumers": i % 5,
                "message_stats": {"deliver_get": i * 3, "publish": i * 4, "ack": i * 2}
            })
        })
        .collect();
    serde_json::Value::Array(queues).to_string()
}

fn benchmark_parse_records(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_records");

    for count in [10, 100, 1000] {
        let json = queue_listing(count);
        group.bench_with_input(BenchmarkId::new("queues", count), &json, |b, json| {
            b.iter(|| parse_records(json))
        });
    }

    group.finish();
}

fn benchmark_queue_check(c: &mut Criterion) {
    let records = parse_records(&queue_listing(1000)).unwrap();
    let extractor = MetricExtractor::new();
    let formatter = SenderFormatter::new();

    let filters = [
        ("match_all", FilterSpec::default()),
        (
            "single",
            FilterSpec::parse(r#"{"vhost": "/", "durable": true}"#).unwrap(),
        ),
        (
            "any_of",
            FilterSpec::parse(r#"[{"vhost": "prod"}, {"node": "rabbit@host1"}, {"consumers": 0}]"#)
                .unwrap(),
        ),
    ];

    let mut group = c.benchmark_group("queue_check");

    for (name, spec) in &filters {
        group.bench_with_input(BenchmarkId::new("extract", name), spec, |b, spec| {
            b.iter(|| {
                let lines: Vec<_> = records
                    .iter()
                    .filter(|r| spec.matches(r))
                    .flat_map(|r| extractor.extract(r, EntityKind::Queue))
                    .collect();
                formatter.format(&lines)
            })
        });
    }

    group.finish();
}

fn benchmark_discovery(c: &mut Criterion) {
    let records = parse_records(&queue_listing(1000)).unwrap();
    let discovery = DiscoveryFormatter::new();
    let filters = FilterSpec::parse(r#"{"vhost": "/"}"#).unwrap();

    c.bench_function("list_queues_1000", |b| {
        b.iter(|| {
            discovery
                .payload(&records, EntityKind::Queue, &filters)
                .to_json()
        })
    });
}

criterion_group!(
    benches,
    benchmark_parse_records,
    benchmark_queue_check,
    benchmark_discovery
);
criterion_main!(benches);
