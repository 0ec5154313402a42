use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use perf_telemetry::performance::{
    CollectorConfig, MetricCategory, PerformanceCollector, ResourceTiming, TimingEvent,
};
use perf_telemetry::preferences::MemoryPreferenceStore;
use std::sync::Arc;

fn enabled_collector() -> PerformanceCollector {
    let config = CollectorConfig {
        development_mode: true,
        ..Default::default()
    };
    PerformanceCollector::new(config, Arc::new(MemoryPreferenceStore::new()), Vec::new())
}

fn filled_collector(count: usize) -> PerformanceCollector {
    let collector = enabled_collector();
    for i in 0..count {
        match i % 3 {
            0 => collector.track_api_call("/api/items", (i % 2500) as f64, true),
            1 => collector.track_component_render("Grid", (i % 150) as f64),
            _ => collector.add_metric("memory_usage", 40.0 * 1024.0 * 1024.0, MetricCategory::Resource, None),
        }
    }
    collector
}

fn bench_recording(c: &mut Criterion) {
    let mut group = c.benchmark_group("recording");
    group.throughput(Throughput::Elements(100));

    // Buffer already at capacity so every push evicts
    let collector = filled_collector(1000);
    group.bench_function("add_metric_at_capacity", |b| {
        b.iter(|| {
            for i in 0..100 {
                collector.add_metric("tick", black_box(i as f64), MetricCategory::User, None);
            }
        })
    });

    let resource = ResourceTiming {
        name: "https://cdn.example.com/img/banner.png?v=3".to_string(),
        transfer_size: 48_000,
        duration: 35.0,
    };
    group.bench_function("resource_event", |b| {
        b.iter(|| {
            for _ in 0..100 {
                collector.handle_event(black_box(TimingEvent::Resource(resource.clone())));
            }
        })
    });

    group.finish();
}

fn bench_reporting(c: &mut Criterion) {
    let mut group = c.benchmark_group("reporting");

    for size in [10usize, 100, 1000] {
        let collector = filled_collector(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("get_report", size), &collector, |b, collector| {
            b.iter(|| black_box(collector.get_report()))
        });
        group.bench_with_input(BenchmarkId::new("render_filter", size), &collector, |b, collector| {
            b.iter(|| black_box(collector.get_metrics(Some(MetricCategory::Render))))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_recording, bench_reporting);
criterion_main!(benches);
