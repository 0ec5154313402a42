use std::sync::Arc;

use perf_telemetry::performance::{
    CollectorConfig, NavigationTiming, PerformanceCollector, ResourceTiming, TimingEventBus, TimingSource,
};
use perf_telemetry::logging::init_console_logging;
use perf_telemetry::preferences::{MemoryPreferenceStore, PreferenceStore};

/// Collector with an in-memory preference store and no attached sources
pub fn create_test_collector(enabled: bool) -> PerformanceCollector {
    create_collector_with_store(enabled, Arc::new(MemoryPreferenceStore::new()))
}

pub fn create_collector_with_store(enabled: bool, store: Arc<dyn PreferenceStore>) -> PerformanceCollector {
    // Only the first test in the binary installs the subscriber
    let _ = init_console_logging("warn");
    let config = CollectorConfig {
        development_mode: enabled,
        ..Default::default()
    };
    PerformanceCollector::new(config, store, Vec::new())
}

/// Enabled collector listening on a fresh event bus
pub fn create_bus_collector() -> (PerformanceCollector, TimingEventBus) {
    let bus = TimingEventBus::new();
    let sources: Vec<Arc<dyn TimingSource>> = vec![Arc::new(bus.clone())];
    let config = CollectorConfig {
        development_mode: true,
        ..Default::default()
    };
    let collector = PerformanceCollector::new(config, Arc::new(MemoryPreferenceStore::new()), sources);
    (collector, bus)
}

pub fn create_sample_navigation() -> NavigationTiming {
    NavigationTiming {
        fetch_start: 0.0,
        domain_lookup_start: 1.0,
        domain_lookup_end: 21.0,
        connect_start: 21.0,
        connect_end: 61.0,
        request_start: 62.0,
        response_end: 262.0,
        dom_complete: 1262.0,
        load_event_end: 3500.0,
    }
}

pub fn create_sample_resource(name: &str, transfer_size: u64, duration: f64) -> ResourceTiming {
    ResourceTiming {
        name: name.to_string(),
        transfer_size,
        duration,
    }
}

pub const SAMPLE_EVENTS_JSONL: &str = include_str!("events.jsonl");
