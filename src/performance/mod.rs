//! Performance telemetry collector
//!
//! Subscribes to timing-event sources, keeps a bounded buffer of metric
//! records, checks each new record against the threshold table and builds
//! health reports on demand. Collection only happens while the lifecycle
//! switch is on; every public operation is infallible so instrumentation can
//! never change the behavior of the code it observes.

pub mod buffer;
pub mod errors;
pub mod events;
pub mod hooks;
pub mod lifecycle;
pub mod record;
pub mod report;
pub mod sources;
pub mod thresholds;

pub use buffer::MetricBuffer;
pub use errors::SourceError;
pub use events::{MetricDraft, NavigationTiming, ResourceFilter, ResourceTiming, ResourceType, TimingEvent};
pub use hooks::{with_performance_tracking, RenderTracked, Renderable};
pub use lifecycle::LifecycleManager;
pub use record::{metadata, Metadata, MetricCategory, MetricRecord};
pub use report::{PerformanceReport, PerformanceSummary};
pub use sources::{
    EventHandler, EventSink, HeapProbe, HeapSnapshot, MemorySampler, ProcHeapProbe, Subscription,
    TimingEventBus, TimingSource,
};
pub use thresholds::{ThresholdKey, ThresholdOverrides, ThresholdViolation, Thresholds};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, Weak};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::common::constants::*;
use crate::preferences::PreferenceStore;

/// Collector configuration
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Development builds collect by default (default: debug_assertions)
    pub development_mode: bool,
    /// Maximum records retained (default: 1000)
    pub buffer_capacity: usize,
    /// Resource loads at or under both cutoffs are ignored
    pub resource_filter: ResourceFilter,
    /// Cadence of the memory sampler (default: 30s)
    pub memory_sample_interval: Duration,
    /// Memory sampling stops after this long (default: 1h)
    pub memory_sampling_cutoff: Duration,
    /// Applied on top of the default threshold table
    pub thresholds: ThresholdOverrides,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            development_mode: cfg!(debug_assertions),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            resource_filter: ResourceFilter::default(),
            memory_sample_interval: Duration::from_secs(DEFAULT_MEMORY_SAMPLE_INTERVAL_SECONDS),
            memory_sampling_cutoff: Duration::from_secs(DEFAULT_MEMORY_SAMPLING_CUTOFF_SECONDS),
            thresholds: ThresholdOverrides::default(),
        }
    }
}

impl CollectorConfig {
    /// Sources a host normally attaches: the given event bus plus a memory
    /// sampler when the platform exposes heap figures.
    pub fn default_sources(&self, bus: &TimingEventBus) -> Vec<Arc<dyn TimingSource>> {
        let mut sources: Vec<Arc<dyn TimingSource>> = vec![Arc::new(bus.clone())];
        match ProcHeapProbe::detect() {
            Ok(probe) => sources.push(Arc::new(
                MemorySampler::new(Arc::new(probe))
                    .with_interval(self.memory_sample_interval)
                    .with_cutoff(self.memory_sampling_cutoff),
            )),
            Err(e) => debug!("Memory introspection unavailable, skipping sampler: {}", e),
        }
        sources
    }
}

struct CollectorState {
    origin: Instant,
    resource_filter: ResourceFilter,
    buffer: Mutex<MetricBuffer>,
    thresholds: RwLock<Thresholds>,
    lifecycle: LifecycleManager,
    measures: Mutex<FxHashMap<String, Instant>>,
    sources: Vec<Arc<dyn TimingSource>>,
    /// `None` while not subscribed
    subscriptions: Mutex<Option<Vec<Subscription>>>,
    page_load_recorded: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl CollectorState {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }

    fn thresholds(&self) -> Thresholds {
        *self.thresholds.read().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, draft: MetricDraft) {
        if !self.lifecycle.is_enabled() {
            return;
        }

        let thresholds = self.thresholds();
        let violation = {
            let mut buffer = lock(&self.buffer);
            // Stamped under the lock so timestamps follow insertion order
            let record = MetricRecord::new(draft.name, draft.value, self.now_ms(), draft.category, draft.metadata);
            let violation = thresholds::evaluate(&record, &thresholds);
            buffer.push(record);
            violation
        };

        if let Some(v) = violation {
            warn!(
                metric = %v.metric,
                threshold = v.key.as_str(),
                value = v.value,
                limit = v.limit,
                "⚠️ Performance threshold exceeded"
            );
        }
    }

    fn start_subscriptions(self: &Arc<Self>) {
        if lock(&self.subscriptions).is_some() {
            return;
        }

        let handler: Weak<dyn EventHandler> = Arc::downgrade(self) as Weak<CollectorState>;
        let mut attached = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            match source.subscribe(EventSink::new(handler.clone())) {
                Ok(subscription) => attached.push(subscription),
                Err(e) => debug!("Timing source {} unavailable: {}", source.name(), e),
            }
        }

        let mut subscriptions = lock(&self.subscriptions);
        if subscriptions.is_none() {
            debug!("🔌 Attached {}/{} timing sources", attached.len(), self.sources.len());
            *subscriptions = Some(attached);
        }
        // Otherwise a concurrent start won; `attached` drops after the guard and detaches
    }

    fn stop_subscriptions(&self) {
        let detached = lock(&self.subscriptions).take();
        drop(detached);
    }
}

impl EventHandler for CollectorState {
    fn handle_event(&self, event: TimingEvent) {
        match event {
            TimingEvent::Navigation(entry) => {
                for draft in events::decompose_navigation(&entry) {
                    self.record(draft);
                }
            }
            TimingEvent::Resource(resource) => {
                if let Some(draft) = events::translate_resource(&resource, &self.resource_filter) {
                    self.record(draft);
                }
            }
            TimingEvent::Measure { name, duration } => {
                self.record(events::translate_measure(&name, duration));
            }
            TimingEvent::Memory(snapshot) => {
                self.record(events::translate_memory(&snapshot));
            }
            TimingEvent::LoadComplete => {
                if self.lifecycle.is_enabled() && !self.page_load_recorded.swap(true, Ordering::AcqRel) {
                    self.record(MetricDraft::new(METRIC_INITIAL_PAGE_LOAD, self.now_ms(), MetricCategory::Navigation));
                }
            }
        }
    }
}

/// Handle to the collector. Clones share the same buffer and lifecycle.
#[derive(Clone)]
pub struct PerformanceCollector {
    state: Arc<CollectorState>,
}

impl PerformanceCollector {
    /// Create a collector. If the lifecycle starts enabled, sources are attached immediately.
    pub fn new(
        config: CollectorConfig,
        preferences: Arc<dyn PreferenceStore>,
        sources: Vec<Arc<dyn TimingSource>>,
    ) -> Self {
        let mut thresholds = Thresholds::default();
        thresholds.merge(&config.thresholds);

        let state = Arc::new(CollectorState {
            origin: Instant::now(),
            resource_filter: config.resource_filter,
            buffer: Mutex::new(MetricBuffer::new(config.buffer_capacity)),
            thresholds: RwLock::new(thresholds),
            lifecycle: LifecycleManager::new(config.development_mode, preferences),
            measures: Mutex::new(FxHashMap::default()),
            sources,
            subscriptions: Mutex::new(None),
            page_load_recorded: AtomicBool::new(false),
        });

        if state.lifecycle.is_enabled() {
            state.start_subscriptions();
        }
        info!(
            enabled = state.lifecycle.is_enabled(),
            capacity = config.buffer_capacity,
            "📊 Performance collector created"
        );

        Self { state }
    }

    /// Record a metric. No-op while disabled.
    pub fn add_metric(
        &self,
        name: impl Into<String>,
        value: f64,
        category: MetricCategory,
        metadata: Option<Metadata>,
    ) {
        self.state.record(MetricDraft {
            name: name.into(),
            value,
            category,
            metadata,
        });
    }

    /// Translate and record a raw timing event, as a subscribed source would
    pub fn handle_event(&self, event: TimingEvent) {
        self.state.handle_event(event);
    }

    /// Snapshot of the buffer in insertion order, optionally filtered by category
    pub fn get_metrics(&self, category: Option<MetricCategory>) -> Vec<MetricRecord> {
        lock(&self.state.buffer).snapshot(category)
    }

    pub fn metric_count(&self) -> usize {
        lock(&self.state.buffer).len()
    }

    pub fn get_report(&self) -> PerformanceReport {
        let thresholds = self.state.thresholds();
        let metrics = self.get_metrics(None);
        PerformanceReport::generate(metrics, &thresholds)
    }

    pub fn clear_metrics(&self) {
        lock(&self.state.buffer).clear();
    }

    pub fn set_thresholds(&self, overrides: ThresholdOverrides) {
        let mut thresholds = self.state.thresholds.write().unwrap_or_else(|e| e.into_inner());
        thresholds.merge(&overrides);
        debug!("Thresholds updated: {:?}", *thresholds);
    }

    pub fn thresholds(&self) -> Thresholds {
        self.state.thresholds()
    }

    pub fn is_enabled(&self) -> bool {
        self.state.lifecycle.is_enabled()
    }

    /// Persist the preference and attach sources if they are not attached yet
    pub fn enable(&self) {
        self.state.lifecycle.enable();
        self.state.start_subscriptions();
    }

    /// Clear the preference and detach every source. Safe to call repeatedly.
    pub fn disable(&self) {
        self.state.lifecycle.disable();
        self.state.stop_subscriptions();
        lock(&self.state.measures).clear();
    }

    /// Detach sources and drop pending measures without touching the persisted preference
    pub fn destroy(&self) {
        self.state.stop_subscriptions();
        lock(&self.state.measures).clear();
        debug!("Performance collector destroyed");
    }

    pub fn active_subscriptions(&self) -> usize {
        lock(&self.state.subscriptions).as_ref().map_or(0, Vec::len)
    }
}
