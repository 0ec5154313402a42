//! Timing-event sources the collector subscribes to
//!
//! A source gets an [`EventSink`] on subscribe and hands back a [`Subscription`]
//! that detaches it when cancelled or dropped. Sinks only hold a weak reference
//! to the collector, so a forgotten subscription never keeps it alive.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{interval_at, Instant as TokioInstant};
use tracing::debug;

use crate::common::constants::*;
use super::errors::SourceError;
use super::events::TimingEvent;

/// Receiver side of a sink
pub trait EventHandler: Send + Sync {
    fn handle_event(&self, event: TimingEvent);
}

#[derive(Clone)]
pub struct EventSink {
    handler: Weak<dyn EventHandler>,
}

impl EventSink {
    pub fn new(handler: Weak<dyn EventHandler>) -> Self {
        Self { handler }
    }

    /// Deliver an event. Returns false once the collector is gone.
    pub fn emit(&self, event: TimingEvent) -> bool {
        match self.handler.upgrade() {
            Some(handler) => {
                handler.handle_event(event);
                true
            }
            None => false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.handler.strong_count() == 0
    }
}

/// Live registration with a source; detaches on cancel or drop
pub struct Subscription {
    source: &'static str,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(source: &'static str, cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            source,
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn from_task(source: &'static str, handle: tokio::task::JoinHandle<()>) -> Self {
        Self::new(source, move || handle.abort())
    }

    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
            debug!("🔌 Detached timing source {}", self.source);
        }
    }
}

pub trait TimingSource: Send + Sync {
    fn name(&self) -> &'static str;
    fn subscribe(&self, sink: EventSink) -> Result<Subscription, SourceError>;
}

#[derive(Default)]
struct BusListeners {
    next_id: u64,
    sinks: Vec<(u64, EventSink)>,
}

/// In-process timing-event source. `publish` delivers synchronously to every subscriber.
#[derive(Clone, Default)]
pub struct TimingEventBus {
    listeners: Arc<Mutex<BusListeners>>,
}

impl TimingEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish an event, returning how many live subscribers received it
    pub fn publish(&self, event: TimingEvent) -> usize {
        // Deliver outside the lock so a handler may subscribe or cancel re-entrantly
        let sinks: Vec<EventSink> = {
            let listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
            listeners.sinks.iter().map(|(_, sink)| sink.clone()).collect()
        };
        sinks.iter().filter(|sink| sink.emit(event.clone())).count()
    }

    pub fn subscriber_count(&self) -> usize {
        let listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        listeners.sinks.iter().filter(|(_, sink)| !sink.is_closed()).count()
    }
}

impl TimingSource for TimingEventBus {
    fn name(&self) -> &'static str {
        "timing_event_bus"
    }

    fn subscribe(&self, sink: EventSink) -> Result<Subscription, SourceError> {
        let id = {
            let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
            let id = listeners.next_id;
            listeners.next_id += 1;
            listeners.sinks.push((id, sink));
            id
        };

        let listeners = Arc::downgrade(&self.listeners);
        Ok(Subscription::new(self.name(), move || {
            if let Some(listeners) = listeners.upgrade() {
                let mut listeners = listeners.lock().unwrap_or_else(|e| e.into_inner());
                listeners.sinks.retain(|(sink_id, _)| *sink_id != id);
            }
        }))
    }
}

/// Heap figures reported by a probe, in bytes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeapSnapshot {
    pub used_bytes: u64,
    pub total_bytes: u64,
    pub limit_bytes: Option<u64>,
}

#[cfg_attr(test, mockall::automock)]
pub trait HeapProbe: Send + Sync {
    /// Current figures, or `None` when the runtime does not expose them
    fn sample(&self) -> Option<HeapSnapshot>;
}

/// Reads resident and virtual size from `/proc/self/status`
#[derive(Debug, Clone, Default)]
pub struct ProcHeapProbe;

impl ProcHeapProbe {
    const STATUS_PATH: &'static str = "/proc/self/status";

    /// Probe for support; fails on platforms without procfs
    pub fn detect() -> Result<Self, SourceError> {
        let status = std::fs::read_to_string(Self::STATUS_PATH)?;
        if parse_proc_status(&status).is_none() {
            return Err(SourceError::Unsupported("procfs memory fields".to_string()));
        }
        Ok(Self)
    }
}

impl HeapProbe for ProcHeapProbe {
    fn sample(&self) -> Option<HeapSnapshot> {
        let status = std::fs::read_to_string(Self::STATUS_PATH).ok()?;
        parse_proc_status(&status)
    }
}

fn parse_proc_status(status: &str) -> Option<HeapSnapshot> {
    let field_kb = |name: &str| -> Option<u64> {
        status
            .lines()
            .find_map(|line| line.strip_prefix(name))
            .and_then(|rest| rest.trim().trim_end_matches("kB").trim().parse::<u64>().ok())
    };
    let used = field_kb("VmRSS:")?;
    let total = field_kb("VmSize:")?;
    Some(HeapSnapshot {
        used_bytes: used * 1024,
        total_bytes: total * 1024,
        limit_bytes: None,
    })
}

/// Periodically samples a heap probe. Stops by itself after `cutoff`.
pub struct MemorySampler {
    probe: Arc<dyn HeapProbe>,
    interval: Duration,
    cutoff: Duration,
}

impl MemorySampler {
    pub fn new(probe: Arc<dyn HeapProbe>) -> Self {
        Self {
            probe,
            interval: Duration::from_secs(DEFAULT_MEMORY_SAMPLE_INTERVAL_SECONDS),
            cutoff: Duration::from_secs(DEFAULT_MEMORY_SAMPLING_CUTOFF_SECONDS),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn with_cutoff(mut self, cutoff: Duration) -> Self {
        self.cutoff = cutoff;
        self
    }
}

impl TimingSource for MemorySampler {
    fn name(&self) -> &'static str {
        "memory_sampler"
    }

    fn subscribe(&self, sink: EventSink) -> Result<Subscription, SourceError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| SourceError::NoRuntime(self.name()))?;

        let probe = self.probe.clone();
        let period = self.interval;
        let cutoff = self.cutoff;

        let handle = runtime.spawn(async move {
            let started = TokioInstant::now();
            let mut ticker = interval_at(started + period, period);

            loop {
                ticker.tick().await;
                if started.elapsed() > cutoff {
                    debug!("⏹️ Memory sampling reached its {:?} cutoff", cutoff);
                    break;
                }

                let Some(snapshot) = probe.sample() else {
                    continue;
                };
                if !sink.emit(TimingEvent::Memory(snapshot)) {
                    break;
                }
            }
        });

        Ok(Subscription::from_task(self.name(), handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingHandler {
        seen: AtomicUsize,
    }

    impl EventHandler for CountingHandler {
        fn handle_event(&self, _event: TimingEvent) {
            self.seen.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn sink_for(handler: &Arc<CountingHandler>) -> EventSink {
        let weak: Weak<dyn EventHandler> = Arc::downgrade(handler) as Weak<CountingHandler>;
        EventSink::new(weak)
    }

    #[test]
    fn test_bus_delivers_until_cancelled() {
        let bus = TimingEventBus::new();
        let handler = Arc::new(CountingHandler::default());
        let subscription = bus.subscribe(sink_for(&handler)).unwrap();

        assert_eq!(bus.publish(TimingEvent::LoadComplete), 1);
        assert_eq!(handler.seen.load(Ordering::SeqCst), 1);

        subscription.cancel();
        assert_eq!(bus.publish(TimingEvent::LoadComplete), 0);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(handler.seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_sink_reports_dropped_handler() {
        let handler = Arc::new(CountingHandler::default());
        let sink = sink_for(&handler);
        drop(handler);
        assert!(sink.is_closed());
        assert!(!sink.emit(TimingEvent::LoadComplete));
    }

    #[test]
    fn test_parse_proc_status() {
        let status = "Name:\tapp\nVmSize:\t  204800 kB\nVmRSS:\t   51200 kB\n";
        let snapshot = parse_proc_status(status).unwrap();
        assert_eq!(snapshot.used_bytes, 51200 * 1024);
        assert_eq!(snapshot.total_bytes, 204800 * 1024);
        assert!(parse_proc_status("Name:\tapp\n").is_none());
    }

    #[test]
    fn test_memory_sampler_requires_runtime() {
        let probe = MockHeapProbe::new();
        let sampler = MemorySampler::new(Arc::new(probe));
        let handler = Arc::new(CountingHandler::default());
        let result = sampler.subscribe(sink_for(&handler));
        assert!(matches!(result, Err(SourceError::NoRuntime("memory_sampler"))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_memory_sampler_ticks_and_skips_missing_figures() {
        let mut probe = MockHeapProbe::new();
        let mut calls = 0;
        probe.expect_sample().returning(move || {
            calls += 1;
            (calls % 2 == 0).then_some(HeapSnapshot {
                used_bytes: 1024,
                total_bytes: 4096,
                limit_bytes: Some(8192),
            })
        });

        let sampler = MemorySampler::new(Arc::new(probe)).with_interval(Duration::from_secs(30));
        let handler = Arc::new(CountingHandler::default());
        let _subscription = sampler.subscribe(sink_for(&handler)).unwrap();

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(handler.seen.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(92)).await;
        // Ticks at 30s, 60s, 90s, 120s; only even calls report figures
        assert_eq!(handler.seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_memory_sampler_stops_at_cutoff() {
        let mut probe = MockHeapProbe::new();
        probe.expect_sample().returning(|| {
            Some(HeapSnapshot { used_bytes: 1, total_bytes: 2, limit_bytes: None })
        });

        let sampler = MemorySampler::new(Arc::new(probe))
            .with_interval(Duration::from_secs(30))
            .with_cutoff(Duration::from_secs(60));
        let handler = Arc::new(CountingHandler::default());
        let _subscription = sampler.subscribe(sink_for(&handler)).unwrap();

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(handler.seen.load(Ordering::SeqCst), 2);
    }
}
