//! Instrumentation hooks for application code

use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tracing::debug;

use crate::common::constants::*;
use super::events::MetricDraft;
use super::record::{metadata, MetricCategory};
use super::{lock, PerformanceCollector, TimingEvent};

static NEXT_RENDER_INSTANCE: AtomicU64 = AtomicU64::new(0);

impl PerformanceCollector {
    /// Mark the start of a named interval. Restarting a name resets its start.
    /// At most `MAX_PENDING_MEASURES` starts are held; the oldest is evicted first.
    pub fn start_measure(&self, name: &str) {
        if !self.is_enabled() {
            return;
        }
        let mut measures = lock(&self.state.measures);
        if measures.len() >= MAX_PENDING_MEASURES && !measures.contains_key(name) {
            let oldest = measures
                .iter()
                .min_by_key(|(_, started)| **started)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                measures.remove(&oldest);
                debug!("Evicted unfinished measure {}", oldest);
            }
        }
        measures.insert(name.to_string(), Instant::now());
    }

    /// Close a named interval and record it as a `user` metric.
    /// Returns the elapsed milliseconds, or 0 when there was no matching start.
    pub fn end_measure(&self, name: &str) -> f64 {
        self.close_measure(name, name).unwrap_or(0.0)
    }

    /// Close the interval started under `key` and record it as `name`.
    /// `None` when nothing was open under `key` or collection is off.
    pub(crate) fn close_measure(&self, key: &str, name: &str) -> Option<f64> {
        let Some(started) = lock(&self.state.measures).remove(key) else {
            debug!("end_measure({}) without a matching start", key);
            return None;
        };
        if !self.is_enabled() {
            return None;
        }

        let duration = started.elapsed().as_secs_f64() * 1000.0;
        self.handle_event(TimingEvent::Measure {
            name: name.to_string(),
            duration,
        });
        Some(duration)
    }

    pub fn track_api_call(&self, url: &str, duration: f64, success: bool) {
        self.state.record(
            MetricDraft::new(METRIC_API_CALL, duration, MetricCategory::Api).with_metadata(metadata([
                ("url", serde_json::Value::from(url)),
                ("success", success.into()),
            ])),
        );
    }

    pub fn track_component_render(&self, component: &str, duration: f64) {
        self.state.record(
            MetricDraft::new(METRIC_COMPONENT_RENDER, duration, MetricCategory::Render)
                .with_metadata(metadata([("component", component)])),
        );
    }

    /// A missing duration records a discrete event with value 0
    pub fn track_user_interaction(&self, action: &str, duration: Option<f64>) {
        self.state.record(
            MetricDraft::new(METRIC_USER_INTERACTION, duration.unwrap_or(0.0), MetricCategory::User)
                .with_metadata(metadata([("action", action)])),
        );
    }
}

/// A UI unit that can be rendered repeatedly
pub trait Renderable {
    type Props;
    type Output;

    fn display_name(&self) -> Cow<'_, str>;
    fn render(&mut self, props: &Self::Props) -> Self::Output;
}

/// Wraps a [`Renderable`] and records the interval between successive commits.
///
/// Each render closes the measure opened by the previous commit (its cleanup)
/// before delegating, then opens a new one. Dropping the wrapper is the final
/// teardown. The recorded value is therefore the inter-render interval rather
/// than the cost of `render` itself. A cycle whose start was discarded (by
/// `disable`, or by eviction) records nothing.
///
/// Each wrapper times itself under its own key, so several mounted instances
/// of one component never share a start. All of them report the measure as
/// `<name>-render`.
pub struct RenderTracked<R: Renderable> {
    inner: R,
    name: String,
    measure_name: String,
    measure_key: String,
    collector: PerformanceCollector,
    committed: bool,
}

impl<R: Renderable> RenderTracked<R> {
    pub fn display_name(&self) -> &str {
        &self.name
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    fn cleanup(&mut self) {
        if !std::mem::take(&mut self.committed) {
            return;
        }
        if let Some(duration) = self.collector.close_measure(&self.measure_key, &self.measure_name) {
            self.collector.track_component_render(&self.name, duration);
        }
    }
}

impl<R: Renderable> Renderable for RenderTracked<R> {
    type Props = R::Props;
    type Output = R::Output;

    fn display_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn render(&mut self, props: &Self::Props) -> Self::Output {
        self.cleanup();
        let output = self.inner.render(props);
        self.collector.start_measure(&self.measure_key);
        self.committed = true;
        output
    }
}

impl<R: Renderable> Drop for RenderTracked<R> {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Wrap `inner` so each commit cycle is reported as `component_render`
pub fn with_performance_tracking<R: Renderable>(
    inner: R,
    collector: &PerformanceCollector,
    display_name: Option<&str>,
) -> RenderTracked<R> {
    let name = display_name
        .map(str::to_string)
        .unwrap_or_else(|| inner.display_name().into_owned());
    let measure_name = format!("{}-render", name);
    let instance = NEXT_RENDER_INSTANCE.fetch_add(1, Ordering::Relaxed);
    RenderTracked {
        measure_key: format!("{}#{}", measure_name, instance),
        measure_name,
        name,
        inner,
        collector: collector.clone(),
        committed: false,
    }
}
