//! Raw timing events and their translation into metric drafts

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::constants::*;
use super::record::{metadata, Metadata, MetricCategory};
use super::sources::HeapSnapshot;

/// Navigation timing entry, all values in milliseconds from the navigation start
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigationTiming {
    pub fetch_start: f64,
    pub domain_lookup_start: f64,
    pub domain_lookup_end: f64,
    pub connect_start: f64,
    pub connect_end: f64,
    pub request_start: f64,
    pub response_end: f64,
    pub dom_complete: f64,
    pub load_event_end: f64,
}

/// One completed resource load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceTiming {
    pub name: String,
    pub transfer_size: u64,
    pub duration: f64,
}

/// Timing signal delivered by a source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimingEvent {
    Navigation(NavigationTiming),
    Resource(ResourceTiming),
    Measure { name: String, duration: f64 },
    Memory(HeapSnapshot),
    LoadComplete,
}

/// A metric before the collector stamps it with a timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDraft {
    pub name: String,
    pub value: f64,
    pub category: MetricCategory,
    pub metadata: Option<Metadata>,
}

impl MetricDraft {
    pub fn new(name: impl Into<String>, value: f64, category: MetricCategory) -> Self {
        Self {
            name: name.into(),
            value,
            category,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Coarse resource type derived from the URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    Javascript,
    Stylesheet,
    Image,
    Api,
    Other,
}

impl ResourceType {
    pub fn classify(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
        let extension = path
            .rsplit('/')
            .next()
            .and_then(|segment| segment.rsplit_once('.'))
            .map(|(_, ext)| ext);

        match extension {
            Some("js") => ResourceType::Javascript,
            Some("css") => ResourceType::Stylesheet,
            Some(ext) if IMAGE_EXTENSIONS.contains(&ext) => ResourceType::Image,
            _ if path.contains(API_PATH_MARKER) => ResourceType::Api,
            _ => ResourceType::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Javascript => "javascript",
            ResourceType::Stylesheet => "stylesheet",
            ResourceType::Image => "image",
            ResourceType::Api => "api",
            ResourceType::Other => "other",
        }
    }
}

/// Cutoffs below which a resource load is not worth recording
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceFilter {
    pub min_transfer_size: u64,
    pub min_duration_ms: f64,
}

impl Default for ResourceFilter {
    fn default() -> Self {
        Self {
            min_transfer_size: RESOURCE_SIZE_THRESHOLD_BYTES,
            min_duration_ms: RESOURCE_DURATION_THRESHOLD_MS,
        }
    }
}

impl ResourceFilter {
    pub fn is_significant(&self, resource: &ResourceTiming) -> bool {
        resource.transfer_size > self.min_transfer_size || resource.duration > self.min_duration_ms
    }
}

fn span(name: &str, start: f64, end: f64) -> MetricDraft {
    let value = end - start;
    if value < 0.0 {
        debug!("⏱️ Out-of-order navigation timing for {} ({} > {}), clamping to 0", name, start, end);
    }
    MetricDraft::new(name, value.max(0.0), MetricCategory::Navigation)
}

/// Split a navigation entry into its five phases
pub fn decompose_navigation(entry: &NavigationTiming) -> [MetricDraft; 5] {
    [
        span(METRIC_DNS_LOOKUP, entry.domain_lookup_start, entry.domain_lookup_end),
        span(METRIC_TCP_CONNECTION, entry.connect_start, entry.connect_end),
        span(METRIC_REQUEST_RESPONSE, entry.request_start, entry.response_end),
        span(METRIC_DOM_PROCESSING, entry.response_end, entry.dom_complete),
        span(METRIC_PAGE_LOAD_COMPLETE, entry.fetch_start, entry.load_event_end),
    ]
}

/// Translate a resource load, or `None` when it falls under the filter
pub fn translate_resource(resource: &ResourceTiming, filter: &ResourceFilter) -> Option<MetricDraft> {
    if !filter.is_significant(resource) {
        return None;
    }
    let resource_type = ResourceType::classify(&resource.name);
    Some(
        MetricDraft::new(METRIC_RESOURCE_LOAD, resource.duration, MetricCategory::Resource).with_metadata(metadata([
            ("name", serde_json::Value::from(resource.name.as_str())),
            ("size", resource.transfer_size.into()),
            ("type", resource_type.as_str().into()),
        ])),
    )
}

/// Named interval from the custom-measure bridge
pub fn translate_measure(name: &str, duration: f64) -> MetricDraft {
    MetricDraft::new(name, duration, MetricCategory::User)
}

/// Heap sample; used bytes are the value, total and limit go to metadata
pub fn translate_memory(snapshot: &HeapSnapshot) -> MetricDraft {
    MetricDraft::new(METRIC_MEMORY_USAGE, snapshot.used_bytes as f64, MetricCategory::Resource).with_metadata(
        metadata([
            ("total", serde_json::Value::from(snapshot.total_bytes)),
            ("limit", snapshot.limit_bytes.into()),
        ]),
    )
}
