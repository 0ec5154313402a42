//! Threshold table and the evaluator that inspects each new record against it

use serde::{Deserialize, Serialize};

use crate::common::constants::*;
use super::record::MetricRecord;

/// Keys of the threshold table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdKey {
    ApiResponseTime,
    ComponentRenderTime,
    PageLoadTime,
    MemoryUsage,
}

impl ThresholdKey {
    /// Which threshold governs a metric, if any
    pub fn for_metric(name: &str) -> Option<Self> {
        match name {
            METRIC_API_CALL => Some(ThresholdKey::ApiResponseTime),
            METRIC_COMPONENT_RENDER => Some(ThresholdKey::ComponentRenderTime),
            METRIC_PAGE_LOAD_COMPLETE => Some(ThresholdKey::PageLoadTime),
            METRIC_MEMORY_USAGE => Some(ThresholdKey::MemoryUsage),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThresholdKey::ApiResponseTime => "api_response_time",
            ThresholdKey::ComponentRenderTime => "component_render_time",
            ThresholdKey::PageLoadTime => "page_load_time",
            ThresholdKey::MemoryUsage => "memory_usage",
        }
    }
}

/// Acceptable limits per metric kind (milliseconds, memory in bytes)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub api_response_time: f64,
    pub component_render_time: f64,
    pub page_load_time: f64,
    pub memory_usage: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            api_response_time: DEFAULT_API_RESPONSE_TIME_MS,
            component_render_time: DEFAULT_COMPONENT_RENDER_TIME_MS,
            page_load_time: DEFAULT_PAGE_LOAD_TIME_MS,
            memory_usage: DEFAULT_MEMORY_USAGE_BYTES,
        }
    }
}

impl Thresholds {
    pub fn get(&self, key: ThresholdKey) -> f64 {
        match key {
            ThresholdKey::ApiResponseTime => self.api_response_time,
            ThresholdKey::ComponentRenderTime => self.component_render_time,
            ThresholdKey::PageLoadTime => self.page_load_time,
            ThresholdKey::MemoryUsage => self.memory_usage,
        }
    }

    /// Overwrite only the keys present in `overrides`
    pub fn merge(&mut self, overrides: &ThresholdOverrides) {
        if let Some(v) = overrides.api_response_time {
            self.api_response_time = v;
        }
        if let Some(v) = overrides.component_render_time {
            self.component_render_time = v;
        }
        if let Some(v) = overrides.page_load_time {
            self.page_load_time = v;
        }
        if let Some(v) = overrides.memory_usage {
            self.memory_usage = v;
        }
    }
}

/// Partial update for [`Thresholds`], also the `[thresholds]` config section
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdOverrides {
    pub api_response_time: Option<f64>,
    pub component_render_time: Option<f64>,
    pub page_load_time: Option<f64>,
    pub memory_usage: Option<f64>,
}

impl ThresholdOverrides {
    pub fn is_empty(&self) -> bool {
        self.api_response_time.is_none()
            && self.component_render_time.is_none()
            && self.page_load_time.is_none()
            && self.memory_usage.is_none()
    }
}

/// A record whose value exceeded its threshold
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdViolation {
    pub metric: String,
    pub key: ThresholdKey,
    pub value: f64,
    pub limit: f64,
}

/// Inspect a record against the table. Pure; metrics without a threshold are never flagged.
pub fn evaluate(record: &MetricRecord, thresholds: &Thresholds) -> Option<ThresholdViolation> {
    let key = ThresholdKey::for_metric(record.name())?;
    let limit = thresholds.get(key);
    (record.value() > limit).then(|| ThresholdViolation {
        metric: record.name().to_string(),
        key,
        value: record.value(),
        limit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::performance::record::MetricCategory;

    fn record(name: &str, value: f64) -> MetricRecord {
        MetricRecord::new(name, value, 0.0, MetricCategory::Api, None)
    }

    #[test]
    fn test_default_thresholds() {
        let t = Thresholds::default();
        assert_eq!(t.api_response_time, 2000.0);
        assert_eq!(t.component_render_time, 100.0);
        assert_eq!(t.page_load_time, 3000.0);
        assert_eq!(t.memory_usage, 52_428_800.0);
    }

    #[test]
    fn test_merge_only_overwrites_supplied_keys() {
        let mut t = Thresholds::default();
        t.merge(&ThresholdOverrides {
            api_response_time: Some(500.0),
            ..Default::default()
        });
        assert_eq!(t.api_response_time, 500.0);
        assert_eq!(t.component_render_time, 100.0);
        assert_eq!(t.memory_usage, DEFAULT_MEMORY_USAGE_BYTES);
    }

    #[test]
    fn test_metric_name_mapping() {
        assert_eq!(ThresholdKey::for_metric("api_call"), Some(ThresholdKey::ApiResponseTime));
        assert_eq!(ThresholdKey::for_metric("component_render"), Some(ThresholdKey::ComponentRenderTime));
        assert_eq!(ThresholdKey::for_metric("page_load_complete"), Some(ThresholdKey::PageLoadTime));
        assert_eq!(ThresholdKey::for_metric("memory_usage"), Some(ThresholdKey::MemoryUsage));
        assert_eq!(ThresholdKey::for_metric("initial_page_load"), None);
    }

    #[test]
    fn test_evaluate_flags_only_strict_excess() {
        let t = Thresholds::default();
        assert!(evaluate(&record("api_call", 2000.0), &t).is_none());

        let violation = evaluate(&record("api_call", 2500.0), &t).unwrap();
        assert_eq!(violation.key, ThresholdKey::ApiResponseTime);
        assert_eq!(violation.limit, 2000.0);

        assert!(evaluate(&record("dns_lookup", 1e9), &t).is_none());
    }
}
