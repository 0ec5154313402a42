pub mod common;
pub mod config;
pub mod logging;
pub mod performance;
pub mod preferences;

pub use performance::{
    with_performance_tracking, CollectorConfig, MetricCategory, MetricRecord, PerformanceCollector,
    PerformanceReport, ThresholdOverrides, TimingEvent, TimingEventBus,
};
