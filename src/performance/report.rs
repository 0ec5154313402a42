//! Point-in-time health report over the buffered metrics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::constants::*;
use super::record::{MetricCategory, MetricRecord};
use super::thresholds::Thresholds;

const API_RECOMMENDATION: &str =
    "Consider caching API responses or optimizing slow endpoints";
const RENDER_RECOMMENDATION: &str =
    "Consider memoizing expensive components to avoid unnecessary re-renders";
const MEMORY_RECOMMENDATION: &str =
    "Check for memory leaks and consider lazy loading heavy modules";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub total_metrics: usize,
    pub avg_api_response: f64,
    pub avg_component_render: f64,
    pub current_memory_usage: f64,
    /// 0-100
    pub performance_score: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub generated_at: DateTime<Utc>,
    pub metrics: Vec<MetricRecord>,
    pub summary: PerformanceSummary,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

impl PerformanceReport {
    /// Aggregate a snapshot of the buffer. Never touches the buffer itself.
    pub fn generate(metrics: Vec<MetricRecord>, thresholds: &Thresholds) -> Self {
        let avg_api_response = average(&metrics, MetricCategory::Api);
        let avg_component_render = average(&metrics, MetricCategory::Render);
        let current_memory_usage = metrics
            .iter()
            .rev()
            .find(|r| r.name() == METRIC_MEMORY_USAGE)
            .map(|r| r.value())
            .unwrap_or(0.0);

        let mut score = PERFECT_SCORE;
        let mut issues = Vec::new();
        let mut recommendations = Vec::new();

        if avg_api_response > thresholds.api_response_time {
            score -= API_SCORE_PENALTY;
            issues.push(format!(
                "Average API response time ({:.2}ms) exceeds threshold ({}ms)",
                avg_api_response, thresholds.api_response_time
            ));
            recommendations.push(API_RECOMMENDATION.to_string());
        }

        if avg_component_render > thresholds.component_render_time {
            score -= RENDER_SCORE_PENALTY;
            issues.push(format!(
                "Average component render time ({:.2}ms) exceeds threshold ({}ms)",
                avg_component_render, thresholds.component_render_time
            ));
            recommendations.push(RENDER_RECOMMENDATION.to_string());
        }

        if current_memory_usage > thresholds.memory_usage {
            score -= MEMORY_SCORE_PENALTY;
            issues.push(format!(
                "Memory usage ({:.2}MB) exceeds threshold ({:.2}MB)",
                current_memory_usage / 1_048_576.0,
                thresholds.memory_usage / 1_048_576.0
            ));
            recommendations.push(MEMORY_RECOMMENDATION.to_string());
        }

        Self {
            generated_at: Utc::now(),
            summary: PerformanceSummary {
                total_metrics: metrics.len(),
                avg_api_response,
                avg_component_render,
                current_memory_usage,
                performance_score: score.clamp(0, PERFECT_SCORE) as u8,
            },
            metrics,
            issues,
            recommendations,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn average(metrics: &[MetricRecord], category: MetricCategory) -> f64 {
    let (sum, count) = metrics
        .iter()
        .filter(|r| r.category() == category)
        .fold((0.0, 0usize), |(sum, count), r| (sum + r.value(), count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, value: f64, category: MetricCategory) -> MetricRecord {
        MetricRecord::new(name, value, 0.0, category, None)
    }

    #[test]
    fn test_empty_buffer_is_perfect() {
        let report = PerformanceReport::generate(Vec::new(), &Thresholds::default());
        assert_eq!(report.summary.performance_score, 100);
        assert_eq!(report.summary.avg_api_response, 0.0);
        assert!(report.issues.is_empty());
        assert!(report.recommendations.is_empty());
        assert!(report.is_healthy());
    }

    #[test]
    fn test_slow_api_deducts_twenty() {
        let report = PerformanceReport::generate(
            vec![record("api_call", 2500.0, MetricCategory::Api)],
            &Thresholds::default(),
        );
        assert_eq!(report.summary.performance_score, 80);
        assert_eq!(report.issues.len(), 1);
        assert!(report.issues[0].contains("2500.00ms"));
        assert_eq!(report.recommendations, vec![API_RECOMMENDATION.to_string()]);
    }

    #[test]
    fn test_memory_uses_latest_sample() {
        let thresholds = Thresholds::default();
        let report = PerformanceReport::generate(
            vec![
                record("memory_usage", 60.0 * 1024.0 * 1024.0, MetricCategory::Resource),
                record("memory_usage", 10.0 * 1024.0 * 1024.0, MetricCategory::Resource),
            ],
            &thresholds,
        );
        assert_eq!(report.summary.current_memory_usage, 10.0 * 1024.0 * 1024.0);
        assert_eq!(report.summary.performance_score, 100);
    }

    #[test]
    fn test_all_deductions_compound() {
        let report = PerformanceReport::generate(
            vec![
                record("api_call", 5000.0, MetricCategory::Api),
                record("component_render", 250.0, MetricCategory::Render),
                record("memory_usage", 1e9, MetricCategory::Resource),
            ],
            &Thresholds::default(),
        );
        assert_eq!(report.summary.performance_score, 30);
        assert_eq!(report.issues.len(), 3);
        assert_eq!(
            report.recommendations,
            vec![API_RECOMMENDATION, RENDER_RECOMMENDATION, MEMORY_RECOMMENDATION]
        );
        assert_eq!(report.summary.total_metrics, 3);
    }

    #[test]
    fn test_average_is_per_category_not_per_name() {
        let report = PerformanceReport::generate(
            vec![
                record("api_call", 1000.0, MetricCategory::Api),
                record("checkout_request", 3000.0, MetricCategory::Api),
                record("api_call", 9999.0, MetricCategory::User),
            ],
            &Thresholds::default(),
        );
        assert_eq!(report.summary.avg_api_response, 2000.0);
        assert_eq!(report.summary.performance_score, 100);
    }

    #[test]
    fn test_report_serializes_summary_fields() {
        let report = PerformanceReport::generate(Vec::new(), &Thresholds::default());
        let json: serde_json::Value = serde_json::from_str(&report.to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["summary"]["performance_score"], 100);
        assert!(json["generated_at"].is_string());
    }
}
