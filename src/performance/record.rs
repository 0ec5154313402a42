use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Auxiliary context attached to a record. Never aggregated.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Partition tag for metric records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricCategory {
    Navigation,
    Api,
    Render,
    User,
    Resource,
}

impl MetricCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricCategory::Navigation => "navigation",
            MetricCategory::Api => "api",
            MetricCategory::Render => "render",
            MetricCategory::User => "user",
            MetricCategory::Resource => "resource",
        }
    }
}

impl fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation. Fields are private so a stored record cannot be altered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    name: String,
    value: f64,
    /// Milliseconds since the collector's time origin
    timestamp: f64,
    category: MetricCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<Metadata>,
}

impl MetricRecord {
    pub fn new(
        name: impl Into<String>,
        value: f64,
        timestamp: f64,
        category: MetricCategory,
        metadata: Option<Metadata>,
    ) -> Self {
        Self {
            name: name.into(),
            value,
            timestamp,
            category,
            metadata,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn category(&self) -> MetricCategory {
        self.category
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }
}

/// Build a metadata map from key/value pairs
pub fn metadata<I, K, V>(entries: I) -> Metadata
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<serde_json::Value>,
{
    entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_serializes_lowercase() {
        let json = serde_json::to_string(&MetricCategory::Navigation).unwrap();
        assert_eq!(json, "\"navigation\"");
        let parsed: MetricCategory = serde_json::from_str("\"render\"").unwrap();
        assert_eq!(parsed, MetricCategory::Render);
        assert!(serde_json::from_str::<MetricCategory>("\"network\"").is_err());
    }

    #[test]
    fn test_record_json_shape() {
        let record = MetricRecord::new(
            "api_call",
            120.0,
            5.0,
            MetricCategory::Api,
            Some(metadata([("url", serde_json::Value::from("/api/menu")), ("success", true.into())])),
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["name"], "api_call");
        assert_eq!(value["category"], "api");
        assert_eq!(value["metadata"]["success"], true);

        let bare = MetricRecord::new("dns_lookup", 3.0, 1.0, MetricCategory::Navigation, None);
        let value = serde_json::to_value(&bare).unwrap();
        assert!(value.get("metadata").is_none());
    }
}
