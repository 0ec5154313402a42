/// Collector and storage constants
// Buffer retention
pub const DEFAULT_BUFFER_CAPACITY: usize = 1000;

// Threshold defaults
pub const DEFAULT_API_RESPONSE_TIME_MS: f64 = 2000.0;
pub const DEFAULT_COMPONENT_RENDER_TIME_MS: f64 = 100.0;
pub const DEFAULT_PAGE_LOAD_TIME_MS: f64 = 3000.0;
pub const DEFAULT_MEMORY_USAGE_BYTES: f64 = 50.0 * 1024.0 * 1024.0; // 50 MiB

// Score deductions
pub const PERFECT_SCORE: i32 = 100;
pub const API_SCORE_PENALTY: i32 = 20;
pub const RENDER_SCORE_PENALTY: i32 = 20;
pub const MEMORY_SCORE_PENALTY: i32 = 30;

// Resource filter
pub const RESOURCE_SIZE_THRESHOLD_BYTES: u64 = 10_000;
pub const RESOURCE_DURATION_THRESHOLD_MS: f64 = 100.0;
pub const API_PATH_MARKER: &str = "/api/";
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp", "ico", "avif"];

// Pending start_measure entries kept before the oldest is evicted
pub const MAX_PENDING_MEASURES: usize = 256;

// Memory sampler
pub const DEFAULT_MEMORY_SAMPLE_INTERVAL_SECONDS: u64 = 30;
pub const DEFAULT_MEMORY_SAMPLING_CUTOFF_SECONDS: u64 = 3600;

// Metric names
pub const METRIC_API_CALL: &str = "api_call";
pub const METRIC_COMPONENT_RENDER: &str = "component_render";
pub const METRIC_USER_INTERACTION: &str = "user_interaction";
pub const METRIC_MEMORY_USAGE: &str = "memory_usage";
pub const METRIC_RESOURCE_LOAD: &str = "resource_load";
pub const METRIC_INITIAL_PAGE_LOAD: &str = "initial_page_load";
pub const METRIC_DNS_LOOKUP: &str = "dns_lookup";
pub const METRIC_TCP_CONNECTION: &str = "tcp_connection";
pub const METRIC_REQUEST_RESPONSE: &str = "request_response";
pub const METRIC_DOM_PROCESSING: &str = "dom_processing";
pub const METRIC_PAGE_LOAD_COMPLETE: &str = "page_load_complete";

// Persisted preference
pub const PERFORMANCE_MONITORING_KEY: &str = "performance_monitoring";
pub const PREFERENCE_ENABLED_VALUE: &str = "true";

// LMDB configuration for the preference store
pub const LMDB_MAP_SIZE: usize = 1024 * 1024; // 1MB, a handful of flags
pub const LMDB_MAX_DBS: u32 = 2;
pub const LMDB_MAX_READERS: u32 = 126;
pub const PREFERENCES_DB_NAME: &str = "preferences";
pub const DEFAULT_PREFERENCES_PATH: &str = "data/preferences";

// Error context messages
pub const LMDB_ENV_CREATION_CONTEXT: &str = "Failed to open preference environment";
pub const LMDB_TRANSACTION_CONTEXT: &str = "Failed to create preference transaction";
pub const LMDB_DATABASE_CONTEXT: &str = "Failed to create preference database";
pub const DIRECTORY_CREATION_CONTEXT: &str = "Failed to create preference directory";

// Logging
pub const LOG_FILE_PREFIX: &str = "perf_telemetry";
