//! Developer console for the performance collector
//!
//! Replays a JSON-lines file of timing events through the collector and
//! prints the resulting health report.
//!
//! Usage: perf_report [--config <file>] [--enable | --disable] [events.jsonl]

use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

use perf_telemetry::config::TelemetryConfig;
use perf_telemetry::logging::{cleanup_old_logs, init_dual_logging, log_system_info};
use perf_telemetry::performance::{PerformanceCollector, TimingEvent, TimingEventBus};
use perf_telemetry::preferences::{LmdbPreferenceStore, MemoryPreferenceStore, PreferenceStore};
use tracing::{info, warn};

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    toggle: Option<bool>,
    events: Option<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().ok_or("--config needs a file path")?;
                args.config = Some(PathBuf::from(path));
            }
            "--enable" => args.toggle = Some(true),
            "--disable" => args.toggle = Some(false),
            other if other.starts_with("--") => return Err(format!("unknown flag {}", other)),
            other => args.events = Some(PathBuf::from(other)),
        }
    }
    Ok(args)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = parse_args()?;
    let config = match &args.config {
        Some(path) => TelemetryConfig::from_toml(path)?,
        None => TelemetryConfig::default(),
    };

    let _log_guard = init_dual_logging(&config.logging)?;
    log_system_info();
    if let Some(days) = config.log_cleanup_days {
        cleanup_old_logs(&config.logging.log_dir, days)?;
    }

    let preferences: Arc<dyn PreferenceStore> = match LmdbPreferenceStore::open(&config.preferences_path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!("Preference store unavailable, monitoring preference will not persist: {}", e);
            Arc::new(MemoryPreferenceStore::new())
        }
    };

    let bus = TimingEventBus::new();
    let sources = config.collector.default_sources(&bus);
    let collector = PerformanceCollector::new(config.collector.clone(), preferences, sources);

    match args.toggle {
        Some(true) => collector.enable(),
        Some(false) => collector.disable(),
        None => {}
    }

    if !collector.is_enabled() {
        info!("📴 Monitoring is disabled; run with --enable to turn it on");
        return Ok(());
    }

    if let Some(path) = &args.events {
        let file = std::fs::File::open(path)?;
        let mut replayed = 0usize;
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<TimingEvent>(&line) {
                Ok(event) => {
                    bus.publish(event);
                    replayed += 1;
                }
                Err(e) => warn!("Skipping line {}: {}", line_no + 1, e),
            }
        }
        info!("▶️ Replayed {} timing events from {}", replayed, path.display());
    }

    let report = collector.get_report();
    info!(
        score = report.summary.performance_score,
        metrics = report.summary.total_metrics,
        issues = report.issues.len(),
        "📋 Performance report generated"
    );
    println!("{}", report.to_json_pretty()?);

    collector.destroy();
    Ok(())
}
