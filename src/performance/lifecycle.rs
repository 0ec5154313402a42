use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use crate::common::constants::{PERFORMANCE_MONITORING_KEY, PREFERENCE_ENABLED_VALUE};
use crate::preferences::PreferenceStore;

/// Process-wide enable/disable switch backed by a persisted preference.
///
/// The persisted flag is read once here; afterwards the in-memory state is
/// authoritative and store failures only produce a warning.
pub struct LifecycleManager {
    enabled: AtomicBool,
    preferences: Arc<dyn PreferenceStore>,
}

impl LifecycleManager {
    pub fn new(development_mode: bool, preferences: Arc<dyn PreferenceStore>) -> Self {
        let persisted = match preferences.contains(PERFORMANCE_MONITORING_KEY) {
            Ok(present) => present,
            Err(e) => {
                warn!("Could not read monitoring preference, assuming unset: {}", e);
                false
            }
        };

        Self {
            enabled: AtomicBool::new(development_mode || persisted),
            preferences,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Persist the flag and switch on. Returns true if the state changed.
    pub fn enable(&self) -> bool {
        if let Err(e) = self.preferences.set(PERFORMANCE_MONITORING_KEY, PREFERENCE_ENABLED_VALUE) {
            warn!("Failed to persist monitoring preference: {}", e);
        }
        let changed = !self.enabled.swap(true, Ordering::AcqRel);
        if changed {
            info!("📊 Performance monitoring enabled");
        }
        changed
    }

    /// Clear the flag and switch off. Returns true if the state changed.
    pub fn disable(&self) -> bool {
        if let Err(e) = self.preferences.remove(PERFORMANCE_MONITORING_KEY) {
            warn!("Failed to clear monitoring preference: {}", e);
        }
        let changed = self.enabled.swap(false, Ordering::AcqRel);
        if changed {
            info!("📴 Performance monitoring disabled");
        }
        changed
    }
}
