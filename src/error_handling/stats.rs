//! Audit run statistics.
//!
//! Thread-safe counters for errors, warnings and informational events,
//! shared by every audit of a run.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::{ErrorType, InfoType, WarningType};

/// Thread-safe processing statistics tracker.
///
/// Every enum variant gets its counter up front, so increments never allocate
/// and the struct can be shared across tasks behind an `Arc`.
///
/// # Categories
///
/// - **Errors**: a signal could not be collected (fetch, probe, persistence)
/// - **Warnings**: a page element is missing
/// - **Info**: notable events (skipped probes, cancellations, partial audits)
pub struct ProcessingStats {
    errors: HashMap<ErrorType, AtomicUsize>,
    warnings: HashMap<WarningType, AtomicUsize>,
    info: HashMap<InfoType, AtomicUsize>,
}

fn counters<T: IntoEnumIterator + std::hash::Hash + Eq>() -> HashMap<T, AtomicUsize> {
    T::iter().map(|variant| (variant, AtomicUsize::new(0))).collect()
}

fn load<T: std::hash::Hash + Eq>(map: &HashMap<T, AtomicUsize>, key: &T) -> usize {
    map.get(key).map(|c| c.load(Ordering::SeqCst)).unwrap_or(0)
}

impl ProcessingStats {
    pub fn new() -> Self {
        ProcessingStats {
            errors: counters(),
            warnings: counters(),
            info: counters(),
        }
    }

    /// Increment an error counter.
    pub fn increment_error(&self, error: ErrorType) {
        match self.errors.get(&error) {
            Some(counter) => {
                counter.fetch_add(1, Ordering::Relaxed);
            }
            None => log::error!("No counter registered for error {:?}", error),
        }
    }

    /// Increment a warning counter.
    pub fn increment_warning(&self, warning: WarningType) {
        match self.warnings.get(&warning) {
            Some(counter) => {
                counter.fetch_add(1, Ordering::Relaxed);
            }
            None => log::error!("No counter registered for warning {:?}", warning),
        }
    }

    /// Increment an info counter.
    pub fn increment_info(&self, info_type: InfoType) {
        match self.info.get(&info_type) {
            Some(counter) => {
                counter.fetch_add(1, Ordering::Relaxed);
            }
            None => log::error!("No counter registered for info {:?}", info_type),
        }
    }

    pub fn get_error_count(&self, error: ErrorType) -> usize {
        load(&self.errors, &error)
    }

    pub fn get_warning_count(&self, warning: WarningType) -> usize {
        load(&self.warnings, &warning)
    }

    pub fn get_info_count(&self, info_type: InfoType) -> usize {
        load(&self.info, &info_type)
    }

    /// Get total error count across all error types.
    pub fn total_errors(&self) -> usize {
        ErrorType::iter().map(|e| self.get_error_count(e)).sum()
    }

    /// Get total warning count across all warning types.
    pub fn total_warnings(&self) -> usize {
        WarningType::iter().map(|w| self.get_warning_count(w)).sum()
    }

    /// Get total info count across all info types.
    pub fn total_info(&self) -> usize {
        InfoType::iter().map(|i| self.get_info_count(i)).sum()
    }
}

impl Default for ProcessingStats {
    fn default() -> Self {
        Self::new()
    }
}
