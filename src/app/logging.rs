//! Progress logging utilities.

use log::info;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Logs batch progress.
///
/// # Arguments
///
/// * `start_time` - The start time of the batch
/// * `finished` - Atomic counter of audits that reached a terminal state
/// * `total` - Number of leads scheduled
pub fn log_progress(start_time: std::time::Instant, finished: &AtomicUsize, total: usize) {
    let elapsed_secs = start_time.elapsed().as_secs_f64();
    let done = finished.load(Ordering::SeqCst);
    let rate = if elapsed_secs > 0.0 {
        done as f64 / elapsed_secs
    } else {
        0.0
    };
    info!(
        "Audited {}/{} leads in {:.1} seconds (~{:.2} leads/sec)",
        done, total, elapsed_secs, rate
    );
}
