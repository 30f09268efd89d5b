//! End-of-run statistics printing.

use log::info;
use strum::IntoEnumIterator;

use crate::audit::BatchReport;
use crate::error_handling::{ErrorType, InfoType, ProcessingStats, WarningType};

/// Prints the batch summary followed by the per-category counters.
pub fn print_batch_statistics(report: &BatchReport, error_stats: &ProcessingStats) {
    info!(
        "Batch finished: {} leads ({} completed, {} no website, {} failed) in {:.1}s",
        report.total,
        report.completed,
        report.no_website,
        report.failed,
        report.elapsed_seconds
    );
    for (tag, count) in &report.tag_counts {
        info!("   {}: {}", tag, count);
    }
    print_error_statistics(error_stats);
}

/// Prints every non-zero error, warning and info counter.
pub fn print_error_statistics(error_stats: &ProcessingStats) {
    let total_errors = error_stats.total_errors();
    let total_warnings = error_stats.total_warnings();
    let total_info = error_stats.total_info();

    if total_errors > 0 {
        info!("Error Counts ({} total):", total_errors);
        for error_type in ErrorType::iter() {
            let count = error_stats.get_error_count(error_type);
            if count > 0 {
                info!("   {}: {}", error_type.as_str(), count);
            }
        }
    }

    if total_warnings > 0 {
        info!("Warning Counts ({} total):", total_warnings);
        for warning_type in WarningType::iter() {
            let count = error_stats.get_warning_count(warning_type);
            if count > 0 {
                info!("   {}: {}", warning_type.as_str(), count);
            }
        }
    }

    if total_info > 0 {
        info!("Info Counts ({} total):", total_info);
        for info_type in InfoType::iter() {
            let count = error_stats.get_info_count(info_type);
            if count > 0 {
                info!("   {}: {}", info_type.as_str(), count);
            }
        }
    }
}
