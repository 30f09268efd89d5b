//! Main application modules.
//!
//! This module provides utilities for URL validation, progress logging,
//! shutdown handling and statistics printing used by the entry points.

pub mod logging;
pub mod shutdown;
pub mod statistics;
pub mod url;

// Re-export public API
pub use logging::log_progress;
pub use shutdown::cancel_on_ctrl_c;
pub use statistics::{print_batch_statistics, print_error_statistics};
pub use url::{bare_host, is_non_business_website, validate_and_normalize_url};
