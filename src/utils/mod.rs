//! Utility functions shared by the detectors and the pipeline.
//!
//! This module provides:
//! - CSS selector and regex compilation for static patterns
//! - String sanitization utilities

pub mod sanitize;
mod selector;

pub use sanitize::{collapse_whitespace, sanitize_and_truncate_error_message};
pub use selector::{compile_regex_unsafe, parse_selector_unsafe};
