//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::constants::{
    DEFAULT_ACCEPT_LANGUAGE, DEFAULT_BATCH_CONCURRENCY, DEFAULT_INTER_AUDIT_DELAY_MS,
    DEFAULT_USER_AGENT, MAX_PAGE_FETCH_TIMEOUT_SECS, PAGE_FETCH_TIMEOUT_SECS,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Library configuration (no CLI dependencies).
///
/// This is the core configuration struct used by the library. It can be
/// constructed programmatically without any CLI dependencies. API keys are
/// capabilities: a `None` key means the matching enrichment is not wired
/// into the engine at all.
///
/// # Examples
///
/// ```no_run
/// use lead_audit::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     db_path: PathBuf::from("./leads.db"),
///     max_concurrency: 5,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,

    /// Database path (SQLite file)
    pub db_path: PathBuf,

    /// Homepage fetch timeout in seconds (clamped to 20)
    pub timeout_seconds: u64,

    /// HTTP User-Agent header value
    pub user_agent: String,

    /// HTTP Accept-Language header value
    pub accept_language: String,

    /// Google PageSpeed Insights API key; enables the performance probe
    pub pagespeed_api_key: Option<String>,

    /// SerpApi key; enables the paid-search lookup
    pub serpapi_api_key: Option<String>,

    /// Skip the paid-search lookup even when a key is configured (cost control)
    pub skip_search_lookup: bool,

    /// Maximum simultaneous audits for batch runs
    pub max_concurrency: usize,

    /// Delay between audits for sequential runs, in milliseconds
    pub inter_audit_delay_ms: u64,
}

impl Config {
    /// Returns the homepage fetch timeout, never above the 20s ceiling.
    pub fn page_timeout_secs(&self) -> u64 {
        self.timeout_seconds.clamp(1, MAX_PAGE_FETCH_TIMEOUT_SECS)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            db_path: PathBuf::from("./lead_audit.db"),
            timeout_seconds: PAGE_FETCH_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            pagespeed_api_key: None,
            serpapi_api_key: None,
            skip_search_lookup: false,
            max_concurrency: DEFAULT_BATCH_CONCURRENCY,
            inter_audit_delay_ms: DEFAULT_INTER_AUDIT_DELAY_MS,
        }
    }
}

/// Command-line options.
///
/// Global flags configure the engine; the subcommand picks the entry point.
///
/// # Examples
///
/// ```bash
/// # Audit one lead
/// lead_audit audit 42
///
/// # Audit every pending lead of search 7, ten at a time
/// lead_audit batch --search-id 7
///
/// # Expose the trigger endpoints
/// lead_audit serve --port 8088
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "lead_audit",
    about = "Audits lead websites and assigns a commercial qualification."
)]
pub struct Opt {
    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain, global = true)]
    pub log_format: LogFormat,

    /// Database path (SQLite file)
    #[arg(long, value_parser, default_value = "./lead_audit.db", global = true)]
    pub db_path: PathBuf,

    /// Homepage fetch timeout in seconds (max 20)
    #[arg(long, default_value_t = PAGE_FETCH_TIMEOUT_SECS, global = true)]
    pub timeout_seconds: u64,

    /// HTTP User-Agent header value
    #[arg(long, default_value = DEFAULT_USER_AGENT, global = true)]
    pub user_agent: String,

    /// Google PageSpeed Insights API key
    #[arg(long, env = "PAGESPEED_API_KEY", hide_env_values = true, global = true)]
    pub pagespeed_api_key: Option<String>,

    /// SerpApi key used to confirm paid search presence
    #[arg(long, env = "SERPAPI_API_KEY", hide_env_values = true, global = true)]
    pub serpapi_api_key: Option<String>,

    /// Do not query paid search results even if a key is set
    #[arg(long, global = true)]
    pub skip_search_lookup: bool,

    /// Maximum simultaneous audits for batch runs
    #[arg(long, default_value_t = DEFAULT_BATCH_CONCURRENCY, global = true)]
    pub max_concurrency: usize,

    /// Delay between sequential audits in milliseconds
    #[arg(long, default_value_t = DEFAULT_INTER_AUDIT_DELAY_MS, global = true)]
    pub inter_audit_delay_ms: u64,

    #[command(subcommand)]
    pub command: Command,
}

/// Entry point selected on the command line.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Audit a single lead and print its classification
    Audit {
        /// Lead id
        lead_id: i64,
    },
    /// Audit many leads concurrently (bounded by --max-concurrency)
    Batch {
        /// Audit every PENDING lead of this search
        #[arg(long)]
        search_id: Option<i64>,
        /// Explicit lead ids
        lead_ids: Vec<i64>,
    },
    /// Audit leads one at a time with a pause between them
    Sequential {
        /// Lead ids in processing order
        #[arg(required = true)]
        lead_ids: Vec<i64>,
    },
    /// Serve the HTTP trigger endpoints
    Serve {
        /// Port to bind on 127.0.0.1
        #[arg(long, default_value_t = 8088)]
        port: u16,
    },
}

impl From<&Opt> for Config {
    fn from(opt: &Opt) -> Self {
        Self {
            log_level: opt.log_level.clone(),
            log_format: opt.log_format.clone(),
            db_path: opt.db_path.clone(),
            timeout_seconds: opt.timeout_seconds,
            user_agent: opt.user_agent.clone(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            pagespeed_api_key: opt.pagespeed_api_key.clone().filter(|k| !k.trim().is_empty()),
            serpapi_api_key: opt.serpapi_api_key.clone().filter(|k| !k.trim().is_empty()),
            skip_search_lookup: opt.skip_search_lookup,
            max_concurrency: opt.max_concurrency.max(1),
            inter_audit_delay_ms: opt.inter_audit_delay_ms,
        }
    }
}
