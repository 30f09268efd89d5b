// storage/mod.rs
// Database operations module

mod leads;
mod migrations;
mod pool;

// Re-export commonly used items
pub use leads::{LeadStore, NewLead, SqliteLeadStore};
pub use migrations::run_migrations;
pub use pool::init_db_pool_with_path;
