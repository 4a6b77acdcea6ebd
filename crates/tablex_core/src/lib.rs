pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::{ConfigStore, MemoryPreferences, Preferences, TablexConfig};
pub use error::{ErrorCategory, ExportError};
pub use types::{CsvQuoting, ExportFormat};
