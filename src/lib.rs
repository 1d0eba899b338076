// Student Registry - Core Library
// Exposes all modules for use in the CLI, the terminal UI, the API server, and tests

pub mod cli;
pub mod config;
pub mod error;
pub mod identifier;
pub mod logging;
pub mod record;
pub mod registry;
pub mod render;
pub mod store;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result, ValidationError};
pub use identifier::{format_identifier, next_identifier, parse_identifier, FIRST_IDENTIFIER};
pub use logging::{init_logging, Verbosity};
pub use record::{Registration, RegistrationForm, FIELD_NAMES};
pub use registry::{Registry, Submission};
pub use render::{document_file_name, DocumentLayout, DocumentRenderer, PdfRenderer};
pub use store::RecordStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
