// IBAN Checksum - Core Library
// ISO 13616 mod-97 validation, exposed for the CLI, API server, and tests

pub mod checksum;
pub mod config;
pub mod batch;
pub mod logging;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use checksum::{
    normalize, rotate_leading_four, to_digit_string, mod97, mod_chunked,
    is_valid_iban, check_digits, explain,
    ChecksumBreakdown, ChecksumError, IBAN_MODULUS,
};
pub use config::{Config, BatchConfig, ServerConfig};
pub use batch::{BatchEntry, BatchReport, check_reader, check_file};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
