//! # symbridge Utilities
//!
//! Shared utilities for the symbridge workspace.
//!
//! Currently this is the logging bootstrap built on `tracing`: library crates
//! only emit events, binaries pick a subscriber from here.

pub mod logging;

// Re-export commonly used logging functions for convenience
pub use logging::{init_logging, init_logging_to_file, init_logging_with_level, LogFormat, LogLevel, LoggingError};
pub use tracing::{debug, error, info, trace, warn};
