//! # Error Types
//!
//! Error handling for the fallible setup side of symbridge.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.
//!
//! Name lookups themselves never fail: "not found" is an ordinary, typed
//! answer. Errors only appear while loading modules and their debug
//! information, or when a caller hands us input we cannot interpret.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for symbridge operations
///
/// ## Error Categories
///
/// 1. **Input errors**: InvalidArgument
/// 2. **Object file errors**: ObjectParse
/// 3. **Debug information errors**: Dwarf
/// 4. **I/O errors**: Io (for reading binaries from disk)
#[derive(Error, Debug)]
pub enum SymbridgeError
{
    /// Invalid argument passed to a symbridge function
    ///
    /// Examples:
    /// - An empty namespace path segment
    /// - An activation character that is not a single character
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The binary could not be parsed as an object file
    ///
    /// This happens when the path does not point to an ELF, Mach-O or other
    /// object format understood by the `object` crate, or when a section
    /// could not be decompressed.
    #[error("Failed to parse object file {path}: {details}")]
    ObjectParse
    {
        /// Path of the binary that failed to parse
        path: PathBuf,
        /// What went wrong
        details: String,
    },

    /// Malformed or unsupported DWARF debug information
    ///
    /// The string contains the operation that was being performed and the
    /// underlying `gimli` error.
    #[error("DWARF error: {0}")]
    Dwarf(String),

    /// I/O error (for reading binaries, log files, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for `Result<T, SymbridgeError>`
///
/// ```rust
/// use symbridge_core::error::SymbridgeResult;
/// fn foo() -> SymbridgeResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type SymbridgeResult<T> = std::result::Result<T, SymbridgeError>;
