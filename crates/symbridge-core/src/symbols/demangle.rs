//! Symbol demangling utilities.
//!
//! Compilers "mangle" symbol names to encode type information and namespaces.
//! The DWARF loader only needs two things from a mangled name:
//!
//! - whether a symbol table entry is mangled at all (unmangled text symbols
//!   are C functions we can offer as callables of unknown signature)
//! - the unqualified name of a subprogram that carries only a linkage name

use rustc_demangle::try_demangle;

use crate::error::SymbridgeError;

/// Whether `raw` looks like an Itanium (`_Z`) or Rust v0 (`_R`) mangled name.
///
/// Mach-O prefixes every symbol with an extra underscore, so `__Z` counts too.
pub(crate) fn is_mangled(raw: &str) -> bool
{
    raw.starts_with("_Z") || raw.starts_with("__Z") || raw.starts_with("_R") || raw.starts_with("__R")
}

/// Unqualified name of a Rust-mangled linkage name, without the hash suffix.
///
/// Only Rust symbols (v0 `_R` names, or legacy `_ZN` names carrying a
/// `17h<hash>E` element) are named this way. C++ and other Itanium names
/// return `None`, so their entries stay unnamed rather than get a wrong tail.
pub(crate) fn short_name(raw: &str) -> Option<String>
{
    if !is_rust_symbol(raw) {
        return None;
    }
    let demangled = try_demangle(raw).ok()?;
    let full = format!("{demangled:#}");
    full.rsplit("::").next().map(str::to_string)
}

fn is_rust_symbol(raw: &str) -> bool
{
    // Mach-O adds one leading underscore.
    let raw = if raw.starts_with("__") { &raw[1..] } else { raw };
    raw.starts_with("_R") || (raw.starts_with("_ZN") && has_legacy_hash(raw))
}

fn has_legacy_hash(raw: &str) -> bool
{
    raw.match_indices("17h").any(|(index, _)| {
        let hash = raw[index + 3..].as_bytes();
        hash.len() > 16 && hash[..16].iter().all(u8::is_ascii_hexdigit) && hash[16] == b'E'
    })
}

/// Map a gimli DWARF error to a `SymbridgeError` with context.
pub(crate) fn map_dwarf_error(context: &str, err: gimli::Error) -> SymbridgeError
{
    SymbridgeError::Dwarf(format!("{context}: {err}"))
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_is_mangled()
    {
        assert!(is_mangled("_ZN4core3fmt5write17h0123456789abcdefE"));
        assert!(is_mangled("__ZN3foo3barEv"));
        assert!(is_mangled("_RNvCs1234_7example4main"));
        assert!(!is_mangled("printf"));
        assert!(!is_mangled("_start"));
    }

    #[test]
    fn test_short_name_strips_path_and_hash()
    {
        assert_eq!(
            short_name("_ZN7example6helper17h0123456789abcdefE").as_deref(),
            Some("helper")
        );
        assert_eq!(short_name("not_mangled"), None);
    }

    #[test]
    fn test_short_name_ignores_cpp_symbols()
    {
        assert!(is_mangled("_ZN3foo3barEv"));
        assert_eq!(short_name("_ZN3foo3barEv"), None);
        assert_eq!(short_name("__ZN3foo3barEi"), None);
        assert!(is_rust_symbol("__ZN7example6helper17h0123456789abcdefE"));
        assert!(!has_legacy_hash("_ZN7example6helper17hnothexatallxxxxE"));
    }
}
