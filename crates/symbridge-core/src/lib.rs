//! # symbridge-core
//!
//! Debug-information-backed declarations for a debugger's expression
//! evaluator.
//!
//! An expression typed at a debugger prompt is compiled against a frontend
//! AST that starts out empty. Every name the frontend cannot resolve locally
//! is handed to an [`ExternalDeclSource`], which looks it up in the symbol
//! backends of the target's loaded modules and synthesizes minimal
//! declarations (variables, functions with parameters, types, namespaces)
//! that are just detailed enough to type-check a reference.
//!
//! This crate provides:
//! - A minimal frontend model with a per-scope lookup cache ([`ast`])
//! - The bridge, its search context and namespace resolution ([`source`])
//! - Targets, modules and lazily loaded symbol backends ([`target`])
//! - An in-memory symbol table that can be filled from DWARF ([`symbols`])
//!
//! ## Lookup contract
//!
//! - A `(scope, name)` pair is resolved against the modules at most once; the
//!   answer, positive or negative, is committed to the frontend's cache.
//! - A query for a name that is already being resolved returns an empty,
//!   uncommitted answer instead of recursing.
//! - External lookups are off until an identifier starting with the
//!   activation character (`$` by default) is seen.
//! - "Not found" is an ordinary result. Only setup (loading binaries) returns
//!   errors.

pub mod ast;
pub mod config;
pub mod error;
pub mod prelude;
pub mod source;
pub mod symbols;
pub mod target;

pub use config::BridgeConfig;
pub use error::{SymbridgeError, SymbridgeResult};
pub use source::{ExternalAstSource, ExternalDeclSource, NameSearchContext, NamespaceMap};
