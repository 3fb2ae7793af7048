//! # Symbol Backends
//!
//! Per-module symbol stores the bridge asks about namespaces and names.
//!
//! A backend answers two questions for its module:
//!
//! - [`SymbolBackend::find_namespace`]: is there a namespace called `name`,
//!   either at top level or nested directly inside a given parent namespace?
//! - [`SymbolBackend::find_symbols`]: which variables, functions and types
//!   called `name` live at that level?
//!
//! The stock backend is [`SymbolTable`], an in-memory index. It can be filled
//! by hand (tests, synthetic targets) or from a binary's DWARF debug
//! information with [`SymbolTable::from_object_file`].

mod demangle;
mod dwarf;
mod table;

use std::fmt;

pub use dwarf::load_symbol_table;
pub use table::SymbolTable;

use crate::ast::TypeDesc;

/// A namespace as one particular module's backend knows it.
///
/// Handles are only meaningful to the backend that produced them; two modules
/// may each hand out a distinct handle for the same qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespaceHandle
{
    id: u64,
    qualified_name: String,
}

impl NamespaceHandle
{
    pub fn new(id: u64, qualified_name: impl Into<String>) -> Self
    {
        Self {
            id,
            qualified_name: qualified_name.into(),
        }
    }

    /// Backend-specific identifier.
    pub fn id(&self) -> u64
    {
        self.id
    }

    /// Fully qualified name, e.g. `outer::inner`.
    pub fn qualified_name(&self) -> &str
    {
        &self.qualified_name
    }

    /// Last component of the qualified name.
    pub fn name(&self) -> &str
    {
        self.qualified_name
            .rsplit("::")
            .next()
            .unwrap_or(&self.qualified_name)
    }
}

impl fmt::Display for NamespaceHandle
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.qualified_name)
    }
}

/// What kind of entity an external symbol is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalSymbolKind
{
    Variable
    {
        ty: TypeDesc
    },
    /// A function. `signature` is `None` when only the symbol's existence is
    /// known (for example a symbol table entry without debug information).
    Function
    {
        signature: Option<TypeDesc>
    },
    Type
    {
        ty: TypeDesc
    },
}

/// A named entity found in a module's symbol store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalSymbol
{
    pub name: String,
    pub kind: ExternalSymbolKind,
}

impl ExternalSymbol
{
    pub fn variable(name: impl Into<String>, ty: TypeDesc) -> Self
    {
        Self {
            name: name.into(),
            kind: ExternalSymbolKind::Variable { ty },
        }
    }

    /// Function with a known prototype.
    pub fn function(name: impl Into<String>, signature: TypeDesc) -> Self
    {
        Self {
            name: name.into(),
            kind: ExternalSymbolKind::Function {
                signature: Some(signature),
            },
        }
    }

    /// Callable symbol whose signature is unknown.
    pub fn unknown_function(name: impl Into<String>) -> Self
    {
        Self {
            name: name.into(),
            kind: ExternalSymbolKind::Function { signature: None },
        }
    }

    pub fn type_decl(name: impl Into<String>, ty: TypeDesc) -> Self
    {
        Self {
            name: name.into(),
            kind: ExternalSymbolKind::Type { ty },
        }
    }
}

/// Per-module symbol store.
///
/// Backends are queried from a single evaluation session at a time but may be
/// shared between sessions, hence `Send + Sync`. Calls may be slow (they can
/// hit the disk); callers impose no timeout.
pub trait SymbolBackend: Send + Sync
{
    /// Find the namespace called `name` directly inside `parent`, or at top
    /// level when `parent` is `None`.
    fn find_namespace(&self, name: &str, parent: Option<&NamespaceHandle>) -> Option<NamespaceHandle>;

    /// Find the variables, functions and types called `name` directly inside
    /// `parent`, or at top level when `parent` is `None`.
    fn find_symbols(&self, name: &str, parent: Option<&NamespaceHandle>) -> Vec<ExternalSymbol>;
}
