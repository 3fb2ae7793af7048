//! In-memory symbol index.

use std::collections::HashMap;
use std::path::Path;

use super::{ExternalSymbol, NamespaceHandle, SymbolBackend};
use crate::error::SymbridgeResult;

/// Symbols and namespaces of one module, indexed by `(parent namespace, name)`.
///
/// ## Example
///
/// ```rust
/// use symbridge_core::ast::{BuiltinType, TypeDesc};
/// use symbridge_core::symbols::{ExternalSymbol, SymbolBackend, SymbolTable};
///
/// let mut table = SymbolTable::new();
/// let chrono = table.add_namespace(None, "chrono");
/// table.add_symbol(Some(&chrono), ExternalSymbol::variable("ticks", TypeDesc::Builtin(BuiltinType::Long)));
///
/// assert_eq!(table.find_namespace("chrono", None), Some(chrono.clone()));
/// assert_eq!(table.find_symbols("ticks", Some(&chrono)).len(), 1);
/// assert!(table.find_symbols("ticks", None).is_empty());
/// ```
#[derive(Debug, Default, Clone)]
pub struct SymbolTable
{
    namespaces: HashMap<(Option<u64>, String), NamespaceHandle>,
    symbols: HashMap<(Option<u64>, String), Vec<ExternalSymbol>>,
    next_namespace_id: u64,
}

impl SymbolTable
{
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Build the table from a binary's debug information.
    ///
    /// ## Errors
    ///
    /// Returns an error if the file cannot be read, is not an object file, or
    /// carries malformed DWARF.
    pub fn from_object_file(path: &Path) -> SymbridgeResult<Self>
    {
        super::load_symbol_table(path)
    }

    /// Register a namespace, returning the existing handle if it is already
    /// known under the same parent.
    pub fn add_namespace(&mut self, parent: Option<&NamespaceHandle>, name: &str) -> NamespaceHandle
    {
        let key = (parent.map(NamespaceHandle::id), name.to_string());
        if let Some(existing) = self.namespaces.get(&key) {
            return existing.clone();
        }

        self.next_namespace_id += 1;
        let qualified = match parent {
            Some(parent) => format!("{}::{name}", parent.qualified_name()),
            None => name.to_string(),
        };
        let handle = NamespaceHandle::new(self.next_namespace_id, qualified);
        self.namespaces.insert(key, handle.clone());
        handle
    }

    /// Register a symbol inside `parent`. Identical duplicates are ignored.
    pub fn add_symbol(&mut self, parent: Option<&NamespaceHandle>, symbol: ExternalSymbol)
    {
        let entries = self
            .symbols
            .entry((parent.map(NamespaceHandle::id), symbol.name.clone()))
            .or_default();
        if !entries.contains(&symbol) {
            entries.push(symbol);
        }
    }

    /// Whether anything called `name` is registered inside `parent`.
    pub fn has_symbol(&self, parent: Option<&NamespaceHandle>, name: &str) -> bool
    {
        self.symbols
            .contains_key(&(parent.map(NamespaceHandle::id), name.to_string()))
    }

    pub fn namespace_count(&self) -> usize
    {
        self.namespaces.len()
    }

    pub fn symbol_count(&self) -> usize
    {
        self.symbols.values().map(Vec::len).sum()
    }
}

impl SymbolBackend for SymbolTable
{
    fn find_namespace(&self, name: &str, parent: Option<&NamespaceHandle>) -> Option<NamespaceHandle>
    {
        self.namespaces
            .get(&(parent.map(NamespaceHandle::id), name.to_string()))
            .cloned()
    }

    fn find_symbols(&self, name: &str, parent: Option<&NamespaceHandle>) -> Vec<ExternalSymbol>
    {
        self.symbols
            .get(&(parent.map(NamespaceHandle::id), name.to_string()))
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::ast::{BuiltinType, TypeDesc};

    #[test]
    fn test_add_namespace_is_idempotent()
    {
        let mut table = SymbolTable::new();
        let outer = table.add_namespace(None, "outer");
        assert_eq!(table.add_namespace(None, "outer"), outer);
        assert_eq!(table.namespace_count(), 1);
    }

    #[test]
    fn test_nested_namespaces_are_qualified()
    {
        let mut table = SymbolTable::new();
        let outer = table.add_namespace(None, "outer");
        let inner = table.add_namespace(Some(&outer), "inner");

        assert_eq!(inner.qualified_name(), "outer::inner");
        assert_eq!(inner.name(), "inner");
        assert_eq!(table.find_namespace("inner", Some(&outer)), Some(inner));
        assert_eq!(table.find_namespace("inner", None), None);
    }

    #[test]
    fn test_same_name_under_different_parents_is_distinct()
    {
        let mut table = SymbolTable::new();
        let first = table.add_namespace(None, "first");
        let second = table.add_namespace(None, "second");
        let a = table.add_namespace(Some(&first), "detail");
        let b = table.add_namespace(Some(&second), "detail");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_duplicate_symbols_are_ignored()
    {
        let mut table = SymbolTable::new();
        let symbol = ExternalSymbol::variable("errno", TypeDesc::Builtin(BuiltinType::Int));
        table.add_symbol(None, symbol.clone());
        table.add_symbol(None, symbol);
        table.add_symbol(None, ExternalSymbol::unknown_function("errno"));

        assert_eq!(table.find_symbols("errno", None).len(), 2);
        assert_eq!(table.symbol_count(), 2);
        assert!(table.has_symbol(None, "errno"));
    }
}
