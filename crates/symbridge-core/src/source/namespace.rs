//! Namespace resolution across modules.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use super::log::{LookupEvent, LookupLog, NullLog};
use crate::symbols::NamespaceHandle;
use crate::target::{Module, ModuleList};

/// Per-module namespaces found for one qualified-name segment.
///
/// Entries keep discovery order. The same qualified name may appear once per
/// module; entries are never merged across modules.
#[derive(Debug, Clone, Default)]
pub struct NamespaceMap
{
    entries: Vec<(Arc<Module>, NamespaceHandle)>,
}

impl NamespaceMap
{
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    pub fn push(&mut self, module: Arc<Module>, namespace: NamespaceHandle)
    {
        self.entries.push((module, namespace));
    }

    pub fn len(&self) -> usize
    {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(Arc<Module>, NamespaceHandle)]
    {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Arc<Module>, NamespaceHandle)>
    {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a NamespaceMap
{
    type IntoIter = std::slice::Iter<'a, (Arc<Module>, NamespaceHandle)>;
    type Item = &'a (Arc<Module>, NamespaceHandle);

    fn into_iter(self) -> Self::IntoIter
    {
        self.entries.iter()
    }
}

/// Asks module symbol backends for namespaces, one segment at a time.
pub struct NamespaceResolver
{
    log: Rc<dyn LookupLog>,
    invocations: Cell<u32>,
}

impl Default for NamespaceResolver
{
    fn default() -> Self
    {
        Self::new(Rc::new(NullLog))
    }
}

impl NamespaceResolver
{
    pub fn new(log: Rc<dyn LookupLog>) -> Self
    {
        Self {
            log,
            invocations: Cell::new(0),
        }
    }

    /// Number of resolutions performed so far.
    pub fn invocation_count(&self) -> u32
    {
        self.invocations.get()
    }

    /// Find the namespaces called `name`.
    ///
    /// With a `parent` map, each of its modules is asked for a child of its
    /// own parent namespace, in the parent map's order. Without one, every
    /// module of `modules` is asked for a top-level namespace, in load order.
    /// Modules without a backend or without a match contribute nothing.
    pub fn resolve(&self, modules: &ModuleList, name: &str, parent: Option<&NamespaceMap>) -> NamespaceMap
    {
        let invocation = self.invocations.get().wrapping_add(1);
        self.invocations.set(invocation);

        self.log.record(&LookupEvent::SearchStarted {
            invocation,
            name,
            parent,
        });

        let mut map = NamespaceMap::new();
        match parent {
            Some(parent) => {
                for (module, parent_namespace) in parent {
                    self.search_module(invocation, module, name, Some(parent_namespace), &mut map);
                }
            }
            None => {
                for index in 0..modules.len() {
                    if let Some(module) = modules.module_at(index) {
                        self.search_module(invocation, module, name, None, &mut map);
                    }
                }
            }
        }

        self.log.record(&LookupEvent::SearchFinished {
            invocation,
            name,
            matches: map.len(),
        });
        map
    }

    fn search_module(
        &self,
        invocation: u32,
        module: &Arc<Module>,
        name: &str,
        parent: Option<&NamespaceHandle>,
        map: &mut NamespaceMap,
    )
    {
        let Some(backend) = module.symbol_backend() else {
            self.log.record(&LookupEvent::ModuleSkipped { invocation, module });
            return;
        };

        if let Some(found) = backend.find_namespace(name, parent) {
            self.log.record(&LookupEvent::NamespaceFound {
                invocation,
                module,
                namespace: &found,
            });
            map.push(Arc::clone(module), found);
        }
    }
}

#[cfg(test)]
mod tests
{
    use std::cell::RefCell;

    use super::*;
    use crate::symbols::SymbolTable;

    #[derive(Default)]
    struct RecordingLog
    {
        lines: RefCell<Vec<String>>,
    }

    impl LookupLog for RecordingLog
    {
        fn record(&self, event: &LookupEvent<'_>)
        {
            self.lines.borrow_mut().push(event.to_string());
        }
    }

    #[test]
    fn test_invocation_ids_increase()
    {
        let log = Rc::new(RecordingLog::default());
        let resolver = NamespaceResolver::new(log.clone());
        let mut modules = ModuleList::new();
        modules.append(Module::without_backend("/lib/a.so"));

        resolver.resolve(&modules, "first", None);
        resolver.resolve(&modules, "second", None);

        assert_eq!(resolver.invocation_count(), 2);
        let lines = log.lines.borrow();
        assert_eq!(
            lines.as_slice(),
            [
                "[1] searching for top-level namespace first",
                "[1] skipping a.so: no symbol backend",
                "[1] namespace first: 0 match(es)",
                "[2] searching for top-level namespace second",
                "[2] skipping a.so: no symbol backend",
                "[2] namespace second: 0 match(es)",
            ]
        );
    }

    #[test]
    fn test_found_namespace_is_logged()
    {
        let log = Rc::new(RecordingLog::default());
        let resolver = NamespaceResolver::new(log.clone());
        let mut table = SymbolTable::new();
        table.add_namespace(None, "util");
        let mut modules = ModuleList::new();
        modules.append(Module::with_backend("/bin/app", table));

        let map = resolver.resolve(&modules, "util", None);

        assert_eq!(map.len(), 1);
        assert!(log
            .lines
            .borrow()
            .contains(&"[1] found namespace util in app".to_string()));
    }
}
