//! The bridge between the frontend and the target's symbol backends.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use super::log::LookupLog;
use super::namespace::{NamespaceMap, NamespaceResolver};
use super::resolver::{ExternalResolver, ModuleResolver};
use super::search::NameSearchContext;
use super::{ExternalAstSource, ExternalLoadResult};
use crate::ast::{AstContext, AstContextId, DeclCategory, DeclId, DeclarationName, NameKind};
use crate::config::BridgeConfig;
use crate::target::{ModuleList, Target};

/// External declaration source backed by a [`Target`]'s modules.
///
/// One bridge serves one expression evaluation. It borrows the target for its
/// whole lifetime and is bound to a single [`AstContext`] by
/// [`start_translation_unit`](ExternalAstSource::start_translation_unit);
/// queries coming from any other context are answered with a committed
/// negative.
///
/// External lookups start disabled. The first identifier that begins with the
/// configured activation character turns them on for good; that identifier
/// itself is not resolved.
pub struct ExternalDeclSource<'t>
{
    target: Option<&'t Target>,
    config: BridgeConfig,
    bound_ast: Option<AstContextId>,
    import_in_progress: bool,
    lookups_enabled: bool,
    active_lookups: HashSet<String>,
    namespace_maps: HashMap<DeclId, NamespaceMap>,
    /// Context whose declarations `namespace_maps` is keyed by.
    maps_owner: Option<AstContextId>,
    resolver: Rc<dyn ExternalResolver>,
    namespaces: NamespaceResolver,
}

impl<'t> ExternalDeclSource<'t>
{
    /// Bridge over `target` with the default configuration and resolver.
    pub fn new(target: &'t Target) -> Self
    {
        Self::with_config(Some(target), BridgeConfig::default())
    }

    /// Bridge with no target: every resolution finds nothing.
    pub fn detached() -> Self
    {
        Self::with_config(None, BridgeConfig::default())
    }

    pub fn with_config(target: Option<&'t Target>, config: BridgeConfig) -> Self
    {
        Self {
            target,
            config,
            bound_ast: None,
            import_in_progress: false,
            lookups_enabled: config.lookups_enabled_at_start,
            active_lookups: HashSet::new(),
            namespace_maps: HashMap::new(),
            maps_owner: None,
            resolver: Rc::new(ModuleResolver),
            namespaces: NamespaceResolver::default(),
        }
    }

    /// Replace the resolver that populates search contexts.
    #[must_use]
    pub fn with_resolver(mut self, resolver: Rc<dyn ExternalResolver>) -> Self
    {
        self.resolver = resolver;
        self
    }

    /// Send namespace-resolution events to `log`.
    #[must_use]
    pub fn with_log(mut self, log: Rc<dyn LookupLog>) -> Self
    {
        self.namespaces = NamespaceResolver::new(log);
        self
    }

    pub fn target(&self) -> Option<&'t Target>
    {
        self.target
    }

    pub fn config(&self) -> &BridgeConfig
    {
        &self.config
    }

    /// Forget the bound AST context. Every later query gets a committed
    /// negative until a translation unit is started again. Namespace maps
    /// survive, so rebinding the same context keeps its namespaces searchable.
    pub fn release_ast_context(&mut self)
    {
        self.bound_ast = None;
    }

    /// Whether `ast` is the context this bridge serves.
    pub fn is_bound_to(&self, ast: &AstContext) -> bool
    {
        self.bound_ast == Some(ast.id())
    }

    /// Mark that a declaration import is running. While set, every query is
    /// answered with a committed negative.
    pub fn set_import_in_progress(&mut self, in_progress: bool)
    {
        self.import_in_progress = in_progress;
    }

    pub fn lookups_enabled(&self) -> bool
    {
        self.lookups_enabled
    }

    /// Turn external lookups on without an activating identifier.
    pub fn enable_lookups(&mut self)
    {
        self.lookups_enabled = true;
    }

    /// Whether `name` is currently being resolved.
    pub fn is_active_lookup(&self, name: &str) -> bool
    {
        self.active_lookups.contains(name)
    }

    pub fn active_lookup_count(&self) -> usize
    {
        self.active_lookups.len()
    }

    /// Namespace map behind a namespace declaration this bridge created.
    pub fn namespace_map(&self, scope: DeclId) -> Option<&NamespaceMap>
    {
        self.namespace_maps.get(&scope)
    }

    pub(crate) fn register_namespace_map(&mut self, decl: DeclId, map: NamespaceMap)
    {
        self.namespace_maps.insert(decl, map);
    }

    /// Number of namespace resolutions performed so far.
    pub fn namespace_invocations(&self) -> u32
    {
        self.namespaces.invocation_count()
    }

    pub(crate) fn namespace_map_for(&self, name: &str, parent: Option<&NamespaceMap>) -> NamespaceMap
    {
        match self.target {
            Some(target) => self.namespaces.resolve(target.images(), name, parent),
            None => self.namespaces.resolve(&ModuleList::new(), name, parent),
        }
    }
}

impl ExternalAstSource for ExternalDeclSource<'_>
{
    fn start_translation_unit(&mut self, ast: &mut AstContext)
    {
        let tu = ast.translation_unit();
        ast.set_has_external_visible_storage(tu, true);
        ast.set_has_external_lexical_storage(tu, true);
        self.bound_ast = Some(ast.id());
        // Namespace declarations created earlier stay in a rebound context.
        if self.maps_owner != Some(ast.id()) {
            self.namespace_maps.clear();
            self.maps_owner = Some(ast.id());
        }
        tracing::debug!(translation_unit = tu.raw(), "Bound external declaration source");
    }

    fn lookup_visible_by_name(&mut self, ast: &mut AstContext, scope: DeclId, name: &DeclarationName) -> Vec<DeclId>
    {
        if !self.is_bound_to(ast) || self.import_in_progress {
            tracing::trace!(scope = scope.raw(), %name, "No AST bound or import in progress");
            return ast.set_no_external_visible_decls_for_name(scope, name);
        }

        let identifier = match name.kind() {
            NameKind::Identifier => match name.as_identifier() {
                Some(identifier) => identifier,
                None => return Vec::new(),
            },
            NameKind::UsingDirective => {
                return ast.set_no_external_visible_decls_for_name(scope, name);
            }
            NameKind::Operator
            | NameKind::LiteralOperator
            | NameKind::ZeroArgSelector
            | NameKind::OneArgSelector
            | NameKind::MultiArgSelector
            | NameKind::Constructor
            | NameKind::Destructor
            | NameKind::ConversionFunction => {
                tracing::trace!(scope = scope.raw(), %name, "Name kind is never looked up externally");
                return Vec::new();
            }
        };

        if ast.is_builtin_identifier(identifier) {
            tracing::trace!(scope = scope.raw(), identifier, "Built-in identifier");
            return ast.set_no_external_visible_decls_for_name(scope, name);
        }

        if !self.lookups_enabled {
            if identifier.starts_with(self.config.activation_char) {
                tracing::debug!(identifier, "External lookups enabled");
                self.lookups_enabled = true;
            }
            return Vec::new();
        }

        if self.active_lookups.contains(identifier) {
            tracing::trace!(scope = scope.raw(), identifier, "Re-entrant lookup ignored");
            return Vec::new();
        }

        let identifier = identifier.to_string();
        self.active_lookups.insert(identifier.clone());

        let resolver = Rc::clone(&self.resolver);
        let found = {
            let mut context = NameSearchContext::new(self, ast, scope, name);
            resolver.find_external_visible_decls(&mut context);
            context.into_decls()
        };

        tracing::trace!(scope = scope.raw(), identifier = %identifier, found = found.len(), "External lookup finished");
        let committed = ast.set_external_visible_decls_for_name(scope, name, &found);
        self.active_lookups.remove(&identifier);
        committed
    }

    fn lookup_lexical(
        &mut self,
        _ast: &AstContext,
        scope: DeclId,
        _filter: &dyn Fn(DeclCategory) -> bool,
        _result: &mut Vec<DeclId>,
    ) -> ExternalLoadResult
    {
        tracing::trace!(scope = scope.raw(), "Lexical enumeration is not supported; reporting an empty scope");
        ExternalLoadResult::Success
    }

    fn complete_tag_type(&mut self, _ast: &mut AstContext, tag: DeclId)
    {
        tracing::trace!(tag = tag.raw(), "Tag completion requested");
    }

    fn complete_interface_type(&mut self, _ast: &mut AstContext, interface: DeclId)
    {
        tracing::trace!(interface = interface.raw(), "Interface completion requested");
    }

    fn resolve_namespace(&self, name: &str, parent: Option<&NamespaceMap>) -> NamespaceMap
    {
        self.namespace_map_for(name, parent)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_new_bridge_state()
    {
        let bridge = ExternalDeclSource::detached();
        assert!(!bridge.lookups_enabled());
        assert_eq!(bridge.active_lookup_count(), 0);
        assert!(bridge.target().is_none());
        assert_eq!(bridge.config().activation_char, '$');
    }

    #[test]
    fn test_start_translation_unit_marks_root_scope()
    {
        let mut ast = AstContext::new();
        let mut bridge = ExternalDeclSource::detached();
        let tu = ast.translation_unit();
        assert!(!ast.decl(tu).has_external_visible_storage());

        bridge.start_translation_unit(&mut ast);

        assert!(bridge.is_bound_to(&ast));
        assert!(ast.decl(tu).has_external_visible_storage());
        assert!(ast.decl(tu).has_external_lexical_storage());
    }

    #[test]
    fn test_lookups_enabled_at_start()
    {
        let config = BridgeConfig::default().with_lookups_enabled(true);
        let bridge = ExternalDeclSource::with_config(None, config);
        assert!(bridge.lookups_enabled());
    }

    #[test]
    fn test_detached_bridge_resolves_no_namespaces()
    {
        let bridge = ExternalDeclSource::detached();
        assert!(bridge.resolve_namespace("std", None).is_empty());
        assert_eq!(bridge.namespace_invocations(), 1);
    }
}
