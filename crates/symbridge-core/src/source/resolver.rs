//! Resolvers that fill a [`NameSearchContext`].

use std::sync::Arc;

use super::search::NameSearchContext;
use crate::symbols::{ExternalSymbol, ExternalSymbolKind, NamespaceHandle};
use crate::target::Module;

/// Populates a search context with the declarations for its query.
///
/// Called by the bridge at most once per non-re-entrant query. Whatever the
/// resolver adds is committed as the definitive answer for the query's
/// `(scope, name)` pair, including an empty result.
pub trait ExternalResolver
{
    fn find_external_visible_decls(&self, context: &mut NameSearchContext<'_, '_>);
}

/// Finds nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullResolver;

impl ExternalResolver for NullResolver
{
    fn find_external_visible_decls(&self, _context: &mut NameSearchContext<'_, '_>) {}
}

/// Resolver backed by the target's module symbol backends.
///
/// - At translation-unit scope every module is searched at top level.
/// - In a namespace the bridge materialized, the search covers exactly the
///   (module, namespace) pairs recorded for it.
/// - Other scopes are never searched.
///
/// Variables, functions and types named after the query are synthesized.
/// The name is then resolved as a namespace; if any module defines it, one
/// namespace declaration standing for all of them is added.
#[derive(Debug, Default, Clone, Copy)]
pub struct ModuleResolver;

impl ExternalResolver for ModuleResolver
{
    fn find_external_visible_decls(&self, context: &mut NameSearchContext<'_, '_>)
    {
        let Some(name) = context.name().as_identifier().map(str::to_string) else {
            return;
        };
        let Some(target) = context.target() else {
            return;
        };

        let at_top_level = context.scope() == context.ast().translation_unit();
        let parent_map = if at_top_level {
            None
        } else {
            match context.namespace_map() {
                Some(map) => Some(map.clone()),
                None => {
                    tracing::trace!(scope = context.scope().raw(), name = %name, "Scope is not searchable");
                    return;
                }
            }
        };

        let search: Vec<(Arc<Module>, Option<NamespaceHandle>)> = match &parent_map {
            Some(map) => map
                .iter()
                .map(|(module, namespace)| (Arc::clone(module), Some(namespace.clone())))
                .collect(),
            None => target
                .images()
                .iter()
                .map(|module| (Arc::clone(module), None))
                .collect(),
        };

        for (module, namespace) in &search {
            let Some(backend) = module.symbol_backend() else {
                continue;
            };
            for symbol in backend.find_symbols(&name, namespace.as_ref()) {
                tracing::trace!(module = %module.file_name(), name = %name, "Found symbol");
                add_symbol(context, &symbol);
            }
        }

        let namespaces = context.resolve_namespace(&name, parent_map.as_ref());
        if !namespaces.is_empty() {
            context.add_namespace_decl(namespaces);
        }
    }
}

fn add_symbol(context: &mut NameSearchContext<'_, '_>, symbol: &ExternalSymbol)
{
    match &symbol.kind {
        ExternalSymbolKind::Variable { ty } => {
            let ty = context.import_type(ty);
            context.add_var_decl(ty);
        }
        ExternalSymbolKind::Function { signature: Some(signature) } => {
            let ty = context.import_type(signature);
            if context.ast().ty(ty).is_function() {
                context.add_fun_decl(ty);
            } else {
                context.add_generic_fun_decl();
            }
        }
        ExternalSymbolKind::Function { signature: None } => {
            context.add_generic_fun_decl();
        }
        ExternalSymbolKind::Type { ty } => {
            let ty = context.import_type(ty);
            context.add_type_decl(ty);
        }
    }
}
