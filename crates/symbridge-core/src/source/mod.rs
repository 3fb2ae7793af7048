//! # External Declaration Source
//!
//! The frontend-facing side of symbol resolution.
//!
//! A frontend that cannot find a name in its own AST asks its
//! [`ExternalAstSource`]. [`ExternalDeclSource`] is the implementation backed by
//! the target's modules. It decides whether a query is worth answering, guards
//! against re-entrant queries for a name that is already being resolved, hands
//! the real work to an [`ExternalResolver`] through a [`NameSearchContext`],
//! and commits the outcome to the frontend's lookup cache.
//!
//! ## Outcomes of a visible-name query
//!
//! | situation | answer | committed |
//! |-----------|--------|-----------|
//! | no bound AST, or an import is in progress | empty | yes |
//! | operator / literal operator / selector / special member | empty | no |
//! | built-in identifier, using directive | empty | yes |
//! | lookups not yet enabled | empty | no |
//! | name already being resolved (re-entrant query) | empty | no |
//! | otherwise | whatever the resolver found, possibly empty | yes |
//!
//! ## Example
//!
//! ```rust
//! use symbridge_core::ast::{AstContext, BuiltinType, DeclarationName, TypeDesc};
//! use symbridge_core::source::{ExternalAstSource, ExternalDeclSource};
//! use symbridge_core::symbols::{ExternalSymbol, SymbolTable};
//! use symbridge_core::target::{Module, Target};
//!
//! let mut table = SymbolTable::new();
//! table.add_symbol(None, ExternalSymbol::variable("counter", TypeDesc::Builtin(BuiltinType::Int)));
//! let mut target = Target::new();
//! target.images_mut().append(Module::with_backend("/bin/app", table));
//!
//! let mut ast = AstContext::new();
//! let mut bridge = ExternalDeclSource::new(&target);
//! bridge.start_translation_unit(&mut ast);
//! bridge.enable_lookups();
//!
//! let tu = ast.translation_unit();
//! let found = ast.lookup_name(tu, &DeclarationName::identifier("counter"), &mut bridge);
//! assert_eq!(found.len(), 1);
//! assert_eq!(ast.describe_decl(found[0]), "static int counter");
//! ```

mod bridge;
pub mod log;
mod namespace;
mod resolver;
mod search;

pub use bridge::ExternalDeclSource;
pub use log::{LookupEvent, LookupLog, NullLog, TracingLog};
pub use namespace::{NamespaceMap, NamespaceResolver};
pub use resolver::{ExternalResolver, ModuleResolver, NullResolver};
pub use search::NameSearchContext;

use crate::ast::{AstContext, DeclCategory, DeclId, DeclarationName};

/// Result of asking an external source to load declarations.
///
/// [`ExternalDeclSource`] only ever reports `Success`: it has nothing to
/// enumerate lexically. `Failure` and `AlreadyLoaded` are part of the
/// contract for other [`ExternalAstSource`] implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalLoadResult
{
    /// The request was handled; the output holds whatever was found.
    Success,
    /// The source could not handle the request.
    Failure,
    /// Nothing to do, the declarations were loaded before.
    AlreadyLoaded,
}

/// What a frontend requires from a supplier of declarations it does not have.
pub trait ExternalAstSource
{
    /// One-time setup for a freshly created translation unit.
    fn start_translation_unit(&mut self, ast: &mut AstContext);

    /// Find the declarations visible as `name` directly inside `scope`.
    ///
    /// Implementations commit their answer through
    /// [`AstContext::set_external_visible_decls_for_name`] or
    /// [`AstContext::set_no_external_visible_decls_for_name`] whenever it is
    /// definitive.
    fn lookup_visible_by_name(&mut self, ast: &mut AstContext, scope: DeclId, name: &DeclarationName) -> Vec<DeclId>;

    /// Enumerate the declarations lexically inside `scope` whose category
    /// passes `filter`, appending them to `result`.
    fn lookup_lexical(
        &mut self,
        ast: &AstContext,
        scope: DeclId,
        filter: &dyn Fn(DeclCategory) -> bool,
        result: &mut Vec<DeclId>,
    ) -> ExternalLoadResult;

    /// Fill in the members of a tag declaration.
    fn complete_tag_type(&mut self, ast: &mut AstContext, tag: DeclId);

    /// Fill in the members of an interface declaration.
    fn complete_interface_type(&mut self, ast: &mut AstContext, interface: DeclId);

    /// Resolve one segment of a namespace-qualified name.
    fn resolve_namespace(&self, name: &str, parent: Option<&NamespaceMap>) -> NamespaceMap;
}
