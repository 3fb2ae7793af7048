//! Per-query declaration accumulator.

use smallvec::SmallVec;

use super::{ExternalDeclSource, NamespaceMap};
use crate::ast::{AstContext, BuiltinType, DeclId, DeclarationName, StorageClass, Type, TypeDesc, TypeId};
use crate::target::Target;

/// Collects the declarations found for one `(scope, name)` query.
///
/// A search context lives only for the duration of one call into an
/// [`ExternalResolver`](super::ExternalResolver). Every synthesis operation
/// appends the declaration it produced; the bridge commits the accumulated
/// list to the frontend once the resolver returns.
///
/// ## Contract
///
/// Types passed to the synthesis operations must belong to the bound
/// [`AstContext`]. A foreign or dangling type means the resolver is broken,
/// and the operation panics.
pub struct NameSearchContext<'c, 't>
{
    source: &'c mut ExternalDeclSource<'t>,
    ast: &'c mut AstContext,
    scope: DeclId,
    name: &'c DeclarationName,
    decls: SmallVec<[DeclId; 4]>,
}

impl<'c, 't> NameSearchContext<'c, 't>
{
    pub(crate) fn new(
        source: &'c mut ExternalDeclSource<'t>,
        ast: &'c mut AstContext,
        scope: DeclId,
        name: &'c DeclarationName,
    ) -> Self
    {
        Self {
            source,
            ast,
            scope,
            name,
            decls: SmallVec::new(),
        }
    }

    /// The name being looked up.
    pub fn name(&self) -> &DeclarationName
    {
        self.name
    }

    /// The scope the name is looked up in.
    pub fn scope(&self) -> DeclId
    {
        self.scope
    }

    pub fn ast(&self) -> &AstContext
    {
        self.ast
    }

    pub fn ast_mut(&mut self) -> &mut AstContext
    {
        self.ast
    }

    /// The target whose modules back this lookup.
    pub fn target(&self) -> Option<&'t Target>
    {
        self.source.target()
    }

    /// Declarations accumulated so far.
    pub fn decls(&self) -> &[DeclId]
    {
        &self.decls
    }

    pub(crate) fn into_decls(self) -> SmallVec<[DeclId; 4]>
    {
        self.decls
    }

    /// Lower an external type description into the bound context.
    pub fn import_type(&mut self, desc: &TypeDesc) -> TypeId
    {
        self.ast.import_type(desc)
    }

    fn assert_owned(&self, ty: TypeId)
    {
        assert!(
            self.ast.contains_type(ty),
            "synthesis for `{}` was given type {ty:?}, which does not belong to the bound AST context",
            self.name
        );
    }

    /// Synthesize a variable of type `ty` named after the query.
    ///
    /// ## Panics
    ///
    /// Panics if `ty` does not belong to the bound AST context.
    pub fn add_var_decl(&mut self, ty: TypeId) -> DeclId
    {
        self.assert_owned(ty);
        let name = self.name.to_string();
        let decl = self.ast.create_variable(self.scope, &name, ty, StorageClass::Static);
        self.decls.push(decl);
        decl
    }

    /// Synthesize a function of type `ty` named after the query.
    ///
    /// When `ty` is a prototype, one unnamed parameter declaration is created
    /// per parameter type, in order.
    ///
    /// ## Panics
    ///
    /// Panics if `ty` does not belong to the bound AST context or is not a
    /// function type.
    pub fn add_fun_decl(&mut self, ty: TypeId) -> DeclId
    {
        self.assert_owned(ty);
        assert!(
            self.ast.ty(ty).is_function(),
            "synthesis of function `{}` was given non-function type {}",
            self.name,
            self.ast.type_name(ty)
        );

        let name = self.name.to_string();
        let function = self.ast.create_function(self.scope, &name, ty, StorageClass::Static);

        if let Some(proto) = self.ast.ty(ty).as_function_proto().cloned() {
            let params = proto
                .params
                .iter()
                .map(|param_ty| {
                    self.ast
                        .create_parameter(function, None, *param_ty, StorageClass::Static)
                })
                .collect();
            self.ast.set_params(function, params);
        }

        self.decls.push(function);
        function
    }

    /// Synthesize a callable placeholder: variadic, no fixed parameters,
    /// returning an unknown type.
    pub fn add_generic_fun_decl(&mut self) -> DeclId
    {
        let unknown = self.ast.builtin_type(BuiltinType::UnknownAny);
        let generic = self.ast.function_type(unknown, Vec::new(), true);
        self.add_fun_decl(generic)
    }

    /// Add the existing declaration behind a tag or interface type.
    ///
    /// Returns `None`, adding nothing, for any other kind of type.
    ///
    /// ## Panics
    ///
    /// Panics if `ty` does not belong to the bound AST context.
    pub fn add_type_decl(&mut self, ty: TypeId) -> Option<DeclId>
    {
        self.assert_owned(ty);
        let decl = match self.ast.ty(ty) {
            Type::Tag(tag) => *tag,
            Type::Interface(interface) => *interface,
            _ => return None,
        };
        self.decls.push(decl);
        Some(decl)
    }

    /// Add declarations that were resolved by other means.
    pub fn add_lookup_result(&mut self, decls: &[DeclId])
    {
        self.decls.extend_from_slice(decls);
    }

    /// Add one already constructed declaration.
    pub fn add_named_decl(&mut self, decl: DeclId)
    {
        self.decls.push(decl);
    }

    /// Namespace map registered for the queried scope, if the scope is a
    /// namespace declaration the bridge materialized.
    pub fn namespace_map(&self) -> Option<&NamespaceMap>
    {
        self.source.namespace_map(self.scope)
    }

    /// Resolve `name` as a namespace through the bridge.
    pub fn resolve_namespace(&self, name: &str, parent: Option<&NamespaceMap>) -> NamespaceMap
    {
        self.source.namespace_map_for(name, parent)
    }

    /// Materialize a namespace declaration for `namespaces` in the queried
    /// scope and add it to the result.
    ///
    /// The new declaration is routed through the bridge for its own lookups:
    /// names inside it are searched in exactly the namespaces of the map.
    pub fn add_namespace_decl(&mut self, namespaces: NamespaceMap) -> DeclId
    {
        let name = self.name.to_string();
        let decl = self.ast.create_namespace(self.scope, &name);
        self.ast.set_has_external_visible_storage(decl, true);
        self.ast.set_has_external_lexical_storage(decl, true);
        self.source.register_namespace_map(decl, namespaces);
        self.decls.push(decl);
        decl
    }

    /// Run a frontend lookup from inside this query.
    ///
    /// The lookup takes the frontend's normal path, so it may come back into
    /// the bridge. A nested query for the name this context is resolving gets
    /// an empty, uncommitted answer.
    pub fn lookup_nested(&mut self, scope: DeclId, name: &DeclarationName) -> Vec<DeclId>
    {
        self.ast.lookup_name(scope, name, &mut *self.source)
    }
}
