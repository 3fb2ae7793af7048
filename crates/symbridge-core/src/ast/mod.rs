//! # Frontend AST Model
//!
//! The smallest slice of a compiler frontend the bridge needs to talk to.
//!
//! An [`AstContext`] owns two arenas, declarations and types, plus the
//! frontend's per-scope lookup cache. Declarations and types are referred to by
//! copyable ids ([`DeclId`], [`TypeId`]); a scope is simply the id of a
//! declaration that can hold other declarations (translation unit, namespace,
//! function, tag, interface).
//!
//! ## Lookup cache
//!
//! When a name cannot be found locally, the frontend asks an external source.
//! The source answers by committing a result for `(scope, name)`:
//!
//! - [`AstContext::set_external_visible_decls_for_name`] records a definitive
//!   answer, which may be empty ("this name does not exist").
//! - [`AstContext::set_no_external_visible_decls_for_name`] records a
//!   definitive negative.
//!
//! Once committed, [`AstContext::lookup_name`] answers from the cache and never
//! asks the external source about that pair again.

pub mod decl;
pub mod name;
pub mod types;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

pub use decl::{Decl, DeclCategory, DeclKind, StorageClass, TagKind};
pub use name::{DeclarationName, NameKind, OperatorKind};
pub use types::{BuiltinType, FunctionProto, Type, TypeDesc};

use crate::source::ExternalAstSource;

/// Identifiers the frontend treats as built-ins.
const DEFAULT_BUILTIN_IDENTIFIERS: &[&str] = &[
    "__builtin_abort",
    "__builtin_constant_p",
    "__builtin_expect",
    "__builtin_memcpy",
    "__builtin_memmove",
    "__builtin_memset",
    "__builtin_offsetof",
    "__builtin_strlen",
    "__builtin_trap",
    "__builtin_types_compatible_p",
    "__builtin_unreachable",
    "__builtin_va_arg",
    "__builtin_va_end",
    "__builtin_va_list",
    "__builtin_va_start",
    "__int128_t",
    "__uint128_t",
];

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identity of an [`AstContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AstContextId(u64);

/// Handle to a declaration in an [`AstContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeclId(u32);

impl DeclId
{
    /// Get the raw index (useful for logging).
    #[must_use]
    pub const fn raw(self) -> u32
    {
        self.0
    }
}

/// Handle to a type in an [`AstContext`].
///
/// Type ids remember which context created them so that a type from one
/// context is never silently used in another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId
{
    owner: AstContextId,
    index: u32,
}

/// The frontend's declaration and type store.
pub struct AstContext
{
    id: AstContextId,
    decls: Vec<Decl>,
    types: Vec<Type>,
    interned_types: HashMap<Type, TypeId>,
    named_tags: HashMap<String, DeclId>,
    named_interfaces: HashMap<String, DeclId>,
    builtin_identifiers: HashSet<String>,
    lookup_cache: HashMap<(DeclId, DeclarationName), Vec<DeclId>>,
    translation_unit: DeclId,
}

impl Default for AstContext
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl AstContext
{
    /// Create an empty context holding only the translation unit.
    #[must_use]
    pub fn new() -> Self
    {
        let id = AstContextId(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed));
        Self {
            id,
            decls: vec![Decl::new(None, None, DeclKind::TranslationUnit)],
            types: Vec::new(),
            interned_types: HashMap::new(),
            named_tags: HashMap::new(),
            named_interfaces: HashMap::new(),
            builtin_identifiers: DEFAULT_BUILTIN_IDENTIFIERS.iter().map(|name| (*name).to_string()).collect(),
            lookup_cache: HashMap::new(),
            translation_unit: DeclId(0),
        }
    }

    pub fn id(&self) -> AstContextId
    {
        self.id
    }

    /// Root scope of the context.
    pub fn translation_unit(&self) -> DeclId
    {
        self.translation_unit
    }

    /// Access a declaration.
    ///
    /// ## Panics
    ///
    /// Panics if `id` was not created by this context.
    pub fn decl(&self, id: DeclId) -> &Decl
    {
        &self.decls[id.0 as usize]
    }

    /// Access a type.
    ///
    /// ## Panics
    ///
    /// Panics if `ty` was not created by this context.
    pub fn ty(&self, ty: TypeId) -> &Type
    {
        assert!(self.contains_type(ty), "type {ty:?} does not belong to this AST context");
        &self.types[ty.index as usize]
    }

    /// Whether `ty` is a valid type of this context.
    pub fn contains_type(&self, ty: TypeId) -> bool
    {
        ty.owner == self.id && (ty.index as usize) < self.types.len()
    }

    pub fn decl_count(&self) -> usize
    {
        self.decls.len()
    }

    // ---- built-in identifiers -------------------------------------------

    pub fn is_builtin_identifier(&self, name: &str) -> bool
    {
        self.builtin_identifiers.contains(name)
    }

    pub fn add_builtin_identifier(&mut self, name: impl Into<String>)
    {
        self.builtin_identifiers.insert(name.into());
    }

    // ---- types ------------------------------------------------------------

    fn intern(&mut self, ty: Type) -> TypeId
    {
        if let Some(existing) = self.interned_types.get(&ty) {
            return *existing;
        }
        let id = TypeId {
            owner: self.id,
            index: u32::try_from(self.types.len()).unwrap_or(u32::MAX),
        };
        self.types.push(ty.clone());
        self.interned_types.insert(ty, id);
        id
    }

    pub fn builtin_type(&mut self, builtin: BuiltinType) -> TypeId
    {
        self.intern(Type::Builtin(builtin))
    }

    pub fn pointer_type(&mut self, pointee: TypeId) -> TypeId
    {
        self.intern(Type::Pointer(pointee))
    }

    pub fn function_type(&mut self, result: TypeId, params: Vec<TypeId>, variadic: bool) -> TypeId
    {
        self.intern(Type::FunctionProto(FunctionProto {
            result,
            params,
            variadic,
        }))
    }

    pub fn function_no_proto_type(&mut self, result: TypeId) -> TypeId
    {
        self.intern(Type::FunctionNoProto { result })
    }

    /// The type of a tag declaration.
    pub fn tag_type(&mut self, tag: DeclId) -> TypeId
    {
        self.intern(Type::Tag(tag))
    }

    /// The type of an interface declaration.
    pub fn interface_type(&mut self, interface: DeclId) -> TypeId
    {
        self.intern(Type::Interface(interface))
    }

    /// Lower an external type description into this context.
    ///
    /// Records and interfaces reuse the translation unit's existing
    /// declaration of the same name, creating one on first sight.
    pub fn import_type(&mut self, desc: &TypeDesc) -> TypeId
    {
        match desc {
            TypeDesc::Builtin(builtin) => self.builtin_type(*builtin),
            TypeDesc::Pointer(pointee) => {
                let pointee = self.import_type(pointee);
                self.pointer_type(pointee)
            }
            TypeDesc::Function {
                result,
                params,
                variadic,
            } => {
                let result = self.import_type(result);
                let params = params.iter().map(|param| self.import_type(param)).collect();
                self.function_type(result, params, *variadic)
            }
            TypeDesc::Record { kind, name } => {
                let existing = self.named_tags.get(name).copied();
                let tag = match existing {
                    Some(tag) => tag,
                    None => self.create_tag(self.translation_unit, name, *kind),
                };
                self.tag_type(tag)
            }
            TypeDesc::Interface { name } => {
                let existing = self.named_interfaces.get(name).copied();
                let interface = match existing {
                    Some(interface) => interface,
                    None => self.create_interface(self.translation_unit, name),
                };
                self.interface_type(interface)
            }
        }
    }

    /// Human readable spelling of a type.
    pub fn type_name(&self, ty: TypeId) -> String
    {
        match self.ty(ty) {
            Type::Builtin(builtin) => builtin.spelling().to_string(),
            Type::Pointer(pointee) => format!("{} *", self.type_name(*pointee)),
            Type::FunctionProto(proto) => {
                let mut params: Vec<String> = proto.params.iter().map(|param| self.type_name(*param)).collect();
                if proto.variadic {
                    params.push("...".to_string());
                }
                format!("{} ({})", self.type_name(proto.result), params.join(", "))
            }
            Type::FunctionNoProto { result } => format!("{} ()", self.type_name(*result)),
            Type::Tag(tag) => {
                let name = self.decl(*tag).name().unwrap_or("<anonymous>");
                match self.decl(*tag).kind() {
                    DeclKind::Tag { kind } => format!("{} {name}", kind.keyword()),
                    _ => name.to_string(),
                }
            }
            Type::Interface(interface) => self.decl(*interface).name().unwrap_or("<anonymous>").to_string(),
        }
    }

    // ---- declarations -----------------------------------------------------

    fn push_decl(&mut self, decl: Decl) -> DeclId
    {
        let id = DeclId(u32::try_from(self.decls.len()).unwrap_or(u32::MAX));
        self.decls.push(decl);
        id
    }

    pub fn create_namespace(&mut self, scope: DeclId, name: &str) -> DeclId
    {
        self.push_decl(Decl::new(Some(name.to_string()), Some(scope), DeclKind::Namespace))
    }

    pub fn create_variable(&mut self, scope: DeclId, name: &str, ty: TypeId, storage: StorageClass) -> DeclId
    {
        self.push_decl(Decl::new(
            Some(name.to_string()),
            Some(scope),
            DeclKind::Variable { ty, storage },
        ))
    }

    /// Create a function declaration with no parameter declarations attached.
    pub fn create_function(&mut self, scope: DeclId, name: &str, ty: TypeId, storage: StorageClass) -> DeclId
    {
        self.push_decl(Decl::new(
            Some(name.to_string()),
            Some(scope),
            DeclKind::Function {
                ty,
                params: Vec::new(),
                storage,
            },
        ))
    }

    pub fn create_parameter(&mut self, scope: DeclId, name: Option<&str>, ty: TypeId, storage: StorageClass) -> DeclId
    {
        self.push_decl(Decl::new(
            name.map(str::to_string),
            Some(scope),
            DeclKind::Parameter { ty, storage },
        ))
    }

    /// Attach parameter declarations to a function, replacing any previous ones.
    pub fn set_params(&mut self, function: DeclId, params: Vec<DeclId>)
    {
        self.decls[function.0 as usize].set_params(params);
    }

    pub fn create_tag(&mut self, scope: DeclId, name: &str, kind: TagKind) -> DeclId
    {
        let tag = self.push_decl(Decl::new(Some(name.to_string()), Some(scope), DeclKind::Tag { kind }));
        if scope == self.translation_unit {
            self.named_tags.entry(name.to_string()).or_insert(tag);
        }
        tag
    }

    pub fn create_interface(&mut self, scope: DeclId, name: &str) -> DeclId
    {
        let interface = self.push_decl(Decl::new(Some(name.to_string()), Some(scope), DeclKind::Interface));
        if scope == self.translation_unit {
            self.named_interfaces.entry(name.to_string()).or_insert(interface);
        }
        interface
    }

    /// Make a declaration visible to ordinary lookup in its own scope.
    pub fn declare(&mut self, decl: DeclId)
    {
        self.decls[decl.0 as usize].set_declared_in_context();
    }

    pub fn set_has_external_visible_storage(&mut self, scope: DeclId, value: bool)
    {
        self.decls[scope.0 as usize].set_has_external_visible_storage(value);
    }

    pub fn set_has_external_lexical_storage(&mut self, scope: DeclId, value: bool)
    {
        self.decls[scope.0 as usize].set_has_external_lexical_storage(value);
    }

    /// One-line description of a declaration, as printed by the CLI.
    pub fn describe_decl(&self, id: DeclId) -> String
    {
        let decl = self.decl(id);
        let name = decl.name().unwrap_or("<unnamed>");
        let storage = match decl.storage_class() {
            Some(StorageClass::Static) => "static ",
            Some(StorageClass::Extern) => "extern ",
            _ => "",
        };
        match decl.kind() {
            DeclKind::TranslationUnit => "translation unit".to_string(),
            DeclKind::Namespace => format!("namespace {name}"),
            DeclKind::Variable { ty, .. } => format!("{storage}{} {name}", self.type_name(*ty)),
            DeclKind::Function { ty, .. } => format!("{storage}function {name}: {}", self.type_name(*ty)),
            DeclKind::Parameter { ty, .. } => format!("{storage}parameter {name}: {}", self.type_name(*ty)),
            DeclKind::Tag { kind } => format!("{} {name}", kind.keyword()),
            DeclKind::Interface => format!("interface {name}"),
        }
    }

    // ---- lookup -----------------------------------------------------------

    /// Commit a definitive answer for `(scope, name)`.
    ///
    /// An empty slice is a valid answer meaning "this name does not exist".
    pub fn set_external_visible_decls_for_name(
        &mut self,
        scope: DeclId,
        name: &DeclarationName,
        decls: &[DeclId],
    ) -> Vec<DeclId>
    {
        self.lookup_cache.insert((scope, name.clone()), decls.to_vec());
        decls.to_vec()
    }

    /// Commit a definitive negative for `(scope, name)`.
    pub fn set_no_external_visible_decls_for_name(&mut self, scope: DeclId, name: &DeclarationName) -> Vec<DeclId>
    {
        self.set_external_visible_decls_for_name(scope, name, &[])
    }

    /// The committed answer for `(scope, name)`, if any.
    pub fn cached_lookup(&self, scope: DeclId, name: &DeclarationName) -> Option<&[DeclId]>
    {
        self.lookup_cache.get(&(scope, name.clone())).map(Vec::as_slice)
    }

    fn local_decls_named(&self, scope: DeclId, name: &DeclarationName) -> Vec<DeclId>
    {
        let Some(identifier) = name.as_identifier() else {
            return Vec::new();
        };
        self.decls
            .iter()
            .enumerate()
            .filter(|(_, decl)| {
                decl.is_declared_in_context() && decl.context() == Some(scope) && decl.name() == Some(identifier)
            })
            .map(|(index, _)| DeclId(u32::try_from(index).unwrap_or(u32::MAX)))
            .collect()
    }

    /// Frontend lookup of `name` directly inside `scope`.
    ///
    /// Order of consultation:
    /// 1. Answers previously committed for `(scope, name)`
    /// 2. Declarations the frontend declared itself
    /// 3. The external source, if the scope has external visible storage
    pub fn lookup_name(
        &mut self,
        scope: DeclId,
        name: &DeclarationName,
        source: &mut dyn ExternalAstSource,
    ) -> Vec<DeclId>
    {
        if let Some(cached) = self.cached_lookup(scope, name) {
            return cached.to_vec();
        }

        let local = self.local_decls_named(scope, name);
        if !local.is_empty() {
            return local;
        }

        if !self.decl(scope).has_external_visible_storage() {
            return Vec::new();
        }

        source.lookup_visible_by_name(self, scope, name)
    }
}
