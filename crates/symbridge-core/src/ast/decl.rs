//! Declaration nodes.

use super::{DeclId, TypeId};

/// Storage classification of a variable, function or parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageClass
{
    None,
    Extern,
    /// Internal linkage. Every declaration synthesized for an external symbol
    /// uses this class.
    Static,
}

/// Flavour of a tag declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind
{
    Struct,
    Class,
    Union,
    Enum,
}

impl TagKind
{
    pub fn keyword(self) -> &'static str
    {
        match self {
            TagKind::Struct => "struct",
            TagKind::Class => "class",
            TagKind::Union => "union",
            TagKind::Enum => "enum",
        }
    }
}

/// Payload-free declaration kind, used by lexical enumeration filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclCategory
{
    TranslationUnit,
    Namespace,
    Variable,
    Function,
    Parameter,
    Tag,
    Interface,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclKind
{
    TranslationUnit,
    Namespace,
    Variable
    {
        ty: TypeId,
        storage: StorageClass,
    },
    Function
    {
        ty: TypeId,
        params: Vec<DeclId>,
        storage: StorageClass,
    },
    Parameter
    {
        ty: TypeId,
        storage: StorageClass,
    },
    Tag
    {
        kind: TagKind
    },
    Interface,
}

/// A declaration in the frontend's arena.
#[derive(Debug, Clone)]
pub struct Decl
{
    name: Option<String>,
    context: Option<DeclId>,
    kind: DeclKind,
    declared_in_context: bool,
    external_visible_storage: bool,
    external_lexical_storage: bool,
}

impl Decl
{
    pub(crate) fn new(name: Option<String>, context: Option<DeclId>, kind: DeclKind) -> Self
    {
        Self {
            name,
            context,
            kind,
            declared_in_context: false,
            external_visible_storage: false,
            external_lexical_storage: false,
        }
    }

    /// Declared name; parameters synthesized from prototypes are unnamed.
    pub fn name(&self) -> Option<&str>
    {
        self.name.as_deref()
    }

    /// The enclosing scope, `None` only for the translation unit.
    pub fn context(&self) -> Option<DeclId>
    {
        self.context
    }

    pub fn kind(&self) -> &DeclKind
    {
        &self.kind
    }

    pub fn category(&self) -> DeclCategory
    {
        match self.kind {
            DeclKind::TranslationUnit => DeclCategory::TranslationUnit,
            DeclKind::Namespace => DeclCategory::Namespace,
            DeclKind::Variable { .. } => DeclCategory::Variable,
            DeclKind::Function { .. } => DeclCategory::Function,
            DeclKind::Parameter { .. } => DeclCategory::Parameter,
            DeclKind::Tag { .. } => DeclCategory::Tag,
            DeclKind::Interface => DeclCategory::Interface,
        }
    }

    /// Whether this declaration can act as a lookup scope.
    pub fn is_decl_context(&self) -> bool
    {
        matches!(
            self.kind,
            DeclKind::TranslationUnit
                | DeclKind::Namespace
                | DeclKind::Function { .. }
                | DeclKind::Tag { .. }
                | DeclKind::Interface
        )
    }

    pub fn is_namespace(&self) -> bool
    {
        matches!(self.kind, DeclKind::Namespace)
    }

    /// Type of a variable, function or parameter.
    pub fn ty(&self) -> Option<TypeId>
    {
        match self.kind {
            DeclKind::Variable { ty, .. } | DeclKind::Function { ty, .. } | DeclKind::Parameter { ty, .. } => Some(ty),
            _ => None,
        }
    }

    pub fn storage_class(&self) -> Option<StorageClass>
    {
        match self.kind {
            DeclKind::Variable { storage, .. }
            | DeclKind::Function { storage, .. }
            | DeclKind::Parameter { storage, .. } => Some(storage),
            _ => None,
        }
    }

    /// Parameter declarations of a function, in order.
    pub fn params(&self) -> &[DeclId]
    {
        match &self.kind {
            DeclKind::Function { params, .. } => params,
            _ => &[],
        }
    }

    /// Whether the frontend itself declared this in its scope, as opposed to a
    /// declaration that is only reachable through committed lookup answers.
    pub fn is_declared_in_context(&self) -> bool
    {
        self.declared_in_context
    }

    pub fn has_external_visible_storage(&self) -> bool
    {
        self.external_visible_storage
    }

    pub fn has_external_lexical_storage(&self) -> bool
    {
        self.external_lexical_storage
    }

    pub(crate) fn set_declared_in_context(&mut self)
    {
        self.declared_in_context = true;
    }

    pub(crate) fn set_has_external_visible_storage(&mut self, value: bool)
    {
        self.external_visible_storage = value;
    }

    pub(crate) fn set_has_external_lexical_storage(&mut self, value: bool)
    {
        self.external_lexical_storage = value;
    }

    pub(crate) fn set_params(&mut self, new_params: Vec<DeclId>)
    {
        if let DeclKind::Function { params, .. } = &mut self.kind {
            *params = new_params;
        }
    }
}
