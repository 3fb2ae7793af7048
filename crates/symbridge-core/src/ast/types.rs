//! Frontend types and backend-neutral type descriptions.
//!
//! [`Type`] lives in an [`AstContext`](super::AstContext) arena and is what
//! synthesized declarations refer to. [`TypeDesc`] is what symbol backends
//! hand us: a self-contained description that the frontend lowers into its
//! arena with [`AstContext::import_type`](super::AstContext::import_type).

use std::fmt;

use super::{DeclId, TypeId};
use crate::ast::decl::TagKind;

/// Built-in scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinType
{
    Void,
    Bool,
    Char,
    SChar,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    Int128,
    UInt128,
    Float,
    Double,
    LongDouble,
    /// Placeholder whose real type is not known yet. Expressions using a
    /// value of this type must cast it before use.
    UnknownAny,
}

impl BuiltinType
{
    pub fn spelling(self) -> &'static str
    {
        match self {
            BuiltinType::Void => "void",
            BuiltinType::Bool => "bool",
            BuiltinType::Char => "char",
            BuiltinType::SChar => "signed char",
            BuiltinType::UChar => "unsigned char",
            BuiltinType::Short => "short",
            BuiltinType::UShort => "unsigned short",
            BuiltinType::Int => "int",
            BuiltinType::UInt => "unsigned int",
            BuiltinType::Long => "long",
            BuiltinType::ULong => "unsigned long",
            BuiltinType::Int128 => "__int128",
            BuiltinType::UInt128 => "unsigned __int128",
            BuiltinType::Float => "float",
            BuiltinType::Double => "double",
            BuiltinType::LongDouble => "long double",
            BuiltinType::UnknownAny => "__unknown_any",
        }
    }
}

impl fmt::Display for BuiltinType
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.spelling())
    }
}

/// A function type that carries its parameter list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionProto
{
    pub result: TypeId,
    pub params: Vec<TypeId>,
    pub variadic: bool,
}

/// A type node in the frontend's arena.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type
{
    Builtin(BuiltinType),
    Pointer(TypeId),
    FunctionProto(FunctionProto),
    /// Function type without a parameter list (K&R style declarations).
    FunctionNoProto
    {
        result: TypeId
    },
    /// struct / class / union / enum, referring to its declaration.
    Tag(DeclId),
    /// Object interface type, referring to its declaration.
    Interface(DeclId),
}

impl Type
{
    /// The prototype, if this is a function type with a parameter list.
    pub fn as_function_proto(&self) -> Option<&FunctionProto>
    {
        match self {
            Type::FunctionProto(proto) => Some(proto),
            _ => None,
        }
    }

    pub fn is_function(&self) -> bool
    {
        matches!(self, Type::FunctionProto(_) | Type::FunctionNoProto { .. })
    }
}

/// Backend-neutral description of an external type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDesc
{
    Builtin(BuiltinType),
    Pointer(Box<TypeDesc>),
    Function
    {
        result: Box<TypeDesc>,
        params: Vec<TypeDesc>,
        variadic: bool,
    },
    /// Named record type. Anonymous records are named `<anonymous>`.
    Record
    {
        kind: TagKind,
        name: String,
    },
    Interface
    {
        name: String
    },
}

impl TypeDesc
{
    /// Type whose shape could not be determined.
    pub fn unknown() -> Self
    {
        TypeDesc::Builtin(BuiltinType::UnknownAny)
    }

    pub fn pointer_to(pointee: TypeDesc) -> Self
    {
        TypeDesc::Pointer(Box::new(pointee))
    }

    /// Non-variadic function prototype.
    pub fn function(result: TypeDesc, params: Vec<TypeDesc>) -> Self
    {
        TypeDesc::Function {
            result: Box::new(result),
            params,
            variadic: false,
        }
    }

    pub fn record(kind: TagKind, name: impl Into<String>) -> Self
    {
        TypeDesc::Record { kind, name: name.into() }
    }
}

impl fmt::Display for TypeDesc
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            TypeDesc::Builtin(builtin) => write!(f, "{builtin}"),
            TypeDesc::Pointer(pointee) => write!(f, "{pointee} *"),
            TypeDesc::Function {
                result,
                params,
                variadic,
            } => {
                write!(f, "{result} (")?;
                for (index, param) in params.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{param}")?;
                }
                if *variadic {
                    write!(f, "{}...", if params.is_empty() { "" } else { ", " })?;
                }
                write!(f, ")")
            }
            TypeDesc::Record { kind, name } => write!(f, "{} {name}", kind.keyword()),
            TypeDesc::Interface { name } => write!(f, "{name}"),
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_type_desc_display()
    {
        let desc = TypeDesc::Function {
            result: Box::new(TypeDesc::Builtin(BuiltinType::Int)),
            params: vec![
                TypeDesc::pointer_to(TypeDesc::Builtin(BuiltinType::Char)),
                TypeDesc::record(TagKind::Struct, "point"),
            ],
            variadic: true,
        };
        assert_eq!(desc.to_string(), "int (char *, struct point, ...)");
    }

    #[test]
    fn test_unknown_is_unknown_any()
    {
        assert_eq!(TypeDesc::unknown(), TypeDesc::Builtin(BuiltinType::UnknownAny));
    }
}
