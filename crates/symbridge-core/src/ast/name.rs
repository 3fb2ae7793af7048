//! Declaration names.
//!
//! A frontend does not only look up plain identifiers: operator names,
//! selectors and special member names all travel through the same lookup
//! entry point. The bridge decides from the [`NameKind`] whether a name is
//! worth asking the program's symbol stores about at all.

use std::fmt;

use super::TypeId;

/// Overloadable operator spelled in an `operator` name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind
{
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Exclaim,
    Equal,
    Less,
    Greater,
    EqualEqual,
    ExclaimEqual,
    LessEqual,
    GreaterEqual,
    AmpAmp,
    PipePipe,
    PlusPlus,
    MinusMinus,
    Arrow,
    Subscript,
    Call,
    New,
    Delete,
}

impl OperatorKind
{
    /// Source spelling of the operator token.
    pub fn spelling(self) -> &'static str
    {
        match self {
            OperatorKind::Plus => "+",
            OperatorKind::Minus => "-",
            OperatorKind::Star => "*",
            OperatorKind::Slash => "/",
            OperatorKind::Percent => "%",
            OperatorKind::Amp => "&",
            OperatorKind::Pipe => "|",
            OperatorKind::Caret => "^",
            OperatorKind::Tilde => "~",
            OperatorKind::Exclaim => "!",
            OperatorKind::Equal => "=",
            OperatorKind::Less => "<",
            OperatorKind::Greater => ">",
            OperatorKind::EqualEqual => "==",
            OperatorKind::ExclaimEqual => "!=",
            OperatorKind::LessEqual => "<=",
            OperatorKind::GreaterEqual => ">=",
            OperatorKind::AmpAmp => "&&",
            OperatorKind::PipePipe => "||",
            OperatorKind::PlusPlus => "++",
            OperatorKind::MinusMinus => "--",
            OperatorKind::Arrow => "->",
            OperatorKind::Subscript => "[]",
            OperatorKind::Call => "()",
            OperatorKind::New => " new",
            OperatorKind::Delete => " delete",
        }
    }
}

/// The name being looked up.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeclarationName
{
    /// Plain identifier (`foo`, `$result`).
    Identifier(String),
    /// Overloaded operator (`operator+`).
    Operator(OperatorKind),
    /// User-defined literal operator (`operator "" _km`).
    LiteralOperator(String),
    /// Messaging selector without arguments (`count`).
    ZeroArgSelector(String),
    /// Messaging selector with one argument (`objectAtIndex:`).
    OneArgSelector(String),
    /// Messaging selector with several argument pieces (`setObject:forKey:`).
    MultiArgSelector(Vec<String>),
    /// Constructor of the given class type.
    Constructor(TypeId),
    /// Destructor of the given class type.
    Destructor(TypeId),
    /// Conversion function to the given type.
    ConversionFunction(TypeId),
    /// Marker name under which using-directives are stored.
    UsingDirective,
}

/// Discriminant of a [`DeclarationName`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameKind
{
    Identifier,
    Operator,
    LiteralOperator,
    ZeroArgSelector,
    OneArgSelector,
    MultiArgSelector,
    Constructor,
    Destructor,
    ConversionFunction,
    UsingDirective,
}

impl DeclarationName
{
    /// Shorthand for an identifier name.
    pub fn identifier(name: impl Into<String>) -> Self
    {
        DeclarationName::Identifier(name.into())
    }

    pub fn kind(&self) -> NameKind
    {
        match self {
            DeclarationName::Identifier(_) => NameKind::Identifier,
            DeclarationName::Operator(_) => NameKind::Operator,
            DeclarationName::LiteralOperator(_) => NameKind::LiteralOperator,
            DeclarationName::ZeroArgSelector(_) => NameKind::ZeroArgSelector,
            DeclarationName::OneArgSelector(_) => NameKind::OneArgSelector,
            DeclarationName::MultiArgSelector(_) => NameKind::MultiArgSelector,
            DeclarationName::Constructor(_) => NameKind::Constructor,
            DeclarationName::Destructor(_) => NameKind::Destructor,
            DeclarationName::ConversionFunction(_) => NameKind::ConversionFunction,
            DeclarationName::UsingDirective => NameKind::UsingDirective,
        }
    }

    /// The identifier string, if this is an identifier name.
    pub fn as_identifier(&self) -> Option<&str>
    {
        match self {
            DeclarationName::Identifier(name) => Some(name),
            _ => None,
        }
    }
}

impl From<&str> for DeclarationName
{
    fn from(name: &str) -> Self
    {
        DeclarationName::identifier(name)
    }
}

impl fmt::Display for DeclarationName
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            DeclarationName::Identifier(name) | DeclarationName::ZeroArgSelector(name) => write!(f, "{name}"),
            DeclarationName::Operator(op) => write!(f, "operator{}", op.spelling()),
            DeclarationName::LiteralOperator(suffix) => write!(f, "operator \"\" {suffix}"),
            DeclarationName::OneArgSelector(piece) => write!(f, "{piece}:"),
            DeclarationName::MultiArgSelector(pieces) => {
                for piece in pieces {
                    write!(f, "{piece}:")?;
                }
                Ok(())
            }
            DeclarationName::Constructor(_) => write!(f, "<constructor>"),
            DeclarationName::Destructor(_) => write!(f, "<destructor>"),
            DeclarationName::ConversionFunction(_) => write!(f, "<conversion function>"),
            DeclarationName::UsingDirective => write!(f, "<using-directive>"),
        }
    }
}
