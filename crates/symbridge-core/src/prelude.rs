//! Common module for library exports

pub use crate::ast::{AstContext, DeclId, DeclarationName, TypeDesc};
pub use crate::config::BridgeConfig;
pub use crate::error::{SymbridgeError, SymbridgeResult};
pub use crate::source::{ExternalAstSource, ExternalDeclSource, ExternalResolver, NameSearchContext, NamespaceMap};
pub use crate::symbols::{ExternalSymbol, SymbolBackend, SymbolTable};
pub use crate::target::{Module, ModuleList, Target};
