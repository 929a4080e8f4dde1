//! Core type model and naming rules for the ifacegen IDL compiler

pub mod error;
pub mod ir;
pub mod module_registry;
pub mod naming;
pub mod types;

pub use error::CoreError;
pub use ir::{Method, Module, ModuleIr};
pub use module_registry::ModuleRegistry;
pub use naming::{make_alias, NamingConfig};
pub use types::{PrimitiveKind, TypeArena, TypeId, TypeKind};
