//! JSON IDL parser: resolves declarations into a typed module
//!
//! ```
//! use ifacegen_core::NamingConfig;
//! use ifacegen_parser::parse_value;
//! use serde_json::json;
//!
//! let document = json!({"iface": [
//!     {"struct": "Point", "typedef": {"x": "int32", "y": "int32"}},
//!     {"procedure": "getOrigin", "response": {"point": "Point"}}
//! ]});
//! let compilation = parse_value("geo", &document, &NamingConfig::new()).unwrap();
//! let method = compilation.module.method("getOrigin").unwrap();
//! assert_eq!(method.response_arg_name.as_deref(), Some("point"));
//! ```

pub mod declarations;
pub mod error;
pub mod loader;
pub mod resolver;
pub mod source;

use std::path::Path;

use ifacegen_core::NamingConfig;

pub use error::ParserError;
pub use loader::{Compilation, ModuleLoader};
pub use resolver::TypeResolver;
pub use source::{FsSource, IdlSource, MemorySource};

/// Parse an IDL file from disk, following its imports.
pub fn parse_file(path: impl AsRef<Path>, naming: &NamingConfig) -> Result<Compilation, ParserError> {
    ModuleLoader::new(naming.clone()).load(path)
}

/// Parse an already decoded IDL document. Imports resolve against the
/// current directory.
pub fn parse_value(
    name: &str,
    document: &serde_json::Value,
    naming: &NamingConfig,
) -> Result<Compilation, ParserError> {
    ModuleLoader::new(naming.clone()).load_document(name, ".", document)
}
