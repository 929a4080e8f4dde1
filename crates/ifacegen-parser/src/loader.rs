//! Module loading and `import` resolution
//!
//! One [`ModuleLoader`] serves one compiler invocation for one input file.
//! All modules it parses share a single [`TypeArena`], so a type imported
//! from another module is the very same arena slot in every importer.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ifacegen_core::{Module, NamingConfig, TypeArena};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::declarations::{build_method, build_struct};
use crate::error::ParserError;
use crate::resolver::TypeResolver;
use crate::source::{FsSource, IdlSource};

const KEY_IFACE: &str = "iface";
const KEY_IMPORT: &str = "import";

/// A resolved module together with the arena its type ids point into
#[derive(Debug, Clone)]
pub struct Compilation {
    pub arena: TypeArena,
    pub module: Module,
}

impl Compilation {
    pub fn ir(&self) -> ifacegen_core::ModuleIr {
        ifacegen_core::ModuleIr::from_module(&self.module, &self.arena)
    }
}

enum Declaration<'a> {
    Struct(&'a Map<String, Value>),
    Procedure(&'a Map<String, Value>),
    Import(&'a str),
}

impl<'a> Declaration<'a> {
    fn classify(value: &'a Value) -> Result<Self, ParserError> {
        let decl = value.as_object().ok_or_else(|| {
            ParserError::InvalidDeclaration(format!("declaration must be an object, found {}", value))
        })?;

        if decl.contains_key("struct") {
            Ok(Declaration::Struct(decl))
        } else if let Some(import) = decl.get(KEY_IMPORT) {
            import.as_str().map(Declaration::Import).ok_or_else(|| {
                ParserError::InvalidDeclaration(format!("import path must be a string, found {}", import))
            })
        } else if ["procedure", "request", "response"]
            .iter()
            .any(|key| decl.contains_key(*key))
        {
            Ok(Declaration::Procedure(decl))
        } else {
            Err(ParserError::InvalidDeclaration(format!(
                "expected struct, procedure or import, found {}",
                value
            )))
        }
    }
}

pub struct ModuleLoader<S: IdlSource = FsSource> {
    source: S,
    naming: NamingConfig,
    arena: TypeArena,
    /// Fully parsed modules by canonical path
    cache: HashMap<PathBuf, Module>,
    /// Documents currently being parsed, outermost first
    stack: Vec<PathBuf>,
}

impl ModuleLoader<FsSource> {
    pub fn new(naming: NamingConfig) -> Self {
        Self::with_source(FsSource, naming)
    }
}

impl<S: IdlSource> ModuleLoader<S> {
    pub fn with_source(source: S, naming: NamingConfig) -> Self {
        Self {
            source,
            naming,
            arena: TypeArena::new(),
            cache: HashMap::new(),
            stack: Vec::new(),
        }
    }

    /// Parse the document at `path` and everything it imports.
    pub fn load(mut self, path: impl AsRef<Path>) -> Result<Compilation, ParserError> {
        let module = self.parse_module(path.as_ref())?;
        Ok(Compilation {
            arena: self.arena,
            module,
        })
    }

    /// Parse an already decoded document. Imports resolve against `base_dir`.
    pub fn load_document(
        mut self,
        name: &str,
        base_dir: impl AsRef<Path>,
        document: &Value,
    ) -> Result<Compilation, ParserError> {
        let origin = base_dir.as_ref().join(format!("{}.json", name));
        let module_name = self.naming.qualify(name);
        let module = self.parse_document(&module_name, &origin, document)?;
        Ok(Compilation {
            arena: self.arena,
            module,
        })
    }

    /// Module name for a document path: the file name up to its first `.`.
    pub fn module_name_for(&self, path: &Path) -> String {
        let stem = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.split('.').next())
            .unwrap_or_default();
        self.naming.qualify(stem)
    }

    fn parse_module(&mut self, path: &Path) -> Result<Module, ParserError> {
        let key = self.source.canonical(path);
        if let Some(module) = self.cache.get(&key) {
            debug!("Reusing parsed module {} for {}", module.name, path.display());
            return Ok(module.clone());
        }
        if self.stack.contains(&key) {
            let mut chain = self.stack.clone();
            chain.push(key);
            return Err(ParserError::CircularImport(chain));
        }

        let text = self.source.read(path)?;
        let document: Value = serde_json::from_str(&text).map_err(|source| ParserError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        self.stack.push(key.clone());
        let name = self.module_name_for(path);
        let result = self.parse_document(&name, path, &document);
        self.stack.pop();

        let module = result?;
        self.cache.insert(key, module.clone());
        Ok(module)
    }

    fn parse_document(
        &mut self,
        name: &str,
        origin: &Path,
        document: &Value,
    ) -> Result<Module, ParserError> {
        info!("Parsing module {} from {}", name, origin.display());
        let declarations = document
            .get(KEY_IFACE)
            .and_then(Value::as_array)
            .ok_or_else(|| ParserError::MissingIface(origin.to_path_buf()))?;

        let base_dir = origin.parent().unwrap_or_else(|| Path::new(""));
        let mut module = Module::new(name);

        for value in declarations {
            match Declaration::classify(value)? {
                Declaration::Struct(decl) => {
                    let mut resolver =
                        TypeResolver::new(&mut self.arena, &mut module.registry, &self.naming);
                    build_struct(&mut resolver, decl)?;
                }
                Declaration::Procedure(decl) => {
                    let mut resolver =
                        TypeResolver::new(&mut self.arena, &mut module.registry, &self.naming);
                    let method = build_method(&mut resolver, decl)?;
                    module.methods.push(method);
                }
                Declaration::Import(relative) => {
                    self.import_module(&base_dir.join(relative), &mut module)?;
                }
            }
        }

        info!(
            "Module {}: {} types, {} methods, {} imported types",
            module.name,
            module.registry.local_len(),
            module.methods.len(),
            module.registry.imported_len()
        );
        Ok(module)
    }

    /// Merge the exports of the module at `path` into `into`.
    ///
    /// Self-imports and repeated imports are skipped before the file is read.
    fn import_module(&mut self, path: &Path, into: &mut Module) -> Result<(), ParserError> {
        let name = self.module_name_for(path);
        if name == into.name || into.registry.has_imported_module(&name) {
            debug!("Import of {} into {} is a no-op", name, into.name);
            return Ok(());
        }

        debug!("Importing {} into {}", path.display(), into.name);
        let imported = self.parse_module(path)?;
        into.registry.merge_exports(&imported.registry)?;
        Ok(())
    }
}
