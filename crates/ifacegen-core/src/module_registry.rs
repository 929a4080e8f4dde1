//! Per-module type tables
//!
//! Every module keeps two ordered tables: types it declares itself and types
//! it received through `import`. A name lives in at most one of them. Lookup
//! consults the imported table first, so a module can never shadow a type it
//! imported.

use indexmap::IndexMap;

use crate::error::CoreError;
use crate::types::TypeId;

#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    /// Owning module's name, used in error messages
    module: String,
    /// Locally declared types in declaration order
    local: IndexMap<String, TypeId>,
    /// Types merged in from imported modules
    imported: IndexMap<String, TypeId>,
    /// Local types that came from `struct` declarations
    structs: Vec<String>,
    /// Names of modules already merged in
    imported_modules: Vec<String>,
}

impl ModuleRegistry {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            ..Default::default()
        }
    }

    pub fn module_name(&self) -> &str {
        &self.module
    }

    fn duplicate(&self, name: &str) -> CoreError {
        CoreError::DuplicateTypeName {
            name: name.to_string(),
            module: self.module.clone(),
        }
    }

    /// Register a locally declared type. Fails if the name is taken in either
    /// table.
    pub fn add_local_type(&mut self, name: &str, id: TypeId) -> Result<(), CoreError> {
        if self.local.contains_key(name) || self.imported.contains_key(name) {
            return Err(self.duplicate(name));
        }
        self.local.insert(name.to_string(), id);
        Ok(())
    }

    /// Drop a local type from name lookup. Declaration order of the rest is
    /// kept.
    pub fn remove_local_type(&mut self, name: &str) -> Option<TypeId> {
        self.local.shift_remove(name)
    }

    /// Register a type received from another module. Fails if the module
    /// declares the name itself; a repeated import of the same name keeps the
    /// latest entry.
    pub fn add_imported_type(&mut self, name: &str, id: TypeId) -> Result<(), CoreError> {
        if self.local.contains_key(name) {
            return Err(self.duplicate(name));
        }
        self.imported.insert(name.to_string(), id);
        Ok(())
    }

    /// Imported types first, then local ones.
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.imported
            .get(name)
            .or_else(|| self.local.get(name))
            .copied()
    }

    pub fn is_local(&self, name: &str) -> bool {
        self.local.contains_key(name)
    }

    pub fn local_types(&self) -> impl Iterator<Item = (&str, TypeId)> {
        self.local.iter().map(|(name, id)| (name.as_str(), *id))
    }

    pub fn imported_types(&self) -> impl Iterator<Item = (&str, TypeId)> {
        self.imported.iter().map(|(name, id)| (name.as_str(), *id))
    }

    pub fn local_len(&self) -> usize {
        self.local.len()
    }

    pub fn imported_len(&self) -> usize {
        self.imported.len()
    }

    /// Mark a local type as coming from an explicit `struct` declaration.
    pub fn mark_struct(&mut self, name: &str) {
        if !self.structs.iter().any(|s| s == name) {
            self.structs.push(name.to_string());
        }
    }

    pub fn struct_names(&self) -> &[String] {
        &self.structs
    }

    pub fn is_struct(&self, name: &str) -> bool {
        self.structs.iter().any(|s| s == name)
    }

    pub fn imported_module_names(&self) -> &[String] {
        &self.imported_modules
    }

    pub fn has_imported_module(&self, name: &str) -> bool {
        self.imported_modules.iter().any(|m| m == name)
    }

    /// Merge every type `other` can see into this registry's imported table.
    ///
    /// Importing a module twice, or importing oneself, does nothing. A name
    /// that collides with a local declaration fails the whole merge before
    /// anything is inserted.
    pub fn merge_exports(&mut self, other: &ModuleRegistry) -> Result<bool, CoreError> {
        if other.module == self.module || self.has_imported_module(&other.module) {
            tracing::debug!(
                "Module {} already visible in {}, skipping import",
                other.module,
                self.module
            );
            return Ok(false);
        }

        let exported: Vec<(&str, TypeId)> =
            other.imported_types().chain(other.local_types()).collect();
        if let Some((name, _)) = exported.iter().find(|(name, _)| self.local.contains_key(*name)) {
            return Err(self.duplicate(name));
        }

        for (name, id) in exported {
            self.imported.insert(name.to_string(), id);
        }
        self.imported_modules.push(other.module.clone());
        tracing::debug!(
            "Imported {} types from {} into {}",
            other.local_len() + other.imported_len(),
            other.module,
            self.module
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeArena;

    fn registry_with(module: &str, arena: &mut TypeArena, names: &[&str]) -> ModuleRegistry {
        let mut registry = ModuleRegistry::new(module);
        for name in names {
            let id = arena.alloc_record(*name);
            registry.add_local_type(name, id).unwrap();
        }
        registry
    }

    #[test]
    fn test_duplicate_local_type() {
        let mut arena = TypeArena::new();
        let mut registry = registry_with("a", &mut arena, &["Point"]);
        let other = arena.alloc_record("Point");
        assert_eq!(
            registry.add_local_type("Point", other),
            Err(CoreError::DuplicateTypeName {
                name: "Point".to_string(),
                module: "a".to_string()
            })
        );
    }

    #[test]
    fn test_lookup_prefers_imported() {
        let mut arena = TypeArena::new();
        let mut registry = ModuleRegistry::new("a");
        let imported = arena.alloc_record("Shared");
        registry.add_imported_type("Shared", imported).unwrap();
        assert_eq!(registry.lookup("Shared"), Some(imported));
        assert!(!registry.is_local("Shared"));
        assert_eq!(registry.lookup("Missing"), None);
    }

    #[test]
    fn test_merge_exports() {
        let mut arena = TypeArena::new();
        let b = registry_with("b", &mut arena, &["T", "U"]);
        let mut a = registry_with("a", &mut arena, &["Local"]);

        assert!(a.merge_exports(&b).unwrap());
        assert_eq!(a.imported_len(), 2);
        assert_eq!(a.imported_module_names(), ["b".to_string()]);

        // Second import is a no-op
        assert!(!a.merge_exports(&b).unwrap());
        assert_eq!(a.imported_len(), 2);

        // Declaring an imported name locally fails
        let t = arena.alloc_record("T");
        assert!(matches!(
            a.add_local_type("T", t),
            Err(CoreError::DuplicateTypeName { .. })
        ));
    }

    #[test]
    fn test_merge_includes_transitive_imports() {
        let mut arena = TypeArena::new();
        let c = registry_with("c", &mut arena, &["Deep"]);
        let mut b = registry_with("b", &mut arena, &["Mid"]);
        b.merge_exports(&c).unwrap();
        let mut a = ModuleRegistry::new("a");
        a.merge_exports(&b).unwrap();

        let names: Vec<&str> = a.imported_types().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Deep", "Mid"]);
    }

    #[test]
    fn test_merge_collision_inserts_nothing() {
        let mut arena = TypeArena::new();
        let b = registry_with("b", &mut arena, &["Fresh", "Taken"]);
        let mut a = registry_with("a", &mut arena, &["Taken"]);
        assert!(a.merge_exports(&b).is_err());
        assert_eq!(a.imported_len(), 0);
        assert!(!a.has_imported_module("b"));
    }

    #[test]
    fn test_self_import_is_noop() {
        let mut arena = TypeArena::new();
        let mut a = registry_with("a", &mut arena, &["T"]);
        let snapshot = a.clone();
        assert!(!a.merge_exports(&snapshot).unwrap());
        assert_eq!(a.imported_len(), 0);
    }

    #[test]
    fn test_structs_and_removal() {
        let mut arena = TypeArena::new();
        let mut registry = registry_with("a", &mut arena, &["Point", "GetOriginInfo", "Line"]);
        registry.mark_struct("Point");
        registry.mark_struct("Point");
        assert_eq!(registry.struct_names(), ["Point".to_string()]);
        assert!(registry.is_struct("Point"));

        assert!(registry.remove_local_type("GetOriginInfo").is_some());
        let names: Vec<&str> = registry.local_types().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Point", "Line"]);
    }
}
