//! Turns JSON type expressions into arena types
//!
//! A type expression is one of:
//! - a string: a primitive keyword or the name of a declared/imported type
//! - an object: an inline record, one field per key
//! - an array: a list whose item type comes from the first element
//!
//! Records and lists are registered in the module's local table as soon as
//! they are allocated, before their contents are resolved.

use std::collections::HashSet;

use ifacegen_core::{ModuleRegistry, NamingConfig, PrimitiveKind, TypeArena, TypeId};
use serde_json::{Map, Value};
use tracing::trace;

use crate::error::ParserError;

pub struct TypeResolver<'a> {
    arena: &'a mut TypeArena,
    registry: &'a mut ModuleRegistry,
    naming: &'a NamingConfig,
}

impl<'a> TypeResolver<'a> {
    pub fn new(
        arena: &'a mut TypeArena,
        registry: &'a mut ModuleRegistry,
        naming: &'a NamingConfig,
    ) -> Self {
        Self {
            arena,
            registry,
            naming,
        }
    }

    pub fn arena(&self) -> &TypeArena {
        &*self.arena
    }

    pub fn arena_mut(&mut self) -> &mut TypeArena {
        &mut *self.arena
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &*self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ModuleRegistry {
        &mut *self.registry
    }

    /// Resolve `value` as the type of `candidate` inside the scope named
    /// `decoration`. `Ok(None)` means the value carries no structure (an
    /// empty object).
    pub fn resolve(
        &mut self,
        decoration: Option<&str>,
        candidate: &str,
        value: &Value,
    ) -> Result<Option<TypeId>, ParserError> {
        match value {
            Value::Object(fields) => self.resolve_record(decoration, candidate, fields),
            Value::Array(items) => self.resolve_list(decoration, candidate, items).map(Some),
            Value::String(name) => self.resolve_named(name).map(Some),
            Value::Null | Value::Bool(_) | Value::Number(_) => Err(ParserError::UnsupportedShape {
                name: self.naming.decorate(decoration, candidate),
                found: value.to_string(),
            }),
        }
    }

    fn resolve_record(
        &mut self,
        decoration: Option<&str>,
        candidate: &str,
        fields: &Map<String, Value>,
    ) -> Result<Option<TypeId>, ParserError> {
        if fields.is_empty() {
            trace!("Object for {} has no fields, no type produced", candidate);
            return Ok(None);
        }

        let name = self.naming.decorate(decoration, candidate);
        let id = self.arena.alloc_record(name.as_str());
        self.registry.add_local_type(&name, id)?;

        for (field, value) in fields {
            let ty = self.resolve(Some(&name), field, value)?;
            self.arena.add_field(id, field, ty)?;
        }

        trace!("Resolved {}", self.arena.display(id));
        Ok(Some(id))
    }

    fn resolve_list(
        &mut self,
        decoration: Option<&str>,
        candidate: &str,
        items: &[Value],
    ) -> Result<TypeId, ParserError> {
        let name = self.naming.decorate(decoration, candidate);
        let first = items
            .first()
            .ok_or_else(|| ParserError::EmptyListExample { name: name.clone() })?;

        let id = self.arena.alloc_list(name.as_str());
        self.registry.add_local_type(&name, id)?;

        let item = self.resolve(Some(&name), "item", first)?;
        self.arena.set_list_item(id, item)?;

        trace!("Resolved {}", self.arena.display(id));
        Ok(id)
    }

    /// A string type expression: primitive keyword first, then imported and
    /// local types by declared name.
    pub fn resolve_named(&mut self, name: &str) -> Result<TypeId, ParserError> {
        if let Ok(kind) = name.parse::<PrimitiveKind>() {
            return Ok(self.arena.primitive(kind));
        }
        self.lookup_declared(name)
            .ok_or_else(|| ParserError::UnresolvedTypeReference {
                name: self.naming.qualify(name),
            })
    }

    /// Declared or imported type by its IDL name, primitives excluded.
    ///
    /// The name goes through the same alias and prefix rules a `struct`
    /// declaration's name does, so `news_item`, `newsItem` and `NewsItem`
    /// all reach the record registered for that declaration.
    pub fn lookup_declared(&self, name: &str) -> Option<TypeId> {
        self.registry.lookup(&self.naming.decorate(None, name))
    }

    /// Names currently in the local table
    pub fn local_names(&self) -> HashSet<String> {
        self.registry
            .local_types()
            .map(|(name, _)| name.to_string())
            .collect()
    }
}
