//! Resolved modules and the serializable view handed to code emitters

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::module_registry::ModuleRegistry;
use crate::types::{PrimitiveKind, TypeArena, TypeId, TypeKind};

/// An RPC operation
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: String,
    /// Literal wire discriminator. When absent the caller supplies one.
    pub prefix: Option<String>,
    /// Fields delivered in the JSON request body
    pub request: Option<TypeId>,
    /// Out-of-band sections keyed by their declaration name
    pub custom_requests: IndexMap<String, Option<TypeId>>,
    pub response: Option<TypeId>,
    /// Set when a one-field response envelope was flattened to its value
    pub response_arg_name: Option<String>,
}

impl Method {
    pub fn new(name: impl Into<String>, prefix: Option<String>) -> Self {
        Self {
            name: name.into(),
            prefix,
            request: None,
            custom_requests: IndexMap::new(),
            response: None,
            response_arg_name: None,
        }
    }

    /// Every type the method holds directly
    pub fn captured_types(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.request
            .into_iter()
            .chain(self.custom_requests.values().filter_map(|t| *t))
            .chain(self.response)
    }

    pub fn display<'a>(&'a self, arena: &'a TypeArena) -> MethodDisplay<'a> {
        MethodDisplay { method: self, arena }
    }
}

pub struct MethodDisplay<'a> {
    method: &'a Method,
    arena: &'a TypeArena,
}

impl fmt::Display for MethodDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name_of = |id: Option<TypeId>| id.map(|t| self.arena.name(t)).unwrap_or("<none>");
        write!(f, "method {}", self.method.name)?;
        if let Some(prefix) = &self.method.prefix {
            write!(f, " [{}]", prefix)?;
        }
        write!(f, ": request: {}", name_of(self.method.request))?;
        for (section, ty) in &self.method.custom_requests {
            write!(f, ", {}: {}", section, name_of(*ty))?;
        }
        write!(f, ", response: {}", name_of(self.method.response))?;
        if let Some(arg) = &self.method.response_arg_name {
            write!(f, " (as {})", arg)?;
        }
        Ok(())
    }
}

/// A compilation unit: one IDL document after resolution
#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    pub registry: ModuleRegistry,
    pub methods: Vec<Method>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            registry: ModuleRegistry::new(name.clone()),
            name,
            methods: Vec::new(),
        }
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// Reference from one type description to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeRef {
    Primitive(PrimitiveKind),
    Named(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeDescKind {
    Record,
    List,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDesc {
    pub name: String,
    pub alias: String,
    pub ty: Option<TypeRef>,
}

/// Full description of a record or list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDesc {
    pub name: String,
    pub kind: TypeDescKind,
    pub nullable: bool,
    pub reference: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDesc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<TypeRef>,
}

/// Method argument or result. Method-held shapes are not name-addressable,
/// so they are carried inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeDesc {
    Ref(TypeRef),
    Inline(TypeDesc),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRequestDesc {
    pub section: String,
    pub ty: Option<ShapeDesc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDesc {
    pub name: String,
    pub prefix: Option<String>,
    pub request: Option<ShapeDesc>,
    pub custom_requests: Vec<CustomRequestDesc>,
    pub response: Option<ShapeDesc>,
    pub response_arg_name: Option<String>,
}

/// Everything an emitter needs from a resolved module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleIr {
    pub name: String,
    pub imported_modules: Vec<String>,
    pub imported_types: Vec<String>,
    pub types: Vec<TypeDesc>,
    pub structs: Vec<String>,
    pub methods: Vec<MethodDesc>,
}

impl ModuleIr {
    pub fn from_module(module: &Module, arena: &TypeArena) -> Self {
        let registry = &module.registry;
        let types = registry
            .local_types()
            .filter_map(|(_, id)| describe(arena, id))
            .collect();

        let shape = |id: TypeId| -> ShapeDesc {
            let name = arena.name(id);
            match (&arena.get(id).kind, registry.lookup(name) == Some(id)) {
                (TypeKind::Primitive(kind), _) => ShapeDesc::Ref(TypeRef::Primitive(*kind)),
                (_, true) => ShapeDesc::Ref(TypeRef::Named(name.to_string())),
                (_, false) => match describe(arena, id) {
                    Some(desc) => ShapeDesc::Inline(desc),
                    None => ShapeDesc::Ref(TypeRef::Named(name.to_string())),
                },
            }
        };

        let methods = module
            .methods
            .iter()
            .map(|method| MethodDesc {
                name: method.name.clone(),
                prefix: method.prefix.clone(),
                request: method.request.map(&shape),
                custom_requests: method
                    .custom_requests
                    .iter()
                    .map(|(section, ty)| CustomRequestDesc {
                        section: section.clone(),
                        ty: ty.map(&shape),
                    })
                    .collect(),
                response: method.response.map(&shape),
                response_arg_name: method.response_arg_name.clone(),
            })
            .collect();

        Self {
            name: module.name.clone(),
            imported_modules: registry.imported_module_names().to_vec(),
            imported_types: registry
                .imported_types()
                .map(|(name, _)| name.to_string())
                .collect(),
            types,
            structs: registry.struct_names().to_vec(),
            methods,
        }
    }

    pub fn find_type(&self, name: &str) -> Option<&TypeDesc> {
        self.types.iter().find(|t| t.name == name)
    }
}

fn type_ref(arena: &TypeArena, id: TypeId) -> TypeRef {
    match arena.get(id).as_primitive() {
        Some(kind) => TypeRef::Primitive(kind),
        None => TypeRef::Named(arena.name(id).to_string()),
    }
}

/// `None` for primitives, which are never described on their own.
fn describe(arena: &TypeArena, id: TypeId) -> Option<TypeDesc> {
    let def = arena.get(id);
    match &def.kind {
        TypeKind::Primitive(_) => None,
        TypeKind::Record(record) => Some(TypeDesc {
            name: def.name.clone(),
            kind: TypeDescKind::Record,
            nullable: def.nullable,
            reference: def.is_reference(),
            base: record.base().map(|b| arena.name(b).to_string()),
            fields: record
                .fields()
                .map(|f| FieldDesc {
                    name: f.name.clone(),
                    alias: f.alias.clone(),
                    ty: f.ty.map(|t| type_ref(arena, t)),
                })
                .collect(),
            item: None,
        }),
        TypeKind::List(list) => Some(TypeDesc {
            name: def.name.clone(),
            kind: TypeDescKind::List,
            nullable: def.nullable,
            reference: def.is_reference(),
            base: None,
            fields: Vec::new(),
            item: list.item().map(|t| type_ref(arena, t)),
        }),
    }
}
