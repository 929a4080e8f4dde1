//! Type model: primitive, record and list types stored in an arena
//!
//! Records are allocated before their fields are resolved, so a field can
//! point at the record being built through its [`TypeId`]. No type ever owns
//! another type; every edge in the graph is an id into [`TypeArena`].

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::naming::make_alias;

/// The fixed set of wire primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Int32,
    Int64,
    Double,
    Bool,
    String,
    /// Opaque JSON object
    Raw,
    /// JSON object carried as a serialized string
    RawStr,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 7] = [
        PrimitiveKind::Int32,
        PrimitiveKind::Int64,
        PrimitiveKind::Double,
        PrimitiveKind::Bool,
        PrimitiveKind::String,
        PrimitiveKind::Raw,
        PrimitiveKind::RawStr,
    ];

    /// IDL keyword for this primitive
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::Int32 => "int32",
            PrimitiveKind::Int64 => "int64",
            PrimitiveKind::Double => "double",
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::String => "string",
            PrimitiveKind::Raw => "raw",
            PrimitiveKind::RawStr => "rawstr",
        }
    }

    /// Scalars are passed by value, everything else by reference.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            PrimitiveKind::Int32 | PrimitiveKind::Int64 | PrimitiveKind::Double | PrimitiveKind::Bool
        )
    }
}

impl FromStr for PrimitiveKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PrimitiveKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CoreError::UnknownPrimitiveKind(s.to_string()))
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable handle of a type inside a [`TypeArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A record field as declared in the IDL
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Wire name, exactly as written in the document
    pub name: String,
    /// Identifier-safe rendering of `name`
    pub alias: String,
    /// `None` when the example value carried no structure (`{}`)
    pub ty: Option<TypeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordType {
    fields: IndexMap<String, Field>,
    base: Option<TypeId>,
}

impl RecordType {
    pub fn base(&self) -> Option<TypeId> {
        self.base
    }

    /// Own fields in declaration order, base fields excluded
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn own_field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListType {
    item: Option<TypeId>,
}

impl ListType {
    pub fn item(&self) -> Option<TypeId> {
        self.item
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Primitive(PrimitiveKind),
    Record(RecordType),
    List(ListType),
}

/// One slot of the arena
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    pub name: String,
    pub nullable: bool,
    pub kind: TypeKind,
}

impl TypeDef {
    /// Whether values of this type are held by reference in generated code
    pub fn is_reference(&self) -> bool {
        match &self.kind {
            TypeKind::Primitive(kind) => !kind.is_scalar(),
            TypeKind::Record(_) | TypeKind::List(_) => true,
        }
    }

    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match &self.kind {
            TypeKind::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordType> {
        match &self.kind {
            TypeKind::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListType> {
        match &self.kind {
            TypeKind::List(list) => Some(list),
            _ => None,
        }
    }
}

/// Owner of every type produced during one compiler run
#[derive(Debug, Clone, Default)]
pub struct TypeArena {
    types: Vec<TypeDef>,
    primitives: IndexMap<PrimitiveKind, TypeId>,
}

impl TypeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn push(&mut self, def: TypeDef) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(def);
        id
    }

    /// Primitives are interned: one slot per kind.
    pub fn primitive(&mut self, kind: PrimitiveKind) -> TypeId {
        if let Some(id) = self.primitives.get(&kind) {
            return *id;
        }
        let id = self.push(TypeDef {
            name: kind.as_str().to_string(),
            nullable: false,
            kind: TypeKind::Primitive(kind),
        });
        self.primitives.insert(kind, id);
        id
    }

    /// Parses an IDL keyword into an interned primitive.
    pub fn primitive_from_keyword(&mut self, keyword: &str) -> Result<TypeId, CoreError> {
        let kind = keyword.parse::<PrimitiveKind>()?;
        Ok(self.primitive(kind))
    }

    /// Allocate an empty record. Fields are added with [`TypeArena::add_field`].
    pub fn alloc_record(&mut self, name: impl Into<String>) -> TypeId {
        self.push(TypeDef {
            name: name.into(),
            nullable: false,
            kind: TypeKind::Record(RecordType::default()),
        })
    }

    /// Allocate a list whose item type is not known yet.
    pub fn alloc_list(&mut self, name: impl Into<String>) -> TypeId {
        self.push(TypeDef {
            name: name.into(),
            nullable: false,
            kind: TypeKind::List(ListType::default()),
        })
    }

    /// # Panics
    /// If `id` was not produced by this arena.
    pub fn get(&self, id: TypeId) -> &TypeDef {
        &self.types[id.index()]
    }

    pub fn name(&self, id: TypeId) -> &str {
        &self.get(id).name
    }

    pub fn record(&self, id: TypeId) -> Option<&RecordType> {
        self.get(id).as_record()
    }

    pub fn list(&self, id: TypeId) -> Option<&ListType> {
        self.get(id).as_list()
    }

    fn record_mut(&mut self, id: TypeId) -> Result<&mut RecordType, CoreError> {
        let def = &mut self.types[id.index()];
        match &mut def.kind {
            TypeKind::Record(record) => Ok(record),
            _ => Err(CoreError::NotARecord(def.name.clone())),
        }
    }

    pub fn add_field(
        &mut self,
        record: TypeId,
        name: &str,
        ty: Option<TypeId>,
    ) -> Result<(), CoreError> {
        let type_name = self.name(record).to_string();
        let target = self.record_mut(record)?;
        if target.fields.contains_key(name) {
            return Err(CoreError::DuplicateField {
                type_name,
                field: name.to_string(),
            });
        }
        target.fields.insert(
            name.to_string(),
            Field {
                name: name.to_string(),
                alias: make_alias(name),
                ty,
            },
        );
        Ok(())
    }

    pub fn set_base(&mut self, record: TypeId, base: TypeId) -> Result<(), CoreError> {
        if self.record(base).is_none() {
            return Err(CoreError::NotARecord(self.name(base).to_string()));
        }
        self.record_mut(record)?.base = Some(base);
        Ok(())
    }

    /// Item type is fixed once; a second call is ignored.
    pub fn set_list_item(&mut self, list: TypeId, item: Option<TypeId>) -> Result<(), CoreError> {
        let def = &mut self.types[list.index()];
        match &mut def.kind {
            TypeKind::List(target) => {
                if target.item.is_none() {
                    target.item = item;
                }
                Ok(())
            }
            _ => Err(CoreError::NotAList(def.name.clone())),
        }
    }

    /// Records from the root of the inheritance chain down to `record`.
    fn lineage(&self, record: TypeId) -> Vec<TypeId> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(record);
        while let Some(id) = current {
            if !seen.insert(id) {
                break;
            }
            chain.push(id);
            current = self.record(id).and_then(RecordType::base);
        }
        chain.reverse();
        chain
    }

    /// Field lookup that resolves to the nearest ancestor declaring `name`,
    /// falling back to the record's own declaration.
    pub fn field(&self, record: TypeId, name: &str) -> Option<&Field> {
        self.lineage(record)
            .into_iter()
            .filter_map(|id| self.record(id))
            .find_map(|r| r.own_field(name))
    }

    /// `None` for an unknown field, `Some(None)` for a field without structure.
    pub fn field_type(&self, record: TypeId, name: &str) -> Option<Option<TypeId>> {
        self.field(record, name).map(|f| f.ty)
    }

    pub fn field_alias(&self, record: TypeId, name: &str) -> Option<&str> {
        self.field(record, name).map(|f| f.alias.as_str())
    }

    /// Base fields first, then own fields, each level in declaration order.
    pub fn all_fields(&self, record: TypeId) -> Vec<&Field> {
        self.lineage(record)
            .into_iter()
            .filter_map(|id| self.record(id))
            .flat_map(|r| r.fields())
            .collect()
    }

    pub fn all_field_names(&self, record: TypeId) -> Vec<&str> {
        self.all_fields(record)
            .into_iter()
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Structural equality.
    ///
    /// Primitives compare by kind, records by field count and per-field type
    /// equality. Lists only equal themselves. Record pairs already under
    /// comparison are assumed equal, which keeps recursive records finite.
    pub fn structurally_equal(&self, a: TypeId, b: TypeId) -> bool {
        let mut assumed = HashSet::new();
        self.equal_inner(a, b, &mut assumed)
    }

    fn equal_inner(&self, a: TypeId, b: TypeId, assumed: &mut HashSet<(TypeId, TypeId)>) -> bool {
        if a == b {
            return true;
        }
        match (&self.get(a).kind, &self.get(b).kind) {
            (TypeKind::Primitive(x), TypeKind::Primitive(y)) => x == y,
            (TypeKind::Record(x), TypeKind::Record(y)) => {
                if x.len() != y.len() {
                    return false;
                }
                if !assumed.insert((a, b)) {
                    return true;
                }
                y.fields().all(|theirs| match x.own_field(&theirs.name) {
                    None => false,
                    Some(ours) => match (ours.ty, theirs.ty) {
                        (Some(l), Some(r)) => self.equal_inner(l, r, assumed),
                        (None, None) => true,
                        _ => false,
                    },
                })
            }
            _ => false,
        }
    }

    /// Borrowing view that renders a type in one line.
    pub fn display(&self, id: TypeId) -> TypeDisplay<'_> {
        TypeDisplay { arena: self, id }
    }
}

pub struct TypeDisplay<'a> {
    arena: &'a TypeArena,
    id: TypeId,
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let def = self.arena.get(self.id);
        match &def.kind {
            TypeKind::Primitive(kind) => write!(f, "primitive ({})", kind),
            TypeKind::List(list) => {
                write!(f, "list {}, item: ", def.name)?;
                match list.item {
                    Some(item) => f.write_str(self.arena.name(item)),
                    None => f.write_str("<none>"),
                }
            }
            TypeKind::Record(record) => {
                write!(f, "record {}", def.name)?;
                if let Some(base) = record.base {
                    write!(f, " : {}", self.arena.name(base))?;
                }
                f.write_str(" {")?;
                for (i, field) in record.fields().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    let ty = field.ty.map(|t| self.arena.name(t)).unwrap_or("<none>");
                    write!(f, " {} ({}): {}", field.name, field.alias, ty)?;
                }
                f.write_str(" }")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record_with(arena: &mut TypeArena, name: &str, fields: &[(&str, PrimitiveKind)]) -> TypeId {
        let id = arena.alloc_record(name);
        for (field, kind) in fields {
            let ty = arena.primitive(*kind);
            arena.add_field(id, field, Some(ty)).unwrap();
        }
        id
    }

    #[test]
    fn test_primitive_keywords_round_trip() {
        for kind in PrimitiveKind::ALL {
            assert_eq!(kind.as_str().parse::<PrimitiveKind>().unwrap(), kind);
        }
        assert_eq!(
            "float".parse::<PrimitiveKind>(),
            Err(CoreError::UnknownPrimitiveKind("float".to_string()))
        );
    }

    #[test]
    fn test_primitives_are_interned() {
        let mut arena = TypeArena::new();
        let a = arena.primitive(PrimitiveKind::Int32);
        let b = arena.primitive_from_keyword("int32").unwrap();
        assert_eq!(a, b);
        assert_eq!(arena.len(), 1);
        assert!(!arena.get(a).is_reference());
        let s = arena.primitive(PrimitiveKind::String);
        assert!(arena.get(s).is_reference());
    }

    #[test]
    fn test_record_equality_ignores_order_and_name() {
        let mut arena = TypeArena::new();
        let ab = record_with(
            &mut arena,
            "A",
            &[("a", PrimitiveKind::Int32), ("b", PrimitiveKind::String)],
        );
        let ba = record_with(
            &mut arena,
            "B",
            &[("b", PrimitiveKind::String), ("a", PrimitiveKind::Int32)],
        );
        let abc = record_with(
            &mut arena,
            "C",
            &[
                ("a", PrimitiveKind::Int32),
                ("b", PrimitiveKind::String),
                ("c", PrimitiveKind::Bool),
            ],
        );
        let a_only = record_with(&mut arena, "D", &[("a", PrimitiveKind::Int32)]);
        let ab_wrong = record_with(
            &mut arena,
            "E",
            &[("a", PrimitiveKind::Int64), ("b", PrimitiveKind::String)],
        );

        assert!(arena.structurally_equal(ab, ba));
        assert!(!arena.structurally_equal(ab, abc));
        assert!(!arena.structurally_equal(ab, a_only));
        assert!(!arena.structurally_equal(ab, ab_wrong));
    }

    #[test]
    fn test_kind_mismatch_is_not_equal() {
        let mut arena = TypeArena::new();
        let int = arena.primitive(PrimitiveKind::Int32);
        let record = record_with(&mut arena, "R", &[("x", PrimitiveKind::Int32)]);
        let list = arena.alloc_list("L");
        let other_list = arena.alloc_list("L");
        arena.set_list_item(list, Some(int)).unwrap();
        arena.set_list_item(other_list, Some(int)).unwrap();

        assert!(!arena.structurally_equal(int, record));
        assert!(!arena.structurally_equal(record, list));
        assert!(arena.structurally_equal(list, list));
        assert!(!arena.structurally_equal(list, other_list));
    }

    #[test]
    fn test_recursive_records_compare_without_looping() {
        let mut arena = TypeArena::new();
        let a = arena.alloc_record("NodeA");
        arena.add_field(a, "next", Some(a)).unwrap();
        let b = arena.alloc_record("NodeB");
        arena.add_field(b, "next", Some(b)).unwrap();
        assert!(arena.structurally_equal(a, b));
    }

    #[test]
    fn test_inheritance_field_order_and_lookup() {
        let mut arena = TypeArena::new();
        let parent = record_with(&mut arena, "Parent", &[("x", PrimitiveKind::Int32)]);
        let child = record_with(&mut arena, "Child", &[("y", PrimitiveKind::String)]);
        arena.set_base(child, parent).unwrap();

        assert_eq!(arena.all_field_names(child), vec!["x", "y"]);
        let int = arena.primitive(PrimitiveKind::Int32);
        assert_eq!(arena.field_type(child, "x"), Some(Some(int)));
        assert_eq!(arena.field_type(child, "z"), None);
        assert_eq!(arena.record(child).unwrap().field_names().collect::<Vec<_>>(), vec!["y"]);
    }

    #[test]
    fn test_ancestor_definition_wins() {
        let mut arena = TypeArena::new();
        let parent = record_with(&mut arena, "Parent", &[("x", PrimitiveKind::Int32)]);
        let child = record_with(&mut arena, "Child", &[("x", PrimitiveKind::String)]);
        arena.set_base(child, parent).unwrap();

        let int = arena.primitive(PrimitiveKind::Int32);
        assert_eq!(arena.field_type(child, "x"), Some(Some(int)));
    }

    #[test]
    fn test_field_without_structure_is_found() {
        let mut arena = TypeArena::new();
        let r = arena.alloc_record("R");
        arena.add_field(r, "meta", None).unwrap();
        assert_eq!(arena.field_type(r, "meta"), Some(None));
        assert_eq!(arena.field_alias(r, "meta"), Some("meta"));
    }

    #[test]
    fn test_field_aliases() {
        let mut arena = TypeArena::new();
        let r = record_with(&mut arena, "R", &[("user_id", PrimitiveKind::Int64), ("id", PrimitiveKind::Int64)]);
        assert_eq!(arena.field_alias(r, "user_id"), Some("userId"));
        assert_eq!(arena.field_alias(r, "id"), Some("theId"));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let mut arena = TypeArena::new();
        let r = record_with(&mut arena, "R", &[("a", PrimitiveKind::Int32)]);
        let err = arena.add_field(r, "a", None).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateField { .. }));
    }

    #[test]
    fn test_list_item_is_fixed_once() {
        let mut arena = TypeArena::new();
        let int = arena.primitive(PrimitiveKind::Int32);
        let string = arena.primitive(PrimitiveKind::String);
        let list = arena.alloc_list("Numbers");
        arena.set_list_item(list, Some(int)).unwrap();
        arena.set_list_item(list, Some(string)).unwrap();
        assert_eq!(arena.list(list).unwrap().item(), Some(int));
    }

    #[test]
    fn test_list_item_requires_list() {
        let mut arena = TypeArena::new();
        let int = arena.primitive(PrimitiveKind::Int32);
        let r = arena.alloc_record("R");
        assert_eq!(
            arena.set_list_item(r, Some(int)),
            Err(CoreError::NotAList("R".to_string()))
        );
    }

    #[test]
    fn test_base_must_be_record() {
        let mut arena = TypeArena::new();
        let int = arena.primitive(PrimitiveKind::Int32);
        let r = arena.alloc_record("R");
        assert_eq!(
            arena.set_base(r, int),
            Err(CoreError::NotARecord("int32".to_string()))
        );
    }

    #[test]
    fn test_display() {
        let mut arena = TypeArena::new();
        let r = record_with(&mut arena, "Point", &[("x", PrimitiveKind::Int32)]);
        assert_eq!(arena.display(r).to_string(), "record Point { x (x): int32 }");
    }
}
