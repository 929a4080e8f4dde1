//! `struct` and `procedure` declarations

use ifacegen_core::naming::capitalize_first;
use ifacegen_core::{Method, TypeId};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::ParserError;
use crate::resolver::TypeResolver;

const KEY_STRUCT: &str = "struct";
const KEY_TYPEDEF: &str = "typedef";
const KEY_EXTENDS: &str = "extends";
const KEY_PROCEDURE: &str = "procedure";
const KEY_PREFIX: &str = "prefix";
const KEY_REQUEST: &str = "request";
const KEY_RESPONSE: &str = "response";

/// Build the record for a `struct` declaration and mark it as a struct.
///
/// Returns `None` when the typedef has no fields.
pub fn build_struct(
    resolver: &mut TypeResolver<'_>,
    decl: &Map<String, Value>,
) -> Result<Option<TypeId>, ParserError> {
    let name = match decl.get(KEY_STRUCT) {
        Some(Value::String(name)) => name.as_str(),
        other => {
            return Err(ParserError::InvalidDeclaration(format!(
                "struct name must be a string, found {}",
                other.map(Value::to_string).unwrap_or_default()
            )))
        }
    };

    let typedef = match decl.get(KEY_TYPEDEF) {
        Some(typedef @ Value::Object(_)) => typedef,
        Some(other) => {
            return Err(ParserError::InvalidDeclaration(format!(
                "typedef of struct {} must be an object, found {}",
                name, other
            )))
        }
        None => {
            return Err(ParserError::InvalidDeclaration(format!(
                "struct {} has no typedef",
                name
            )))
        }
    };

    debug!("Struct: {}", name);
    let Some(id) = resolver.resolve(None, name, typedef)? else {
        warn!("Struct {} declares no fields, skipping", name);
        return Ok(None);
    };
    let type_name = resolver.arena().name(id).to_string();

    match decl.get(KEY_EXTENDS) {
        None | Some(Value::Null) => {}
        Some(Value::String(parent)) => {
            let base = resolver
                .lookup_declared(parent)
                .ok_or_else(|| ParserError::UnknownBaseType {
                    type_name: type_name.clone(),
                    base: parent.clone(),
                })?;
            if base == id {
                return Err(ParserError::InvalidBaseType {
                    type_name,
                    base: parent.clone(),
                    reason: "a type cannot extend itself".to_string(),
                });
            }
            if resolver.arena().record(base).is_none() {
                return Err(ParserError::InvalidBaseType {
                    type_name,
                    base: parent.clone(),
                    reason: "base is not a record type".to_string(),
                });
            }
            resolver.arena_mut().set_base(id, base)?;
        }
        Some(other) => {
            return Err(ParserError::InvalidDeclaration(format!(
                "extends of struct {} must be a type name, found {}",
                name, other
            )))
        }
    }

    resolver.registry_mut().mark_struct(&type_name);
    Ok(Some(id))
}

/// Build a [`Method`] from a `procedure` declaration.
///
/// Keys other than `procedure`, `prefix`, `request` and `response` are custom
/// request sections. Request and response shapes the method creates are
/// dropped from the module's name table once the method holds them.
pub fn build_method(
    resolver: &mut TypeResolver<'_>,
    decl: &Map<String, Value>,
) -> Result<Method, ParserError> {
    let mut name = None;
    let mut prefix = None;
    let mut request = None;
    let mut response = None;
    let mut custom_sections = Vec::new();

    for (key, value) in decl {
        match key.as_str() {
            KEY_PROCEDURE => name = value.as_str(),
            KEY_PREFIX => match value {
                Value::String(p) => prefix = Some(p.clone()),
                Value::Null => {}
                other => {
                    return Err(ParserError::InvalidDeclaration(format!(
                        "prefix must be a string, found {}",
                        other
                    )))
                }
            },
            KEY_REQUEST => request = Some(value),
            KEY_RESPONSE => response = Some(value),
            _ => custom_sections.push((key.as_str(), value)),
        }
    }

    let name = name.ok_or_else(|| ParserError::MissingProcedureName(Value::Object(decl.clone()).to_string()))?;
    debug!("Method: {}", name);

    let response = response.ok_or_else(|| ParserError::MissingResponse {
        procedure: name.to_string(),
    })?;

    let existing = resolver.local_names();
    let mut method = Method::new(name, prefix);
    let decoration = capitalize_first(name);

    match request {
        None | Some(Value::Null) => {}
        Some(request @ Value::Object(_)) => {
            method.request = resolver.resolve(None, &format!("{}_json_args", name), request)?;
        }
        Some(other) => {
            return Err(ParserError::InvalidDeclaration(format!(
                "request of procedure {} must be an object, found {}",
                name, other
            )))
        }
    }

    for (section, value) in custom_sections {
        let ty = build_custom_section(resolver, name, section, value)?;
        method.custom_requests.insert(section.to_string(), ty);
    }

    match response {
        Value::Array(_) => {
            method.response = resolver.resolve(Some(&decoration), "List", response)?;
        }
        Value::Object(fields) if fields.len() == 1 => {
            if let Some((field, value)) = fields.iter().next() {
                method.response = resolver.resolve(Some(&decoration), field, value)?;
                method.response_arg_name = Some(field.clone());
            }
        }
        _ => {
            method.response = resolver.resolve(Some(&decoration), "Info", response)?;
        }
    }

    // Shapes created for this method are reachable only through it
    let captured: Vec<TypeId> = method.captured_types().collect();
    for id in captured {
        let type_name = resolver.arena().name(id).to_string();
        if !existing.contains(&type_name) && resolver.registry().lookup(&type_name) == Some(id) {
            resolver.registry_mut().remove_local_type(&type_name);
        }
    }

    Ok(method)
}

/// Custom sections are delivered through transport setters that only take
/// primitive values.
fn build_custom_section(
    resolver: &mut TypeResolver<'_>,
    procedure: &str,
    section: &str,
    value: &Value,
) -> Result<Option<TypeId>, ParserError> {
    let invalid = |detail: String| ParserError::InvalidArgumentShape {
        procedure: procedure.to_string(),
        section: section.to_string(),
        detail,
    };

    let fields = match value {
        Value::Object(fields) => fields,
        other => return Err(invalid(format!("expected an object of fields, found {}", other))),
    };
    if let Some((field, _)) = fields.iter().find(|(_, v)| !v.is_string()) {
        return Err(invalid(format!("field {} is not a primitive type name", field)));
    }

    let ty = resolver.resolve(None, &format!("{}_{}_args", procedure, section), value)?;
    if let Some(id) = ty {
        let arena = resolver.arena();
        let offending = arena
            .record(id)
            .into_iter()
            .flat_map(|record| record.fields())
            .find(|f| f.ty.map_or(true, |t| arena.get(t).as_primitive().is_none()));
        if let Some(field) = offending {
            return Err(invalid(format!(
                "field {} refers to structured type {}",
                field.name,
                field.ty.map(|t| arena.name(t)).unwrap_or("<none>")
            )));
        }
    }
    Ok(ty)
}
