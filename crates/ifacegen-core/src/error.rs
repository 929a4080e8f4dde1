use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Unknown primitive type: {0}")]
    UnknownPrimitiveKind(String),

    #[error("Type {name} already exists in module {module}")]
    DuplicateTypeName { name: String, module: String },

    #[error("Type {0} is not a record type")]
    NotARecord(String),

    #[error("Type {0} is not a list type")]
    NotAList(String),

    #[error("Field {field} is declared twice in type {type_name}")]
    DuplicateField { type_name: String, field: String },
}
