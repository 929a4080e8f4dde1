use std::path::PathBuf;

use ifacegen_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParserError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Unresolved type reference {name} (not a primitive and not declared or imported)")]
    UnresolvedTypeReference { name: String },

    #[error("Unknown base type {base} for type {type_name}")]
    UnknownBaseType { type_name: String, base: String },

    #[error("Type {type_name} cannot extend {base}: {reason}")]
    InvalidBaseType {
        type_name: String,
        base: String,
        reason: String,
    },

    #[error("No method name provided for method in IDL: {0}")]
    MissingProcedureName(String),

    #[error("Procedure {procedure} has no response declaration")]
    MissingResponse { procedure: String },

    #[error("Argument section {section} of procedure {procedure} must contain only primitive fields: {detail}")]
    InvalidArgumentShape {
        procedure: String,
        section: String,
        detail: String,
    },

    #[error("Unsupported JSON shape for {name}: {found}")]
    UnsupportedShape { name: String, found: String },

    #[error("Cannot infer item type of {name} from an empty array")]
    EmptyListExample { name: String },

    #[error("Invalid declaration: {0}")]
    InvalidDeclaration(String),

    #[error("Document {0} has no iface array")]
    MissingIface(PathBuf),

    #[error("Circular import: {}", .0.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(" -> "))]
    CircularImport(Vec<PathBuf>),

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ParserError {
    /// Short label for the error kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ParserError::Core(CoreError::UnknownPrimitiveKind(_)) => "UnknownPrimitiveKind",
            ParserError::Core(CoreError::DuplicateTypeName { .. }) => "DuplicateTypeName",
            ParserError::Core(_) => "InvalidType",
            ParserError::UnresolvedTypeReference { .. } => "UnresolvedTypeReference",
            ParserError::UnknownBaseType { .. } => "UnknownBaseType",
            ParserError::InvalidBaseType { .. } => "InvalidBaseType",
            ParserError::MissingProcedureName(_) => "MissingProcedureName",
            ParserError::MissingResponse { .. } => "MissingResponse",
            ParserError::InvalidArgumentShape { .. } => "InvalidArgumentShape",
            ParserError::UnsupportedShape { .. } => "UnsupportedShape",
            ParserError::EmptyListExample { .. } => "EmptyListExample",
            ParserError::InvalidDeclaration(_) => "InvalidDeclaration",
            ParserError::MissingIface(_) => "MissingIface",
            ParserError::CircularImport(_) => "CircularImport",
            ParserError::Io { .. } => "Io",
            ParserError::Json { .. } => "Json",
        }
    }
}
