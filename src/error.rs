use std::path::PathBuf;

use thiserror::Error;

use crate::resolver::SchemaId;

/// Failures while loading documents or following `$ref` pointers. Always fatal for the run.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("cannot read schema document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse schema document {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("malformed reference `{reference}` at {location}: {reason}")]
    MalformedRef {
        reference: String,
        location: SchemaId,
        reason: String,
    },

    #[error("reference `{reference}` at {location} points at nothing")]
    MissingTarget { reference: String, location: SchemaId },

    #[error("invalid schema at {location}: {message}")]
    InvalidSchema { location: SchemaId, message: String },
}

/// Failures while turning resolved schemas into the class graph. Always fatal for the run.
#[derive(Debug, Error)]
pub enum ModelBuildError {
    #[error("class `{0}` is already defined in the class graph")]
    DuplicateClass(String),

    #[error("root schema {0} is not an object schema")]
    RootNotObject(SchemaId),

    #[error("recursive reference to {0}, which is not an object schema")]
    NonObjectCycle(SchemaId),

    #[error("cannot derive a class name for {0}")]
    Unnamed(SchemaId),
}

/// Per-file failures of the emission phase. Collected, never fatal.
#[derive(Debug, Error)]
pub enum EmissionError {
    #[error("template `{template}` for `{lang}` not found at {path}")]
    TemplateNotFound {
        lang: String,
        template: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("template `{template}` failed to render class `{class}`: {source:#}")]
    Render {
        template: String,
        class: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot copy support file {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Non-fatal note about a schema construct that was degraded to a generic type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingWarning {
    pub location: SchemaId,
    pub message: String,
}

impl std::fmt::Display for MappingWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// Errors that abort a whole run before any output is written.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    ModelBuild(#[from] ModelBuildError),

    #[error("unknown target language `{lang}` (available: {available})")]
    UnknownLanguage { lang: String, available: String },

    #[error("invalid configuration {path}: {message}")]
    Config { path: PathBuf, message: String },
}
