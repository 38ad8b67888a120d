//! Unified error types for the docx-embed generator.

use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur while generating embedded template sources.
#[derive(Error, Debug)]
pub enum EmbedError {
    // --- Invocation ---

    /// A required option was missing or malformed.
    #[error("usage error: {0}")]
    Usage(String),

    /// An input or output path contains characters the generator refuses to handle.
    #[error("cannot use {role} path {path:?}: {reason}")]
    UnsafePath {
        role: &'static str,
        path: String,
        reason: &'static str,
    },

    // --- Configuration ---

    /// The generator configuration file was not found.
    #[error("config file not found at {path}")]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file exists but contains invalid JSON.
    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The configuration would produce C that does not compile.
    #[error("invalid config field '{field}': {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    // --- Unpacking ---

    /// A required external tool (e.g. `unzip`) is not installed.
    #[error("required tool '{name}' not found — install: {install}")]
    MissingTool { name: String, install: String },

    /// An external unpack command exited unsuccessfully.
    #[error("{tool} failed: {stderr}")]
    ExternalTool { tool: String, stderr: String },

    /// The template archive could not be opened or extracted.
    #[error("failed to read archive {path}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    // --- Members ---

    /// A member file in the scratch directory could not be read.
    #[error("failed to read member file {path}")]
    MemberRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A member path is not valid UTF-8 and cannot be used as an archive name.
    #[error("member path is not valid UTF-8: {0}")]
    InvalidMemberName(PathBuf),

    // --- Generation ---

    /// Handlebars template rendering failed.
    #[error("template rendering failed: {0}")]
    TemplateRender(String),

    /// A string-literal fragment could not be decoded.
    #[error("malformed literal at byte {offset}: {reason}")]
    MalformedLiteral { offset: usize, reason: &'static str },

    /// The generated source does not reproduce the template.
    #[error("generated source does not reproduce the template: {0}")]
    VerificationFailed(String),

    /// A generated file could not be written.
    #[error("failed to write generated file {path}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // --- General ---

    /// A filesystem I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A catch-all for errors from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Alias for `Result<T, EmbedError>`.
pub type Result<T> = std::result::Result<T, EmbedError>;
