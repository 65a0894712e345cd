//! Error types for the GISView map viewer.
//!
//! Failures are limited to talking to the map server, decoding what it
//! returns, and loading configuration. All errors implement
//! `std::error::Error` and are serializable so they can be forwarded to a
//! UI banner or a log sink unchanged.

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Result type alias using GisError as the error type.
pub type Result<T> = std::result::Result<T, GisError>;

/// Top-level error type for all GISView operations.
#[derive(Debug, Error, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum GisError {
    /// Network and HTTP errors
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Parsing and deserialization errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// A requested layer, workspace, or document target does not exist
    #[error("Not found: {what}")]
    NotFound { what: String },

    /// Internal errors that shouldn't normally occur
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GisError {
    /// Creates a not found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Returns true if retrying the same request later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            GisError::Network(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// Errors raised while talking to the map server.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum NetworkError {
    /// The request never produced a response
    #[error("Request to {url} failed: {reason}")]
    RequestFailed { url: String, reason: String },

    /// The server answered with a non-success status
    #[error("HTTP error {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    /// The request did not complete in time
    #[error("Request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    /// The request URL could not be built
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl NetworkError {
    /// Creates a request failed error.
    pub fn request_failed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RequestFailed {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Returns true if this error is transient and the operation can be retried.
    pub fn is_transient(&self) -> bool {
        match self {
            NetworkError::Timeout { .. } | NetworkError::RequestFailed { .. } => true,
            NetworkError::HttpStatus { status, .. } => *status >= 500,
            NetworkError::InvalidUrl { .. } => false,
        }
    }
}

/// Errors related to parsing server documents and configuration text.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum ParseError {
    /// Failed to parse XML data
    #[error("XML parse error at byte {position}: {message}")]
    Xml { position: u64, message: String },

    /// Failed to parse JSON data
    #[error("JSON parse error at line {line}, column {column}: {message}")]
    Json {
        line: usize,
        column: usize,
        message: String,
    },

    /// Well-formed JSON that is not valid GeoJSON
    #[error("GeoJSON error: {message}")]
    GeoJson { message: String },

    /// Missing required field
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// Invalid field value
    #[error("Invalid value for field '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ParseError {
    /// Creates an XML parse error.
    pub fn xml(position: u64, message: impl Into<String>) -> Self {
        Self::Xml {
            position,
            message: message.into(),
        }
    }

    /// Creates a missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json {
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
        }
    }
}

impl From<geojson::Error> for ParseError {
    fn from(err: geojson::Error) -> Self {
        Self::GeoJson {
            message: err.to_string(),
        }
    }
}

impl From<geojson::Error> for GisError {
    fn from(err: geojson::Error) -> Self {
        GisError::Parse(err.into())
    }
}

impl From<serde_json::Error> for GisError {
    fn from(err: serde_json::Error) -> Self {
        GisError::Parse(err.into())
    }
}

/// Errors related to configuration.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {reason}")]
    LoadFailed { path: String, reason: String },

    /// Invalid configuration format
    #[error("Invalid configuration format: {reason}")]
    InvalidFormat { reason: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// Two catalog entries share an id
    #[error("Duplicate {kind} id: {id}")]
    DuplicateId { kind: String, id: u32 },
}

impl ConfigError {
    /// Creates a file not found error.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Wrapper for I/O errors to make them serializable.
#[derive(Debug, Error, Serialize, Deserialize)]
#[error("I/O error: {kind:?}: {message}")]
pub struct IoError {
    pub kind: IoErrorKind,
    pub message: String,
}

impl From<io::Error> for IoError {
    fn from(err: io::Error) -> Self {
        Self {
            kind: err.kind().into(),
            message: err.to_string(),
        }
    }
}

impl From<io::Error> for GisError {
    fn from(err: io::Error) -> Self {
        GisError::Io(err.into())
    }
}

/// Serializable subset of std::io::ErrorKind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IoErrorKind {
    NotFound,
    PermissionDenied,
    InvalidData,
    UnexpectedEof,
    Other,
}

impl From<io::ErrorKind> for IoErrorKind {
    fn from(kind: io::ErrorKind) -> Self {
        match kind {
            io::ErrorKind::NotFound => IoErrorKind::NotFound,
            io::ErrorKind::PermissionDenied => IoErrorKind::PermissionDenied,
            io::ErrorKind::InvalidData => IoErrorKind::InvalidData,
            io::ErrorKind::UnexpectedEof => IoErrorKind::UnexpectedEof,
            _ => IoErrorKind::Other,
        }
    }
}
