//! Error handling for the content-generation pipeline
//!
//! This module provides the error system shared by every pipeline stage:
//! - Categorizes failures by kind (network, rate limit, auth, quota, ...)
//! - Separates the backoff/retry tier from the regeneration tier
//! - Adds rich context to errors for better debugging
//! - Provides a convenient Result type alias

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod classify;

pub use classify::{classify, classify_message, map_http_error, Classification};

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, GenerationError>;

/// The kind of a pipeline failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Network,
    RateLimit,
    Auth,
    Quota,
    Server,
    ContentFilter,
    Unknown,
    /// Synthetic: the circuit breaker rejected the call without any I/O
    BreakerOpen,
    ParseFailure,
    StructuralValidationFailure,
    Configuration,
}

impl ErrorKind {
    /// Whether the backoff/retry tier should repeat the same call
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ErrorKind::Network | ErrorKind::RateLimit | ErrorKind::Server | ErrorKind::Unknown
        )
    }

    /// Whether another generation attempt with adjusted parameters may succeed
    pub fn is_regenerable(self) -> bool {
        !matches!(
            self,
            ErrorKind::BreakerOpen | ErrorKind::Auth | ErrorKind::Quota | ErrorKind::Configuration
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Network => "NETWORK",
            ErrorKind::RateLimit => "RATE_LIMIT",
            ErrorKind::Auth => "AUTH",
            ErrorKind::Quota => "QUOTA",
            ErrorKind::Server => "SERVER",
            ErrorKind::ContentFilter => "CONTENT_FILTER",
            ErrorKind::Unknown => "UNKNOWN",
            ErrorKind::BreakerOpen => "BREAKER_OPEN",
            ErrorKind::ParseFailure => "PARSE_FAILURE",
            ErrorKind::StructuralValidationFailure => "STRUCTURAL_VALIDATION_FAILURE",
            ErrorKind::Configuration => "CONFIGURATION",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum GenerationError {
    /// Network, connection or timeout errors
    #[error("Network error: {0}")]
    Network(String),

    /// Rate limiting errors
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    /// Authentication or authorization errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Account quota or billing exhaustion
    #[error("Quota exceeded: {0}")]
    Quota(String),

    /// Upstream server errors
    #[error("Server error: {0}")]
    Server(String),

    /// The generation service refused the content
    #[error("Content filtered: {0}")]
    ContentFilter(String),

    /// Unclassified errors
    #[error("Unknown error: {0}")]
    Unknown(String),

    /// Circuit breaker open errors
    #[error("Circuit breaker open: {0}")]
    CircuitOpen(String),

    /// Response payload could not be parsed
    #[error("Parsing error: {0}")]
    Parsing(String),

    /// Parsed payload violates the activity schema
    #[error("Structural validation failed: {0}")]
    Structural(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Errors with additional context
    #[error("{inner}")]
    WithContext {
        inner: Box<GenerationError>,
        context: ErrorContext,
    },
}

impl GenerationError {
    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        GenerationError::Network(message.into())
    }

    /// Create a rate limit error
    pub fn rate_limit(message: impl Into<String>) -> Self {
        GenerationError::RateLimit(message.into())
    }

    /// Create an authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        GenerationError::Authentication(message.into())
    }

    /// Create a quota error
    pub fn quota(message: impl Into<String>) -> Self {
        GenerationError::Quota(message.into())
    }

    /// Create a server error
    pub fn server(message: impl Into<String>) -> Self {
        GenerationError::Server(message.into())
    }

    /// Create a content filter error
    pub fn content_filter(message: impl Into<String>) -> Self {
        GenerationError::ContentFilter(message.into())
    }

    /// Create an unknown error
    pub fn unknown(message: impl Into<String>) -> Self {
        GenerationError::Unknown(message.into())
    }

    /// Create a circuit-open error
    pub fn circuit_open(message: impl Into<String>) -> Self {
        GenerationError::CircuitOpen(message.into())
    }

    /// Create a parsing error
    pub fn parsing(message: impl Into<String>) -> Self {
        GenerationError::Parsing(message.into())
    }

    /// Create a structural validation error
    pub fn structural(message: impl Into<String>) -> Self {
        GenerationError::Structural(message.into())
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        GenerationError::Configuration(message.into())
    }

    /// Build the typed error matching a kind
    pub fn from_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::Network => GenerationError::Network(message),
            ErrorKind::RateLimit => GenerationError::RateLimit(message),
            ErrorKind::Auth => GenerationError::Authentication(message),
            ErrorKind::Quota => GenerationError::Quota(message),
            ErrorKind::Server => GenerationError::Server(message),
            ErrorKind::ContentFilter => GenerationError::ContentFilter(message),
            ErrorKind::Unknown => GenerationError::Unknown(message),
            ErrorKind::BreakerOpen => GenerationError::CircuitOpen(message),
            ErrorKind::ParseFailure => GenerationError::Parsing(message),
            ErrorKind::StructuralValidationFailure => GenerationError::Structural(message),
            ErrorKind::Configuration => GenerationError::Configuration(message),
        }
    }

    /// Add context to an existing error
    pub fn with_context(self, context: ErrorContext) -> Self {
        GenerationError::WithContext {
            inner: Box::new(self),
            context,
        }
    }

    /// Add a single context key/value to an existing error
    pub fn with_context_value(self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        match self {
            GenerationError::WithContext { inner, mut context } => {
                context.add(key, value);
                GenerationError::WithContext { inner, context }
            }
            other => {
                let mut context = ErrorContext::new();
                context.add(key, value);
                other.with_context(context)
            }
        }
    }

    /// The error with any context wrappers removed
    pub fn root(&self) -> &GenerationError {
        match self {
            GenerationError::WithContext { inner, .. } => inner.root(),
            other => other,
        }
    }

    /// The kind of this error, looking through context wrappers
    pub fn kind(&self) -> ErrorKind {
        match self.root() {
            GenerationError::Network(_) => ErrorKind::Network,
            GenerationError::RateLimit(_) => ErrorKind::RateLimit,
            GenerationError::Authentication(_) => ErrorKind::Auth,
            GenerationError::Quota(_) => ErrorKind::Quota,
            GenerationError::Server(_) => ErrorKind::Server,
            GenerationError::ContentFilter(_) => ErrorKind::ContentFilter,
            GenerationError::Unknown(_) => ErrorKind::Unknown,
            GenerationError::CircuitOpen(_) => ErrorKind::BreakerOpen,
            GenerationError::Parsing(_) => ErrorKind::ParseFailure,
            GenerationError::Structural(_) => ErrorKind::StructuralValidationFailure,
            GenerationError::Configuration(_) => ErrorKind::Configuration,
            GenerationError::WithContext { .. } => ErrorKind::Unknown,
        }
    }

    /// Get the HTTP status code if available
    pub fn status_code(&self) -> Option<u16> {
        match self {
            GenerationError::WithContext { context, inner } => {
                context.status_code.or_else(|| inner.status_code())
            }
            _ => None,
        }
    }

    /// Get the service name if available
    pub fn service_name(&self) -> Option<&str> {
        match self {
            GenerationError::WithContext { context, .. } => Some(&context.service),
            _ => None,
        }
    }

    /// Check if the same call should be retried after a backoff delay
    pub fn is_retryable(&self) -> bool {
        classify(self).retryable
    }

    /// Check if a fresh generation attempt may fix this failure
    pub fn is_regenerable(&self) -> bool {
        classify(self).kind.is_regenerable()
    }

    /// Check if this is a permanent error (not retryable)
    pub fn is_permanent(&self) -> bool {
        !self.is_retryable()
    }
}

/// Error context information
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Component that generated the error
    pub service: String,

    /// Error timestamp
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,

    /// HTTP status code if applicable
    pub status_code: Option<u16>,

    /// Request ID for tracing
    pub request_id: Option<String>,

    /// Additional context data
    pub data: HashMap<String, String>,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            service: "unknown".to_string(),
            timestamp: Some(chrono::Utc::now()),
            status_code: None,
            request_id: None,
            data: HashMap::new(),
        }
    }
}

impl ErrorContext {
    /// Create a new error context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new error context for a specific service
    pub fn for_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            ..Self::default()
        }
    }

    /// Add an HTTP status code
    pub fn status_code(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }

    /// Add a request ID
    pub fn request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// Add a context value
    pub fn add<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: fmt::Display,
    {
        self.data.insert(key.into(), value.to_string());
    }

    /// Add a context value and return self (builder pattern)
    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: fmt::Display,
    {
        self.add(key, value);
        self
    }
}

/// Convert reqwest errors to GenerationError
impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        let context = ErrorContext::for_service("http_client");

        let error = if err.is_timeout() {
            GenerationError::network(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            GenerationError::network(format!("Connection error: {}", err))
        } else if err.is_decode() {
            GenerationError::parsing(format!("Response decode error: {}", err))
        } else if let Some(status) = err.status() {
            map_http_error(status, &err.to_string())
        } else {
            let message = format!("HTTP client error: {}", err);
            GenerationError::from_kind(classify_message(&message).kind, message)
        };

        match err.status() {
            Some(status) => error.with_context(context.status_code(status.as_u16())),
            None => error.with_context(context),
        }
    }
}

/// Convert serde_json errors to GenerationError
impl From<serde_json::Error> for GenerationError {
    fn from(err: serde_json::Error) -> Self {
        GenerationError::parsing(format!("JSON error: {}", err))
            .with_context(ErrorContext::for_service("json"))
    }
}
