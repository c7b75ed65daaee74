//! Error types for Targa operations.

use std::fmt;

use crate::types::FieldType;

/// The primary error type for all Targa operations.
#[derive(Debug)]
pub enum Error {
    /// A declared field is absent from the mapping
    MissingField { model: String, field: String },
    /// The mapping carries a key the model does not declare
    UnexpectedField { model: String, key: String },
    /// A supplied value is not compatible with the declared field type
    TypeMismatch {
        model: String,
        field: String,
        declared: FieldType,
        actual: &'static str,
    },
    /// Two fields of one definition share a name
    DuplicateField { model: String, field: String },
    /// A definition is malformed (bad identifier, empty name)
    InvalidDefinition { model: String, message: String },
    /// Typed extraction failed
    Type(TypeError),
    /// Placeholder and parameter counts disagree
    Params { expected: usize, provided: usize },
    /// Connection-related errors (connect, ping, lost connection)
    Connection(ConnectionError),
    /// Query execution errors
    Query(QueryError),
    /// Configuration errors
    Config(ConfigError),
}

#[derive(Debug)]
pub struct ConnectionError {
    pub kind: ConnectionErrorKind,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// Failed to establish connection
    Connect,
    /// Authentication failed
    Authentication,
    /// Connection lost during operation
    Disconnected,
    /// Ping did not get a reply
    Ping,
}

#[derive(Debug)]
pub struct QueryError {
    pub kind: QueryErrorKind,
    pub sql: Option<String>,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// Syntax error in SQL
    Syntax,
    /// Table or column not found
    NotFound,
    /// Constraint violation
    Constraint,
    /// Other database error
    Database,
}

#[derive(Debug)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub column: Option<String>,
    pub rust_type: Option<&'static str>,
}

#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Name of the field this error is about, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Error::MissingField { field, .. }
            | Error::TypeMismatch { field, .. }
            | Error::DuplicateField { field, .. } => Some(field),
            Error::UnexpectedField { key, .. } => Some(key),
            Error::Type(e) => e.column.as_deref(),
            _ => None,
        }
    }

    /// Did model construction reject the input mapping?
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Error::MissingField { .. } | Error::UnexpectedField { .. } | Error::TypeMismatch { .. }
        )
    }

    /// Is this a connection error that likely requires reconnection?
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_))
    }

    /// Get the SQL that caused this error, if available
    pub fn sql(&self) -> Option<&str> {
        match self {
            Error::Query(q) => q.sql.as_deref(),
            _ => None,
        }
    }

    /// A connection error without an underlying source.
    pub fn connection(kind: ConnectionErrorKind, message: impl Into<String>) -> Self {
        Error::Connection(ConnectionError {
            kind,
            message: message.into(),
            source: None,
        })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MissingField { model, field } => {
                write!(f, "{model}: missing required field '{field}'")
            }
            Error::UnexpectedField { model, key } => {
                write!(f, "{model}: unexpected field '{key}'")
            }
            Error::TypeMismatch {
                model,
                field,
                declared,
                actual,
            } => write!(
                f,
                "{model}: field '{field}' expects {declared}, found {actual}"
            ),
            Error::DuplicateField { model, field } => {
                write!(f, "{model}: field '{field}' is declared more than once")
            }
            Error::InvalidDefinition { model, message } => {
                write!(f, "Invalid model definition '{model}': {message}")
            }
            Error::Type(e) => {
                if let Some(col) = &e.column {
                    write!(
                        f,
                        "Type error in column '{}': expected {}, found {}",
                        col, e.expected, e.actual
                    )
                } else {
                    write!(f, "Type error: expected {}, found {}", e.expected, e.actual)
                }
            }
            Error::Params { expected, provided } => write!(
                f,
                "Query has {expected} placeholder(s) but {provided} parameter(s) were supplied"
            ),
            Error::Connection(e) => write!(f, "Connection error: {}", e.message),
            Error::Query(e) => write!(f, "Query error: {}", e.message),
            Error::Config(e) => write!(f, "Configuration error: {}", e.message),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        let source = match self {
            Error::Connection(e) => e.source.as_deref(),
            Error::Query(e) => e.source.as_deref(),
            Error::Config(e) => e.source.as_deref(),
            _ => None,
        };
        source.map(|err| err as &(dyn std::error::Error + 'static))
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(col) = &self.column {
            write!(
                f,
                "expected {} for column '{}', found {}",
                self.expected, col, self.actual
            )
        } else {
            write!(f, "expected {}, found {}", self.expected, self.actual)
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<ConnectionError> for Error {
    fn from(err: ConnectionError) -> Self {
        Error::Connection(err)
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        Error::Query(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

/// Result type alias for Targa operations.
pub type Result<T> = std::result::Result<T, Error>;
