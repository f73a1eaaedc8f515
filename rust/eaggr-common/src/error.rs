use thiserror::Error;

use crate::status::StatusCode;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_format(element: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidFormat {
                element: element.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn id_too_long(id: impl Into<String>, max_len: usize) -> Error {
        Error(
            ErrorKind::IdTooLong {
                id: id.into(),
                max_len,
            }
            .into(),
        )
    }

    /// Wraps a lower-level encoding failure with the location of the offending element.
    pub fn encoding_overflow(element: impl Into<String>, source: Error) -> Error {
        Error(
            ErrorKind::EncodingOverflow {
                element: element.into(),
                message: source.to_string(),
            }
            .into(),
        )
    }

    pub fn session_closed(operation: impl Into<String>) -> Error {
        Error(
            ErrorKind::SessionClosed {
                operation: operation.into(),
            }
            .into(),
        )
    }

    pub fn engine_operation(
        operation: impl Into<String>,
        code: StatusCode,
        message: impl Into<String>,
    ) -> Error {
        Error(
            ErrorKind::EngineOperationFailed {
                operation: operation.into(),
                code,
                message: message.into(),
            }
            .into(),
        )
    }

    /// Returns the engine status code if this error was reported by the engine.
    pub fn engine_code(&self) -> Option<StatusCode> {
        match self.kind() {
            ErrorKind::EngineOpenFailed { code }
            | ErrorKind::EngineCloseFailed { code }
            | ErrorKind::EngineOperationFailed { code, .. } => Some(*code),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid wire format for '{element}': {message}")]
    InvalidFormat { element: String, message: String },

    #[error("cell id '{id}' does not fit into {max_len} bytes")]
    IdTooLong { id: String, max_len: usize },

    #[error("cannot encode '{element}': {message}")]
    EncodingOverflow { element: String, message: String },

    #[error("unsupported shape type discriminant {discriminant}")]
    UnsupportedShapeType { discriminant: u32 },

    #[error("engine returned unrecognised status {raw}")]
    UnrecognisedEngineStatus { raw: i32 },

    #[error("failed to open engine handle: {code}")]
    EngineOpenFailed { code: StatusCode },

    #[error("engine operation '{operation}' failed with {code}: {message}")]
    EngineOperationFailed {
        operation: String,
        code: StatusCode,
        message: String,
    },

    #[error("failed to close engine handle: {code}")]
    EngineCloseFailed { code: StatusCode },

    #[error("cells have no common ancestor: {message}")]
    NoCommonAncestor { message: String },

    #[error("engine session is closed, cannot {operation}")]
    SessionClosed { operation: String },

    #[error("multi-resolution indexer did not terminate after {iterations} iterations")]
    IndexerDidNotTerminate { iterations: usize },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}
