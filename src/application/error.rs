//! Application-level errors (wraps domain errors)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::DomainError;
use crate::infrastructure::traits::CodecError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("operator input failed at '{context}'")]
    Operator {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot use tree file {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApplicationError {
    /// True when the operator's input stream ended.
    pub fn is_input_closed(&self) -> bool {
        matches!(
            self,
            ApplicationError::Operator { source, .. }
                if source.kind() == std::io::ErrorKind::UnexpectedEof
        )
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
