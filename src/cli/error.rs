//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        let CliError::Infra(InfraError::Application(app)) = self;
        match app {
            ApplicationError::Persistence { .. } => crate::exitcode::DATAERR,
            ApplicationError::Config { .. } => crate::exitcode::CONFIG,
            e if e.is_input_closed() => crate::exitcode::NOINPUT,
            ApplicationError::Operator { .. } => crate::exitcode::IOERR,
            ApplicationError::OperationFailed { .. } => crate::exitcode::IOERR,
            ApplicationError::Domain(_) => crate::exitcode::SOFTWARE,
        }
    }
}
