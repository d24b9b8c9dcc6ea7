use thiserror::Error;

/// Outcome of an employee operation that did not succeed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmployeeError {
    #[error("Employee with id {0} not found")]
    NotFound(String),
    #[error("Employee with id {0} already exists")]
    AlreadyExists(String),
    #[error("{0}")]
    Validation(String),
    #[error("employees backend is closed")]
    Closed,
    #[error("storage error: {0}")]
    Storage(String),
}

impl EmployeeError {
    /// Stable error name exposed to clients.
    pub fn name(&self) -> &'static str {
        match self {
            EmployeeError::NotFound(_) => "NotFoundError",
            EmployeeError::AlreadyExists(_) => "AlreadyExistsError",
            EmployeeError::Validation(_) => "ValidationError",
            EmployeeError::Closed | EmployeeError::Storage(_) => "InternalError",
        }
    }

    /// HTTP status the error maps to.
    pub fn code(&self) -> u16 {
        match self {
            EmployeeError::NotFound(_) => 404,
            EmployeeError::AlreadyExists(_) => 409,
            EmployeeError::Validation(_) => 400,
            EmployeeError::Closed | EmployeeError::Storage(_) => 500,
        }
    }

    pub(crate) fn storage(e: impl std::fmt::Display) -> Self {
        EmployeeError::Storage(e.to_string())
    }
}

impl From<crate::errors::StorageError> for EmployeeError {
    fn from(e: crate::errors::StorageError) -> Self {
        EmployeeError::storage(e)
    }
}
