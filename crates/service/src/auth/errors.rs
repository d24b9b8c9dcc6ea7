use thiserror::Error;

/// Business errors for auth workflows
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Wrong Credentials")]
    Login,
    #[error("Authentication Error")]
    Authentication,
    #[error("Authorization Error")]
    Authorization,
    #[error("hashing error: {0}")]
    Hash(String),
    #[error("token error: {0}")]
    Token(String),
    #[error("repository error: {0}")]
    Repository(String),
}

impl AuthError {
    /// Stable error name exposed to clients
    pub fn name(&self) -> &'static str {
        match self {
            AuthError::Login => "LoginError",
            AuthError::Authentication => "AuthenticationError",
            AuthError::Authorization => "AuthorizationError",
            AuthError::Hash(_) | AuthError::Token(_) | AuthError::Repository(_) => "InternalError",
        }
    }

    /// HTTP status for external mapping
    pub fn code(&self) -> u16 {
        match self {
            AuthError::Login => 400,
            AuthError::Authentication => 401,
            AuthError::Authorization => 403,
            AuthError::Hash(_) | AuthError::Token(_) | AuthError::Repository(_) => 500,
        }
    }
}
