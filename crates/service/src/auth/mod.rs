//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Accounts live in a repository; the service verifies passwords with
//! argon2 and issues/verifies HS256 JWTs.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod service;

pub use domain::{Principal, Role};
pub use errors::AuthError;
pub use service::{AuthService, AuthSettings};
