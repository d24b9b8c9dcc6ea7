//! Service layer for the employees API.
//! - `employees`: domain types, backend contract, registry and facade.
//! - `backends`: the built-in storage backends.
//! - `auth`: account store, password hashing and JWT issuing.

pub mod errors;
pub mod auth;
pub mod storage;
pub mod employees;
pub mod backends;
pub mod bootstrap;

pub use bootstrap::{bootstrap, default_registry, select_backend_key};
pub use employees::{EmployeeError, EmployeesFacade};
