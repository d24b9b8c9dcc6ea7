//! Employees domain: record types, the storage contract every backend
//! implements, the backend registry and the facade the HTTP layer holds.

pub mod domain;
pub mod errors;
pub mod backend;
pub mod registry;
pub mod facade;
pub mod validation;


pub use backend::EmployeesBackend;
pub use domain::{Employee, EmployeePatch, NewEmployee};
pub use errors::EmployeeError;
pub use facade::EmployeesFacade;
pub use registry::{BackendDeps, BackendRegistry, RegistryError};
pub use validation::EmployeeRules;
