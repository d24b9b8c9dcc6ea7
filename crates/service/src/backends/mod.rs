//! Built-in storage backends and their registry entries.

pub mod map;
pub mod sql;
pub mod mongo;
pub mod mock;
