//! Storage helpers for the service layer.
//!
//! File-backed stores persist small collections as JSON next to the binary.

pub mod json_file;

pub use json_file::JsonArrayFile;
