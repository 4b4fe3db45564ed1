//! Taskboard task service library.
//!
//! Exposes the in-memory task service for use in tests and embedding.
//! The service serves the task collection over HTTP as a JSON resource.

pub mod config;
pub mod service;
pub mod store;
