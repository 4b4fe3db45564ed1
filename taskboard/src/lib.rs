//! `taskboard` — kanban task board client.
//!
//! The [`tasks::TaskStore`] keeps the local board in sync with a remote task
//! service through the [`client::TaskService`] trait; [`tasks::board`]
//! projects it into columns.

pub mod client;
pub mod commands;
pub mod config;
pub mod tasks;
