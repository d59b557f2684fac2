//! Shared infrastructure for the task tracker
//!
//! This crate holds the pieces the API service does not own itself:
//! PostgreSQL connection pooling, database configuration from the
//! environment, and the shared database error type.

pub mod database;
pub mod error;
