//! # TaskGate Shared Library
//!
//! Types and business logic shared by the TaskGate API server and its
//! background notification worker.
//!
//! ## Module Organization
//!
//! - `models`: Users, roles, permissions, tasks and their associations
//! - `auth`: Password hashing, JWT, request principal, and the policy engine
//! - `events`: Domain events and the completion notifier interface
//! - `db`: Connection pool, migrations, and startup seeding

pub mod auth;
pub mod db;
pub mod events;
pub mod models;

/// Current version of the TaskGate shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
