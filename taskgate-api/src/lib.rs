//! # TaskGate API Server Library
//!
//! This library provides the core functionality for the TaskGate API server.
//!
//! ## Modules
//!
//! - `app`: Application state, router builder, authentication layer
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Extractors that report decoding failures as JSON
//! - `pages`: Page rendering boundary
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod pages;
pub mod routes;
