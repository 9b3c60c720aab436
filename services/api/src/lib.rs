//! services/api/src/lib.rs
//!
//! The library crate behind both binaries (`api` and `openapi`). It wires
//! the `docket_core` versioning engine to Postgres, OpenAI and axum.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
