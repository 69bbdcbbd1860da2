//! # API Shared
//!
//! Shared utilities and definitions for the medforms APIs.
//!
//! Contains:
//! - Wire request/response types (`dto` module)
//! - Shared services like `HealthService`
//! - Authentication utilities
//!
//! Used by `api-rest`, the main server binary and the CLI for common
//! functionality.

pub mod auth;
pub mod dto;
pub mod health;

pub use dto::*;
pub use health::HealthService;
