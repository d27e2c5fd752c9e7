//! Optic Desk client library.
//!
//! Everything between the pure sale model in `optic-desk-core` and the
//! backend REST API:
//!
//! - [`api`] - Typed HTTP client for customers, prescriptions, catalog,
//!   sales, payments and expenses
//! - [`services`] - Sale workflows: debounced customer resolution, checkout,
//!   prescription saving
//! - [`config`] - Environment-driven configuration
//! - [`error`] - Error classification and reporting

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod services;

pub use api::{ApiClient, ApiError};
pub use config::{ApiConfig, AppConfig, ConfigError};
pub use error::{AppError, FailureKind};
