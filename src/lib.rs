//! Event-services marketplace backend.
//!
//! Customers book caterers, hotels and photographers for events; admins
//! manage the catalogue. Every route is a thin pass-through to a document
//! store, guarded by bearer tokens and an admin role check.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`store`]: Document store trait with MongoDB and in-memory backends
//! - [`auth`]: Access tokens and route guards
//! - [`payment`]: Payment intents (Stripe or offline)
//! - [`api`]: HTTP routes and handlers
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod payment;
pub mod store;
pub mod utils;

pub use config::Config;
pub use error::{ApiError, Result, ServerError};
