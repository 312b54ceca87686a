//! Storefront API
//!
//! Products carry dynamically configured features whose validation rules
//! live in the database; users sell and buy them.
//!
//! # Architecture Layers
//!
//! - **cli** / **commands**: command-line entry points
//! - **config**: environment configuration and constants
//! - **domain**: entities, the feature rule engine and preferences
//! - **services**: use cases over the unit of work
//! - **infra**: database, migrations, repositories and Redis
//! - **jobs**: background email delivery
//! - **api**: HTTP handlers, middleware and routes
//! - **types**: pagination and shared responses
//! - **errors**: centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! storefront serve
//! storefront migrate up
//! storefront jobs work
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod jobs;
pub mod services;
pub mod types;

pub use api::AppState;
pub use config::Config;
pub use domain::{Feature, Password, Product, User, UserRole};
pub use errors::{AppError, AppResult};
pub use infra::Cache;
