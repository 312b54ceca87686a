//! Storefront configuration.
//!
//! `Config` is read from the environment once at startup; tunables that do
//! not change between deployments live in `constants`.

mod constants;
mod settings;

pub use constants::*;
pub use settings::{Config, ConfigError};
