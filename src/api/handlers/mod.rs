//! HTTP request handlers.

pub mod auth_handler;
pub mod feature_handler;
pub mod product_handler;
pub mod user_handler;

pub use auth_handler::auth_routes;
pub use feature_handler::{feature_routes, public_feature_routes};
pub use product_handler::{product_routes, public_product_routes};
pub use user_handler::user_routes;
