//! Application services layer - use cases over the Unit of Work.
//!
//! Each service is a trait (what handlers depend on) plus a concrete
//! implementation generic over [`crate::infra::UnitOfWork`].

mod auth_service;
pub mod container;
mod feature_service;
mod notifier;
mod product_service;
mod user_service;

pub use container::{ServiceContainer, Services};

pub use auth_service::{AuthService, Authenticator, Claims, Registration, TokenResponse};
pub use feature_service::{FeatureCatalog, FeatureService};
pub use notifier::Notifier;
pub use product_service::{Actor, ProductCatalog, ProductService};
pub use user_service::{UserManager, UserService};

#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
