//! Repository layer - data access behind traits so services can be
//! tested against mocks.

mod base;
mod email_change_repository;
pub mod entities;
mod feature_repository;
mod notification_repository;
mod password_reset_repository;
mod product_repository;
mod user_repository;

pub use base::{fetch_page, DeleteRepository, ReadRepository, WriteRepository};
pub use email_change_repository::{EmailChangeRepository, EmailChangeStore};
pub use feature_repository::{FeatureRepository, FeatureStore};
pub use notification_repository::{NotificationRepository, NotificationStore};
pub use password_reset_repository::{PasswordResetRepository, PasswordResetStore};
pub use product_repository::{ProductRepository, ProductStore};
pub use user_repository::{UserRepository, UserStore};

#[cfg(any(test, feature = "test-utils"))]
pub use email_change_repository::MockEmailChangeRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use feature_repository::MockFeatureRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use notification_repository::MockNotificationRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use password_reset_repository::MockPasswordResetRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use product_repository::MockProductRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
