//! SeaORM entity definitions
//!
//! These are database-specific entities separate from domain models.

pub mod email_change_petition;
pub mod feature;
pub mod notification;
pub mod password_reset;
pub mod product;
pub mod user;

pub use feature::{ActiveModel as FeatureActiveModel, Entity as FeatureEntity, Model as FeatureModel};
pub use user::{ActiveModel as UserActiveModel, Entity as UserEntity, Model as UserModel};
