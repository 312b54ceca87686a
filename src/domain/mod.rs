//! Domain layer - storefront entities, value objects and the feature rule
//! engine. Nothing here touches the database or HTTP.

pub mod email_change;
pub mod feature;
pub mod notification;
pub mod password;
pub mod preferences;
pub mod product;
pub mod rules;
pub mod user;

pub use email_change::EmailChangePetition;
pub use feature::{
    filterable_validation_rules, validate_filters, validate_product_features, Feature,
    FeatureChanges, InputType, NewFeature, ProductType, FEATURE_NAME_TAKEN,
};
pub use notification::{Notification, OutboundNotification};
pub use password::{generate_token, Password, PasswordReset};
pub use preferences::{PreferenceKey, Preferences};
pub use product::{NewProduct, Product, ProductChanges, ProductFilter};
pub use rules::{validate_fields, RuleSet, ValidationRule};
pub use user::{NewUser, ProfileChanges, User, UserResponse, UserRole};
