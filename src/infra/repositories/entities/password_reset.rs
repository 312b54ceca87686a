//! Password reset token entity. One row per email; a new request
//! replaces the previous token.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "password_resets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub email: String,
    /// Argon2 hash of the emailed token
    pub token_hash: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for crate::domain::PasswordReset {
    fn from(model: Model) -> Self {
        crate::domain::PasswordReset {
            email: model.email,
            token_hash: model.token_hash,
            created_at: model.created_at,
        }
    }
}
