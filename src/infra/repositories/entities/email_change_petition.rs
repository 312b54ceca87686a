//! Email change petition database entity.

use sea_orm::entity::prelude::*;

use crate::domain::EmailChangePetition;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "email_change_petitions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub old_email: String,
    pub new_email: String,
    #[sea_orm(unique)]
    pub token: String,
    pub expires_at: DateTimeUtc,
    pub confirmed: bool,
    pub confirmed_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for EmailChangePetition {
    fn from(model: Model) -> Self {
        EmailChangePetition {
            id: model.id,
            user_id: model.user_id,
            old_email: model.old_email,
            new_email: model.new_email,
            token: model.token,
            expires_at: model.expires_at,
            confirmed: model.confirmed,
            confirmed_at: model.confirmed_at,
            created_at: model.created_at,
        }
    }
}
