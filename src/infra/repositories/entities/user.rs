//! User database entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::domain::{Preferences, User, UserRole};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub nickname: Option<String>,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub pic_url: Option<String>,
    pub language: Option<String>,
    pub time_zone: Option<String>,
    pub phone_number: Option<String>,
    pub gender: Option<String>,
    pub birthday: Option<Date>,
    pub rate_val: Option<i32>,
    pub rate_count: Option<i32>,
    /// JSON object of preference key to comma-separated entries
    pub preferences: Option<Json>,
    pub verified: bool,
    pub confirmation_token: Option<String>,
    pub disabled_at: Option<DateTimeUtc>,
    pub facebook: Option<String>,
    pub twitter: Option<String>,
    pub website: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    /// Soft delete timestamp (NULL = active, set = deleted)
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
    #[sea_orm(has_many = "super::email_change_petition::Entity")]
    EmailChangePetitions,
    #[sea_orm(has_many = "super::notification::Entity")]
    Notifications,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl Related<super::email_change_petition::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EmailChangePetitions.def()
    }
}

impl Related<super::notification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notifications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity
impl From<Model> for User {
    fn from(model: Model) -> Self {
        User {
            id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            nickname: model.nickname,
            email: model.email,
            password_hash: model.password_hash,
            role: UserRole::from(model.role.as_str()),
            pic_url: model.pic_url,
            language: model.language,
            time_zone: model.time_zone,
            phone_number: model.phone_number,
            gender: model.gender,
            birthday: model.birthday,
            rate_val: model.rate_val,
            rate_count: model.rate_count,
            preferences: model
                .preferences
                .as_ref()
                .map(Preferences::from_value)
                .unwrap_or_default(),
            verified: model.verified,
            confirmation_token: model.confirmation_token,
            disabled_at: model.disabled_at,
            facebook: model.facebook,
            twitter: model.twitter,
            website: model.website,
            created_at: model.created_at,
            updated_at: model.updated_at,
            deleted_at: model.deleted_at,
        }
    }
}
