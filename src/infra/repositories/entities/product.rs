//! Product database entity.

use std::collections::BTreeMap;

use sea_orm::entity::prelude::*;

use crate::domain::{Product, ProductType};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: i32,
    pub product_type: String,
    pub status: bool,
    /// JSON object of feature name to value
    pub features: Json,
    /// JSON array of tags
    pub tags: Json,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
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

impl From<Model> for Product {
    fn from(model: Model) -> Self {
        let features: BTreeMap<String, String> = model
            .features
            .as_object()
            .map(|object| {
                object
                    .iter()
                    .filter_map(|(name, value)| match value {
                        Json::String(s) => Some((name.clone(), s.clone())),
                        Json::Null => None,
                        other => Some((name.clone(), other.to_string())),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let tags = model
            .tags
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        Product {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            description: model.description,
            price_cents: model.price_cents,
            stock: model.stock,
            product_type: ProductType::from(model.product_type.as_str()),
            status: model.status,
            features,
            tags,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
