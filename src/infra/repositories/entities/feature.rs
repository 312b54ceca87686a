//! Product feature database entity.

use sea_orm::entity::prelude::*;

use crate::domain::{Feature, InputType, ProductType};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "features")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub input_type: String,
    pub product_type: String,
    pub help_message: Option<String>,
    pub status: bool,
    pub filterable: bool,
    /// Pipe-joined rule string, NULL when the feature has no rules
    pub validation_rules: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Feature {
    fn from(model: Model) -> Self {
        Feature {
            id: model.id,
            name: model.name,
            input_type: InputType::from(model.input_type.as_str()),
            product_type: ProductType::from(model.product_type.as_str()),
            help_message: model.help_message,
            status: model.status,
            filterable: model.filterable,
            validation_rules: model.validation_rules,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
