//! Feature repository: catalog attributes and their validation rules.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr,
};
use uuid::Uuid;

use super::base::{fetch_page, DeleteRepository, ReadRepository, WriteRepository};
use super::entities::feature::{self, ActiveModel, Entity as FeatureEntity, Model as FeatureModel};
use crate::domain::{
    filterable_validation_rules, Feature, FeatureChanges, NewFeature, FEATURE_NAME_TAKEN,
};
use crate::errors::{AppError, AppResult};
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait FeatureRepository: Send + Sync {
    /// Every feature ordered by name
    async fn all(&self) -> AppResult<Vec<Feature>>;

    async fn paginate(&self, params: &PaginationParams) -> AppResult<(Vec<Feature>, u64)>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Feature>>;

    /// Whether another feature already uses `name`, ignoring `ignore`
    async fn name_taken(&self, name: &str, ignore: Option<Uuid>) -> AppResult<bool>;

    async fn create(&self, feature: NewFeature) -> AppResult<Feature>;

    /// Rewrites `validation_rules` from `changes` even when they are `None`
    async fn update(&self, id: Uuid, changes: FeatureChanges) -> AppResult<Feature>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Active features flagged as filterable
    async fn filterable(&self) -> AppResult<Vec<Feature>>;

    /// `features.<name>` to rule string for every filterable feature with rules
    async fn filterable_validation_rules(&self) -> AppResult<BTreeMap<String, String>>;

    async fn active(&self) -> AppResult<Vec<Feature>>;
}

pub struct FeatureStore {
    db: DatabaseConnection,
}

impl FeatureStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn model(&self, id: Uuid) -> AppResult<FeatureModel> {
        ReadRepository::find_by_id(self, id)
            .await?
            .ok_or(AppError::NotFound)
    }
}

impl ReadRepository<FeatureEntity, FeatureModel> for FeatureStore {
    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl WriteRepository<FeatureEntity, FeatureModel, ActiveModel> for FeatureStore {
    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl DeleteRepository<FeatureEntity> for FeatureStore {
    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

fn is_unique_violation(err: Option<SqlErr>) -> bool {
    matches!(err, Some(SqlErr::UniqueConstraintViolation(_)))
}

/// A write that lost the race for `features.name` is a validation error on
/// `name`, like the check the service runs first.
fn name_conflict(err: DbErr) -> AppError {
    if is_unique_violation(err.sql_err()) {
        AppError::invalid_field("name", FEATURE_NAME_TAKEN)
    } else {
        err.into()
    }
}

#[async_trait]
impl FeatureRepository for FeatureStore {
    async fn all(&self) -> AppResult<Vec<Feature>> {
        let models = FeatureEntity::find()
            .order_by_asc(feature::Column::Name)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Feature::from).collect())
    }

    async fn paginate(&self, params: &PaginationParams) -> AppResult<(Vec<Feature>, u64)> {
        let query = FeatureEntity::find().order_by_asc(feature::Column::Name);
        let (models, total) = fetch_page(query, &self.db, params).await?;
        Ok((models.into_iter().map(Feature::from).collect(), total))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Feature>> {
        let model = ReadRepository::find_by_id(self, id).await?;
        Ok(model.map(Feature::from))
    }

    async fn name_taken(&self, name: &str, ignore: Option<Uuid>) -> AppResult<bool> {
        let mut query = FeatureEntity::find().filter(feature::Column::Name.eq(name));
        if let Some(id) = ignore {
            query = query.filter(feature::Column::Id.ne(id));
        }

        Ok(query.one(&self.db).await?.is_some())
    }

    async fn create(&self, new: NewFeature) -> AppResult<Feature> {
        let now = Utc::now();
        let active = ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(new.name),
            input_type: Set(new.input_type.as_str().to_string()),
            product_type: Set(new.product_type.as_str().to_string()),
            help_message: Set(new.help_message),
            status: Set(new.status),
            filterable: Set(new.filterable),
            validation_rules: Set(new.validation_rules),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = self.insert(active).await.map_err(name_conflict)?;
        tracing::debug!(feature_id = %model.id, name = %model.name, "Feature created");
        Ok(Feature::from(model))
    }

    async fn update(&self, id: Uuid, changes: FeatureChanges) -> AppResult<Feature> {
        let mut active: ActiveModel = self.model(id).await?.into();

        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(input_type) = changes.input_type {
            active.input_type = Set(input_type.as_str().to_string());
        }
        if let Some(product_type) = changes.product_type {
            active.product_type = Set(product_type.as_str().to_string());
        }
        if let Some(help_message) = changes.help_message {
            active.help_message = Set(Some(help_message));
        }
        if let Some(status) = changes.status {
            active.status = Set(status);
        }
        if let Some(filterable) = changes.filterable {
            active.filterable = Set(filterable);
        }
        active.validation_rules = Set(changes.validation_rules);
        active.updated_at = Set(Utc::now());

        let model = WriteRepository::update(self, active)
            .await
            .map_err(name_conflict)?;
        Ok(Feature::from(model))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.model(id).await?;
        self.delete_by_id(id).await
    }

    async fn filterable(&self) -> AppResult<Vec<Feature>> {
        let models = FeatureEntity::find()
            .filter(feature::Column::Status.eq(true))
            .filter(feature::Column::Filterable.eq(true))
            .order_by_asc(feature::Column::Name)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Feature::from).collect())
    }

    async fn filterable_validation_rules(&self) -> AppResult<BTreeMap<String, String>> {
        let features = self.filterable().await?;
        Ok(filterable_validation_rules(&features))
    }

    async fn active(&self) -> AppResult<Vec<Feature>> {
        let models = FeatureEntity::find()
            .filter(feature::Column::Status.eq(true))
            .order_by_asc(feature::Column::Name)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Feature::from).collect())
    }
}
