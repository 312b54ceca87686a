//! Feature catalog service: CRUD for product features and the filterable
//! feature lookups.

use std::collections::BTreeMap;

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{Feature, FeatureChanges, NewFeature, FEATURE_NAME_TAKEN};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;
use crate::types::PaginationParams;

#[async_trait]
pub trait FeatureService: Send + Sync {
    async fn list_features(&self, params: &PaginationParams) -> AppResult<(Vec<Feature>, u64)>;

    async fn get_feature(&self, id: Uuid) -> AppResult<Feature>;

    /// Reject `name` when another feature uses it. `current_feature` is the
    /// record being edited and never conflicts with itself.
    async fn ensure_name_available(&self, name: &str, current_feature: Option<Uuid>) -> AppResult<()>;

    async fn create_feature(&self, feature: NewFeature) -> AppResult<Feature>;

    /// Update `id`. Name uniqueness ignores `id` itself; a `current_feature`
    /// naming another record is not honoured.
    async fn update_feature(
        &self,
        id: Uuid,
        changes: FeatureChanges,
        current_feature: Option<Uuid>,
    ) -> AppResult<Feature>;

    async fn delete_feature(&self, id: Uuid) -> AppResult<()>;

    async fn filterable_features(&self) -> AppResult<Vec<Feature>>;

    /// `features.<name>` to rule string for filterable features
    async fn filterable_rules(&self) -> AppResult<BTreeMap<String, String>>;
}

pub struct FeatureCatalog<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> FeatureCatalog<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> FeatureService for FeatureCatalog<U> {
    async fn list_features(&self, params: &PaginationParams) -> AppResult<(Vec<Feature>, u64)> {
        self.uow.features().paginate(params).await
    }

    async fn get_feature(&self, id: Uuid) -> AppResult<Feature> {
        self.uow.features().find_by_id(id).await?.ok_or_not_found()
    }

    async fn ensure_name_available(&self, name: &str, current_feature: Option<Uuid>) -> AppResult<()> {
        if self.uow.features().name_taken(name, current_feature).await? {
            return Err(AppError::invalid_field("name", FEATURE_NAME_TAKEN));
        }
        Ok(())
    }

    async fn create_feature(&self, feature: NewFeature) -> AppResult<Feature> {
        self.ensure_name_available(&feature.name, None).await?;

        let feature = self.uow.features().create(feature).await?;
        tracing::info!(feature_id = %feature.id, name = %feature.name, "Feature created");
        Ok(feature)
    }

    async fn update_feature(
        &self,
        id: Uuid,
        changes: FeatureChanges,
        current_feature: Option<Uuid>,
    ) -> AppResult<Feature> {
        if current_feature.is_some_and(|current| current != id) {
            tracing::warn!(
                feature_id = %id,
                ?current_feature,
                "current_feature does not match the updated feature"
            );
        }
        if let Some(name) = &changes.name {
            self.ensure_name_available(name, Some(id)).await?;
        }

        let feature = self.uow.features().update(id, changes).await?;
        tracing::info!(feature_id = %feature.id, "Feature updated");
        Ok(feature)
    }

    async fn delete_feature(&self, id: Uuid) -> AppResult<()> {
        self.uow.features().delete(id).await?;
        tracing::info!(feature_id = %id, "Feature deleted");
        Ok(())
    }

    async fn filterable_features(&self) -> AppResult<Vec<Feature>> {
        self.uow.features().filterable().await
    }

    async fn filterable_rules(&self) -> AppResult<BTreeMap<String, String>> {
        self.uow.features().filterable_validation_rules().await
    }
}
