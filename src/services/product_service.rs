//! Product service: listing with feature filters, and seller-owned writes
//! validated against the active features.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{
    validate_filters, validate_product_features, NewProduct, Product, ProductChanges,
    ProductFilter,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;
use crate::types::PaginationParams;

/// Who is acting on a product
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub is_admin: bool,
}

impl Actor {
    fn can_manage(&self, product: &Product) -> bool {
        self.is_admin || product.user_id == self.id
    }
}

#[async_trait]
pub trait ProductService: Send + Sync {
    /// Active products matching the filters; unknown or malformed filters
    /// are rejected.
    async fn list_products(
        &self,
        filter: &ProductFilter,
        params: &PaginationParams,
    ) -> AppResult<(Vec<Product>, u64)>;

    /// Active product by id; inactive products are hidden like missing ones.
    async fn get_product(&self, id: Uuid) -> AppResult<Product>;

    async fn create_product(&self, product: NewProduct) -> AppResult<Product>;

    /// Owner or admin only
    async fn update_product(
        &self,
        actor: Actor,
        id: Uuid,
        changes: ProductChanges,
    ) -> AppResult<Product>;

    /// Owner or admin only
    async fn delete_product(&self, actor: Actor, id: Uuid) -> AppResult<()>;
}

pub struct ProductCatalog<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> ProductCatalog<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    /// Any product `actor` may change, inactive ones included
    async fn managed(&self, actor: Actor, id: Uuid) -> AppResult<Product> {
        let product = self.uow.products().find_by_id(id).await?.ok_or_not_found()?;
        if !actor.can_manage(&product) {
            return Err(AppError::Forbidden);
        }
        Ok(product)
    }
}

#[async_trait]
impl<U: UnitOfWork> ProductService for ProductCatalog<U> {
    async fn list_products(
        &self,
        filter: &ProductFilter,
        params: &PaginationParams,
    ) -> AppResult<(Vec<Product>, u64)> {
        if !filter.features.is_empty() {
            let filterable = self.uow.features().filterable().await?;
            validate_filters(&filterable, &filter.features)?;
        }

        self.uow.products().list(filter, params).await
    }

    async fn get_product(&self, id: Uuid) -> AppResult<Product> {
        self.uow
            .products()
            .find_by_id(id)
            .await?
            .filter(|product| product.status)
            .ok_or_not_found()
    }

    async fn create_product(&self, product: NewProduct) -> AppResult<Product> {
        let active = self.uow.features().active().await?;
        validate_product_features(&active, product.product_type, &product.features)?;

        let product = self.uow.products().create(product).await?;
        tracing::info!(product_id = %product.id, user_id = %product.user_id, "Product created");
        Ok(product)
    }

    async fn update_product(
        &self,
        actor: Actor,
        id: Uuid,
        changes: ProductChanges,
    ) -> AppResult<Product> {
        let product = self.managed(actor, id).await?;

        if let Some(features) = &changes.features {
            let active = self.uow.features().active().await?;
            validate_product_features(&active, product.product_type, features)?;
        }

        self.uow.products().update(id, changes).await
    }

    async fn delete_product(&self, actor: Actor, id: Uuid) -> AppResult<()> {
        self.managed(actor, id).await?;
        self.uow.products().delete(id).await?;
        tracing::info!(product_id = %id, actor = %actor.id, "Product deleted");
        Ok(())
    }
}
