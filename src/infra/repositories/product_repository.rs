//! Product repository.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde_json::json;
use uuid::Uuid;

use super::base::fetch_page;
use super::entities::product::{self, ActiveModel, Entity as ProductEntity};
use crate::domain::{NewProduct, Product, ProductChanges, ProductFilter};
use crate::errors::{AppError, AppResult};
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn create(&self, product: NewProduct) -> AppResult<Product>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Product>>;

    /// Page of active products matching every feature filter, newest first
    async fn list(
        &self,
        filter: &ProductFilter,
        params: &PaginationParams,
    ) -> AppResult<(Vec<Product>, u64)>;

    /// Every product of a seller, including inactive ones
    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<Product>>;

    async fn update(&self, id: Uuid, changes: ProductChanges) -> AppResult<Product>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

pub struct ProductStore {
    db: DatabaseConnection,
}

impl ProductStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductRepository for ProductStore {
    async fn create(&self, new: NewProduct) -> AppResult<Product> {
        let now = Utc::now();
        let active = ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(new.user_id),
            name: Set(new.name),
            description: Set(new.description),
            price_cents: Set(new.price_cents),
            stock: Set(new.stock),
            product_type: Set(new.product_type.as_str().to_string()),
            status: Set(true),
            features: Set(json!(new.features)),
            tags: Set(json!(new.tags)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active.insert(&self.db).await?;
        Ok(Product::from(model))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Product>> {
        let model = ProductEntity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Product::from))
    }

    async fn list(
        &self,
        filter: &ProductFilter,
        params: &PaginationParams,
    ) -> AppResult<(Vec<Product>, u64)> {
        let mut query = ProductEntity::find().filter(product::Column::Status.eq(true));

        if let Some(user_id) = filter.user_id {
            query = query.filter(product::Column::UserId.eq(user_id));
        }
        for (name, value) in &filter.features {
            query = query.filter(Expr::cust_with_values(
                "features ->> ? = ?",
                [name.clone(), value.clone()],
            ));
        }

        let query = query.order_by_desc(product::Column::CreatedAt);
        let (models, total) = fetch_page(query, &self.db, params).await?;

        Ok((models.into_iter().map(Product::from).collect(), total))
    }

    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<Product>> {
        let models = ProductEntity::find()
            .filter(product::Column::UserId.eq(user_id))
            .order_by_desc(product::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Product::from).collect())
    }

    async fn update(&self, id: Uuid, changes: ProductChanges) -> AppResult<Product> {
        let model = ProductEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;
        let mut active: ActiveModel = model.into();

        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(description) = changes.description {
            active.description = Set(Some(description));
        }
        if let Some(price_cents) = changes.price_cents {
            active.price_cents = Set(price_cents);
        }
        if let Some(stock) = changes.stock {
            active.stock = Set(stock);
        }
        if let Some(status) = changes.status {
            active.status = Set(status);
        }
        if let Some(features) = changes.features {
            active.features = Set(json!(features));
        }
        if let Some(tags) = changes.tags {
            active.tags = Set(json!(tags));
        }
        active.updated_at = Set(Utc::now());

        let model = active.update(&self.db).await?;
        Ok(Product::from(model))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = ProductEntity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }
}
