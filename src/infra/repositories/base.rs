//! Shared repository building blocks.
//!
//! Stores implement the small read/write/delete traits for their entity and
//! get primary key lookups and saves for free; [`fetch_page`] runs any
//! select as a page plus total count.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait,
    FromQueryResult, IntoActiveModel, PaginatorTrait, PrimaryKeyTrait, Select,
};
use std::fmt::Debug;

use crate::errors::AppResult;
use crate::types::PaginationParams;

/// Run `query` for the requested page and count every matching row.
pub async fn fetch_page<E>(
    query: Select<E>,
    db: &DatabaseConnection,
    params: &PaginationParams,
) -> AppResult<(Vec<E::Model>, u64)>
where
    E: EntityTrait,
    E::Model: FromQueryResult + Send + Sync,
{
    let paginator = query.paginate(db, params.limit());
    let total = paginator.num_items().await?;
    let models = paginator.fetch_page(params.page() - 1).await?;
    Ok((models, total))
}

#[async_trait]
pub trait ReadRepository<E, M>: Send + Sync
where
    E: EntityTrait<Model = M>,
    M: Send + Sync + FromQueryResult,
{
    fn db(&self) -> &DatabaseConnection;

    async fn find_by_id(&self, id: <E::PrimaryKey as PrimaryKeyTrait>::ValueType) -> AppResult<Option<M>>
    where
        <E::PrimaryKey as PrimaryKeyTrait>::ValueType: Clone + Send,
    {
        E::find_by_id(id)
            .one(self.db())
            .await
            .map_err(Into::into)
    }
}

/// Saves return the raw `DbErr` so stores can map constraint violations.
#[async_trait]
pub trait WriteRepository<E, M, A>: Send + Sync
where
    E: EntityTrait<Model = M>,
    M: Send + Sync + IntoActiveModel<A>,
    A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send + 'static,
{
    fn db(&self) -> &DatabaseConnection;

    async fn insert(&self, model: A) -> Result<M, DbErr>
    where
        <<A as ActiveModelTrait>::Entity as EntityTrait>::Model: Send,
    {
        model.insert(self.db()).await
    }

    /// Save the changed columns of an existing row
    async fn update(&self, model: A) -> Result<M, DbErr>
    where
        <<A as ActiveModelTrait>::Entity as EntityTrait>::Model: Send,
    {
        model.update(self.db()).await
    }
}

#[async_trait]
pub trait DeleteRepository<E>: Send + Sync
where
    E: EntityTrait,
{
    fn db(&self) -> &DatabaseConnection;

    /// Hard delete by primary key
    async fn delete_by_id(&self, id: <E::PrimaryKey as PrimaryKeyTrait>::ValueType) -> AppResult<()>
    where
        <E::PrimaryKey as PrimaryKeyTrait>::ValueType: Clone + Send + Debug,
    {
        E::delete_by_id(id)
            .exec(self.db())
            .await?;
        Ok(())
    }
}
