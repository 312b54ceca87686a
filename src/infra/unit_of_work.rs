//! Unit of Work: one entry point to every repository plus transactions for
//! workflows that touch several tables at once (password reset, email
//! change confirmation).

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    AccessMode, ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, IsolationLevel, QueryFilter, Set, TransactionTrait,
};
use uuid::Uuid;

use super::repositories::entities::{email_change_petition, password_reset, user};
use super::repositories::{
    EmailChangeRepository, EmailChangeStore, FeatureRepository, FeatureStore,
    NotificationRepository, NotificationStore, PasswordResetRepository, PasswordResetStore,
    ProductRepository, ProductStore, UserRepository, UserStore,
};
use crate::domain::{EmailChangePetition, User};
use crate::errors::{AppError, AppResult};

/// Boxed transactional work, borrowing the transaction context.
pub type TransactionFuture<'a, T> = Pin<Box<dyn Future<Output = AppResult<T>> + Send + 'a>>;

/// Unit of Work trait for dependency injection.
///
/// Not mockable directly because of the generic transaction methods; tests
/// wrap mocked repositories in their own implementation.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    fn users(&self) -> Arc<dyn UserRepository>;

    fn features(&self) -> Arc<dyn FeatureRepository>;

    fn products(&self) -> Arc<dyn ProductRepository>;

    fn notifications(&self) -> Arc<dyn NotificationRepository>;

    fn email_changes(&self) -> Arc<dyn EmailChangeRepository>;

    fn password_resets(&self) -> Arc<dyn PasswordResetRepository>;

    /// Run `f` in a ReadCommitted transaction; commit on `Ok`, roll back on `Err`.
    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TransactionFuture<'a, T> + Send,
        T: Send;

    /// Same as [`UnitOfWork::transaction`] with serializable isolation.
    async fn transaction_serializable<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TransactionFuture<'a, T> + Send,
        T: Send;
}

/// Repository access scoped to one open transaction.
pub struct TransactionContext<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TransactionContext<'a> {
    pub fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    pub fn users(&self) -> TxUserRepository<'_> {
        TxUserRepository { txn: self.txn }
    }

    pub fn email_changes(&self) -> TxEmailChangeRepository<'_> {
        TxEmailChangeRepository { txn: self.txn }
    }

    pub fn password_resets(&self) -> TxPasswordResetRepository<'_> {
        TxPasswordResetRepository { txn: self.txn }
    }
}

/// Database-backed Unit of Work
pub struct Persistence {
    db: DatabaseConnection,
    user_repo: Arc<UserStore>,
    feature_repo: Arc<FeatureStore>,
    product_repo: Arc<ProductStore>,
    notification_repo: Arc<NotificationStore>,
    email_change_repo: Arc<EmailChangeStore>,
    password_reset_repo: Arc<PasswordResetStore>,
}

impl Persistence {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            user_repo: Arc::new(UserStore::new(db.clone())),
            feature_repo: Arc::new(FeatureStore::new(db.clone())),
            product_repo: Arc::new(ProductStore::new(db.clone())),
            notification_repo: Arc::new(NotificationStore::new(db.clone())),
            email_change_repo: Arc::new(EmailChangeStore::new(db.clone())),
            password_reset_repo: Arc::new(PasswordResetStore::new(db.clone())),
            db,
        }
    }
}

/// Open a transaction on `db`, run `f` in it and commit on `Ok`. Any error
/// rolls the transaction back and is returned unchanged.
pub async fn run_transaction<F, T>(
    db: &DatabaseConnection,
    isolation: IsolationLevel,
    f: F,
) -> AppResult<T>
where
    F: for<'a> FnOnce(TransactionContext<'a>) -> TransactionFuture<'a, T> + Send,
    T: Send,
{
    let txn = db
        .begin_with_config(Some(isolation), Some(AccessMode::ReadWrite))
        .await?;

    match f(TransactionContext::new(&txn)).await {
        Ok(result) => {
            txn.commit().await?;
            Ok(result)
        }
        Err(e) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!(error = %rollback_err, "Transaction rollback failed");
            }
            Err(e)
        }
    }
}

#[async_trait]
impl UnitOfWork for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.user_repo.clone()
    }

    fn features(&self) -> Arc<dyn FeatureRepository> {
        self.feature_repo.clone()
    }

    fn products(&self) -> Arc<dyn ProductRepository> {
        self.product_repo.clone()
    }

    fn notifications(&self) -> Arc<dyn NotificationRepository> {
        self.notification_repo.clone()
    }

    fn email_changes(&self) -> Arc<dyn EmailChangeRepository> {
        self.email_change_repo.clone()
    }

    fn password_resets(&self) -> Arc<dyn PasswordResetRepository> {
        self.password_reset_repo.clone()
    }

    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TransactionFuture<'a, T> + Send,
        T: Send,
    {
        run_transaction(&self.db, IsolationLevel::ReadCommitted, f).await
    }

    async fn transaction_serializable<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TransactionFuture<'a, T> + Send,
        T: Send,
    {
        run_transaction(&self.db, IsolationLevel::Serializable, f).await
    }
}

/// Transaction-aware user operations.
pub struct TxUserRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxUserRepository<'a> {
    async fn editable(&self, id: Uuid) -> AppResult<user::ActiveModel> {
        let model = user::Entity::find_by_id(id)
            .filter(user::Column::DeletedAt.is_null())
            .one(self.txn)
            .await?
            .ok_or(AppError::NotFound)?;

        Ok(model.into())
    }

    /// Any account (soft-deleted included) holding `email`
    pub async fn find_by_email_with_deleted(&self, email: &str) -> AppResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(self.txn)
            .await?;

        Ok(model.map(User::from))
    }

    pub async fn update_password(&self, id: Uuid, password_hash: String) -> AppResult<User> {
        let mut active = self.editable(id).await?;
        active.password_hash = Set(password_hash);
        active.updated_at = Set(Utc::now());

        Ok(User::from(active.update(self.txn).await?))
    }

    pub async fn update_email(&self, id: Uuid, email: String) -> AppResult<User> {
        let mut active = self.editable(id).await?;
        active.email = Set(email);
        active.updated_at = Set(Utc::now());

        Ok(User::from(active.update(self.txn).await?))
    }
}

/// Transaction-aware email change petition operations.
pub struct TxEmailChangeRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxEmailChangeRepository<'a> {
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<EmailChangePetition>> {
        let model = email_change_petition::Entity::find()
            .filter(email_change_petition::Column::Token.eq(token))
            .one(self.txn)
            .await?;

        Ok(model.map(EmailChangePetition::from))
    }

    pub async fn mark_confirmed(&self, id: Uuid) -> AppResult<EmailChangePetition> {
        let model = email_change_petition::Entity::find_by_id(id)
            .one(self.txn)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: email_change_petition::ActiveModel = model.into();
        active.confirmed = Set(true);
        active.confirmed_at = Set(Some(Utc::now()));

        Ok(EmailChangePetition::from(active.update(self.txn).await?))
    }
}

/// Transaction-aware password reset operations.
pub struct TxPasswordResetRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxPasswordResetRepository<'a> {
    /// Consume the reset for `email`
    pub async fn delete(&self, email: &str) -> AppResult<()> {
        password_reset::Entity::delete_by_id(email.to_string())
            .exec(self.txn)
            .await?;
        Ok(())
    }
}

/// Run a block inside a transaction of the given unit of work.
#[macro_export]
macro_rules! with_transaction {
    ($uow:expr, serializable, |$ctx:ident| $body:expr) => {
        $uow.transaction_serializable(|$ctx| Box::pin(async move { $body }))
            .await
    };
    ($uow:expr, |$ctx:ident| $body:expr) => {
        $uow.transaction(|$ctx| Box::pin(async move { $body })).await
    };
}
