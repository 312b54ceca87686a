//! Shared fixtures for service tests: a unit of work over mocked
//! repositories and sample domain values.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{DatabaseBackend, DatabaseConnection, IsolationLevel, MockDatabase};
use uuid::Uuid;

use storefront::domain::{Feature, InputType, Product, ProductType, User, UserRole};
use storefront::errors::AppResult;
use storefront::infra::repositories::entities::{email_change_petition, user as user_entity};
use storefront::infra::repositories::{
    MockEmailChangeRepository, MockFeatureRepository, MockNotificationRepository,
    MockPasswordResetRepository, MockProductRepository, MockUserRepository,
};
use storefront::infra::{
    EmailChangeRepository, FeatureRepository, NotificationRepository, PasswordResetRepository,
    run_transaction, ProductRepository, TransactionContext, TransactionFuture, UnitOfWork,
    UserRepository,
};

/// Unit of Work over mocked repositories. Repositories without
/// expectations panic when called.
///
/// Transactions run against `database`, a sea-orm `MockDatabase` whose
/// queued results feed the transaction-scoped repositories.
#[derive(Default)]
pub struct TestUnitOfWork {
    pub users: MockUserRepository,
    pub features: MockFeatureRepository,
    pub products: MockProductRepository,
    pub notifications: MockNotificationRepository,
    pub email_changes: MockEmailChangeRepository,
    pub password_resets: MockPasswordResetRepository,
    pub database: Option<DatabaseConnection>,
}

impl TestUnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_database(mut self, database: MockDatabase) -> Self {
        self.database = Some(database.into_connection());
        self
    }

    pub fn build(self) -> Arc<SharedTestUnitOfWork> {
        let db = self
            .database
            .unwrap_or_else(|| MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        Arc::new(SharedTestUnitOfWork {
            db,
            users: Arc::new(self.users),
            features: Arc::new(self.features),
            products: Arc::new(self.products),
            notifications: Arc::new(self.notifications),
            email_changes: Arc::new(self.email_changes),
            password_resets: Arc::new(self.password_resets),
        })
    }
}

pub struct SharedTestUnitOfWork {
    db: DatabaseConnection,
    users: Arc<MockUserRepository>,
    features: Arc<MockFeatureRepository>,
    products: Arc<MockProductRepository>,
    notifications: Arc<MockNotificationRepository>,
    email_changes: Arc<MockEmailChangeRepository>,
    password_resets: Arc<MockPasswordResetRepository>,
}

#[async_trait]
impl UnitOfWork for SharedTestUnitOfWork {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.users.clone()
    }

    fn features(&self) -> Arc<dyn FeatureRepository> {
        self.features.clone()
    }

    fn products(&self) -> Arc<dyn ProductRepository> {
        self.products.clone()
    }

    fn notifications(&self) -> Arc<dyn NotificationRepository> {
        self.notifications.clone()
    }

    fn email_changes(&self) -> Arc<dyn EmailChangeRepository> {
        self.email_changes.clone()
    }

    fn password_resets(&self) -> Arc<dyn PasswordResetRepository> {
        self.password_resets.clone()
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

pub fn user(id: Uuid) -> User {
    User::new(
        id,
        "jane".to_string(),
        "doe".to_string(),
        "jane@example.com".to_string(),
        "hashed".to_string(),
    )
}

pub fn user_with_role(id: Uuid, role: UserRole) -> User {
    User {
        role,
        ..user(id)
    }
}

pub fn feature(name: &str, rules: Option<&str>) -> Feature {
    Feature {
        id: Uuid::new_v4(),
        name: name.to_string(),
        input_type: InputType::Text,
        product_type: ProductType::Item,
        help_message: Some(format!("The {}", name)),
        status: true,
        filterable: true,
        validation_rules: rules.map(str::to_string),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn product(id: Uuid, owner: Uuid) -> Product {
    Product {
        id,
        user_id: owner,
        name: "Leather boots".to_string(),
        description: None,
        price_cents: 12999,
        stock: 3,
        product_type: ProductType::Item,
        status: true,
        features: BTreeMap::new(),
        tags: vec![],
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Stored row for [`user`], as the transaction-scoped repositories read it
pub fn user_row(id: Uuid, email: &str) -> user_entity::Model {
    user_entity::Model {
        id,
        first_name: "jane".to_string(),
        last_name: "doe".to_string(),
        nickname: None,
        email: email.to_string(),
        password_hash: "hashed".to_string(),
        role: "person".to_string(),
        pic_url: None,
        language: None,
        time_zone: None,
        phone_number: None,
        gender: None,
        birthday: None,
        rate_val: None,
        rate_count: None,
        preferences: None,
        verified: false,
        confirmation_token: None,
        disabled_at: None,
        facebook: None,
        twitter: None,
        website: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        deleted_at: None,
    }
}

pub fn petition_row(
    user_id: Uuid,
    new_email: &str,
    expires_at: chrono::DateTime<Utc>,
) -> email_change_petition::Model {
    email_change_petition::Model {
        id: Uuid::new_v4(),
        user_id,
        old_email: "jane@example.com".to_string(),
        new_email: new_email.to_string(),
        token: "confirm-token".to_string(),
        expires_at,
        confirmed: false,
        confirmed_at: None,
        created_at: Utc::now(),
    }
}
