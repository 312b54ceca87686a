//! Service container: builds every service over one shared Unit of Work.

use std::sync::Arc;

use super::{
    AuthService, Authenticator, FeatureCatalog, FeatureService, ProductCatalog, ProductService,
    UserManager, UserService,
};
use crate::config::Config;
use crate::infra::Persistence;
use crate::jobs::EmailQueue;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    fn auth(&self) -> Arc<dyn AuthService>;

    fn users(&self) -> Arc<dyn UserService>;

    fn features(&self) -> Arc<dyn FeatureService>;

    fn products(&self) -> Arc<dyn ProductService>;
}

pub struct Services {
    auth_service: Arc<dyn AuthService>,
    user_service: Arc<dyn UserService>,
    feature_service: Arc<dyn FeatureService>,
    product_service: Arc<dyn ProductService>,
}

impl Services {
    pub fn new(
        auth_service: Arc<dyn AuthService>,
        user_service: Arc<dyn UserService>,
        feature_service: Arc<dyn FeatureService>,
        product_service: Arc<dyn ProductService>,
    ) -> Self {
        Self {
            auth_service,
            user_service,
            feature_service,
            product_service,
        }
    }

    /// Wire the database-backed services.
    pub fn from_connection(
        db: sea_orm::DatabaseConnection,
        queue: Arc<dyn EmailQueue>,
        config: Config,
    ) -> Self {
        let uow = Arc::new(Persistence::new(db));

        Self {
            user_service: Arc::new(UserManager::new(uow.clone(), queue.clone(), &config)),
            feature_service: Arc::new(FeatureCatalog::new(uow.clone())),
            product_service: Arc::new(ProductCatalog::new(uow.clone())),
            auth_service: Arc::new(Authenticator::new(uow, queue, config)),
        }
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth_service.clone()
    }

    fn users(&self) -> Arc<dyn UserService> {
        self.user_service.clone()
    }

    fn features(&self) -> Arc<dyn FeatureService> {
        self.feature_service.clone()
    }

    fn products(&self) -> Arc<dyn ProductService> {
        self.product_service.clone()
    }
}
