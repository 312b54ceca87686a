//! Application state shared by every handler.

use std::sync::Arc;

use crate::config::Config;
use crate::infra::{Cache, Database};
use crate::jobs::EmailQueue;
use crate::services::{
    AuthService, FeatureService, ProductService, ServiceContainer, Services, UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub user_service: Arc<dyn UserService>,
    pub feature_service: Arc<dyn FeatureService>,
    pub product_service: Arc<dyn ProductService>,
    /// Redis cache (feature lookups and rate limiting)
    pub cache: Arc<Cache>,
    pub database: Arc<Database>,
}

impl AppState {
    /// Wire the database-backed services over `database`.
    pub fn from_config(
        database: Arc<Database>,
        cache: Arc<Cache>,
        queue: Arc<dyn EmailQueue>,
        config: Config,
    ) -> Self {
        let container = Services::from_connection(database.get_connection(), queue, config);
        Self::new(&container, cache, database)
    }

    /// Build state from any service container.
    pub fn new(
        services: &dyn ServiceContainer,
        cache: Arc<Cache>,
        database: Arc<Database>,
    ) -> Self {
        Self {
            auth_service: services.auth(),
            user_service: services.users(),
            feature_service: services.features(),
            product_service: services.products(),
            cache,
            database,
        }
    }
}
