//! Infrastructure layer - database, repositories, Redis cache and the
//! Unit of Work that ties repositories to transactions.

pub mod cache;
pub mod db;
pub mod repositories;
pub mod unit_of_work;

pub use cache::Cache;
pub use db::{Database, Migrator};
pub use repositories::{
    EmailChangeRepository, FeatureRepository, NotificationRepository, PasswordResetRepository,
    ProductRepository, UserRepository,
};
pub use unit_of_work::{
    run_transaction, Persistence, TransactionContext, TransactionFuture, UnitOfWork,
};
