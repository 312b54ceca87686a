//! Jobs command - email queue worker and queue maintenance.
//!
//! ```bash
//! storefront jobs work    # process queued emails
//! storefront jobs list    # job counts per status
//! storefront jobs clear   # drop failed jobs
//! ```

use apalis::prelude::*;
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, Statement};

use crate::cli::args::{JobsAction, JobsArgs};
use crate::config::{Config, JOB_NAME_EMAIL};
use crate::errors::{AppError, AppResult};
use crate::infra::Database;
use crate::jobs::{connect_email_storage, email_job_handler};

/// Execute the jobs command
pub async fn execute(args: JobsArgs, config: Config) -> AppResult<()> {
    match args.action {
        JobsAction::Work => run_worker(&config).await,
        JobsAction::List => list_jobs(&config).await,
        JobsAction::Clear => clear_failed_jobs(&config).await,
    }
}

/// Consume email jobs until Ctrl+C.
async fn run_worker(config: &Config) -> AppResult<()> {
    tracing::info!("Connecting to database for job worker...");
    let storage = connect_email_storage(&config.database_url).await?;

    let worker = WorkerBuilder::new(JOB_NAME_EMAIL)
        .backend(storage)
        .build_fn(email_job_handler);

    tracing::info!(worker = JOB_NAME_EMAIL, "Job worker started. Press Ctrl+C to stop.");

    tokio::select! {
        result = Monitor::new().register(worker).run() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Worker error");
                return Err(AppError::internal(format!("Worker failed: {}", e)));
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping worker...");
        }
    }

    tracing::info!("Job worker stopped.");
    Ok(())
}

async fn connect(config: &Config) -> AppResult<DatabaseConnection> {
    tracing::info!("Connecting to database...");
    let db = Database::connect_without_migrations(config)
        .await
        .map_err(|e| AppError::internal(format!("Failed to connect to database: {}", e)))?;
    Ok(db.get_connection())
}

/// True once a worker (or the server) has created the apalis tables.
async fn queue_initialized(db: &DatabaseConnection) -> AppResult<bool> {
    let row = db
        .query_one(Statement::from_string(
            DatabaseBackend::Postgres,
            "SELECT EXISTS(SELECT 1 FROM information_schema.schemata WHERE schema_name = 'apalis') AS exists",
        ))
        .await?;

    Ok(row
        .and_then(|r| r.try_get::<bool>("", "exists").ok())
        .unwrap_or(false))
}

/// Job counts per status
async fn list_jobs(config: &Config) -> AppResult<()> {
    let db = connect(config).await?;

    println!("\n=== Job Queue Status ===");
    if !queue_initialized(&db).await? {
        println!("Job queue not initialized.");
        println!("Run 'jobs work' or 'serve' first to create the queue tables.");
        println!("========================\n");
        return Ok(());
    }

    let rows = db
        .query_all(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "SELECT status::text AS status, COUNT(*)::bigint AS count FROM apalis.jobs \
             WHERE job_type = $1 GROUP BY status",
            [JOB_NAME_EMAIL.into()],
        ))
        .await?;

    let mut counts = [("Pending", 0i64), ("Running", 0), ("Failed", 0), ("Done", 0)];
    for row in rows {
        if let (Ok(status), Ok(count)) = (
            row.try_get::<String>("", "status"),
            row.try_get::<i64>("", "count"),
        ) {
            if let Some(slot) = counts.iter_mut().find(|(name, _)| *name == status) {
                slot.1 = count;
            }
        }
    }

    for (status, count) in counts {
        println!("{:<9} {}", format!("{}:", status), count);
    }
    println!("========================\n");

    Ok(())
}

async fn clear_failed_jobs(config: &Config) -> AppResult<()> {
    let db = connect(config).await?;

    if !queue_initialized(&db).await? {
        println!("Job queue not initialized. Nothing to clear.");
        return Ok(());
    }

    let result = db
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "DELETE FROM apalis.jobs WHERE status = 'Failed' AND job_type = $1",
            [JOB_NAME_EMAIL.into()],
        ))
        .await?;

    tracing::info!(count = result.rows_affected(), "Cleared failed jobs");
    println!("Cleared {} failed job(s) from the queue.", result.rows_affected());

    Ok(())
}
