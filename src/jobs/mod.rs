//! Background jobs processed by the apalis worker (`jobs work`).

mod email_job;

pub use email_job::{
    connect_email_storage, email_job_handler, EmailJob, EmailQueue, PostgresEmailQueue,
};

#[cfg(any(test, feature = "test-utils"))]
pub use email_job::MockEmailQueue;
