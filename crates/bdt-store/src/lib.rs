//! JSON-file persistence, the operations audit log and the company deletion
//! saga for the business development tool.

pub mod audit;
pub mod config;
pub mod saga;
pub mod store;

use bdt_core::ParseEnumError;
use thiserror::Error;

pub use audit::{AuditLog, AuditOperation, AuditSink, LogEntry};
pub use config::StoreConfig;
pub use saga::{delete_company, CascadeStep, DeletionReport, DEFAULT_ACTOR};
pub use store::{DataStore, Dataset, DatasetTotals, SeedSummary};

pub const CRATE_NAME: &str = "bdt-store";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    UnknownStatus(#[from] ParseEnumError),
    #[error(transparent)]
    Persist(#[from] anyhow::Error),
}
