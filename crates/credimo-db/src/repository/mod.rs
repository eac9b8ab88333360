//! SurrealDB implementations of the `credimo-core` repository traits.
//!
//! Every repository is generic over the connection engine, so the same
//! code runs against a remote server in production and an in-memory
//! instance in tests.

mod activity;
mod case;
mod deadline;
mod document;
mod history;
mod notification;
mod stage;
mod task;
mod user;

pub use activity::SurrealActivityRepository;
pub use case::SurrealCaseRepository;
pub use deadline::SurrealDeadlineRepository;
pub use document::SurrealDocumentExpiryRepository;
pub use history::SurrealHistoryRepository;
pub use notification::SurrealNotificationRepository;
pub use stage::SurrealStageRepository;
pub use task::SurrealTaskRepository;
pub use user::{SurrealUserRepository, hash_password};

use crate::error::DbError;
use chrono::NaiveDate;
use surrealdb_types::SurrealValue;
use uuid::Uuid;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
pub(crate) struct CountRow {
    pub(crate) total: u64,
}

pub(crate) fn parse_uuid(entity: &str, s: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(s).map_err(|e| DbError::Decode(format!("invalid {entity} UUID: {e}")))
}

pub(crate) fn parse_opt_uuid(entity: &str, s: Option<String>) -> Result<Option<Uuid>, DbError> {
    s.map(|v| parse_uuid(entity, &v)).transpose()
}

/// Calendar dates are stored as ISO `YYYY-MM-DD` strings; range
/// queries rely on lexicographic ordering.
pub(crate) fn date_to_string(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| DbError::Decode(format!("invalid date '{s}': {e}")))
}
