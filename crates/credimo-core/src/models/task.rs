//! Task domain model — same shape as a deadline but with an optional
//! due date and a single assignee.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::deadline::Priority;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub case_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub completed: bool,
    pub created_by: Uuid,
    pub assigned_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub case_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub created_by: Uuid,
    pub assigned_to: Option<Uuid>,
}

/// Partial update. `Some(Some(v))` sets, JSON `null` clears, absent
/// keeps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    #[serde(default, with = "crate::serde_util::double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, with = "crate::serde_util::double_option")]
    pub due_date: Option<Option<NaiveDate>>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
    #[serde(default, with = "crate::serde_util::double_option")]
    pub assigned_to: Option<Option<Uuid>>,
}
