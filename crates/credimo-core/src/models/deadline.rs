//! Deadline domain model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deadline {
    pub id: Uuid,
    /// `None` = standalone deadline, reachable only through its
    /// creator or assignees.
    pub case_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    /// Calendar date, no time component.
    pub due_date: NaiveDate,
    pub priority: Priority,
    pub completed: bool,
    pub created_by: Uuid,
    pub assigned_consultant_id: Option<Uuid>,
    pub assigned_intermediary_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDeadline {
    pub case_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub due_date: NaiveDate,
    pub priority: Priority,
    pub created_by: Uuid,
    pub assigned_consultant_id: Option<Uuid>,
    pub assigned_intermediary_id: Option<Uuid>,
}

/// Partial update. `Some(Some(v))` sets, JSON `null` clears, absent
/// keeps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDeadline {
    pub title: Option<String>,
    #[serde(default, with = "crate::serde_util::double_option")]
    pub description: Option<Option<String>>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
    #[serde(default, with = "crate::serde_util::double_option")]
    pub assigned_consultant_id: Option<Option<Uuid>>,
    #[serde(default, with = "crate::serde_util::double_option")]
    pub assigned_intermediary_id: Option<Option<Uuid>>,
}

/// A deadline annotated for the calendar view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEntry {
    #[serde(flatten)]
    pub deadline: Deadline,
    pub client_name: Option<String>,
    pub case_status: Option<String>,
}
