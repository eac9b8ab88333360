//! Notification inbox domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    NewCase,
    CaseAssigned,
    DeadlineAssigned,
    TaskAssigned,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::NewCase => "new_case",
            NotificationType::CaseAssigned => "case_assigned",
            NotificationType::DeadlineAssigned => "deadline_assigned",
            NotificationType::TaskAssigned => "task_assigned",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub case_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotification {
    pub user_id: Uuid,
    pub case_id: Option<Uuid>,
    pub kind: NotificationType,
    pub message: String,
}
