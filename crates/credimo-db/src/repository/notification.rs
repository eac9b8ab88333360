//! SurrealDB implementation of [`NotificationRepository`].
//!
//! Every notification has a single recipient. Admin and CEO listings
//! additionally merge in the global `new_case` feed at query time.

use chrono::{DateTime, Utc};
use credimo_core::error::CredimoResult;
use credimo_core::models::notification::{CreateNotification, Notification, NotificationType};
use credimo_core::repository::NotificationRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::{CountRow, parse_opt_uuid, parse_uuid};

#[derive(Debug, SurrealValue)]
struct NotificationRow {
    user_id: String,
    case_id: Option<String>,
    r#type: String,
    message: String,
    read: bool,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct NotificationRowWithId {
    record_id: String,
    user_id: String,
    case_id: Option<String>,
    r#type: String,
    message: String,
    read: bool,
    created_at: DateTime<Utc>,
}

fn parse_kind(s: &str) -> Result<NotificationType, DbError> {
    match s {
        "new_case" => Ok(NotificationType::NewCase),
        "case_assigned" => Ok(NotificationType::CaseAssigned),
        "deadline_assigned" => Ok(NotificationType::DeadlineAssigned),
        "task_assigned" => Ok(NotificationType::TaskAssigned),
        other => Err(DbError::Decode(format!(
            "unknown notification type: {other}"
        ))),
    }
}

impl NotificationRow {
    fn into_notification(self, id: Uuid) -> Result<Notification, DbError> {
        Ok(Notification {
            id,
            user_id: parse_uuid("user", &self.user_id)?,
            case_id: parse_opt_uuid("process", self.case_id)?,
            kind: parse_kind(&self.r#type)?,
            message: self.message,
            read: self.read,
            created_at: self.created_at,
        })
    }
}

impl NotificationRowWithId {
    fn try_into_notification(self) -> Result<Notification, DbError> {
        let id = parse_uuid("notification", &self.record_id)?;
        let row = NotificationRow {
            user_id: self.user_id,
            case_id: self.case_id,
            r#type: self.r#type,
            message: self.message,
            read: self.read,
            created_at: self.created_at,
        };
        row.into_notification(id)
    }
}

/// SurrealDB implementation of the notification inbox.
#[derive(Clone)]
pub struct SurrealNotificationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealNotificationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> NotificationRepository for SurrealNotificationRepository<C> {
    async fn create(&self, input: CreateNotification) -> CredimoResult<Notification> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('notification', $id) SET \
                 user_id = $user_id, case_id = $case_id, \
                 type = $type, message = $message, read = false",
            )
            .bind(("id", id_str.clone()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("case_id", input.case_id.map(|v| v.to_string())))
            .bind(("type", input.kind.as_str().to_string()))
            .bind(("message", input.message))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Decode(e.to_string()))?;

        let rows: Vec<NotificationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "notificação".into(),
            id: id_str,
        })?;

        Ok(row.into_notification(id)?)
    }

    async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
        include_new_case_feed: bool,
    ) -> CredimoResult<Vec<Notification>> {
        let mut clauses = vec![if include_new_case_feed {
            "(user_id = $user_id OR type = 'new_case')"
        } else {
            "user_id = $user_id"
        }];
        if unread_only {
            clauses.push("read = false");
        }

        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM notification \
             WHERE {} ORDER BY created_at DESC",
            clauses.join(" AND ")
        );

        let mut result = self
            .db
            .query(&query)
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<NotificationRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| row.try_into_notification())
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> CredimoResult<()> {
        // Recipient-only and idempotent: a foreign or repeated call
        // matches zero rows.
        self.db
            .query(
                "UPDATE type::record('notification', $id) SET read = true \
                 WHERE user_id = $user_id",
            )
            .bind(("id", id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn mark_all_read(&self, user_id: Uuid) -> CredimoResult<u64> {
        let user_id_str = user_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM notification \
                 WHERE user_id = $user_id AND read = false GROUP ALL",
            )
            .bind(("user_id", user_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = rows.first().map(|r| r.total).unwrap_or(0);

        self.db
            .query(
                "UPDATE notification SET read = true \
                 WHERE user_id = $user_id AND read = false",
            )
            .bind(("user_id", user_id_str))
            .await
            .map_err(DbError::from)?;

        Ok(total)
    }
}
