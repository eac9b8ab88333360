//! Repository trait definitions for data access abstraction.
//!
//! All operations are async. List operations over cases, deadlines,
//! tasks and documents take the caller's row filter as an explicit
//! parameter so that visibility is decided by the policy layer, never
//! inside a store implementation.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::CredimoResult;
use crate::models::{
    activity::{Activity, CreateActivity},
    case::{Case, CreateCase, ProcessType},
    deadline::{CreateDeadline, Deadline, UpdateDeadline},
    document::{CreateDocumentExpiry, DocumentExpiry, UpdateDocumentExpiry},
    history::{CreateHistoryEntry, HistoryEntry},
    notification::{CreateNotification, Notification},
    stage::{CreateStage, UpdateStage, WorkflowStage},
    task::{CreateTask, Task, UpdateTask},
    user::{CreateUser, Role, UpdateUser, User},
};
use crate::policy::CaseScope;

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

pub trait UserRepository: Send + Sync {
    /// Rejects duplicate email (case-insensitive).
    fn create(&self, input: CreateUser) -> impl Future<Output = CredimoResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CredimoResult<User>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = CredimoResult<User>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = CredimoResult<User>> + Send;
    /// Soft deactivation: authentication is rejected, history
    /// references stay intact.
    fn deactivate(&self, id: Uuid) -> impl Future<Output = CredimoResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = CredimoResult<PaginatedResult<User>>> + Send;
    fn list_by_role(&self, role: Role) -> impl Future<Output = CredimoResult<Vec<User>>> + Send;
    fn count(&self) -> impl Future<Output = CredimoResult<u64>> + Send;
    fn count_active(&self) -> impl Future<Output = CredimoResult<u64>> + Send;
}

pub trait StageRepository: Send + Sync {
    /// Rejects duplicate `name`.
    fn create(
        &self,
        input: CreateStage,
    ) -> impl Future<Output = CredimoResult<WorkflowStage>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CredimoResult<WorkflowStage>> + Send;
    fn get_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = CredimoResult<WorkflowStage>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateStage,
    ) -> impl Future<Output = CredimoResult<WorkflowStage>> + Send;
    /// Callers must have already checked is_default and references.
    fn delete(&self, id: Uuid) -> impl Future<Output = CredimoResult<()>> + Send;
    /// Ordered by `order` ascending.
    fn list(&self) -> impl Future<Output = CredimoResult<Vec<WorkflowStage>>> + Send;
    fn count(&self) -> impl Future<Output = CredimoResult<u64>> + Send;
    /// Insert the canonical set in one batch. Used only when the
    /// registry is empty at startup.
    fn seed(&self, stages: Vec<CreateStage>) -> impl Future<Output = CredimoResult<()>> + Send;
    /// Apply a full set of (id, order) pairs atomically with respect
    /// to listings.
    fn reorder(
        &self,
        orders: Vec<(Uuid, i64)>,
    ) -> impl Future<Output = CredimoResult<()>> + Send;
}

/// Non-scope filters for case listings.
#[derive(Debug, Clone, Default)]
pub struct CaseFilter {
    pub status: Option<String>,
    pub process_type: Option<ProcessType>,
    pub consultant_id: Option<Uuid>,
    pub intermediary_id: Option<Uuid>,
    /// Substring over denormalized client name/email.
    pub search: Option<String>,
}

pub trait CaseRepository: Send + Sync {
    fn create(&self, input: CreateCase) -> impl Future<Output = CredimoResult<Case>> + Send;
    fn get(&self, id: Uuid) -> impl Future<Output = CredimoResult<Case>> + Send;
    /// Full-document write of every mutable field; bumps `updated_at`.
    fn save(&self, case: &Case) -> impl Future<Output = CredimoResult<Case>> + Send;
    fn list(
        &self,
        scope: &CaseScope,
        filter: &CaseFilter,
        pagination: Pagination,
    ) -> impl Future<Output = CredimoResult<PaginatedResult<Case>>> + Send;
    /// Ids only — used to extend the row filter to dependents.
    fn list_ids(&self, scope: &CaseScope) -> impl Future<Output = CredimoResult<Vec<Uuid>>> + Send;
    fn count(&self, scope: &CaseScope) -> impl Future<Output = CredimoResult<u64>> + Send;
    fn count_by_status(
        &self,
        scope: &CaseScope,
        status: &str,
    ) -> impl Future<Output = CredimoResult<u64>> + Send;
    /// Global reference count for a stage name, used by stage delete.
    fn count_referencing_status(
        &self,
        status: &str,
    ) -> impl Future<Output = CredimoResult<u64>> + Send;
}

pub trait ActivityRepository: Send + Sync {
    fn append(
        &self,
        input: CreateActivity,
    ) -> impl Future<Output = CredimoResult<Activity>> + Send;
    /// Newest first.
    fn list_by_case(
        &self,
        case_id: Uuid,
    ) -> impl Future<Output = CredimoResult<Vec<Activity>>> + Send;
}

pub trait HistoryRepository: Send + Sync {
    fn append(
        &self,
        input: CreateHistoryEntry,
    ) -> impl Future<Output = CredimoResult<HistoryEntry>> + Send;
    /// Newest first.
    fn list_by_case(
        &self,
        case_id: Uuid,
    ) -> impl Future<Output = CredimoResult<Vec<HistoryEntry>>> + Send;
}

/// Row filter for deadlines and tasks, derived by the handler from
/// the principal plus the set of case ids visible to them.
#[derive(Debug, Clone)]
pub enum SchedulerScope {
    All,
    /// Created by, assigned to, or attached to a visible case.
    Visible { user_id: Uuid, case_ids: Vec<Uuid> },
    /// Calendar filter: union of items carrying the given assignment
    /// and items on cases carrying it.
    Assignment {
        consultant_id: Option<Uuid>,
        intermediary_id: Option<Uuid>,
        case_ids: Vec<Uuid>,
    },
}

pub trait DeadlineRepository: Send + Sync {
    fn create(
        &self,
        input: CreateDeadline,
    ) -> impl Future<Output = CredimoResult<Deadline>> + Send;
    fn get(&self, id: Uuid) -> impl Future<Output = CredimoResult<Deadline>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateDeadline,
    ) -> impl Future<Output = CredimoResult<Deadline>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = CredimoResult<()>> + Send;
    /// Ascending by due date; optional date window for the calendar.
    fn list(
        &self,
        scope: &SchedulerScope,
        due_from: Option<NaiveDate>,
        due_to: Option<NaiveDate>,
    ) -> impl Future<Output = CredimoResult<Vec<Deadline>>> + Send;
    fn count_pending(
        &self,
        scope: &SchedulerScope,
    ) -> impl Future<Output = CredimoResult<u64>> + Send;
}

pub trait TaskRepository: Send + Sync {
    fn create(&self, input: CreateTask) -> impl Future<Output = CredimoResult<Task>> + Send;
    fn get(&self, id: Uuid) -> impl Future<Output = CredimoResult<Task>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateTask,
    ) -> impl Future<Output = CredimoResult<Task>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = CredimoResult<()>> + Send;
    fn list(
        &self,
        scope: &SchedulerScope,
    ) -> impl Future<Output = CredimoResult<Vec<Task>>> + Send;
    fn count_pending(
        &self,
        scope: &SchedulerScope,
    ) -> impl Future<Output = CredimoResult<u64>> + Send;
}

pub trait DocumentExpiryRepository: Send + Sync {
    fn create(
        &self,
        input: CreateDocumentExpiry,
    ) -> impl Future<Output = CredimoResult<DocumentExpiry>> + Send;
    fn get(&self, id: Uuid) -> impl Future<Output = CredimoResult<DocumentExpiry>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateDocumentExpiry,
    ) -> impl Future<Output = CredimoResult<DocumentExpiry>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = CredimoResult<()>> + Send;
    fn list_by_case(
        &self,
        case_id: Uuid,
    ) -> impl Future<Output = CredimoResult<Vec<DocumentExpiry>>> + Send;
    /// Records whose expiry date lies in `[from, to]`, ascending.
    /// `case_ids = None` means no row restriction (scope All).
    fn upcoming(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        case_ids: Option<Vec<Uuid>>,
    ) -> impl Future<Output = CredimoResult<Vec<DocumentExpiry>>> + Send;
}

pub trait NotificationRepository: Send + Sync {
    fn create(
        &self,
        input: CreateNotification,
    ) -> impl Future<Output = CredimoResult<Notification>> + Send;
    /// Own notifications, newest first; `include_new_case_feed` adds
    /// the global `new_case` feed for admin/CEO callers.
    fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
        include_new_case_feed: bool,
    ) -> impl Future<Output = CredimoResult<Vec<Notification>>> + Send;
    /// Idempotent; only the recipient may mark.
    fn mark_read(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = CredimoResult<()>> + Send;
    fn mark_all_read(&self, user_id: Uuid) -> impl Future<Output = CredimoResult<u64>> + Send;
}
