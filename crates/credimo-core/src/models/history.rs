//! History domain model — append-only field-change audit records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub case_id: Uuid,
    pub author_id: Uuid,
    /// Snapshot of the author name at the time of the action.
    pub author_name: String,
    /// Action label, e.g. `atualizado`, `estado_alterado`, `atribuido`.
    pub action: String,
    pub field: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHistoryEntry {
    pub case_id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub action: String,
    pub field: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

/// Action labels used by the case store. Kept as constants so tests
/// and handlers never drift apart on spelling.
pub mod actions {
    pub const CREATED: &str = "criado";
    pub const PUBLIC_REGISTRATION: &str = "registo_formulario_publico";
    pub const UPDATED: &str = "atualizado";
    pub const STATUS_CHANGED: &str = "estado_alterado";
    pub const ASSIGNED: &str = "atribuido";
    pub const DEADLINE_COMPLETED: &str = "prazo_concluido";
    pub const TASK_COMPLETED: &str = "tarefa_concluida";
}
