//! Workflow stage domain model and the canonical seeded pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stage whose order gates `credit_data` edits and starts the 90-day
/// bank countdown.
pub const PRE_APPROVAL_STAGE: &str = "pre_aprovacao";

/// Terminal stage used for soft-dropping a case.
pub const DROPPED_STAGE: &str = "desistiu";

/// Terminal stage counted as concluded in statistics.
pub const COMPLETED_STAGE: &str = "concluido";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStage {
    pub id: Uuid,
    /// Short name, unique and stable; `Case.status` references it.
    pub name: String,
    /// Human label shown in listings.
    pub label: String,
    /// Display order; the registry keeps orders gap-free.
    pub order: i64,
    pub color: Option<String>,
    pub description: Option<String>,
    /// Seeded stages cannot be deleted.
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStage {
    pub name: String,
    pub label: String,
    pub order: i64,
    pub color: Option<String>,
    pub description: Option<String>,
    pub is_default: bool,
}

/// Partial update. `Some(Some(v))` sets, JSON `null` clears, absent
/// keeps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateStage {
    pub label: Option<String>,
    pub order: Option<i64>,
    #[serde(default, with = "crate::serde_util::double_option")]
    pub color: Option<Option<String>>,
    #[serde(default, with = "crate::serde_util::double_option")]
    pub description: Option<Option<String>>,
}

/// The canonical pipeline, inserted in one batch when the registry is
/// empty at startup.
pub fn canonical_stages() -> Vec<CreateStage> {
    let stage = |name: &str, label: &str, order: i64, color: &str| CreateStage {
        name: name.into(),
        label: label.into(),
        order,
        color: Some(color.into()),
        description: None,
        is_default: true,
    };
    vec![
        stage("em_espera", "Em Espera", 1, "#9CA3AF"),
        stage("documentacao", "Documentação", 2, "#F59E0B"),
        stage(PRE_APPROVAL_STAGE, "Pré-Aprovação", 3, "#3B82F6"),
        stage("aprovado", "Aprovado", 4, "#10B981"),
        stage("escritura", "Escritura", 5, "#8B5CF6"),
        stage(COMPLETED_STAGE, "Concluído", 6, "#059669"),
        stage(DROPPED_STAGE, "Desistiu", 7, "#EF4444"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_orders_are_gap_free() {
        let stages = canonical_stages();
        for (i, s) in stages.iter().enumerate() {
            assert_eq!(s.order, i as i64 + 1);
            assert!(s.is_default);
        }
    }

    #[test]
    fn canonical_set_contains_boundary_stages() {
        let stages = canonical_stages();
        let names: Vec<&str> = stages.iter().map(|s| s.name.as_str()).collect();
        assert!(names.contains(&PRE_APPROVAL_STAGE));
        assert!(names.contains(&DROPPED_STAGE));
        assert!(names.contains(&COMPLETED_STAGE));
    }
}
