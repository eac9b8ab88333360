//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings; enums are stored as strings with
//! ASSERT constraints. Calendar dates (due dates, expiry dates) are
//! ISO `YYYY-MM-DD` strings, so range queries rely on lexicographic
//! ordering.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Users
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD name ON TABLE user TYPE string;
DEFINE FIELD phone ON TABLE user TYPE option<string>;
DEFINE FIELD role ON TABLE user TYPE string \
    ASSERT $value IN ['client', 'consultant', 'intermediary', \
    'consultant_intermediary', 'director', 'administrative', 'ceo', \
    'admin'];
DEFINE FIELD password_hash ON TABLE user TYPE option<string>;
DEFINE FIELD active ON TABLE user TYPE bool DEFAULT true;
DEFINE FIELD cloud_folder ON TABLE user TYPE option<string>;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;

-- =======================================================================
-- Workflow stages
-- =======================================================================
DEFINE TABLE workflow_status SCHEMAFULL;
DEFINE FIELD name ON TABLE workflow_status TYPE string;
DEFINE FIELD label ON TABLE workflow_status TYPE string;
DEFINE FIELD order ON TABLE workflow_status TYPE int;
DEFINE FIELD color ON TABLE workflow_status TYPE option<string>;
DEFINE FIELD description ON TABLE workflow_status TYPE option<string>;
DEFINE FIELD is_default ON TABLE workflow_status TYPE bool \
    DEFAULT false;
DEFINE FIELD created_at ON TABLE workflow_status TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_workflow_status_name ON TABLE workflow_status \
    COLUMNS name UNIQUE;

-- =======================================================================
-- Cases (processes)
-- =======================================================================
DEFINE TABLE process SCHEMAFULL;
DEFINE FIELD client_id ON TABLE process TYPE string;
DEFINE FIELD client_name ON TABLE process TYPE string;
DEFINE FIELD client_email ON TABLE process TYPE string;
DEFINE FIELD client_phone ON TABLE process TYPE option<string>;
DEFINE FIELD process_type ON TABLE process TYPE string \
    ASSERT $value IN ['credit', 'real_estate', 'both'];
DEFINE FIELD status ON TABLE process TYPE string;
DEFINE FIELD personal_data ON TABLE process TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD second_holder_data ON TABLE process TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD financial_data ON TABLE process TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD real_estate_data ON TABLE process TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD credit_data ON TABLE process TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD assigned_consultant_id ON TABLE process \
    TYPE option<string>;
DEFINE FIELD assigned_intermediary_id ON TABLE process \
    TYPE option<string>;
DEFINE FIELD age_under_35 ON TABLE process TYPE bool DEFAULT false;
DEFINE FIELD priority ON TABLE process TYPE bool DEFAULT false;
DEFINE FIELD notes ON TABLE process TYPE option<string>;
DEFINE FIELD tags ON TABLE process TYPE array DEFAULT [];
DEFINE FIELD tags.* ON TABLE process TYPE string;
DEFINE FIELD pre_approval_date ON TABLE process TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE process TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE process TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_process_client ON TABLE process COLUMNS client_id;
DEFINE INDEX idx_process_status ON TABLE process COLUMNS status;
DEFINE INDEX idx_process_consultant ON TABLE process \
    COLUMNS assigned_consultant_id;
DEFINE INDEX idx_process_intermediary ON TABLE process \
    COLUMNS assigned_intermediary_id;

-- =======================================================================
-- Activities (append-only comments)
-- =======================================================================
DEFINE TABLE activity SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD case_id ON TABLE activity TYPE string;
DEFINE FIELD author_id ON TABLE activity TYPE string;
DEFINE FIELD author_name ON TABLE activity TYPE string;
DEFINE FIELD author_role ON TABLE activity TYPE string;
DEFINE FIELD comment ON TABLE activity TYPE string;
DEFINE FIELD created_at ON TABLE activity TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_activity_case ON TABLE activity COLUMNS case_id;

-- =======================================================================
-- History (append-only field-change audit)
-- =======================================================================
DEFINE TABLE history SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD case_id ON TABLE history TYPE string;
DEFINE FIELD author_id ON TABLE history TYPE string;
DEFINE FIELD author_name ON TABLE history TYPE string;
DEFINE FIELD action ON TABLE history TYPE string;
DEFINE FIELD field ON TABLE history TYPE option<string>;
DEFINE FIELD old_value ON TABLE history TYPE option<string>;
DEFINE FIELD new_value ON TABLE history TYPE option<string>;
DEFINE FIELD created_at ON TABLE history TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_history_case ON TABLE history COLUMNS case_id;

-- =======================================================================
-- Deadlines
-- =======================================================================
DEFINE TABLE deadline SCHEMAFULL;
DEFINE FIELD case_id ON TABLE deadline TYPE option<string>;
DEFINE FIELD title ON TABLE deadline TYPE string;
DEFINE FIELD description ON TABLE deadline TYPE option<string>;
DEFINE FIELD due_date ON TABLE deadline TYPE string;
DEFINE FIELD priority ON TABLE deadline TYPE string \
    ASSERT $value IN ['low', 'medium', 'high'];
DEFINE FIELD completed ON TABLE deadline TYPE bool DEFAULT false;
DEFINE FIELD created_by ON TABLE deadline TYPE string;
DEFINE FIELD assigned_consultant_id ON TABLE deadline \
    TYPE option<string>;
DEFINE FIELD assigned_intermediary_id ON TABLE deadline \
    TYPE option<string>;
DEFINE FIELD created_at ON TABLE deadline TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_deadline_case ON TABLE deadline COLUMNS case_id;
DEFINE INDEX idx_deadline_due ON TABLE deadline COLUMNS due_date;

-- =======================================================================
-- Tasks
-- =======================================================================
DEFINE TABLE task SCHEMAFULL;
DEFINE FIELD case_id ON TABLE task TYPE option<string>;
DEFINE FIELD title ON TABLE task TYPE string;
DEFINE FIELD description ON TABLE task TYPE option<string>;
DEFINE FIELD due_date ON TABLE task TYPE option<string>;
DEFINE FIELD priority ON TABLE task TYPE string \
    ASSERT $value IN ['low', 'medium', 'high'];
DEFINE FIELD completed ON TABLE task TYPE bool DEFAULT false;
DEFINE FIELD created_by ON TABLE task TYPE string;
DEFINE FIELD assigned_to ON TABLE task TYPE option<string>;
DEFINE FIELD created_at ON TABLE task TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_task_case ON TABLE task COLUMNS case_id;

-- =======================================================================
-- Document expiries
-- =======================================================================
DEFINE TABLE document_expiry SCHEMAFULL;
DEFINE FIELD case_id ON TABLE document_expiry TYPE string;
DEFINE FIELD document_type ON TABLE document_expiry TYPE string \
    ASSERT $value IN ['cc', 'passaporte', 'irs', 'recibo_vencimento', \
    'extrato_bancario', 'contrato_trabalho', 'caderneta_predial', \
    'outro'];
DEFINE FIELD document_name ON TABLE document_expiry TYPE string;
DEFINE FIELD expiry_date ON TABLE document_expiry TYPE string;
DEFINE FIELD notes ON TABLE document_expiry TYPE option<string>;
DEFINE FIELD created_by ON TABLE document_expiry TYPE string;
DEFINE FIELD created_at ON TABLE document_expiry TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_document_expiry_case ON TABLE document_expiry \
    COLUMNS case_id;
DEFINE INDEX idx_document_expiry_date ON TABLE document_expiry \
    COLUMNS expiry_date;

-- =======================================================================
-- Notifications
-- =======================================================================
DEFINE TABLE notification SCHEMAFULL;
DEFINE FIELD user_id ON TABLE notification TYPE string;
DEFINE FIELD case_id ON TABLE notification TYPE option<string>;
DEFINE FIELD type ON TABLE notification TYPE string \
    ASSERT $value IN ['new_case', 'case_assigned', \
    'deadline_assigned', 'task_assigned'];
DEFINE FIELD message ON TABLE notification TYPE string;
DEFINE FIELD read ON TABLE notification TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE notification TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_notification_user_read ON TABLE notification \
    COLUMNS user_id, read;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            db.query("CREATE _migration SET version = $version, name = $name")
                .bind(("version", migration.version))
                .bind(("name", migration.name))
                .await?
                .check()
                .map_err(|e| {
                    DbError::Migration(format!(
                        "Failed to record migration v{}: {}",
                        migration.version, e,
                    ))
                })?;

            info!(version = migration.version, "Migration applied successfully");
        }
    }

    Ok(())
}
