//! SurrealDB implementation of [`CaseRepository`].
//!
//! The nested data bags (personal, financial, real-estate, credit,
//! second holder) are stored as flexible objects and round-tripped
//! through `serde_json::Value`. Visibility is decided by the caller:
//! every read takes a [`CaseScope`] and the repository only turns it
//! into a WHERE clause.

use chrono::{DateTime, Utc};
use credimo_core::error::{CredimoError, CredimoResult};
use credimo_core::models::case::{
    Case, CreateCase, CreditData, FinancialData, PersonalData, ProcessType, RealEstateData,
    SecondHolderData,
};
use credimo_core::policy::CaseScope;
use credimo_core::repository::{CaseFilter, CaseRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::{CountRow, parse_opt_uuid, parse_uuid};

#[derive(Debug, SurrealValue)]
struct CaseRow {
    client_id: String,
    client_name: String,
    client_email: String,
    client_phone: Option<String>,
    process_type: String,
    status: String,
    personal_data: serde_json::Value,
    second_holder_data: serde_json::Value,
    financial_data: serde_json::Value,
    real_estate_data: serde_json::Value,
    credit_data: serde_json::Value,
    assigned_consultant_id: Option<String>,
    assigned_intermediary_id: Option<String>,
    age_under_35: bool,
    priority: bool,
    notes: Option<String>,
    tags: Vec<String>,
    pre_approval_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct CaseRowWithId {
    record_id: String,
    client_id: String,
    client_name: String,
    client_email: String,
    client_phone: Option<String>,
    process_type: String,
    status: String,
    personal_data: serde_json::Value,
    second_holder_data: serde_json::Value,
    financial_data: serde_json::Value,
    real_estate_data: serde_json::Value,
    credit_data: serde_json::Value,
    assigned_consultant_id: Option<String>,
    assigned_intermediary_id: Option<String>,
    age_under_35: bool,
    priority: bool,
    notes: Option<String>,
    tags: Vec<String>,
    pre_approval_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct IdRow {
    record_id: String,
}

fn parse_process_type(s: &str) -> Result<ProcessType, DbError> {
    match s {
        "credit" => Ok(ProcessType::Credit),
        "real_estate" => Ok(ProcessType::RealEstate),
        "both" => Ok(ProcessType::Both),
        other => Err(DbError::Decode(format!("unknown process type: {other}"))),
    }
}

fn decode_bag<T: serde::de::DeserializeOwned>(field: &str, value: serde_json::Value) -> Result<T, DbError> {
    serde_json::from_value(value)
        .map_err(|e| DbError::Decode(format!("invalid {field} payload: {e}")))
}

fn encode_bag<T: serde::Serialize>(field: &str, value: &T) -> Result<serde_json::Value, DbError> {
    serde_json::to_value(value)
        .map_err(|e| DbError::Decode(format!("failed to encode {field}: {e}")))
}

impl CaseRow {
    fn into_case(self, id: Uuid) -> Result<Case, DbError> {
        Ok(Case {
            id,
            client_id: parse_uuid("client", &self.client_id)?,
            client_name: self.client_name,
            client_email: self.client_email,
            client_phone: self.client_phone,
            process_type: parse_process_type(&self.process_type)?,
            status: self.status,
            personal_data: decode_bag::<PersonalData>("personal_data", self.personal_data)?,
            second_holder_data: decode_bag::<SecondHolderData>(
                "second_holder_data",
                self.second_holder_data,
            )?,
            financial_data: decode_bag::<FinancialData>("financial_data", self.financial_data)?,
            real_estate_data: decode_bag::<RealEstateData>(
                "real_estate_data",
                self.real_estate_data,
            )?,
            credit_data: decode_bag::<CreditData>("credit_data", self.credit_data)?,
            assigned_consultant_id: parse_opt_uuid("consultant", self.assigned_consultant_id)?,
            assigned_intermediary_id: parse_opt_uuid(
                "intermediary",
                self.assigned_intermediary_id,
            )?,
            age_under_35: self.age_under_35,
            priority: self.priority,
            notes: self.notes,
            tags: self.tags,
            pre_approval_date: self.pre_approval_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl CaseRowWithId {
    fn try_into_case(self) -> Result<Case, DbError> {
        let id = parse_uuid("process", &self.record_id)?;
        let row = CaseRow {
            client_id: self.client_id,
            client_name: self.client_name,
            client_email: self.client_email,
            client_phone: self.client_phone,
            process_type: self.process_type,
            status: self.status,
            personal_data: self.personal_data,
            second_holder_data: self.second_holder_data,
            financial_data: self.financial_data,
            real_estate_data: self.real_estate_data,
            credit_data: self.credit_data,
            assigned_consultant_id: self.assigned_consultant_id,
            assigned_intermediary_id: self.assigned_intermediary_id,
            age_under_35: self.age_under_35,
            priority: self.priority,
            notes: self.notes,
            tags: self.tags,
            pre_approval_date: self.pre_approval_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        row.into_case(id)
    }
}

/// Turn a [`CaseScope`] into a WHERE fragment plus its bind value.
///
/// Scope [`CaseScope::All`] yields no fragment.
fn scope_clause(scope: &CaseScope) -> Option<(&'static str, String)> {
    match scope {
        CaseScope::All => None,
        CaseScope::Client(id) => Some(("client_id = $scope_id", id.to_string())),
        CaseScope::Consultant(id) => Some(("assigned_consultant_id = $scope_id", id.to_string())),
        CaseScope::Intermediary(id) => {
            Some(("assigned_intermediary_id = $scope_id", id.to_string()))
        }
        CaseScope::Assigned(id) => Some((
            "(assigned_consultant_id = $scope_id OR assigned_intermediary_id = $scope_id)",
            id.to_string(),
        )),
    }
}

/// SurrealDB implementation of the case store.
#[derive(Clone)]
pub struct SurrealCaseRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCaseRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Fetch every row matching the scope plus non-search filters,
    /// ordered newest first.
    async fn fetch_filtered(
        &self,
        scope: &CaseScope,
        filter: &CaseFilter,
    ) -> Result<Vec<Case>, DbError> {
        let mut clauses = Vec::new();
        let scope_bind = scope_clause(scope);
        if let Some((clause, _)) = &scope_bind {
            clauses.push(clause.to_string());
        }
        if filter.status.is_some() {
            clauses.push("status = $status".into());
        }
        if filter.process_type.is_some() {
            clauses.push("process_type = $process_type".into());
        }
        if filter.consultant_id.is_some() {
            clauses.push("assigned_consultant_id = $consultant_id".into());
        }
        if filter.intermediary_id.is_some() {
            clauses.push("assigned_intermediary_id = $intermediary_id".into());
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {} ", clauses.join(" AND "))
        };

        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM process \
             {where_clause}ORDER BY created_at DESC"
        );

        let mut builder = self.db.query(&query);
        if let Some((_, id)) = scope_bind {
            builder = builder.bind(("scope_id", id));
        }
        if let Some(status) = &filter.status {
            builder = builder.bind(("status", status.clone()));
        }
        if let Some(process_type) = &filter.process_type {
            builder = builder.bind(("process_type", process_type.as_str().to_string()));
        }
        if let Some(consultant_id) = &filter.consultant_id {
            builder = builder.bind(("consultant_id", consultant_id.to_string()));
        }
        if let Some(intermediary_id) = &filter.intermediary_id {
            builder = builder.bind(("intermediary_id", intermediary_id.to_string()));
        }

        let mut result = builder.await?;
        let rows: Vec<CaseRowWithId> = result.take(0)?;

        rows.into_iter().map(|row| row.try_into_case()).collect()
    }
}

impl<C: Connection> CaseRepository for SurrealCaseRepository<C> {
    async fn create(&self, input: CreateCase) -> CredimoResult<Case> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('process', $id) SET \
                 client_id = $client_id, \
                 client_name = $client_name, \
                 client_email = $client_email, \
                 client_phone = $client_phone, \
                 process_type = $process_type, \
                 status = $status, \
                 personal_data = $personal_data, \
                 second_holder_data = $second_holder_data, \
                 financial_data = $financial_data, \
                 real_estate_data = $real_estate_data, \
                 credit_data = $credit_data, \
                 assigned_consultant_id = $assigned_consultant_id, \
                 assigned_intermediary_id = $assigned_intermediary_id, \
                 age_under_35 = $age_under_35, \
                 priority = $priority, \
                 notes = $notes, \
                 tags = $tags, \
                 pre_approval_date = NONE",
            )
            .bind(("id", id_str.clone()))
            .bind(("client_id", input.client_id.to_string()))
            .bind(("client_name", input.client_name))
            .bind(("client_email", input.client_email))
            .bind(("client_phone", input.client_phone))
            .bind(("process_type", input.process_type.as_str().to_string()))
            .bind(("status", input.status))
            .bind((
                "personal_data",
                encode_bag("personal_data", &input.personal_data)?,
            ))
            .bind((
                "second_holder_data",
                encode_bag("second_holder_data", &input.second_holder_data)?,
            ))
            .bind((
                "financial_data",
                encode_bag("financial_data", &input.financial_data)?,
            ))
            .bind((
                "real_estate_data",
                encode_bag("real_estate_data", &input.real_estate_data)?,
            ))
            .bind((
                "credit_data",
                encode_bag("credit_data", &input.credit_data)?,
            ))
            .bind((
                "assigned_consultant_id",
                input.assigned_consultant_id.map(|v| v.to_string()),
            ))
            .bind((
                "assigned_intermediary_id",
                input.assigned_intermediary_id.map(|v| v.to_string()),
            ))
            .bind(("age_under_35", input.age_under_35))
            .bind(("priority", input.priority))
            .bind(("notes", input.notes))
            .bind(("tags", input.tags))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Decode(e.to_string()))?;

        let rows: Vec<CaseRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "processo".into(),
            id: id_str,
        })?;

        Ok(row.into_case(id)?)
    }

    async fn get(&self, id: Uuid) -> CredimoResult<Case> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('process', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CaseRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "processo".into(),
            id: id_str,
        })?;

        Ok(row.into_case(id)?)
    }

    async fn save(&self, case: &Case) -> CredimoResult<Case> {
        let id_str = case.id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('process', $id) SET \
                 client_name = $client_name, \
                 client_email = $client_email, \
                 client_phone = $client_phone, \
                 process_type = $process_type, \
                 status = $status, \
                 personal_data = $personal_data, \
                 second_holder_data = $second_holder_data, \
                 financial_data = $financial_data, \
                 real_estate_data = $real_estate_data, \
                 credit_data = $credit_data, \
                 assigned_consultant_id = $assigned_consultant_id, \
                 assigned_intermediary_id = $assigned_intermediary_id, \
                 age_under_35 = $age_under_35, \
                 priority = $priority, \
                 notes = $notes, \
                 tags = $tags, \
                 pre_approval_date = $pre_approval_date, \
                 updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("client_name", case.client_name.clone()))
            .bind(("client_email", case.client_email.clone()))
            .bind(("client_phone", case.client_phone.clone()))
            .bind(("process_type", case.process_type.as_str().to_string()))
            .bind(("status", case.status.clone()))
            .bind((
                "personal_data",
                encode_bag("personal_data", &case.personal_data)?,
            ))
            .bind((
                "second_holder_data",
                encode_bag("second_holder_data", &case.second_holder_data)?,
            ))
            .bind((
                "financial_data",
                encode_bag("financial_data", &case.financial_data)?,
            ))
            .bind((
                "real_estate_data",
                encode_bag("real_estate_data", &case.real_estate_data)?,
            ))
            .bind(("credit_data", encode_bag("credit_data", &case.credit_data)?))
            .bind((
                "assigned_consultant_id",
                case.assigned_consultant_id.map(|v| v.to_string()),
            ))
            .bind((
                "assigned_intermediary_id",
                case.assigned_intermediary_id.map(|v| v.to_string()),
            ))
            .bind(("age_under_35", case.age_under_35))
            .bind(("priority", case.priority))
            .bind(("notes", case.notes.clone()))
            .bind(("tags", case.tags.clone()))
            .bind(("pre_approval_date", case.pre_approval_date))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Decode(e.to_string()))?;

        let rows: Vec<CaseRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "processo".into(),
            id: id_str,
        })?;

        Ok(row.into_case(case.id)?)
    }

    async fn list(
        &self,
        scope: &CaseScope,
        filter: &CaseFilter,
        pagination: Pagination,
    ) -> CredimoResult<PaginatedResult<Case>> {
        let mut cases = self.fetch_filtered(scope, filter).await?;

        // Free-text search over the denormalized client snapshot is
        // applied in-process, so pagination happens after it.
        if let Some(search) = &filter.search {
            let needle = search.to_lowercase();
            cases.retain(|c| {
                c.client_name.to_lowercase().contains(&needle)
                    || c.client_email.to_lowercase().contains(&needle)
            });
        }

        let total = cases.len() as u64;
        let items = cases
            .into_iter()
            .skip(pagination.offset as usize)
            .take(pagination.limit as usize)
            .collect();

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn list_ids(&self, scope: &CaseScope) -> CredimoResult<Vec<Uuid>> {
        let scope_bind = scope_clause(scope);
        let query = match &scope_bind {
            Some((clause, _)) => {
                format!("SELECT meta::id(id) AS record_id FROM process WHERE {clause}")
            }
            None => "SELECT meta::id(id) AS record_id FROM process".to_string(),
        };

        let mut builder = self.db.query(&query);
        if let Some((_, id)) = scope_bind {
            builder = builder.bind(("scope_id", id));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<IdRow> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| parse_uuid("process", &row.record_id))
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn count(&self, scope: &CaseScope) -> CredimoResult<u64> {
        let scope_bind = scope_clause(scope);
        let query = match &scope_bind {
            Some((clause, _)) => {
                format!("SELECT count() AS total FROM process WHERE {clause} GROUP ALL")
            }
            None => "SELECT count() AS total FROM process GROUP ALL".to_string(),
        };

        let mut builder = self.db.query(&query);
        if let Some((_, id)) = scope_bind {
            builder = builder.bind(("scope_id", id));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn count_by_status(&self, scope: &CaseScope, status: &str) -> CredimoResult<u64> {
        let scope_bind = scope_clause(scope);
        let query = match &scope_bind {
            Some((clause, _)) => format!(
                "SELECT count() AS total FROM process \
                 WHERE status = $status AND {clause} GROUP ALL"
            ),
            None => {
                "SELECT count() AS total FROM process WHERE status = $status GROUP ALL".to_string()
            }
        };

        let mut builder = self
            .db
            .query(&query)
            .bind(("status", status.to_string()));
        if let Some((_, id)) = scope_bind {
            builder = builder.bind(("scope_id", id));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn count_referencing_status(&self, status: &str) -> CredimoResult<u64> {
        let mut result = self
            .db
            .query("SELECT count() AS total FROM process WHERE status = $status GROUP ALL")
            .bind(("status", status.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}
