//! SurrealDB implementation of [`DocumentExpiryRepository`].

use chrono::{DateTime, NaiveDate, Utc};
use credimo_core::error::CredimoResult;
use credimo_core::models::document::{
    CreateDocumentExpiry, DocumentExpiry, DocumentType, UpdateDocumentExpiry,
};
use credimo_core::repository::DocumentExpiryRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::{date_to_string, parse_date, parse_uuid};

#[derive(Debug, SurrealValue)]
struct DocumentRow {
    case_id: String,
    document_type: String,
    document_name: String,
    expiry_date: String,
    notes: Option<String>,
    created_by: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct DocumentRowWithId {
    record_id: String,
    case_id: String,
    document_type: String,
    document_name: String,
    expiry_date: String,
    notes: Option<String>,
    created_by: String,
    created_at: DateTime<Utc>,
}

fn parse_document_type(s: &str) -> Result<DocumentType, DbError> {
    match s {
        "cc" => Ok(DocumentType::Cc),
        "passaporte" => Ok(DocumentType::Passaporte),
        "irs" => Ok(DocumentType::Irs),
        "recibo_vencimento" => Ok(DocumentType::ReciboVencimento),
        "extrato_bancario" => Ok(DocumentType::ExtratoBancario),
        "contrato_trabalho" => Ok(DocumentType::ContratoTrabalho),
        "caderneta_predial" => Ok(DocumentType::CadernetaPredial),
        "outro" => Ok(DocumentType::Outro),
        other => Err(DbError::Decode(format!("unknown document type: {other}"))),
    }
}

impl DocumentRow {
    fn into_document(self, id: Uuid) -> Result<DocumentExpiry, DbError> {
        Ok(DocumentExpiry {
            id,
            case_id: parse_uuid("process", &self.case_id)?,
            document_type: parse_document_type(&self.document_type)?,
            document_name: self.document_name,
            expiry_date: parse_date(&self.expiry_date)?,
            notes: self.notes,
            created_by: parse_uuid("user", &self.created_by)?,
            created_at: self.created_at,
        })
    }
}

impl DocumentRowWithId {
    fn try_into_document(self) -> Result<DocumentExpiry, DbError> {
        let id = parse_uuid("document_expiry", &self.record_id)?;
        let row = DocumentRow {
            case_id: self.case_id,
            document_type: self.document_type,
            document_name: self.document_name,
            expiry_date: self.expiry_date,
            notes: self.notes,
            created_by: self.created_by,
            created_at: self.created_at,
        };
        row.into_document(id)
    }
}

/// SurrealDB implementation of the document-expiry tracker.
#[derive(Clone)]
pub struct SurrealDocumentExpiryRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealDocumentExpiryRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> DocumentExpiryRepository for SurrealDocumentExpiryRepository<C> {
    async fn create(&self, input: CreateDocumentExpiry) -> CredimoResult<DocumentExpiry> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('document_expiry', $id) SET \
                 case_id = $case_id, document_type = $document_type, \
                 document_name = $document_name, \
                 expiry_date = $expiry_date, notes = $notes, \
                 created_by = $created_by",
            )
            .bind(("id", id_str.clone()))
            .bind(("case_id", input.case_id.to_string()))
            .bind(("document_type", input.document_type.as_str().to_string()))
            .bind(("document_name", input.document_name))
            .bind(("expiry_date", date_to_string(input.expiry_date)))
            .bind(("notes", input.notes))
            .bind(("created_by", input.created_by.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Decode(e.to_string()))?;

        let rows: Vec<DocumentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "documento".into(),
            id: id_str,
        })?;

        Ok(row.into_document(id)?)
    }

    async fn get(&self, id: Uuid) -> CredimoResult<DocumentExpiry> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('document_expiry', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DocumentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "documento".into(),
            id: id_str,
        })?;

        Ok(row.into_document(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateDocumentExpiry) -> CredimoResult<DocumentExpiry> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.document_type.is_some() {
            sets.push("document_type = $document_type");
        }
        if input.document_name.is_some() {
            sets.push("document_name = $document_name");
        }
        if input.expiry_date.is_some() {
            sets.push("expiry_date = $expiry_date");
        }
        if input.notes.is_some() {
            sets.push("notes = $notes");
        }

        if sets.is_empty() {
            return self.get(id).await;
        }

        let query = format!(
            "UPDATE type::record('document_expiry', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(document_type) = input.document_type {
            builder = builder.bind(("document_type", document_type.as_str().to_string()));
        }
        if let Some(document_name) = input.document_name {
            builder = builder.bind(("document_name", document_name));
        }
        if let Some(expiry_date) = input.expiry_date {
            builder = builder.bind(("expiry_date", date_to_string(expiry_date)));
        }
        if let Some(notes) = input.notes {
            builder = builder.bind(("notes", notes));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Decode(e.to_string()))?;

        let rows: Vec<DocumentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "documento".into(),
            id: id_str,
        })?;

        Ok(row.into_document(id)?)
    }

    async fn delete(&self, id: Uuid) -> CredimoResult<()> {
        self.db
            .query("DELETE type::record('document_expiry', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list_by_case(&self, case_id: Uuid) -> CredimoResult<Vec<DocumentExpiry>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM document_expiry \
                 WHERE case_id = $case_id \
                 ORDER BY expiry_date ASC",
            )
            .bind(("case_id", case_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DocumentRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| row.try_into_document())
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn upcoming(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        case_ids: Option<Vec<Uuid>>,
    ) -> CredimoResult<Vec<DocumentExpiry>> {
        let query = match &case_ids {
            Some(_) => {
                "SELECT meta::id(id) AS record_id, * FROM document_expiry \
                 WHERE expiry_date >= $from AND expiry_date <= $to \
                 AND case_id IN $case_ids \
                 ORDER BY expiry_date ASC"
            }
            None => {
                "SELECT meta::id(id) AS record_id, * FROM document_expiry \
                 WHERE expiry_date >= $from AND expiry_date <= $to \
                 ORDER BY expiry_date ASC"
            }
        };

        let mut builder = self
            .db
            .query(query)
            .bind(("from", date_to_string(from)))
            .bind(("to", date_to_string(to)));
        if let Some(ids) = case_ids {
            let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
            builder = builder.bind(("case_ids", ids));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<DocumentRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| row.try_into_document())
            .collect::<Result<Vec<_>, DbError>>()?)
    }
}
