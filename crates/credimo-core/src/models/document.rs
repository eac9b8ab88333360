//! Document-expiry domain model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closed vocabulary of tracked document kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Cartão de cidadão.
    Cc,
    Passaporte,
    Irs,
    ReciboVencimento,
    ExtratoBancario,
    ContratoTrabalho,
    CadernetaPredial,
    Outro,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Cc => "cc",
            DocumentType::Passaporte => "passaporte",
            DocumentType::Irs => "irs",
            DocumentType::ReciboVencimento => "recibo_vencimento",
            DocumentType::ExtratoBancario => "extrato_bancario",
            DocumentType::ContratoTrabalho => "contrato_trabalho",
            DocumentType::CadernetaPredial => "caderneta_predial",
            DocumentType::Outro => "outro",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentExpiry {
    pub id: Uuid,
    pub case_id: Uuid,
    pub document_type: DocumentType,
    pub document_name: String,
    pub expiry_date: NaiveDate,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocumentExpiry {
    pub case_id: Uuid,
    pub document_type: DocumentType,
    pub document_name: String,
    pub expiry_date: NaiveDate,
    pub notes: Option<String>,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDocumentExpiry {
    pub document_type: Option<DocumentType>,
    pub document_name: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub notes: Option<Option<String>>,
}
