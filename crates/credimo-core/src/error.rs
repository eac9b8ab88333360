//! Error types for the Credimo system.
//!
//! Error messages are user-facing and therefore written in pt-PT; the
//! API layer forwards them verbatim in the `detail` field.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredimoError {
    #[error("Registo não encontrado: {entity} com id {id}")]
    NotFound { entity: String, id: String },

    #[error("Já existe: {entity}")]
    AlreadyExists { entity: String },

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Falha de autenticação: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Acesso negado: {reason}")]
    AuthorizationDenied { reason: String },

    #[error("Erro de validação: {message}")]
    Validation { message: String },

    #[error("Autorização bancária necessária: {message}")]
    BankAuthorizationRequired { message: String },

    #[error("Conflito: {message}")]
    Conflict { message: String },

    #[error("Erro de base de dados: {0}")]
    Database(String),

    #[error("Erro de criptografia: {0}")]
    Crypto(String),

    #[error("Erro interno: {0}")]
    Internal(String),
}

impl CredimoError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        CredimoError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CredimoError::Validation {
            message: message.into(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        CredimoError::AuthorizationDenied {
            reason: reason.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        CredimoError::Conflict {
            message: message.into(),
        }
    }
}

pub type CredimoResult<T> = Result<T, CredimoError>;
