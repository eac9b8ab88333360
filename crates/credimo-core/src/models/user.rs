//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CredimoError;

/// Staff and client roles. Canonical vocabulary uses *intermediário*
/// (not the legacy *mediador*) for the bank-facing role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Client,
    Consultant,
    Intermediary,
    ConsultantIntermediary,
    Director,
    Administrative,
    Ceo,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Consultant => "consultant",
            Role::Intermediary => "intermediary",
            Role::ConsultantIntermediary => "consultant_intermediary",
            Role::Director => "director",
            Role::Administrative => "administrative",
            Role::Ceo => "ceo",
            Role::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = CredimoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Role::Client),
            "consultant" => Ok(Role::Consultant),
            "intermediary" => Ok(Role::Intermediary),
            "consultant_intermediary" => Ok(Role::ConsultantIntermediary),
            "director" => Ok(Role::Director),
            "administrative" => Ok(Role::Administrative),
            "ceo" => Ok(Role::Ceo),
            "admin" => Ok(Role::Admin),
            other => Err(CredimoError::validation(format!(
                "perfil desconhecido: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Unique, stored lowercase.
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: Role,
    /// Absent only for clients created implicitly via the public form;
    /// such accounts cannot authenticate until a hash is set.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub active: bool,
    /// Label of the client folder in cloud storage, when provisioned.
    pub cloud_folder: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: Role,
    /// Raw password (hashed with Argon2id before storage). `None` for
    /// public-form clients.
    pub password: Option<String>,
    pub cloud_folder: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    #[serde(default, with = "crate::serde_util::double_option")]
    pub phone: Option<Option<String>>,
    pub role: Option<Role>,
    pub active: Option<bool>,
    /// Raw password; hashed before storage.
    pub password: Option<String>,
    #[serde(default, with = "crate::serde_util::double_option")]
    pub cloud_folder: Option<Option<String>>,
}
