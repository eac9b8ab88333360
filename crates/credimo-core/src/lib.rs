//! Credimo Core — domain models, repository traits, authorization
//! policy and the alert engine.
//!
//! These are the shared types of the case-management service. Nothing
//! here touches the database or the network; persistence lives in
//! `credimo-db` and the HTTP surface in `credimo-api`.

pub mod alerts;
pub mod error;
pub mod fiscal;
pub mod models;
pub mod policy;
pub mod repository;
pub mod serde_util;
