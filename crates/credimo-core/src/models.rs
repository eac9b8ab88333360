//! Domain models for Credimo.
//!
//! One module per aggregate. All timestamps are UTC; calendar dates
//! (deadline due dates, document expiry dates) are `NaiveDate`.

pub mod activity;
pub mod case;
pub mod deadline;
pub mod document;
pub mod history;
pub mod notification;
pub mod stage;
pub mod task;
pub mod user;
