//! Alert engine — pure derivation from (case, documents, now).
//!
//! Stateless and side-effect free: identical inputs produce identical
//! outputs. This module is the authoritative source for every per-case
//! alert surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::case::Case;
use crate::models::document::DocumentExpiry;

/// Days the bank pre-approval remains valid.
pub const PRE_APPROVAL_WINDOW_DAYS: i64 = 90;

/// Document-expiry alerts fire once the expiry date falls within this
/// many days.
pub const DOCUMENT_WARNING_DAYS: i64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertPriority {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    AgeUnder35,
    PreApprovalCountdown,
    DocumentExpiry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub priority: AlertPriority,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_remaining: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_name: Option<String>,
}

/// Alert summary for one case, as served by the alerts endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseAlerts {
    pub process_id: Uuid,
    pub client_name: String,
    pub alerts: Vec<Alert>,
    pub total: usize,
    pub has_high: bool,
    pub has_critical: bool,
}

/// Evaluate all alerts for a case at instant `now`.
pub fn evaluate(case: &Case, documents: &[DocumentExpiry], now: DateTime<Utc>) -> CaseAlerts {
    let mut alerts = Vec::new();

    if case.age_under_35 {
        alerts.push(Alert {
            alert_type: AlertType::AgeUnder35,
            priority: AlertPriority::Info,
            message: "Cliente com menos de 35 anos: elegível para apoio estatal à habitação."
                .into(),
            days_remaining: None,
            document_name: None,
        });
    }

    if let Some(pre_approval) = case.pre_approval_date {
        let elapsed_secs = (now - pre_approval).num_seconds();
        let remaining_secs = PRE_APPROVAL_WINDOW_DAYS * 86_400 - elapsed_secs;
        if remaining_secs > 0 {
            let days = remaining_secs / 86_400;
            let priority = match days {
                d if d > 30 => AlertPriority::Low,
                d if d >= 15 => AlertPriority::Medium,
                d if d >= 5 => AlertPriority::High,
                _ => AlertPriority::Critical,
            };
            alerts.push(Alert {
                alert_type: AlertType::PreApprovalCountdown,
                priority,
                message: format!("Pré-aprovação bancária expira em {days} dias."),
                days_remaining: Some(days),
                document_name: None,
            });
        }
    }

    let today = now.date_naive();
    for doc in documents {
        let days = (doc.expiry_date - today).num_days();
        if days <= DOCUMENT_WARNING_DAYS {
            let (priority, message) = if days > 0 {
                (
                    AlertPriority::High,
                    format!("Documento '{}' expira em {days} dias.", doc.document_name),
                )
            } else if days == 0 {
                (
                    AlertPriority::Critical,
                    format!("Documento '{}' expira hoje.", doc.document_name),
                )
            } else {
                (
                    AlertPriority::Critical,
                    format!(
                        "Documento '{}' expirou há {} dias.",
                        doc.document_name,
                        -days
                    ),
                )
            };
            alerts.push(Alert {
                alert_type: AlertType::DocumentExpiry,
                priority,
                message,
                days_remaining: Some(days),
                document_name: Some(doc.document_name.clone()),
            });
        }
    }

    let has_high = alerts.iter().any(|a| a.priority == AlertPriority::High);
    let has_critical = alerts.iter().any(|a| a.priority == AlertPriority::Critical);

    CaseAlerts {
        process_id: case.id,
        client_name: case.client_name.clone(),
        total: alerts.len(),
        has_high,
        has_critical,
        alerts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::case::{
        CreditData, FinancialData, PersonalData, ProcessType, RealEstateData, SecondHolderData,
    };
    use crate::models::document::DocumentType;
    use chrono::Duration;

    fn base_case() -> Case {
        Case {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            client_name: "João Silva".into(),
            client_email: "js@x.pt".into(),
            client_phone: None,
            process_type: ProcessType::Credit,
            status: "em_espera".into(),
            personal_data: PersonalData::default(),
            second_holder_data: SecondHolderData::default(),
            financial_data: FinancialData::default(),
            real_estate_data: RealEstateData::default(),
            credit_data: CreditData::default(),
            assigned_consultant_id: None,
            assigned_intermediary_id: None,
            age_under_35: false,
            priority: false,
            notes: None,
            tags: vec![],
            pre_approval_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn doc(name: &str, expiry: chrono::NaiveDate) -> DocumentExpiry {
        DocumentExpiry {
            id: Uuid::new_v4(),
            case_id: Uuid::new_v4(),
            document_type: DocumentType::Cc,
            document_name: name.into(),
            expiry_date: expiry,
            notes: None,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn age_alert_is_info() {
        let mut case = base_case();
        case.age_under_35 = true;
        let out = evaluate(&case, &[], Utc::now());
        assert_eq!(out.total, 1);
        assert_eq!(out.alerts[0].alert_type, AlertType::AgeUnder35);
        assert_eq!(out.alerts[0].priority, AlertPriority::Info);
        assert!(!out.has_high && !out.has_critical);
    }

    #[test]
    fn countdown_priorities_by_remaining_days() {
        let now = Utc::now();
        let expect = [
            (10, AlertPriority::Low),      // 80 days remaining
            (62, AlertPriority::Medium),   // 28 days remaining
            (80, AlertPriority::High),     // 10 days remaining
            (87, AlertPriority::Critical), // 3 days remaining
        ];
        for (elapsed_days, priority) in expect {
            let mut case = base_case();
            case.pre_approval_date = Some(now - Duration::days(elapsed_days));
            let out = evaluate(&case, &[], now);
            assert_eq!(out.total, 1, "elapsed {elapsed_days}d");
            assert_eq!(out.alerts[0].priority, priority, "elapsed {elapsed_days}d");
        }
    }

    #[test]
    fn countdown_at_89d23h_is_critical() {
        let now = Utc::now();
        let mut case = base_case();
        case.pre_approval_date = Some(now - (Duration::days(89) + Duration::hours(23)));
        let out = evaluate(&case, &[], now);
        assert_eq!(out.total, 1);
        assert_eq!(out.alerts[0].priority, AlertPriority::Critical);
        assert_eq!(out.alerts[0].days_remaining, Some(0));
    }

    #[test]
    fn countdown_absent_after_window() {
        let now = Utc::now();
        let mut case = base_case();
        case.pre_approval_date = Some(now - Duration::days(90));
        assert_eq!(evaluate(&case, &[], now).total, 0);

        case.pre_approval_date = Some(now - Duration::days(120));
        assert_eq!(evaluate(&case, &[], now).total, 0);
    }

    #[test]
    fn document_expiring_today_is_critical() {
        let now = Utc::now();
        let case = base_case();
        let docs = [doc("Cartão de Cidadão", now.date_naive())];
        let out = evaluate(&case, &docs, now);
        assert_eq!(out.total, 1);
        assert_eq!(out.alerts[0].priority, AlertPriority::Critical);
        assert_eq!(out.alerts[0].days_remaining, Some(0));
        assert!(out.has_critical);
    }

    #[test]
    fn document_within_window_is_high() {
        let now = Utc::now();
        let case = base_case();
        let docs = [doc("CC", now.date_naive() + Duration::days(15))];
        let out = evaluate(&case, &docs, now);
        assert_eq!(out.total, 1);
        assert_eq!(out.alerts[0].priority, AlertPriority::High);
        assert!(out.has_high);
    }

    #[test]
    fn document_outside_window_is_silent() {
        let now = Utc::now();
        let case = base_case();
        let docs = [doc("CC", now.date_naive() + Duration::days(16))];
        assert_eq!(evaluate(&case, &docs, now).total, 0);
    }

    #[test]
    fn engine_is_deterministic() {
        let now = Utc::now();
        let mut case = base_case();
        case.age_under_35 = true;
        case.pre_approval_date = Some(now - Duration::days(40));
        let docs = [doc("CC", now.date_naive() + Duration::days(3))];

        let a = evaluate(&case, &docs, now);
        let b = evaluate(&case, &docs, now);
        assert_eq!(a.alerts, b.alerts);
        assert_eq!(a.total, b.total);
        assert_eq!((a.has_high, a.has_critical), (b.has_high, b.has_critical));
    }
}
