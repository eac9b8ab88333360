//! Case (process) domain model: nested data bags, merge semantics and
//! per-leaf change tracking.
//!
//! The nested bags are closed records of optional typed fields —
//! unknown fields are rejected at the boundary, never silently stored.
//! Merging a patch over the current value records exactly one
//! [`FieldChange`] per changed leaf, which the case store turns into
//! history entries.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessType {
    Credit,
    RealEstate,
    Both,
}

impl ProcessType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessType::Credit => "credit",
            ProcessType::RealEstate => "real_estate",
            ProcessType::Both => "both",
        }
    }
}

/// A single leaf-level change, as recorded in the history log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    /// Dotted path, e.g. `personal_data.nif`.
    pub field: String,
    pub old: Option<String>,
    pub new: Option<String>,
}

/// Merge one optional leaf of a patch over the current value and
/// record the change when the value actually differs.
macro_rules! merge_leaf {
    ($changes:expr, $prefix:expr, $cur:expr, $patch:expr, $name:literal) => {
        if let Some(v) = &$patch {
            let old = $cur.as_ref().map(|x| x.to_string());
            let new = v.to_string();
            if old.as_deref() != Some(new.as_str()) {
                $changes.push(FieldChange {
                    field: format!("{}.{}", $prefix, $name),
                    old,
                    new: Some(new),
                });
                $cur = Some(v.clone());
            }
        }
    };
}

/// Merge one plain (non-nested) optional field of a case patch.
macro_rules! merge_scalar {
    ($changes:expr, $cur:expr, $patch:expr, $name:literal) => {
        if let Some(v) = &$patch {
            let old = $cur.to_string();
            let new = v.to_string();
            if old != new {
                $changes.push(FieldChange {
                    field: $name.into(),
                    old: Some(old),
                    new: Some(new),
                });
                $cur = v.clone();
            }
        }
    };
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PersonalData {
    /// Nine-digit fiscal number, normalized at the boundary.
    pub nif: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub marital_status: Option<String>,
    pub nationality: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub profession: Option<String>,
}

impl PersonalData {
    pub fn merge_from(&mut self, patch: &PersonalData, changes: &mut Vec<FieldChange>) {
        let p = "personal_data";
        merge_leaf!(changes, p, self.nif, patch.nif, "nif");
        merge_leaf!(changes, p, self.birth_date, patch.birth_date, "birth_date");
        merge_leaf!(changes, p, self.marital_status, patch.marital_status, "marital_status");
        merge_leaf!(changes, p, self.nationality, patch.nationality, "nationality");
        merge_leaf!(changes, p, self.address, patch.address, "address");
        merge_leaf!(changes, p, self.postal_code, patch.postal_code, "postal_code");
        merge_leaf!(changes, p, self.city, patch.city, "city");
        merge_leaf!(changes, p, self.profession, patch.profession, "profession");
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecondHolderData {
    pub name: Option<String>,
    pub nif: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub profession: Option<String>,
}

impl SecondHolderData {
    pub fn merge_from(&mut self, patch: &SecondHolderData, changes: &mut Vec<FieldChange>) {
        let p = "second_holder_data";
        merge_leaf!(changes, p, self.name, patch.name, "name");
        merge_leaf!(changes, p, self.nif, patch.nif, "nif");
        merge_leaf!(changes, p, self.birth_date, patch.birth_date, "birth_date");
        merge_leaf!(changes, p, self.profession, patch.profession, "profession");
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FinancialData {
    pub monthly_income: Option<f64>,
    pub other_income: Option<f64>,
    pub monthly_expenses: Option<f64>,
    pub existing_loans: Option<f64>,
    pub employer: Option<String>,
    pub employment_type: Option<String>,
}

impl FinancialData {
    pub fn merge_from(&mut self, patch: &FinancialData, changes: &mut Vec<FieldChange>) {
        let p = "financial_data";
        merge_leaf!(changes, p, self.monthly_income, patch.monthly_income, "monthly_income");
        merge_leaf!(changes, p, self.other_income, patch.other_income, "other_income");
        merge_leaf!(changes, p, self.monthly_expenses, patch.monthly_expenses, "monthly_expenses");
        merge_leaf!(changes, p, self.existing_loans, patch.existing_loans, "existing_loans");
        merge_leaf!(changes, p, self.employer, patch.employer, "employer");
        merge_leaf!(changes, p, self.employment_type, patch.employment_type, "employment_type");
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RealEstateData {
    pub property_type: Option<String>,
    pub property_value: Option<f64>,
    pub location: Option<String>,
    pub area_m2: Option<f64>,
}

impl RealEstateData {
    pub fn merge_from(&mut self, patch: &RealEstateData, changes: &mut Vec<FieldChange>) {
        let p = "real_estate_data";
        merge_leaf!(changes, p, self.property_type, patch.property_type, "property_type");
        merge_leaf!(changes, p, self.property_value, patch.property_value, "property_value");
        merge_leaf!(changes, p, self.location, patch.location, "location");
        merge_leaf!(changes, p, self.area_m2, patch.area_m2, "area_m2");
    }
}

/// Bank credit terms. Editable only once the case has reached the
/// pre-approval stage (roles Director and above bypass the gate).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CreditData {
    pub requested_amount: Option<f64>,
    pub approved_amount: Option<f64>,
    pub interest_rate: Option<f64>,
    pub term_years: Option<u32>,
    pub bank_name: Option<String>,
}

impl CreditData {
    pub fn merge_from(&mut self, patch: &CreditData, changes: &mut Vec<FieldChange>) {
        let p = "credit_data";
        merge_leaf!(changes, p, self.requested_amount, patch.requested_amount, "requested_amount");
        merge_leaf!(changes, p, self.approved_amount, patch.approved_amount, "approved_amount");
        merge_leaf!(changes, p, self.interest_rate, patch.interest_rate, "interest_rate");
        merge_leaf!(changes, p, self.term_years, patch.term_years, "term_years");
        merge_leaf!(changes, p, self.bank_name, patch.bank_name, "bank_name");
    }

    /// True when the patch carries at least one populated leaf.
    pub fn has_values(&self) -> bool {
        self.requested_amount.is_some()
            || self.approved_amount.is_some()
            || self.interest_rate.is_some()
            || self.term_years.is_some()
            || self.bank_name.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    pub id: Uuid,
    pub client_id: Uuid,
    /// Denormalized client snapshot, kept for listings and calendar
    /// annotations.
    pub client_name: String,
    pub client_email: String,
    pub client_phone: Option<String>,
    pub process_type: ProcessType,
    /// Always the `name` of a live workflow stage.
    pub status: String,
    pub personal_data: PersonalData,
    pub second_holder_data: SecondHolderData,
    pub financial_data: FinancialData,
    pub real_estate_data: RealEstateData,
    pub credit_data: CreditData,
    pub assigned_consultant_id: Option<Uuid>,
    pub assigned_intermediary_id: Option<Uuid>,
    /// Derived at intake from the birth date; drives the state-subsidy
    /// eligibility alert.
    pub age_under_35: bool,
    pub priority: bool,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    /// Stamped on the first transition into the pre-approval stage;
    /// starts the 90-day bank countdown.
    pub pre_approval_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCase {
    pub client_id: Uuid,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: Option<String>,
    pub process_type: ProcessType,
    pub status: String,
    pub personal_data: PersonalData,
    pub second_holder_data: SecondHolderData,
    pub financial_data: FinancialData,
    pub real_estate_data: RealEstateData,
    pub credit_data: CreditData,
    pub assigned_consultant_id: Option<Uuid>,
    pub assigned_intermediary_id: Option<Uuid>,
    pub age_under_35: bool,
    pub priority: bool,
    pub notes: Option<String>,
    pub tags: Vec<String>,
}

/// Partial update. Each nested bag merges over the current value;
/// `status` is handled separately by the transition operation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaseUpdate {
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
    pub process_type: Option<ProcessType>,
    pub status: Option<String>,
    pub personal_data: Option<PersonalData>,
    pub second_holder_data: Option<SecondHolderData>,
    pub financial_data: Option<FinancialData>,
    pub real_estate_data: Option<RealEstateData>,
    pub credit_data: Option<CreditData>,
    pub priority: Option<bool>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl CaseUpdate {
    /// Whether the update tries to write any credit-data leaf.
    pub fn touches_credit_data(&self) -> bool {
        self.credit_data.as_ref().is_some_and(CreditData::has_values)
    }
}

impl Case {
    /// Merge an update over the current value, returning one change
    /// record per modified leaf. `status` is intentionally not applied
    /// here — transitions validate against the stage registry first.
    pub fn apply(&mut self, update: &CaseUpdate) -> Vec<FieldChange> {
        let mut changes = Vec::new();

        merge_scalar!(changes, self.client_name, update.client_name, "client_name");
        if let Some(phone) = &update.client_phone {
            let old = self.client_phone.clone();
            if old.as_deref() != Some(phone.as_str()) {
                changes.push(FieldChange {
                    field: "client_phone".into(),
                    old,
                    new: Some(phone.clone()),
                });
                self.client_phone = Some(phone.clone());
            }
        }
        if let Some(pt) = update.process_type {
            if pt != self.process_type {
                changes.push(FieldChange {
                    field: "process_type".into(),
                    old: Some(self.process_type.as_str().into()),
                    new: Some(pt.as_str().into()),
                });
                self.process_type = pt;
            }
        }
        if let Some(bag) = &update.personal_data {
            self.personal_data.merge_from(bag, &mut changes);
        }
        if let Some(bag) = &update.second_holder_data {
            self.second_holder_data.merge_from(bag, &mut changes);
        }
        if let Some(bag) = &update.financial_data {
            self.financial_data.merge_from(bag, &mut changes);
        }
        if let Some(bag) = &update.real_estate_data {
            self.real_estate_data.merge_from(bag, &mut changes);
        }
        if let Some(bag) = &update.credit_data {
            self.credit_data.merge_from(bag, &mut changes);
        }
        if let Some(priority) = update.priority {
            if priority != self.priority {
                changes.push(FieldChange {
                    field: "priority".into(),
                    old: Some(self.priority.to_string()),
                    new: Some(priority.to_string()),
                });
                self.priority = priority;
            }
        }
        if let Some(notes) = &update.notes {
            if self.notes.as_deref() != Some(notes.as_str()) {
                changes.push(FieldChange {
                    field: "notes".into(),
                    old: self.notes.clone(),
                    new: Some(notes.clone()),
                });
                self.notes = Some(notes.clone());
            }
        }
        if let Some(tags) = &update.tags {
            if *tags != self.tags {
                changes.push(FieldChange {
                    field: "tags".into(),
                    old: Some(self.tags.join(",")),
                    new: Some(tags.join(",")),
                });
                self.tags = tags.clone();
            }
        }

        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_case() -> Case {
        Case {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            client_name: "Maria Santos".into(),
            client_email: "maria@exemplo.pt".into(),
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

    #[test]
    fn merge_records_one_change_per_leaf() {
        let mut case = sample_case();
        let update = CaseUpdate {
            personal_data: Some(PersonalData {
                nif: Some("123456789".into()),
                city: Some("Lisboa".into()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let changes = case.apply(&update);
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().any(|c| c.field == "personal_data.nif"
            && c.old.is_none()
            && c.new.as_deref() == Some("123456789")));
        assert!(changes.iter().any(|c| c.field == "personal_data.city"));
    }

    #[test]
    fn merge_keeps_fields_the_patch_omits() {
        let mut case = sample_case();
        case.personal_data.city = Some("Porto".into());

        let update = CaseUpdate {
            personal_data: Some(PersonalData {
                nif: Some("987654321".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        case.apply(&update);

        assert_eq!(case.personal_data.city.as_deref(), Some("Porto"));
        assert_eq!(case.personal_data.nif.as_deref(), Some("987654321"));
    }

    #[test]
    fn unchanged_value_emits_no_change() {
        let mut case = sample_case();
        case.personal_data.nif = Some("123456789".into());

        let update = CaseUpdate {
            personal_data: Some(PersonalData {
                nif: Some("123456789".into()),
                ..Default::default()
            }),
            priority: Some(false),
            ..Default::default()
        };

        assert!(case.apply(&update).is_empty());
    }

    #[test]
    fn touches_credit_data_requires_a_populated_leaf() {
        let empty = CaseUpdate {
            credit_data: Some(CreditData::default()),
            ..Default::default()
        };
        assert!(!empty.touches_credit_data());

        let populated = CaseUpdate {
            credit_data: Some(CreditData {
                requested_amount: Some(200_000.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(populated.touches_credit_data());
    }

    #[test]
    fn unknown_bag_fields_are_rejected() {
        let raw = r#"{"personal_data": {"nif": "123456789", "favourite_color": "blue"}}"#;
        assert!(serde_json::from_str::<CaseUpdate>(raw).is_err());
    }
}
