//! Authorization policy: the single source for role capabilities and
//! row-level visibility.
//!
//! Handlers never branch on roles directly; they ask the capability
//! table and derive a [`CaseScope`] from the principal. The scope is
//! applied both as a query filter and as a per-row predicate.

use uuid::Uuid;

use crate::models::case::Case;
use crate::models::user::Role;

/// Authenticated caller identity, produced by token validation.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub impersonated_by: Option<Impersonator>,
}

/// Originating administrator of an impersonated session.
#[derive(Debug, Clone)]
pub struct Impersonator {
    pub admin_id: Uuid,
    pub admin_name: String,
}

impl Principal {
    /// Row filter derived from the role, never hard-coded at call
    /// sites.
    pub fn case_scope(&self) -> CaseScope {
        self.role.case_scope(self.user_id)
    }
}

/// Which case rows a caller may observe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseScope {
    All,
    /// `client_id == self`.
    Client(Uuid),
    /// `assigned_consultant_id == self`.
    Consultant(Uuid),
    /// `assigned_intermediary_id == self`.
    Intermediary(Uuid),
    /// Either assignment field matches.
    Assigned(Uuid),
}

/// Gate on writing `credit_data` leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditAccess {
    Never,
    /// Allowed only once the case stage order has reached the
    /// pre-approval stage order.
    AfterPreApproval,
    Always,
}

impl Role {
    pub fn is_staff(self) -> bool {
        !matches!(self, Role::Client)
    }

    pub fn case_scope(self, user_id: Uuid) -> CaseScope {
        match self {
            Role::Client => CaseScope::Client(user_id),
            Role::Consultant => CaseScope::Consultant(user_id),
            Role::Intermediary => CaseScope::Intermediary(user_id),
            Role::ConsultantIntermediary | Role::Director => CaseScope::Assigned(user_id),
            Role::Administrative | Role::Ceo | Role::Admin => CaseScope::All,
        }
    }

    pub fn can_change_status(self) -> bool {
        self.is_staff()
    }

    pub fn credit_access(self) -> CreditAccess {
        match self {
            Role::Client => CreditAccess::Never,
            Role::Consultant | Role::Intermediary | Role::ConsultantIntermediary => {
                CreditAccess::AfterPreApproval
            }
            Role::Director | Role::Administrative | Role::Ceo | Role::Admin => CreditAccess::Always,
        }
    }

    pub fn can_assign(self) -> bool {
        self.is_staff()
    }

    pub fn can_manage_users(self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn can_view_users(self) -> bool {
        matches!(self, Role::Admin | Role::Ceo)
    }

    pub fn can_manage_stages(self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn can_impersonate(self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Admin and CEO also see the global feed of new-case
    /// notifications, so intake is never lost before assignment.
    pub fn sees_new_case_feed(self) -> bool {
        matches!(self, Role::Admin | Role::Ceo)
    }

    /// Whether user counts appear in the stats endpoint.
    pub fn sees_user_counts(self) -> bool {
        matches!(self, Role::Admin | Role::Ceo)
    }
}

/// Per-row predicate matching the query-side filter exactly.
pub fn case_visible(scope: &CaseScope, case: &Case) -> bool {
    match scope {
        CaseScope::All => true,
        CaseScope::Client(id) => case.client_id == *id,
        CaseScope::Consultant(id) => case.assigned_consultant_id == Some(*id),
        CaseScope::Intermediary(id) => case.assigned_intermediary_id == Some(*id),
        CaseScope::Assigned(id) => {
            case.assigned_consultant_id == Some(*id) || case.assigned_intermediary_id == Some(*id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::case::{
        CreditData, FinancialData, PersonalData, ProcessType, RealEstateData, SecondHolderData,
    };
    use chrono::Utc;

    fn case_with(
        client: Uuid,
        consultant: Option<Uuid>,
        intermediary: Option<Uuid>,
    ) -> Case {
        Case {
            id: Uuid::new_v4(),
            client_id: client,
            client_name: "c".into(),
            client_email: "c@x.pt".into(),
            client_phone: None,
            process_type: ProcessType::Credit,
            status: "em_espera".into(),
            personal_data: PersonalData::default(),
            second_holder_data: SecondHolderData::default(),
            financial_data: FinancialData::default(),
            real_estate_data: RealEstateData::default(),
            credit_data: CreditData::default(),
            assigned_consultant_id: consultant,
            assigned_intermediary_id: intermediary,
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
    fn credit_access_matrix() {
        assert_eq!(Role::Client.credit_access(), CreditAccess::Never);
        assert_eq!(
            Role::Consultant.credit_access(),
            CreditAccess::AfterPreApproval
        );
        assert_eq!(
            Role::Intermediary.credit_access(),
            CreditAccess::AfterPreApproval
        );
        assert_eq!(
            Role::ConsultantIntermediary.credit_access(),
            CreditAccess::AfterPreApproval
        );
        assert_eq!(Role::Director.credit_access(), CreditAccess::Always);
        assert_eq!(Role::Admin.credit_access(), CreditAccess::Always);
    }

    #[test]
    fn admin_capabilities() {
        assert!(Role::Admin.can_manage_users());
        assert!(Role::Admin.can_manage_stages());
        assert!(Role::Admin.can_impersonate());
        assert!(!Role::Ceo.can_manage_users());
        assert!(Role::Ceo.can_view_users());
        assert!(!Role::Director.can_manage_stages());
    }

    #[test]
    fn clients_cannot_change_status() {
        assert!(!Role::Client.can_change_status());
        assert!(Role::Consultant.can_change_status());
        assert!(Role::Administrative.can_change_status());
    }

    /// Deterministic fuzz over assignments: each scope sees exactly
    /// the rows its predicate selects, nothing leaks.
    #[test]
    fn scopes_never_leak_rows() {
        let users: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let mut universe = Vec::new();
        for client in &users {
            for consultant in [None, Some(users[0]), Some(users[1])] {
                for intermediary in [None, Some(users[1]), Some(users[2])] {
                    universe.push(case_with(*client, consultant, intermediary));
                }
            }
        }

        for uid in &users {
            for role in [
                Role::Client,
                Role::Consultant,
                Role::Intermediary,
                Role::ConsultantIntermediary,
                Role::Director,
                Role::Administrative,
                Role::Ceo,
                Role::Admin,
            ] {
                let scope = role.case_scope(*uid);
                for case in &universe {
                    let visible = case_visible(&scope, case);
                    let expected = match role {
                        Role::Client => case.client_id == *uid,
                        Role::Consultant => case.assigned_consultant_id == Some(*uid),
                        Role::Intermediary => case.assigned_intermediary_id == Some(*uid),
                        Role::ConsultantIntermediary | Role::Director => {
                            case.assigned_consultant_id == Some(*uid)
                                || case.assigned_intermediary_id == Some(*uid)
                        }
                        Role::Administrative | Role::Ceo | Role::Admin => true,
                    };
                    assert_eq!(visible, expected);
                }
            }
        }
    }
}
