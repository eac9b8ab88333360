//! Post-commit side effects: inbox notifications and outgoing mail.
//!
//! Dispatch happens on a spawned task after the triggering write has
//! committed. Failures are logged and never surfaced to the caller —
//! a lost notification must not fail the request that caused it.

use credimo_core::models::case::Case;
use credimo_core::models::deadline::Deadline;
use credimo_core::models::notification::{CreateNotification, NotificationType};
use credimo_core::models::task::Task;
use credimo_core::models::user::Role;
use credimo_core::repository::{NotificationRepository, UserRepository};
use tracing::{info, warn};
use uuid::Uuid;

use crate::state::AppState;

/// Log an outgoing email. Without an SMTP relay configured the send
/// is simulated; either way the message body is not persisted.
fn send_mail(state: &AppState, to: &str, subject: &str) {
    match &state.config.smtp {
        Some(smtp) => info!(to, subject, relay = %smtp.host, "Sending email"),
        None => info!(to, subject, "SMTP not configured, simulating email"),
    }
}

/// New case arrived through the public form or staff creation: record
/// a `new_case` notification for every administrator (the CEO reads
/// the same feed) and mail the back-office.
pub fn case_created(state: &AppState, case: &Case) {
    let state = state.clone();
    let case_id = case.id;
    let client_name = case.client_name.clone();

    tokio::spawn(async move {
        let admins = match state.users.list_by_role(Role::Admin).await {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, "Failed to resolve new-case recipients");
                return;
            }
        };

        for admin in admins {
            let result = state
                .notifications
                .create(CreateNotification {
                    user_id: admin.id,
                    case_id: Some(case_id),
                    kind: NotificationType::NewCase,
                    message: format!("Novo processo recebido: {client_name}"),
                })
                .await;
            if let Err(e) = result {
                warn!(error = %e, %case_id, "Failed to record new-case notification");
            }
            send_mail(&state, &admin.email, "Novo processo recebido");
        }
    });
}

/// Case assignment changed: notify each newly assigned staff member.
pub fn case_assigned(state: &AppState, case: &Case, newly_assigned: Vec<Uuid>) {
    let state = state.clone();
    let case_id = case.id;
    let client_name = case.client_name.clone();

    tokio::spawn(async move {
        for user_id in newly_assigned {
            let result = state
                .notifications
                .create(CreateNotification {
                    user_id,
                    case_id: Some(case_id),
                    kind: NotificationType::CaseAssigned,
                    message: format!("Processo de {client_name} atribuído a si"),
                })
                .await;
            match result {
                Ok(_) => {
                    if let Ok(user) = state.users.get_by_id(user_id).await {
                        send_mail(&state, &user.email, "Processo atribuído");
                    }
                }
                Err(e) => {
                    warn!(error = %e, %case_id, "Failed to record assignment notification")
                }
            }
        }
    });
}

/// Deadline created or reassigned: notify its assignees.
pub fn deadline_assigned(state: &AppState, deadline: &Deadline) {
    let recipients: Vec<Uuid> = [
        deadline.assigned_consultant_id,
        deadline.assigned_intermediary_id,
    ]
    .into_iter()
    .flatten()
    .filter(|id| *id != deadline.created_by)
    .collect();

    let state = state.clone();
    let case_id = deadline.case_id;
    let title = deadline.title.clone();

    tokio::spawn(async move {
        for user_id in recipients {
            let result = state
                .notifications
                .create(CreateNotification {
                    user_id,
                    case_id,
                    kind: NotificationType::DeadlineAssigned,
                    message: format!("Prazo atribuído a si: {title}"),
                })
                .await;
            if let Err(e) = result {
                warn!(error = %e, "Failed to record deadline notification");
            }
        }
    });
}

/// Task created or reassigned: notify the assignee.
pub fn task_assigned(state: &AppState, task: &Task) {
    let Some(assignee) = task.assigned_to else {
        return;
    };
    if assignee == task.created_by {
        return;
    }

    let state = state.clone();
    let case_id = task.case_id;
    let title = task.title.clone();

    tokio::spawn(async move {
        let result = state
            .notifications
            .create(CreateNotification {
                user_id: assignee,
                case_id,
                kind: NotificationType::TaskAssigned,
                message: format!("Tarefa atribuída a si: {title}"),
            })
            .await;
        if let Err(e) = result {
            warn!(error = %e, "Failed to record task notification");
        }
    });
}
