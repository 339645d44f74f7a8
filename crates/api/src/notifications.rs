//! Asynchronous side effects of approval transitions.
//!
//! [`ChannelEventSink`] queues events published by the approval service.
//! [`NotificationDispatcher`] drains the queue on a background task, emails
//! the people involved and records leave usage once a leave request is
//! approved. Failures are retried a bounded number of times, then logged and
//! dropped. They never reach the caller that made the decision.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use sea_orm::{DatabaseConnection, DbErr};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use hrflow_core::approval::{ApprovalEvent, ApprovalOutcome, EventSink, RequestKind};
use hrflow_db::repositories::{
    ApprovalStore, EmployeeRepository, LeaveBalanceRepository, LeaveRequestRepository,
};
use hrflow_shared::{EmailError, EmailService};

const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);

/// Event sink backed by an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    tx: mpsc::UnboundedSender<ApprovalEvent>,
}

impl ChannelEventSink {
    /// Creates a sink and the receiver a dispatcher should drain.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ApprovalEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelEventSink {
    fn publish(&self, event: ApprovalEvent) {
        if let Err(e) = self.tx.send(event) {
            warn!(request_id = %e.0.request_id, "Notification dispatcher stopped, dropping approval event");
        }
    }
}

/// Errors raised while handling one event.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Database lookup or write failed.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// Email could not be delivered.
    #[error(transparent)]
    Email(#[from] EmailError),
}

/// Background consumer of approval events.
pub struct NotificationDispatcher {
    employees: EmployeeRepository,
    leaves: LeaveRequestRepository,
    balances: LeaveBalanceRepository,
    email: EmailService,
    max_attempts: u32,
    backoff: Duration,
}

impl NotificationDispatcher {
    /// Creates a dispatcher that tries each delivery up to `max_attempts` times.
    #[must_use]
    pub fn new(db: DatabaseConnection, email: EmailService, max_attempts: u32) -> Self {
        Self {
            employees: EmployeeRepository::new(db.clone()),
            leaves: LeaveRequestRepository::new(db.clone()),
            balances: LeaveBalanceRepository::new(db),
            email,
            max_attempts,
            backoff: DEFAULT_BACKOFF,
        }
    }

    /// Runs the dispatcher on a Tokio task until every sender is dropped.
    pub fn spawn(self, rx: mpsc::UnboundedReceiver<ApprovalEvent>) -> JoinHandle<()> {
        tokio::spawn(self.run(rx))
    }

    async fn run(self, mut rx: mpsc::UnboundedReceiver<ApprovalEvent>) {
        while let Some(event) = rx.recv().await {
            self.handle(&event).await;
        }
        info!("Notification dispatcher stopped");
    }

    async fn handle(&self, event: &ApprovalEvent) {
        for recipient in event.recipients() {
            let result = with_retries(self.max_attempts, self.backoff, || {
                self.notify(recipient, event)
            })
            .await;
            if let Err(e) = result {
                warn!(
                    request_id = %event.request_id,
                    employee_id = recipient,
                    error = %e,
                    "Dropping approval notification"
                );
            }
        }

        if event.kind == RequestKind::Leave
            && matches!(event.outcome, ApprovalOutcome::Approved { .. })
        {
            let result = with_retries(self.max_attempts, self.backoff, || {
                self.record_leave_usage(event.request_id)
            })
            .await;
            if let Err(e) = result {
                warn!(request_id = %event.request_id, error = %e, "Failed to record leave usage");
            }
        }
    }

    async fn notify(&self, recipient: &str, event: &ApprovalEvent) -> Result<(), DispatchError> {
        let Some(employee) = self.employees.find(recipient).await? else {
            debug!(employee_id = recipient, "Recipient no longer exists");
            return Ok(());
        };
        let Some(address) = employee.email else {
            debug!(employee_id = recipient, "Recipient has no email address");
            return Ok(());
        };

        let (subject, body) = compose(event, recipient);
        self.email.send_email(&address, &subject, &body).await?;
        debug!(request_id = %event.request_id, employee_id = recipient, "Notification sent");
        Ok(())
    }

    async fn record_leave_usage(&self, request_id: Uuid) -> Result<(), DispatchError> {
        let Some(request) = self.leaves.load(request_id).await? else {
            return Ok(());
        };
        if self.balances.record_usage(&request, Utc::now()).await? {
            info!(
                %request_id,
                employee_id = %request.applicant_id,
                days = %request.days,
                "Leave usage recorded"
            );
        }
        Ok(())
    }
}

/// Runs `op` until it succeeds or `max_attempts` is exhausted, waiting a
/// linearly growing delay between attempts.
async fn with_retries<T, E, F, Fut>(max_attempts: u32, backoff: Duration, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                debug!(attempt, error = %e, "Delivery failed, retrying");
                tokio::time::sleep(backoff * attempt).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Subject and body of the email `recipient` receives for `event`.
fn compose(event: &ApprovalEvent, recipient: &str) -> (String, String) {
    let kind = kind_label(event.kind);
    let id = event.request_id;

    match &event.outcome {
        ApprovalOutcome::Submitted { next_role, .. } => (
            format!("{kind} awaiting your approval"),
            format!(
                "{} submitted {kind} {id}. It is waiting for your decision as {}.",
                event.applicant_id,
                next_role.as_deref().unwrap_or("approver"),
            ),
        ),
        ApprovalOutcome::Advanced {
            next_approver_id,
            next_role,
            ..
        } if next_approver_id == recipient => (
            format!("{kind} awaiting your approval"),
            format!(
                "{kind} {id} from {} is waiting for your decision as {next_role}.",
                event.applicant_id
            ),
        ),
        ApprovalOutcome::Advanced { next_role, .. } => (
            format!("Your {kind} moved forward"),
            format!("Your {kind} {id} is now pending for {next_role}."),
        ),
        ApprovalOutcome::Approved { .. } => (
            format!("Your {kind} was approved"),
            format!("Your {kind} {id} has been approved."),
        ),
        ApprovalOutcome::Rejected { role, comments, .. } => {
            let body = match comments {
                Some(comments) => {
                    format!("Your {kind} {id} was rejected by {role}.\n\nComments: {comments}")
                }
                None => format!("Your {kind} {id} was rejected by {role}."),
            };
            (format!("Your {kind} was rejected"), body)
        }
    }
}

const fn kind_label(kind: RequestKind) -> &'static str {
    match kind {
        RequestKind::Leave => "leave request",
        RequestKind::Project => "project assignment",
        RequestKind::Task => "task assignment",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn event(outcome: ApprovalOutcome) -> ApprovalEvent {
        ApprovalEvent {
            kind: RequestKind::Leave,
            request_id: Uuid::nil(),
            applicant_id: "EMP0001".into(),
            outcome,
            occurred_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_channel_sink_forwards_events() {
        let (sink, mut rx) = ChannelEventSink::new();
        sink.publish(event(ApprovalOutcome::Approved { actor_id: None }));

        let received = rx.recv().await.unwrap();
        assert!(received.is_terminal());
    }

    #[test]
    fn test_channel_sink_survives_closed_receiver() {
        let (sink, rx) = ChannelEventSink::new();
        drop(rx);
        sink.publish(event(ApprovalOutcome::Approved { actor_id: None }));
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = with_retries(3, Duration::ZERO, || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move { if n < 3 { Err(format!("attempt {n}")) } else { Ok(n) } }
        })
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retries_give_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = with_retries(2, Duration::ZERO, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("smtp down".to_string()) }
        })
        .await;

        assert_eq!(result, Err("smtp down".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let calls = AtomicU32::new(0);
        let _: Result<(), String> = with_retries(0, Duration::ZERO, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("down".to_string()) }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_compose_advanced_differs_per_recipient() {
        let advanced = event(ApprovalOutcome::Advanced {
            actor_id: "EMP0002".into(),
            next_approver_id: "EMP0003".into(),
            next_role: "Manager".into(),
        });

        let (subject, _) = compose(&advanced, "EMP0003");
        assert_eq!(subject, "leave request awaiting your approval");

        let (subject, body) = compose(&advanced, "EMP0001");
        assert_eq!(subject, "Your leave request moved forward");
        assert!(body.contains("pending for Manager"));
    }

    #[test]
    fn test_compose_rejection_includes_comments() {
        let rejected = event(ApprovalOutcome::Rejected {
            actor_id: "EMP0003".into(),
            role: "Manager".into(),
            comments: Some("Overlaps the release".into()),
        });

        let (subject, body) = compose(&rejected, "EMP0001");
        assert_eq!(subject, "Your leave request was rejected");
        assert!(body.contains("rejected by Manager"));
        assert!(body.contains("Overlaps the release"));
    }
}
