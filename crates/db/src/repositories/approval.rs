//! Approval workflow repository.
//!
//! Ties the pure approval engine to storage: loads the flow and a directory
//! snapshot, applies the transition, writes it back with a version check and
//! only then publishes the resulting events.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, DbErr, SqlErr};
use tracing::{info, warn};
use uuid::Uuid;

use hrflow_core::approval::{
    Approvable, ApprovalEngine, ApprovalError, ApprovalEvent, ApprovalFlow, ApprovalState,
    Decision, DecisionOutcome, EmployeeDirectory, EventSink, OverallStatus, RequestKind, Stepper,
};

use crate::repositories::approval_flow::ApprovalFlowRepository;
use crate::repositories::approval_store::ApprovalStore;
use crate::repositories::employee::EmployeeRepository;

/// Everything a request builder needs to assemble a new request.
#[derive(Debug, Clone)]
pub struct NewRequestContext {
    /// ID assigned to the request.
    pub request_id: Uuid,
    /// Flow the request is created against.
    pub flow_id: Uuid,
    /// Initial approval state.
    pub approval: ApprovalState,
    /// Submission time.
    pub now: DateTime<Utc>,
}

/// A persisted decision.
#[derive(Debug, Clone)]
pub struct Decided<R> {
    /// The request as stored after the decision.
    pub request: R,
    /// What the engine computed.
    pub outcome: DecisionOutcome,
}

/// Approval workflow repository shared by all request kinds.
#[derive(Clone)]
pub struct ApprovalRepository {
    flows: ApprovalFlowRepository,
    employees: EmployeeRepository,
    events: Arc<dyn EventSink>,
    max_write_retries: u32,
}

impl ApprovalRepository {
    /// Creates a new approval repository.
    ///
    /// `flows` should be the same instance the configuration endpoints
    /// write through so cache invalidation is shared.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        flows: ApprovalFlowRepository,
        events: Arc<dyn EventSink>,
        max_write_retries: u32,
    ) -> Self {
        Self {
            flows,
            employees: EmployeeRepository::new(db),
            events,
            max_write_retries,
        }
    }

    /// Submits a new request.
    ///
    /// `build` receives the generated ID, flow and initial approval state
    /// and returns the request to insert.
    ///
    /// # Errors
    ///
    /// - `EmployeeNotFound` if the applicant or an employee the request
    ///   names (such as an assignee) is unknown
    /// - `FlowNotFound` if no flow is configured for `kind`
    /// - `Configuration` if the applicant's role is not in the flow
    pub async fn submit<S, F>(
        &self,
        store: &S,
        kind: RequestKind,
        applicant_id: &str,
        build: F,
    ) -> Result<S::Request, ApprovalError>
    where
        S: ApprovalStore,
        F: FnOnce(NewRequestContext) -> S::Request + Send,
    {
        let directory = self
            .employees
            .load_directory_snapshot()
            .await
            .map_err(db_error)?;
        let applicant = directory
            .find_employee(applicant_id)
            .ok_or_else(|| ApprovalError::EmployeeNotFound(applicant_id.to_string()))?
            .clone();
        let flow = self.flow_for_kind(kind).await?;

        let now = Utc::now();
        let request_id = Uuid::now_v7();
        let (approval, events) =
            ApprovalEngine::initiate(kind, request_id, &applicant, &flow, &directory, now)?;

        if approval.overall_status == OverallStatus::Approved {
            warn!(
                %request_id,
                %kind,
                applicant_id,
                "No approver could be resolved, request approved on submission"
            );
        }

        let status = approval.overall_status.clone();
        let request = build(NewRequestContext {
            request_id,
            flow_id: flow.id,
            approval,
            now,
        });
        if let Some(unknown) = request
            .referenced_employees()
            .into_iter()
            .find(|id| directory.find_employee(id).is_none())
        {
            return Err(ApprovalError::EmployeeNotFound(unknown.to_string()));
        }
        store.insert(&request).await.map_err(insert_error)?;

        info!(%request_id, %kind, applicant_id, %status, "Approval request submitted");
        self.publish(events);
        Ok(request)
    }

    /// Applies an approve/reject decision with an optimistic write.
    ///
    /// A lost version race reloads the request and re-applies the decision.
    /// If the actor's step was decided in the meantime the retry fails with
    /// `DuplicateAction`.
    ///
    /// # Errors
    ///
    /// - `RequestNotFound` if the request does not exist
    /// - any engine error from [`ApprovalEngine::apply_decision`]
    /// - `ConcurrentModification` if every retry lost the race
    pub async fn decide<S: ApprovalStore>(
        &self,
        store: &S,
        request_id: Uuid,
        actor_id: &str,
        decision: Decision,
        comments: Option<String>,
    ) -> Result<Decided<S::Request>, ApprovalError> {
        let attempts = self.max_write_retries.max(1);

        for attempt in 1..=attempts {
            let mut request = self.get(store, request_id).await?;
            let flow = self.flow_for_request(&request).await?;
            let directory = self
                .employees
                .load_directory_snapshot()
                .await
                .map_err(db_error)?;

            let expected_version = request.version();
            let outcome = ApprovalEngine::apply_decision(
                &mut request,
                &flow,
                &directory,
                actor_id,
                decision,
                comments.clone(),
                Utc::now(),
            )?;

            if store
                .save_approval(&request, expected_version)
                .await
                .map_err(db_error)?
            {
                info!(
                    %request_id,
                    kind = %request.request_kind(),
                    actor_id,
                    ?decision,
                    status = %outcome.overall_status,
                    "Approval decision recorded"
                );
                if outcome.overall_status == OverallStatus::Approved
                    && let Some(role) = &outcome.stepper.truncated_at
                {
                    warn!(%request_id, role, "No approver found for step, treating request as approved");
                }

                self.publish(outcome.events.clone());
                let request = self.get(store, request_id).await?;
                return Ok(Decided { request, outcome });
            }

            warn!(%request_id, attempt, "Approval write lost a version race");
        }

        Err(ApprovalError::ConcurrentModification(request_id))
    }

    /// Replays resolution for a stored request.
    ///
    /// # Errors
    ///
    /// Returns `RequestNotFound` or any resolution error.
    pub async fn stepper<S: ApprovalStore>(
        &self,
        store: &S,
        request_id: Uuid,
    ) -> Result<(S::Request, Stepper), ApprovalError> {
        let request = self.get(store, request_id).await?;
        let flow = self.flow_for_request(&request).await?;
        let directory = self
            .employees
            .load_directory_snapshot()
            .await
            .map_err(db_error)?;

        let stepper = ApprovalEngine::stepper(&request, &flow, &directory)?;
        Ok((request, stepper))
    }

    /// Loads a request.
    ///
    /// # Errors
    ///
    /// Returns `RequestNotFound` if it does not exist.
    pub async fn get<S: ApprovalStore>(
        &self,
        store: &S,
        request_id: Uuid,
    ) -> Result<S::Request, ApprovalError> {
        store
            .load(request_id)
            .await
            .map_err(db_error)?
            .ok_or(ApprovalError::RequestNotFound(request_id))
    }

    /// Requests waiting on `employee_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn pending_for<S: ApprovalStore>(
        &self,
        store: &S,
        employee_id: &str,
    ) -> Result<Vec<S::Request>, ApprovalError> {
        store.list_pending_for(employee_id).await.map_err(db_error)
    }

    /// Requests filed by `applicant_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn submitted_by<S: ApprovalStore>(
        &self,
        store: &S,
        applicant_id: &str,
    ) -> Result<Vec<S::Request>, ApprovalError> {
        store.list_by_applicant(applicant_id).await.map_err(db_error)
    }

    /// Withdraws a request that is still in progress.
    ///
    /// # Errors
    ///
    /// - `NotApplicant` if `caller_id` did not file the request
    /// - `Finalized` if the request is already approved or rejected
    /// - `ConcurrentModification` if it changed while being withdrawn
    pub async fn withdraw<S: ApprovalStore>(
        &self,
        store: &S,
        request_id: Uuid,
        caller_id: &str,
    ) -> Result<(), ApprovalError> {
        let request = self.get(store, request_id).await?;
        if request.applicant_id() != caller_id {
            return Err(ApprovalError::NotApplicant(caller_id.to_string()));
        }
        if request.approval_state().overall_status.is_terminal() {
            return Err(ApprovalError::Finalized(request_id));
        }
        if !store
            .delete(request_id, request.version())
            .await
            .map_err(db_error)?
        {
            return Err(ApprovalError::ConcurrentModification(request_id));
        }

        info!(%request_id, caller_id, "Approval request withdrawn");
        Ok(())
    }

    async fn flow_for_kind(&self, kind: RequestKind) -> Result<Arc<ApprovalFlow>, ApprovalError> {
        self.flows
            .find_flow(kind.flow_request_type(), Some(kind.flow_display_name()))
            .await?
            .ok_or_else(|| ApprovalError::FlowNotFound {
                request_type: kind.flow_request_type().to_string(),
                display_name: kind.flow_display_name().to_string(),
            })
    }

    async fn flow_for_request<R: Approvable>(
        &self,
        request: &R,
    ) -> Result<Arc<ApprovalFlow>, ApprovalError> {
        let kind = request.request_kind();
        self.flows
            .find_by_id(request.flow_id())
            .await?
            .ok_or_else(|| ApprovalError::FlowNotFound {
                request_type: kind.flow_request_type().to_string(),
                display_name: kind.flow_display_name().to_string(),
            })
    }

    fn publish(&self, events: Vec<ApprovalEvent>) {
        for event in events {
            self.events.publish(event);
        }
    }
}

/// Foreign keys left after the directory checks (e.g. a task's project)
/// point at client-supplied IDs.
fn insert_error(err: DbErr) -> ApprovalError {
    match err.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => ApprovalError::InvalidRequest(
            "request references a record that does not exist".to_string(),
        ),
        _ => db_error(err),
    }
}

#[allow(clippy::needless_pass_by_value)]
fn db_error(err: DbErr) -> ApprovalError {
    ApprovalError::Database(err.to_string())
}
