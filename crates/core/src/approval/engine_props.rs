//! Property-based tests for ApprovalEngine.
//!
//! Random decision sequences are replayed against random org charts and the
//! trail is checked after every step.

use chrono::Utc;
use proptest::prelude::*;
use uuid::Uuid;

use crate::approval::directory::EmployeeDirectory;
use crate::approval::engine::{Approvable, ApprovalEngine, ApprovalState};
use crate::approval::error::ApprovalError;
use crate::approval::resolver::StepResolver;
use crate::approval::resolver_props::{Org, arb_org};
use crate::approval::types::{ApprovalStatus, Decision, RequestKind};

#[derive(Debug, Clone)]
struct PropRequest {
    applicant_id: String,
    state: ApprovalState,
}

impl Approvable for PropRequest {
    fn request_kind(&self) -> RequestKind {
        RequestKind::Task
    }
    fn request_id(&self) -> Uuid {
        Uuid::nil()
    }
    fn applicant_id(&self) -> &str {
        &self.applicant_id
    }
    fn flow_id(&self) -> Uuid {
        Uuid::nil()
    }
    fn version(&self) -> i32 {
        1
    }
    fn approval_state(&self) -> &ApprovalState {
        &self.state
    }
    fn approval_state_mut(&mut self) -> &mut ApprovalState {
        &mut self.state
    }
}

fn submit(org: &Org) -> PropRequest {
    let applicant = org.directory.find_employee("E00").unwrap();
    let (state, _) = ApprovalEngine::initiate(
        RequestKind::Task,
        Uuid::nil(),
        applicant,
        &org.flow,
        &org.directory,
        Utc::now(),
    )
    .unwrap();
    PropRequest {
        applicant_id: "E00".to_string(),
        state,
    }
}

fn arb_decision() -> impl Strategy<Value = Decision> {
    prop_oneof![
        4 => Just(Decision::Approved),
        1 => Just(Decision::Rejected),
    ]
}

fn arb_script() -> impl Strategy<Value = Vec<(u16, Decision)>> {
    proptest::collection::vec((any::<u16>(), arb_decision()), 1..12)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The trail never holds more than one Pending entry and nothing
    /// is recorded after a rejection
    #[test]
    fn prop_trail_invariants_hold(org in arb_org(), script in arb_script()) {
        let mut request = submit(&org);

        for (pick, decision) in script {
            let actor = &org.codes[usize::from(pick) % org.codes.len()];
            let _ = ApprovalEngine::apply_decision(
                &mut request, &org.flow, &org.directory, actor, decision, None, Utc::now(),
            );

            let trail = &request.state.trail;
            let pending = trail.iter().filter(|e| e.status == ApprovalStatus::Pending).count();
            prop_assert!(pending <= 1);

            if let Some(pos) = trail.iter().position(|e| e.status == ApprovalStatus::Rejected) {
                prop_assert_eq!(pos, trail.len() - 1);
                prop_assert_eq!(pending, 0);
            }
        }
    }

    /// Overall status always matches a fresh replay of the trail
    #[test]
    fn prop_status_matches_replay(org in arb_org(), script in arb_script()) {
        let mut request = submit(&org);

        for (pick, decision) in script {
            let actor = &org.codes[usize::from(pick) % org.codes.len()];
            if ApprovalEngine::apply_decision(
                &mut request, &org.flow, &org.directory, actor, decision, None, Utc::now(),
            ).is_ok() {
                let replay = ApprovalEngine::stepper(&request, &org.flow, &org.directory).unwrap();
                prop_assert_eq!(replay.overall_status(), request.state.overall_status.clone());
            }
        }
    }

    /// A repeated decision fails and leaves the trail unchanged
    #[test]
    fn prop_duplicate_action_is_rejected(org in arb_org(), decision in arb_decision()) {
        let mut request = submit(&org);
        let stepper = StepResolver::resolve(
            "E00", "Role0", &org.flow, &request.state.trail, &org.directory,
        ).unwrap();

        if let Some(pending) = stepper.pending_step() {
            let actor = pending.employee_id.clone();
            ApprovalEngine::apply_decision(
                &mut request, &org.flow, &org.directory, &actor, decision, None, Utc::now(),
            ).unwrap();

            let before = request.state.clone();
            let result = ApprovalEngine::apply_decision(
                &mut request, &org.flow, &org.directory, &actor, Decision::Approved, None, Utc::now(),
            );
            prop_assert!(
                matches!(result, Err(ApprovalError::DuplicateAction { .. })),
                "expected DuplicateAction"
            );
            prop_assert_eq!(request.state, before);
        }
    }
}
