//! Role-gated status workflow for quotations.
//!
//! `Draft -> Sent` is open to any authenticated actor, `Sent -> Approved | Rejected` is
//! admin-only, and `Approved` / `Rejected` are terminal. This check is advisory: the
//! persistence layer re-validates with a conditional update before anything is written.

use serde::{Deserialize, Serialize};

use crate::audit::{AuditCategory, AuditContext, AuditOutcome, AuditSink};
use crate::domain::actor::{Actor, Role};
use crate::domain::quotation::{Quotation, QuotationStatus};
use crate::errors::LifecycleError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: QuotationStatus,
    pub to: QuotationStatus,
    pub actor_role: Role,
}

/// Minimum role an edge requires, or `None` when the edge does not exist.
fn required_role(current: QuotationStatus, requested: QuotationStatus) -> Option<Role> {
    use QuotationStatus::{Approved, Draft, Rejected, Sent};

    match (current, requested) {
        (Draft, Sent) => Some(Role::Staff),
        (Sent, Approved) | (Sent, Rejected) => Some(Role::Admin),
        _ => None,
    }
}

fn role_satisfies(actual: Role, required: Role) -> bool {
    match required {
        Role::Staff => true,
        Role::Admin => actual == Role::Admin,
    }
}

pub fn check_transition(
    current: QuotationStatus,
    requested: QuotationStatus,
    actor: &Actor,
) -> Result<TransitionOutcome, LifecycleError> {
    if current == requested {
        return Err(LifecycleError::NoOpTransition { state: current });
    }
    if current.is_terminal() {
        return Err(LifecycleError::TerminalState { state: current, requested });
    }

    let required = required_role(current, requested)
        .ok_or(LifecycleError::IllegalTransition { from: current, to: requested })?;
    if !role_satisfies(actor.role, required) {
        return Err(LifecycleError::Unauthorized { role: actor.role, from: current, to: requested });
    }

    Ok(TransitionOutcome { from: current, to: requested, actor_role: actor.role })
}

pub fn can_transition(current: QuotationStatus, requested: QuotationStatus, role: Role) -> bool {
    check_transition(current, requested, &Actor::new("", role)).is_ok()
}

/// Returns the quotation with its new status. Items, totals and percents are carried over.
pub fn request_transition(
    quotation: &Quotation,
    requested: QuotationStatus,
    actor: &Actor,
) -> Result<Quotation, LifecycleError> {
    check_transition(quotation.status, requested, actor)?;
    Ok(Quotation { status: requested, ..quotation.clone() })
}

/// Statuses the actor may move to from `current`, in display order.
pub fn available_transitions(current: QuotationStatus, role: Role) -> Vec<QuotationStatus> {
    QuotationStatus::ALL
        .into_iter()
        .filter(|requested| can_transition(current, *requested, role))
        .collect()
}

#[derive(Clone, Copy, Debug, Default)]
pub struct QuotationLifecycle;

impl QuotationLifecycle {
    pub fn initial_state(&self) -> QuotationStatus {
        QuotationStatus::Draft
    }

    pub fn request_transition(
        &self,
        quotation: &Quotation,
        requested: QuotationStatus,
        actor: &Actor,
    ) -> Result<Quotation, LifecycleError> {
        request_transition(quotation, requested, actor)
    }

    pub fn request_transition_with_audit<S>(
        &self,
        quotation: &Quotation,
        requested: QuotationStatus,
        actor: &Actor,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<Quotation, LifecycleError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.request_transition(quotation, requested, actor);
        let audit = audit.for_quotation(quotation.id);
        let event = match &result {
            Ok(updated) => audit
                .event("quotation.transition_applied", AuditCategory::Lifecycle, AuditOutcome::Success)
                .with_metadata("from", quotation.status.as_str())
                .with_metadata("to", updated.status.as_str())
                .with_metadata("role", actor.role.as_str()),
            Err(error) => audit
                .event("quotation.transition_rejected", AuditCategory::Lifecycle, AuditOutcome::Rejected)
                .with_metadata("from", quotation.status.as_str())
                .with_metadata("requested", requested.as_str())
                .with_metadata("role", actor.role.as_str())
                .with_metadata("error", error.to_string()),
        };
        sink.emit(event);
        result
    }
}
