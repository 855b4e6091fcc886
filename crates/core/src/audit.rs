//! Audit trail for pricing, lifecycle and catalog decisions.
//!
//! Callers build events from an [`AuditContext`] so every event of one request carries
//! the same quotation id, correlation id and actor. Sinks are the only place audit events
//! become log lines.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::quotation::QuotationId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditCategory {
    Pricing,
    Lifecycle,
    Persistence,
    Catalog,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditOutcome {
    Success,
    Rejected,
    Failed,
}

/// Request-scoped identity shared by the events one operation emits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditContext {
    pub quotation_id: Option<QuotationId>,
    pub correlation_id: String,
    pub actor: String,
}

impl AuditContext {
    pub fn new(
        quotation_id: Option<QuotationId>,
        correlation_id: impl Into<String>,
        actor: impl Into<String>,
    ) -> Self {
        Self { quotation_id, correlation_id: correlation_id.into(), actor: actor.into() }
    }

    /// Same request, now bound to the quotation it produced.
    pub fn for_quotation(&self, quotation_id: QuotationId) -> Self {
        Self { quotation_id: Some(quotation_id), ..self.clone() }
    }

    pub fn event(
        &self,
        event_type: impl Into<String>,
        category: AuditCategory,
        outcome: AuditOutcome,
    ) -> AuditEvent {
        AuditEvent {
            event_id: Uuid::new_v4().to_string(),
            quotation_id: self.quotation_id,
            correlation_id: self.correlation_id.clone(),
            event_type: event_type.into(),
            category,
            actor: self.actor.clone(),
            outcome,
            metadata: BTreeMap::new(),
            occurred_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: String,
    pub quotation_id: Option<QuotationId>,
    pub correlation_id: String,
    pub event_type: String,
    pub category: AuditCategory,
    pub actor: String,
    pub outcome: AuditOutcome,
    pub metadata: BTreeMap<String, String>,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

pub trait AuditSink: Send + Sync {
    fn emit(&self, event: AuditEvent);
}

#[derive(Clone, Default)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl InMemoryAuditSink {
    pub fn events(&self) -> Vec<AuditEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl AuditSink for InMemoryAuditSink {
    fn emit(&self, event: AuditEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

/// Writes each audit event as one structured log line; rejections and failures at `warn`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, event: AuditEvent) {
        let quotation_id =
            event.quotation_id.map(|id| id.to_string()).unwrap_or_else(|| "none".to_string());
        match event.outcome {
            AuditOutcome::Success => tracing::info!(
                event_name = %event.event_type,
                correlation_id = %event.correlation_id,
                quotation_id = %quotation_id,
                category = ?event.category,
                actor = %event.actor,
                metadata = ?event.metadata,
                "audit"
            ),
            AuditOutcome::Rejected | AuditOutcome::Failed => tracing::warn!(
                event_name = %event.event_type,
                correlation_id = %event.correlation_id,
                quotation_id = %quotation_id,
                category = ?event.category,
                actor = %event.actor,
                outcome = ?event.outcome,
                metadata = ?event.metadata,
                "audit"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        audit::{AuditCategory, AuditContext, AuditOutcome, AuditSink, InMemoryAuditSink},
        domain::quotation::QuotationId,
    };

    #[test]
    fn context_stamps_its_identity_on_every_event() {
        let sink = InMemoryAuditSink::default();
        let context = AuditContext::new(None, "req-123", "staff-1");

        sink.emit(context.event("material.price_updated", AuditCategory::Catalog, AuditOutcome::Success));
        sink.emit(
            context
                .for_quotation(QuotationId(42))
                .event("quotation.transition_applied", AuditCategory::Lifecycle, AuditOutcome::Success)
                .with_metadata("from", "Draft")
                .with_metadata("to", "Sent"),
        );

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.correlation_id == "req-123" && e.actor == "staff-1"));
        assert_eq!(events[0].quotation_id, None);
        assert_eq!(events[1].quotation_id, Some(QuotationId(42)));
        assert_eq!(events[1].metadata.get("to").map(String::as_str), Some("Sent"));
        assert_ne!(events[0].event_id, events[1].event_id);
    }
}
