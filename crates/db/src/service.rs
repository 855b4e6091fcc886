//! Create and transition quotations against the repositories.
//!
//! Pricing and workflow rules live in `quotecraft-core`; this layer only loads the
//! reference data they need and makes the resulting writes conditional.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use quotecraft_core::audit::{
    AuditCategory, AuditContext, AuditOutcome, AuditSink, TracingAuditSink,
};
use quotecraft_core::cpq::catalog::MaterialCatalog;
use quotecraft_core::cpq::snapshot::{build_quotation, verify_frozen_total};
use quotecraft_core::cpq::{CpqEvaluation, CpqEvaluationInput, CpqRuntime, DeterministicCpqRuntime};
use quotecraft_core::domain::actor::Actor;
use quotecraft_core::domain::material::MaterialId;
use quotecraft_core::domain::quotation::{NewQuotation, Quotation, QuotationId, QuotationStatus};
use quotecraft_core::errors::{ApplicationError, DomainError};
use quotecraft_core::flows::QuotationLifecycle;

use crate::repositories::{
    CustomerRepository, MaterialRepository, QuotationRepository, RepositoryError,
    SqlCustomerRepository, SqlMaterialRepository, SqlQuotationRepository,
};
use crate::DbPool;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("{entity} `{id}` was not found")]
    NotFound { entity: &'static str, id: String },
    #[error("quotation {id} was changed by another request; reload and retry")]
    Conflict { id: QuotationId },
    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for ServiceError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::VersionConflict { id, .. } => Self::Conflict { id },
            RepositoryError::NotFound { entity, id } => Self::NotFound { entity, id },
            other => Self::Repository(other),
        }
    }
}

impl From<ServiceError> for ApplicationError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Domain(error) => Self::Domain(error),
            ServiceError::NotFound { entity, id } => Self::NotFound { entity, id },
            conflict @ ServiceError::Conflict { .. } => Self::Conflict(conflict.to_string()),
            ServiceError::Repository(RepositoryError::Decode(message)) => {
                Self::Domain(DomainError::InvariantViolation(message))
            }
            ServiceError::Repository(error) => Self::Persistence(error.to_string()),
        }
    }
}

pub struct QuotationService {
    quotations: Arc<dyn QuotationRepository>,
    materials: Arc<dyn MaterialRepository>,
    customers: Arc<dyn CustomerRepository>,
    audit: Arc<dyn AuditSink>,
    lifecycle: QuotationLifecycle,
    currency: String,
}

impl QuotationService {
    pub fn new(
        quotations: Arc<dyn QuotationRepository>,
        materials: Arc<dyn MaterialRepository>,
        customers: Arc<dyn CustomerRepository>,
        audit: Arc<dyn AuditSink>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            quotations,
            materials,
            customers,
            audit,
            lifecycle: QuotationLifecycle,
            currency: currency.into(),
        }
    }

    /// SQL-backed service that reports audit events through `tracing`.
    pub fn sql(pool: DbPool, currency: impl Into<String>) -> Self {
        Self::new(
            Arc::new(SqlQuotationRepository::new(pool.clone())),
            Arc::new(SqlMaterialRepository::new(pool.clone())),
            Arc::new(SqlCustomerRepository::new(pool)),
            Arc::new(TracingAuditSink),
            currency,
        )
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Prices `new` against the current catalog, freezes the line prices and stores a `Draft`.
    pub async fn create_quotation(
        &self,
        new: &NewQuotation,
        actor: &Actor,
        correlation_id: &str,
    ) -> Result<Quotation, ServiceError> {
        if new.customer_id.0 > 0 && self.customers.find_by_id(&new.customer_id).await?.is_none() {
            return Err(ServiceError::NotFound {
                entity: "customer",
                id: new.customer_id.0.to_string(),
            });
        }

        let catalog = self.load_catalog(new).await?;
        let quotation = build_quotation(QuotationId(0), new, &catalog, Utc::now())?;
        let stored = self.quotations.create(quotation).await?;

        self.audit.emit(
            AuditContext::new(Some(stored.id), correlation_id, actor.user_id.clone())
                .event("quotation.created", AuditCategory::Pricing, AuditOutcome::Success)
                .with_metadata("customer_id", stored.customer_id.0.to_string())
                .with_metadata("item_count", stored.items.len().to_string())
                .with_metadata("total_amount", stored.total_amount.to_string())
                .with_metadata("currency", self.currency.clone()),
        );

        Ok(stored)
    }

    /// Applies a status change if the workflow allows it and nobody else changed the row first.
    pub async fn transition(
        &self,
        id: &QuotationId,
        requested: QuotationStatus,
        actor: &Actor,
        correlation_id: &str,
    ) -> Result<Quotation, ServiceError> {
        let current = self.get(id).await?;
        let context = AuditContext::new(Some(current.id), correlation_id, actor.user_id.clone());
        let updated = self
            .lifecycle
            .request_transition_with_audit(&current, requested, actor, self.audit.as_ref(), &context)
            .map_err(DomainError::from)?;

        match self.quotations.update_status(id, current.version, updated.status).await {
            Ok(persisted) => Ok(persisted),
            Err(RepositoryError::VersionConflict { id, expected_version }) => {
                self.audit.emit(
                    context
                        .event(
                            "quotation.transition_conflict",
                            AuditCategory::Persistence,
                            AuditOutcome::Failed,
                        )
                        .with_metadata("requested", requested.as_str())
                        .with_metadata("expected_version", expected_version.to_string()),
                );
                Err(ServiceError::Conflict { id })
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Loads a quotation and checks its stored total against its frozen lines.
    pub async fn get(&self, id: &QuotationId) -> Result<Quotation, ServiceError> {
        let quotation = self.quotations.find_by_id(id).await?.ok_or_else(|| {
            ServiceError::NotFound { entity: "quotation", id: id.to_string() }
        })?;
        verify_frozen_total(&quotation)?;
        Ok(quotation)
    }

    /// Every stored quotation, newest first. One row with an inconsistent total fails the
    /// whole listing, so reports never count a figure `get` would refuse.
    pub async fn list(&self) -> Result<Vec<Quotation>, ServiceError> {
        let quotations = self.quotations.list().await?;
        for quotation in &quotations {
            verify_frozen_total(quotation)?;
        }
        Ok(quotations)
    }

    /// Validation findings and live totals for a draft, without storing anything.
    pub async fn preview(&self, new: &NewQuotation) -> Result<CpqEvaluation, ServiceError> {
        let catalog = self.load_catalog(new).await?;
        let runtime = DeterministicCpqRuntime::default();
        Ok(runtime.evaluate(
            CpqEvaluationInput { quotation: new, currency: &self.currency },
            &catalog,
        ))
    }

    async fn load_catalog(&self, new: &NewQuotation) -> Result<MaterialCatalog, ServiceError> {
        let ids: BTreeSet<MaterialId> = new.items.iter().map(|item| item.material_id).collect();
        let mut materials = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(material) = self.materials.find_by_id(&id).await? {
                materials.push(material);
            }
        }
        Ok(materials.into_iter().collect())
    }
}
