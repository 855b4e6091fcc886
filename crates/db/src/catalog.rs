//! Catalog maintenance: material prices and template-based drafts.

use std::sync::Arc;

use rust_decimal::Decimal;

use quotecraft_core::audit::{
    AuditCategory, AuditContext, AuditOutcome, AuditSink, TracingAuditSink,
};
use quotecraft_core::domain::actor::Actor;
use quotecraft_core::domain::customer::CustomerId;
use quotecraft_core::domain::material::{Material, MaterialId};
use quotecraft_core::domain::product::ProductTemplateId;
use quotecraft_core::domain::quotation::NewQuotation;
use quotecraft_core::errors::{DomainError, PricingError};

use crate::repositories::{
    MaterialRepository, ProductTemplateRepository, SqlMaterialRepository,
    SqlProductTemplateRepository,
};
use crate::service::ServiceError;
use crate::DbPool;

pub struct CatalogService {
    materials: Arc<dyn MaterialRepository>,
    templates: Arc<dyn ProductTemplateRepository>,
    audit: Arc<dyn AuditSink>,
}

impl CatalogService {
    pub fn new(
        materials: Arc<dyn MaterialRepository>,
        templates: Arc<dyn ProductTemplateRepository>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self { materials, templates, audit }
    }

    pub fn sql(pool: DbPool) -> Self {
        Self::new(
            Arc::new(SqlMaterialRepository::new(pool.clone())),
            Arc::new(SqlProductTemplateRepository::new(pool)),
            Arc::new(TracingAuditSink),
        )
    }

    pub async fn list_materials(&self) -> Result<Vec<Material>, ServiceError> {
        Ok(self.materials.list().await?)
    }

    /// Changes the catalog price used by future quotations. Stored quotations keep the
    /// price they froze at creation.
    pub async fn set_material_price(
        &self,
        id: &MaterialId,
        unit_price: Decimal,
        actor: &Actor,
        correlation_id: &str,
    ) -> Result<Material, ServiceError> {
        let current = self.materials.find_by_id(id).await?.ok_or_else(|| ServiceError::NotFound {
            entity: "material",
            id: id.to_string(),
        })?;
        if unit_price < Decimal::ZERO {
            return Err(DomainError::from(PricingError::InvalidUnitPrice {
                material_id: *id,
                unit_price,
            })
            .into());
        }

        let previous = current.unit_price;
        let updated = Material { unit_price, ..current };
        self.materials.save(updated.clone()).await?;

        self.audit.emit(
            AuditContext::new(None, correlation_id, actor.user_id.clone())
                .event("material.price_updated", AuditCategory::Catalog, AuditOutcome::Success)
                .with_metadata("material_id", id.to_string())
                .with_metadata("previous_unit_price", previous.to_string())
                .with_metadata("unit_price", unit_price.to_string()),
        );

        Ok(updated)
    }

    /// A quotation draft with one line per template, each pre-filled from the template
    /// defaults. Discount and tax start at zero.
    pub async fn draft_from_templates(
        &self,
        template_ids: &[ProductTemplateId],
        customer_id: CustomerId,
    ) -> Result<NewQuotation, ServiceError> {
        let mut items = Vec::with_capacity(template_ids.len());
        for id in template_ids {
            let template = self.templates.find_by_id(id).await?.ok_or_else(|| {
                ServiceError::NotFound { entity: "product template", id: id.0.to_string() }
            })?;
            items.push(template.draft_item());
        }

        Ok(NewQuotation {
            customer_id,
            items,
            discount_percent: Decimal::ZERO,
            tax_percent: Decimal::ZERO,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use quotecraft_core::audit::{AuditCategory, InMemoryAuditSink};
    use quotecraft_core::domain::actor::{Actor, Role};
    use quotecraft_core::domain::customer::CustomerId;
    use quotecraft_core::domain::material::{Material, MaterialId};
    use quotecraft_core::domain::product::{ProductTemplate, ProductTemplateId};
    use quotecraft_core::errors::{DomainError, PricingError};

    use super::CatalogService;
    use crate::repositories::{
        InMemoryMaterialRepository, InMemoryProductTemplateRepository, MaterialRepository,
        ProductTemplateRepository,
    };
    use crate::service::ServiceError;

    async fn catalog() -> (CatalogService, Arc<InMemoryMaterialRepository>, InMemoryAuditSink) {
        let materials = Arc::new(InMemoryMaterialRepository::default());
        let templates = Arc::new(InMemoryProductTemplateRepository::default());
        let audit = InMemoryAuditSink::default();

        materials
            .save(Material {
                id: MaterialId(1),
                name: "MDF".to_string(),
                unit: "m2".to_string(),
                unit_price: Decimal::from(400_000),
            })
            .await
            .expect("seed material");
        templates
            .save(ProductTemplate {
                id: ProductTemplateId(1),
                name: "Wardrobe 2-door".to_string(),
                image_url: None,
                default_width: Decimal::from(1200),
                default_height: Decimal::from(2100),
                default_depth: Decimal::from(600),
                pricing_formula: "W*H*Material".to_string(),
                base_labor_cost: Decimal::from(250_000),
                default_material_id: MaterialId(1),
            })
            .await
            .expect("seed template");

        let service = CatalogService::new(materials.clone(), templates, Arc::new(audit.clone()));
        (service, materials, audit)
    }

    #[tokio::test]
    async fn set_price_updates_the_catalog_and_audits_the_change() {
        let (service, materials, audit) = catalog().await;
        let actor = Actor::new("admin-1", Role::Admin);

        let updated = service
            .set_material_price(&MaterialId(1), Decimal::from(450_000), &actor, "req-1")
            .await
            .expect("reprice");

        assert_eq!(updated.unit_price, Decimal::from(450_000));
        let stored = materials.find_by_id(&MaterialId(1)).await.expect("find");
        assert_eq!(stored.map(|m| m.unit_price), Some(Decimal::from(450_000)));

        let events = audit.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].category, AuditCategory::Catalog);
        assert_eq!(events[0].quotation_id, None);
        assert_eq!(events[0].metadata.get("previous_unit_price").map(String::as_str), Some("400000"));
    }

    #[tokio::test]
    async fn set_price_rejects_unknown_material_and_negative_price() {
        let (service, materials, audit) = catalog().await;
        let actor = Actor::new("admin-1", Role::Admin);

        assert!(matches!(
            service.set_material_price(&MaterialId(9), Decimal::ONE, &actor, "req-2").await,
            Err(ServiceError::NotFound { entity: "material", .. })
        ));
        assert!(matches!(
            service.set_material_price(&MaterialId(1), Decimal::from(-5), &actor, "req-3").await,
            Err(ServiceError::Domain(DomainError::Pricing(PricingError::InvalidUnitPrice { .. })))
        ));

        let stored = materials.find_by_id(&MaterialId(1)).await.expect("find");
        assert_eq!(stored.map(|m| m.unit_price), Some(Decimal::from(400_000)));
        assert!(audit.events().is_empty());
    }

    #[tokio::test]
    async fn drafts_prefill_one_line_per_template() {
        let (service, _, _) = catalog().await;

        let draft = service
            .draft_from_templates(&[ProductTemplateId(1), ProductTemplateId(1)], CustomerId(3))
            .await
            .expect("draft");

        assert_eq!(draft.customer_id, CustomerId(3));
        assert_eq!(draft.items.len(), 2);
        assert_eq!(draft.items[0].product_name, "Wardrobe 2-door");
        assert_eq!(draft.items[0].material_id, MaterialId(1));
        assert_eq!(draft.items[0].quantity, 1);
        assert_eq!(draft.discount_percent, Decimal::ZERO);

        assert!(matches!(
            service.draft_from_templates(&[ProductTemplateId(7)], CustomerId(3)).await,
            Err(ServiceError::NotFound { entity: "product template", .. })
        ));
    }
}
