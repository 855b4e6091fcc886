use std::collections::BTreeMap;

use tokio::sync::RwLock;

use quotecraft_core::domain::customer::{Customer, CustomerId};
use quotecraft_core::domain::material::{Material, MaterialId};
use quotecraft_core::domain::product::{ProductTemplate, ProductTemplateId};
use quotecraft_core::domain::quotation::{Quotation, QuotationId, QuotationStatus};

use super::{
    CustomerRepository, MaterialRepository, ProductTemplateRepository, QuotationRepository,
    RepositoryError,
};

#[derive(Default)]
struct QuotationTable {
    next_id: i64,
    rows: BTreeMap<i64, Quotation>,
}

#[derive(Default)]
pub struct InMemoryQuotationRepository {
    table: RwLock<QuotationTable>,
}

#[async_trait::async_trait]
impl QuotationRepository for InMemoryQuotationRepository {
    async fn create(&self, quotation: Quotation) -> Result<Quotation, RepositoryError> {
        let mut table = self.table.write().await;
        table.next_id += 1;
        let stored = Quotation { id: QuotationId(table.next_id), ..quotation };
        table.rows.insert(stored.id.0, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: &QuotationId) -> Result<Option<Quotation>, RepositoryError> {
        let table = self.table.read().await;
        Ok(table.rows.get(&id.0).cloned())
    }

    async fn list(&self) -> Result<Vec<Quotation>, RepositoryError> {
        let table = self.table.read().await;
        Ok(table.rows.values().rev().cloned().collect())
    }

    async fn update_status(
        &self,
        id: &QuotationId,
        expected_version: u32,
        status: QuotationStatus,
    ) -> Result<Quotation, RepositoryError> {
        let mut table = self.table.write().await;
        let stored = table
            .rows
            .get_mut(&id.0)
            .ok_or_else(|| RepositoryError::NotFound { entity: "quotation", id: id.to_string() })?;

        if stored.version != expected_version {
            return Err(RepositoryError::VersionConflict { id: *id, expected_version });
        }

        stored.status = status;
        stored.version += 1;
        Ok(stored.clone())
    }
}

#[derive(Default)]
pub struct InMemoryMaterialRepository {
    materials: RwLock<BTreeMap<MaterialId, Material>>,
}

#[async_trait::async_trait]
impl MaterialRepository for InMemoryMaterialRepository {
    async fn find_by_id(&self, id: &MaterialId) -> Result<Option<Material>, RepositoryError> {
        let materials = self.materials.read().await;
        Ok(materials.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Material>, RepositoryError> {
        let materials = self.materials.read().await;
        Ok(materials.values().cloned().collect())
    }

    async fn save(&self, material: Material) -> Result<(), RepositoryError> {
        let mut materials = self.materials.write().await;
        materials.insert(material.id, material);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryCustomerRepository {
    customers: RwLock<BTreeMap<CustomerId, Customer>>,
}

#[async_trait::async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let customers = self.customers.read().await;
        Ok(customers.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Customer>, RepositoryError> {
        let customers = self.customers.read().await;
        Ok(customers.values().cloned().collect())
    }

    async fn save(&self, customer: Customer) -> Result<(), RepositoryError> {
        let mut customers = self.customers.write().await;
        customers.insert(customer.id, customer);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryProductTemplateRepository {
    templates: RwLock<BTreeMap<ProductTemplateId, ProductTemplate>>,
}

#[async_trait::async_trait]
impl ProductTemplateRepository for InMemoryProductTemplateRepository {
    async fn find_by_id(
        &self,
        id: &ProductTemplateId,
    ) -> Result<Option<ProductTemplate>, RepositoryError> {
        let templates = self.templates.read().await;
        Ok(templates.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<ProductTemplate>, RepositoryError> {
        let templates = self.templates.read().await;
        Ok(templates.values().cloned().collect())
    }

    async fn save(&self, template: ProductTemplate) -> Result<(), RepositoryError> {
        let mut templates = self.templates.write().await;
        templates.insert(template.id, template);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use quotecraft_core::domain::customer::{Customer, CustomerId};
    use quotecraft_core::domain::material::{Material, MaterialId};
    use quotecraft_core::domain::product::{ProductTemplate, ProductTemplateId};
    use quotecraft_core::domain::quotation::{Quotation, QuotationId, QuotationStatus};

    use crate::repositories::{
        CustomerRepository, InMemoryCustomerRepository, InMemoryMaterialRepository,
        InMemoryProductTemplateRepository, InMemoryQuotationRepository, MaterialRepository,
        ProductTemplateRepository, QuotationRepository, RepositoryError,
    };

    fn empty_quotation() -> Quotation {
        Quotation {
            id: QuotationId(0),
            customer_id: CustomerId(1),
            status: QuotationStatus::Draft,
            discount_percent: Decimal::ZERO,
            tax_percent: Decimal::ZERO,
            items: Vec::new(),
            total_amount: Decimal::ZERO,
            created_at: Utc::now(),
            version: 0,
        }
    }

    #[tokio::test]
    async fn in_memory_quotation_repo_assigns_ids_and_lists_newest_first() {
        let repo = InMemoryQuotationRepository::default();

        let first = repo.create(empty_quotation()).await.expect("create first");
        let second = repo.create(empty_quotation()).await.expect("create second");

        assert_eq!(first.id, QuotationId(1));
        assert_eq!(second.id, QuotationId(2));
        assert_eq!(repo.find_by_id(&first.id).await.expect("find"), Some(first.clone()));

        let ids: Vec<QuotationId> =
            repo.list().await.expect("list").into_iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![QuotationId(2), QuotationId(1)]);
    }

    #[tokio::test]
    async fn in_memory_update_status_checks_version() {
        let repo = InMemoryQuotationRepository::default();
        let created = repo.create(empty_quotation()).await.expect("create");

        let sent =
            repo.update_status(&created.id, 0, QuotationStatus::Sent).await.expect("update");
        assert_eq!((sent.status, sent.version), (QuotationStatus::Sent, 1));

        assert!(matches!(
            repo.update_status(&created.id, 0, QuotationStatus::Approved).await,
            Err(RepositoryError::VersionConflict { .. })
        ));
        assert!(matches!(
            repo.update_status(&QuotationId(77), 0, QuotationStatus::Sent).await,
            Err(RepositoryError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn in_memory_reference_repos_round_trip() {
        let materials = InMemoryMaterialRepository::default();
        let material = Material {
            id: MaterialId(1),
            name: "MDF".to_string(),
            unit: "m2".to_string(),
            unit_price: Decimal::from(400_000),
        };
        materials.save(material.clone()).await.expect("save material");
        assert_eq!(materials.find_by_id(&material.id).await.expect("find"), Some(material));

        let customers = InMemoryCustomerRepository::default();
        let customer = Customer {
            id: CustomerId(3),
            name: "Le Hoang Cuong".to_string(),
            phone: "0987654321".to_string(),
            email: "cuong.le@example.com".to_string(),
            address: "8 Tran Phu".to_string(),
        };
        customers.save(customer.clone()).await.expect("save customer");
        assert_eq!(customers.list().await.expect("list"), vec![customer]);

        let templates = InMemoryProductTemplateRepository::default();
        let template = ProductTemplate {
            id: ProductTemplateId(1),
            name: "TV console".to_string(),
            image_url: None,
            default_width: Decimal::from(1800),
            default_height: Decimal::from(450),
            default_depth: Decimal::from(400),
            pricing_formula: String::new(),
            base_labor_cost: Decimal::ZERO,
            default_material_id: MaterialId(1),
        };
        templates.save(template.clone()).await.expect("save template");
        assert_eq!(templates.find_by_id(&template.id).await.expect("find"), Some(template));
    }
}
