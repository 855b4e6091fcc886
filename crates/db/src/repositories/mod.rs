use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use quotecraft_core::domain::customer::{Customer, CustomerId};
use quotecraft_core::domain::material::{Material, MaterialId};
use quotecraft_core::domain::product::{ProductTemplate, ProductTemplateId};
use quotecraft_core::domain::quotation::{Quotation, QuotationId, QuotationStatus};

pub mod customer;
pub mod material;
pub mod memory;
pub mod product;
pub mod quotation;

pub use customer::SqlCustomerRepository;
pub use material::SqlMaterialRepository;
pub use memory::{
    InMemoryCustomerRepository, InMemoryMaterialRepository, InMemoryProductTemplateRepository,
    InMemoryQuotationRepository,
};
pub use product::SqlProductTemplateRepository;
pub use quotation::SqlQuotationRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("{entity} `{id}` was not found")]
    NotFound { entity: &'static str, id: String },
    #[error("quotation {id} changed since version {expected_version} was read")]
    VersionConflict { id: QuotationId, expected_version: u32 },
}

/// Quotation headers and their frozen line items.
///
/// Items are written once by `create` and never rewritten; only the status column
/// (and its version counter) moves afterwards.
#[async_trait]
pub trait QuotationRepository: Send + Sync {
    /// Inserts header and items atomically and returns the quotation with its assigned id.
    async fn create(&self, quotation: Quotation) -> Result<Quotation, RepositoryError>;
    async fn find_by_id(&self, id: &QuotationId) -> Result<Option<Quotation>, RepositoryError>;
    /// Newest first.
    async fn list(&self) -> Result<Vec<Quotation>, RepositoryError>;
    /// Writes `status` only if the stored version still equals `expected_version`.
    async fn update_status(
        &self,
        id: &QuotationId,
        expected_version: u32,
        status: QuotationStatus,
    ) -> Result<Quotation, RepositoryError>;
}

#[async_trait]
pub trait MaterialRepository: Send + Sync {
    async fn find_by_id(&self, id: &MaterialId) -> Result<Option<Material>, RepositoryError>;
    async fn list(&self) -> Result<Vec<Material>, RepositoryError>;
    async fn save(&self, material: Material) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError>;
    async fn list(&self) -> Result<Vec<Customer>, RepositoryError>;
    async fn save(&self, customer: Customer) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait ProductTemplateRepository: Send + Sync {
    async fn find_by_id(
        &self,
        id: &ProductTemplateId,
    ) -> Result<Option<ProductTemplate>, RepositoryError>;
    async fn list(&self) -> Result<Vec<ProductTemplate>, RepositoryError>;
    async fn save(&self, template: ProductTemplate) -> Result<(), RepositoryError>;
}

pub(crate) fn parse_decimal(column: &str, value: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(value).map_err(|error| {
        RepositoryError::Decode(format!("invalid decimal in `{column}`: `{value}` ({error})"))
    })
}

pub(crate) fn parse_u32(column: &str, value: i64) -> Result<u32, RepositoryError> {
    u32::try_from(value).map_err(|_| {
        RepositoryError::Decode(format!(
            "invalid value for `{column}` (expected non-negative u32): {value}"
        ))
    })
}

pub(crate) fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value).map(|timestamp| timestamp.with_timezone(&Utc)).map_err(
        |error| {
            RepositoryError::Decode(format!("invalid timestamp in `{column}`: `{value}` ({error})"))
        },
    )
}

pub(crate) fn parse_status(value: i64) -> Result<QuotationStatus, RepositoryError> {
    QuotationStatus::from_code(value)
        .map_err(|_| RepositoryError::Decode(format!("unknown quotation status code `{value}`")))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{parse_decimal, parse_status, parse_timestamp, parse_u32, RepositoryError};
    use quotecraft_core::domain::quotation::QuotationStatus;

    #[test]
    fn decoders_keep_exact_values() {
        assert_eq!(parse_decimal("total", "2916000.00").expect("decimal"), Decimal::new(291600000, 2));
        assert_eq!(parse_status(2).expect("status"), QuotationStatus::Approved);
        assert_eq!(parse_u32("version", 4).expect("u32"), 4);
        assert!(parse_timestamp("created_at", "2024-05-01T08:00:00+00:00").is_ok());
    }

    #[test]
    fn decoders_report_column_names() {
        let error = parse_decimal("unit_price", "abc").expect_err("should fail");
        assert!(matches!(error, RepositoryError::Decode(ref m) if m.contains("unit_price")));
        assert!(matches!(parse_u32("quantity", -1), Err(RepositoryError::Decode(_))));
        assert!(matches!(parse_status(9), Err(RepositoryError::Decode(_))));
    }
}
