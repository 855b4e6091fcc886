use std::collections::HashMap;

use sqlx::{sqlite::SqliteRow, Row};

use quotecraft_core::domain::customer::CustomerId;
use quotecraft_core::domain::material::MaterialId;
use quotecraft_core::domain::quotation::{Quotation, QuotationId, QuotationItem, QuotationStatus};

use super::{
    parse_decimal, parse_status, parse_timestamp, parse_u32, QuotationRepository, RepositoryError,
};
use crate::DbPool;

const HEADER_COLUMNS: &str = "id, customer_id, status, discount_percent, tax_percent, \
                              total_amount, created_at, version";
const ITEM_COLUMNS: &str = "quotation_id, product_name, width, height, depth, material_id, \
                            quantity, unit_price_snapshot, total_price";

pub struct SqlQuotationRepository {
    pool: DbPool,
}

impl SqlQuotationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: &QuotationId) -> Result<bool, RepositoryError> {
        let exists: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM quotation WHERE id = ?)")
            .bind(id.0)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists == 1)
    }

    async fn load_items(&self, id: &QuotationId) -> Result<Vec<QuotationItem>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM quotation_item WHERE quotation_id = ? ORDER BY line_no ASC"
        ))
        .bind(id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(item_from_row).collect()
    }
}

#[async_trait::async_trait]
impl QuotationRepository for SqlQuotationRepository {
    async fn create(&self, quotation: Quotation) -> Result<Quotation, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            "INSERT INTO quotation (
                customer_id, status, discount_percent, tax_percent, total_amount, created_at, version
             ) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(quotation.customer_id.0)
        .bind(quotation.status.code())
        .bind(quotation.discount_percent.to_string())
        .bind(quotation.tax_percent.to_string())
        .bind(quotation.total_amount.to_string())
        .bind(quotation.created_at.to_rfc3339())
        .bind(i64::from(quotation.version))
        .execute(&mut *tx)
        .await?;
        let id = QuotationId(inserted.last_insert_rowid());

        for (line_no, item) in quotation.items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO quotation_item (
                    quotation_id, line_no, product_name, width, height, depth, material_id,
                    quantity, unit_price_snapshot, total_price
                 ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(id.0)
            .bind(line_no as i64)
            .bind(&item.product_name)
            .bind(item.width.to_string())
            .bind(item.height.to_string())
            .bind(item.depth.to_string())
            .bind(item.material_id.0)
            .bind(i64::from(item.quantity))
            .bind(item.unit_price_snapshot.to_string())
            .bind(item.total_price.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::debug!(
            event_name = "db.quotation.created",
            quotation_id = id.0,
            item_count = quotation.items.len(),
            "quotation persisted"
        );

        Ok(Quotation { id, ..quotation })
    }

    async fn find_by_id(&self, id: &QuotationId) -> Result<Option<Quotation>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {HEADER_COLUMNS} FROM quotation WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let items = self.load_items(id).await?;
        header_from_row(&row, items).map(Some)
    }

    async fn list(&self) -> Result<Vec<Quotation>, RepositoryError> {
        let headers =
            sqlx::query(&format!("SELECT {HEADER_COLUMNS} FROM quotation ORDER BY id DESC"))
                .fetch_all(&self.pool)
                .await?;
        let item_rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM quotation_item ORDER BY quotation_id ASC, line_no ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut items_by_quotation: HashMap<i64, Vec<QuotationItem>> = HashMap::new();
        for row in &item_rows {
            let quotation_id: i64 = row.try_get("quotation_id")?;
            items_by_quotation.entry(quotation_id).or_default().push(item_from_row(row)?);
        }

        headers
            .iter()
            .map(|row| {
                let id: i64 = row.try_get("id")?;
                header_from_row(row, items_by_quotation.remove(&id).unwrap_or_default())
            })
            .collect()
    }

    async fn update_status(
        &self,
        id: &QuotationId,
        expected_version: u32,
        status: QuotationStatus,
    ) -> Result<Quotation, RepositoryError> {
        let updated = sqlx::query(
            "UPDATE quotation SET status = ?, version = version + 1 WHERE id = ? AND version = ?",
        )
        .bind(status.code())
        .bind(id.0)
        .bind(i64::from(expected_version))
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            if self.exists(id).await? {
                return Err(RepositoryError::VersionConflict { id: *id, expected_version });
            }
            return Err(RepositoryError::NotFound { entity: "quotation", id: id.to_string() });
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound { entity: "quotation", id: id.to_string() })
    }
}

fn header_from_row(row: &SqliteRow, items: Vec<QuotationItem>) -> Result<Quotation, RepositoryError> {
    let discount_percent: String = row.try_get("discount_percent")?;
    let tax_percent: String = row.try_get("tax_percent")?;
    let total_amount: String = row.try_get("total_amount")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(Quotation {
        id: QuotationId(row.try_get("id")?),
        customer_id: CustomerId(row.try_get("customer_id")?),
        status: parse_status(row.try_get("status")?)?,
        discount_percent: parse_decimal("discount_percent", &discount_percent)?,
        tax_percent: parse_decimal("tax_percent", &tax_percent)?,
        items,
        total_amount: parse_decimal("total_amount", &total_amount)?,
        created_at: parse_timestamp("created_at", &created_at)?,
        version: parse_u32("version", row.try_get("version")?)?,
    })
}

fn item_from_row(row: &SqliteRow) -> Result<QuotationItem, RepositoryError> {
    let width: String = row.try_get("width")?;
    let height: String = row.try_get("height")?;
    let depth: String = row.try_get("depth")?;
    let unit_price_snapshot: String = row.try_get("unit_price_snapshot")?;
    let total_price: String = row.try_get("total_price")?;

    Ok(QuotationItem {
        product_name: row.try_get("product_name")?,
        width: parse_decimal("width", &width)?,
        height: parse_decimal("height", &height)?,
        depth: parse_decimal("depth", &depth)?,
        material_id: MaterialId(row.try_get("material_id")?),
        quantity: parse_u32("quantity", row.try_get("quantity")?)?,
        unit_price_snapshot: parse_decimal("unit_price_snapshot", &unit_price_snapshot)?,
        total_price: parse_decimal("total_price", &total_price)?,
    })
}
