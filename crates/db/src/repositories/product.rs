use sqlx::{sqlite::SqliteRow, Row};

use quotecraft_core::domain::material::MaterialId;
use quotecraft_core::domain::product::{ProductTemplate, ProductTemplateId};

use super::{parse_decimal, ProductTemplateRepository, RepositoryError};
use crate::DbPool;

const COLUMNS: &str = "id, name, image_url, default_width, default_height, default_depth, \
                       pricing_formula, base_labor_cost, default_material_id";

pub struct SqlProductTemplateRepository {
    pool: DbPool,
}

impl SqlProductTemplateRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ProductTemplateRepository for SqlProductTemplateRepository {
    async fn find_by_id(
        &self,
        id: &ProductTemplateId,
    ) -> Result<Option<ProductTemplate>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM product_template WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(template_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<ProductTemplate>, RepositoryError> {
        let rows = sqlx::query(&format!("SELECT {COLUMNS} FROM product_template ORDER BY id ASC"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(template_from_row).collect()
    }

    async fn save(&self, template: ProductTemplate) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO product_template (
                id, name, image_url, default_width, default_height, default_depth,
                pricing_formula, base_labor_cost, default_material_id
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                image_url = excluded.image_url,
                default_width = excluded.default_width,
                default_height = excluded.default_height,
                default_depth = excluded.default_depth,
                pricing_formula = excluded.pricing_formula,
                base_labor_cost = excluded.base_labor_cost,
                default_material_id = excluded.default_material_id",
        )
        .bind(template.id.0)
        .bind(&template.name)
        .bind(template.image_url.as_deref())
        .bind(template.default_width.to_string())
        .bind(template.default_height.to_string())
        .bind(template.default_depth.to_string())
        .bind(&template.pricing_formula)
        .bind(template.base_labor_cost.to_string())
        .bind(template.default_material_id.0)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn template_from_row(row: &SqliteRow) -> Result<ProductTemplate, RepositoryError> {
    let default_width: String = row.try_get("default_width")?;
    let default_height: String = row.try_get("default_height")?;
    let default_depth: String = row.try_get("default_depth")?;
    let base_labor_cost: String = row.try_get("base_labor_cost")?;

    Ok(ProductTemplate {
        id: ProductTemplateId(row.try_get("id")?),
        name: row.try_get("name")?,
        image_url: row.try_get("image_url")?,
        default_width: parse_decimal("default_width", &default_width)?,
        default_height: parse_decimal("default_height", &default_height)?,
        default_depth: parse_decimal("default_depth", &default_depth)?,
        pricing_formula: row.try_get("pricing_formula")?,
        base_labor_cost: parse_decimal("base_labor_cost", &base_labor_cost)?,
        default_material_id: MaterialId(row.try_get("default_material_id")?),
    })
}
