use sqlx::{sqlite::SqliteRow, Row};

use quotecraft_core::domain::material::{Material, MaterialId};

use super::{parse_decimal, MaterialRepository, RepositoryError};
use crate::DbPool;

pub struct SqlMaterialRepository {
    pool: DbPool,
}

impl SqlMaterialRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl MaterialRepository for SqlMaterialRepository {
    async fn find_by_id(&self, id: &MaterialId) -> Result<Option<Material>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, unit, unit_price FROM material WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(material_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<Material>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name, unit, unit_price FROM material ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(material_from_row).collect()
    }

    /// Upsert by id. Existing quotations keep their own price snapshots.
    async fn save(&self, material: Material) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO material (id, name, unit, unit_price) VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                unit = excluded.unit,
                unit_price = excluded.unit_price",
        )
        .bind(material.id.0)
        .bind(&material.name)
        .bind(&material.unit)
        .bind(material.unit_price.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn material_from_row(row: &SqliteRow) -> Result<Material, RepositoryError> {
    let unit_price: String = row.try_get("unit_price")?;

    Ok(Material {
        id: MaterialId(row.try_get("id")?),
        name: row.try_get("name")?,
        unit: row.try_get("unit")?,
        unit_price: parse_decimal("unit_price", &unit_price)?,
    })
}
