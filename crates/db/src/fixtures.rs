use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

const SEED_MATERIAL_IDS: &[i64] = &[1, 2, 3, 4];
const SEED_CUSTOMER_IDS: &[i64] = &[1, 2, 3];
const SEED_PRODUCT_TEMPLATE_IDS: &[i64] = &[1, 2, 3, 4];

/// Demo catalog: materials, customers and product templates for local runs.
pub struct DemoSeedDataset;

impl DemoSeedDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_seed.sql");

    /// Loads the demo rows. Existing rows with the same ids are left alone.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        Ok(SeedResult {
            materials: SEED_MATERIAL_IDS.len(),
            customers: SEED_CUSTOMER_IDS.len(),
            product_templates: SEED_PRODUCT_TEMPLATE_IDS.len(),
        })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let checks = vec![
            ("materials", count_present(pool, "material", SEED_MATERIAL_IDS).await?),
            ("customers", count_present(pool, "customer", SEED_CUSTOMER_IDS).await?),
            (
                "product_templates",
                count_present(pool, "product_template", SEED_PRODUCT_TEMPLATE_IDS).await?,
            ),
        ];

        let all_present = checks.iter().all(|(_, present)| *present);
        Ok(VerificationResult { all_present, checks })
    }
}

async fn count_present(pool: &DbPool, table: &str, ids: &[i64]) -> Result<bool, RepositoryError> {
    let id_list = ids.iter().map(i64::to_string).collect::<Vec<_>>().join(", ");
    let present: i64 =
        sqlx::query_scalar(&format!("SELECT COUNT(1) FROM {table} WHERE id IN ({id_list})"))
            .fetch_one(pool)
            .await?;
    Ok(present == ids.len() as i64)
}

#[derive(Debug)]
pub struct SeedResult {
    pub materials: usize,
    pub customers: usize,
    pub product_templates: usize,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
