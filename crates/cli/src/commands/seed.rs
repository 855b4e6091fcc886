use quotecraft_core::config::AppConfig;
use quotecraft_db::{DbPool, DemoSeedDataset, SeedResult};

use crate::commands::{with_database, CommandFailure, CommandResult};

pub fn run() -> CommandResult {
    match with_database("seed", load_and_verify) {
        Ok(seeded) => CommandResult::success(
            "seed",
            format!(
                "demo catalog loaded: {} materials, {} customers, {} product templates",
                seeded.materials, seeded.customers, seeded.product_templates
            ),
        ),
        Err(failure) => failure,
    }
}

async fn load_and_verify(_config: AppConfig, pool: DbPool) -> Result<SeedResult, CommandFailure> {
    let seeded = DemoSeedDataset::load(&pool)
        .await
        .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

    let verification = DemoSeedDataset::verify(&pool)
        .await
        .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

    if !verification.all_present {
        let failed_checks = failed_check_labels(&verification.checks);
        return Err(("seed_verification", verification_message(&failed_checks), 6));
    }

    Ok(seeded)
}

fn failed_check_labels(checks: &[(&'static str, bool)]) -> Vec<&'static str> {
    checks.iter().filter_map(|(check, passed)| (!passed).then_some(*check)).collect()
}

fn verification_message(failed_checks: &[&str]) -> String {
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}
