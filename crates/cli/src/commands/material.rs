use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::json;

use quotecraft_core::config::AppConfig;
use quotecraft_core::domain::actor::Actor;
use quotecraft_core::domain::material::MaterialId;
use quotecraft_db::{CatalogService, DbPool};

use crate::commands::{
    interface_failure, new_correlation_id, settle, to_json, with_database, CommandFailure,
    CommandResult,
};

pub fn list() -> CommandResult {
    settle(with_database("material.list", list_in))
}

/// Reprices a material for future quotations. `price` is a decimal per catalog unit.
pub fn set_price(id: i64, price: &str, user: &str, role_claim: &str) -> CommandResult {
    let unit_price = match Decimal::from_str(price.trim()) {
        Ok(unit_price) => unit_price,
        Err(error) => {
            return CommandResult::failure(
                "material.set_price",
                "input",
                format!("`{price}` is not a decimal price: {error}"),
                7,
            );
        }
    };
    let actor = Actor::from_claims(user, role_claim);

    settle(with_database("material.set_price", |config, pool| {
        set_price_in(config, pool, MaterialId(id), unit_price, actor)
    }))
}

async fn list_in(config: AppConfig, pool: DbPool) -> Result<CommandResult, CommandFailure> {
    let catalog = CatalogService::sql(pool);

    match catalog.list_materials().await {
        Ok(materials) => Ok(CommandResult::success_with_data(
            "material.list",
            format!("{} material(s)", materials.len()),
            json!({ "currency": config.pricing.currency, "materials": to_json(&materials)? }),
        )),
        Err(error) => Ok(interface_failure("material.list", error.into(), &new_correlation_id())),
    }
}

async fn set_price_in(
    config: AppConfig,
    pool: DbPool,
    id: MaterialId,
    unit_price: Decimal,
    actor: Actor,
) -> Result<CommandResult, CommandFailure> {
    let catalog = CatalogService::sql(pool);
    let correlation_id = new_correlation_id();

    match catalog.set_material_price(&id, unit_price, &actor, &correlation_id).await {
        Ok(material) => Ok(CommandResult::success_with_data(
            "material.set_price",
            format!(
                "material {} now costs {} {} per {}",
                material.id, material.unit_price, config.pricing.currency, material.unit
            ),
            json!({ "currency": config.pricing.currency, "material": to_json(&material)? }),
        )),
        Err(error) => Ok(interface_failure("material.set_price", error.into(), &correlation_id)),
    }
}
