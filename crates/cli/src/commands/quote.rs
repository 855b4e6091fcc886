use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use quotecraft_core::config::AppConfig;
use quotecraft_core::cpq::snapshot::frozen_breakdown;
use quotecraft_core::domain::actor::Actor;
use quotecraft_core::domain::customer::CustomerId;
use quotecraft_core::domain::product::ProductTemplateId;
use quotecraft_core::domain::quotation::{NewQuotation, Quotation, QuotationId, QuotationStatus};
use quotecraft_core::flows::available_transitions;
use quotecraft_db::{CatalogService, DbPool, QuotationService};

use crate::commands::{
    interface_failure, new_correlation_id, settle, to_json, with_database, CommandFailure,
    CommandResult,
};

pub fn create(file: &Path, user: &str, role_claim: &str) -> CommandResult {
    let new = match read_new_quotation("quote.create", file) {
        Ok(new) => new,
        Err(failure) => return failure,
    };
    let actor = Actor::from_claims(user, role_claim);

    settle(with_database("quote.create", |config, pool| create_in(config, pool, new, actor)))
}

/// Pre-fills a draft payload from product templates. With `out`, the payload is also
/// written there, ready for `quote create --file`.
pub fn draft(template_ids: &[i64], customer_id: i64, out: Option<&Path>) -> CommandResult {
    let templates: Vec<ProductTemplateId> =
        template_ids.iter().copied().map(ProductTemplateId).collect();
    let out = out.map(Path::to_path_buf);

    settle(with_database("quote.draft", |_config, pool| {
        draft_in(pool, templates, CustomerId(customer_id), out)
    }))
}

/// Validation findings and totals for a draft file without saving it.
pub fn preview(file: &Path) -> CommandResult {
    let new = match read_new_quotation("quote.preview", file) {
        Ok(new) => new,
        Err(failure) => return failure,
    };

    settle(with_database("quote.preview", |config, pool| preview_in(config, pool, new)))
}

pub fn show(id: i64, role_claim: &str) -> CommandResult {
    let viewer = Actor::from_claims("cli", role_claim);
    settle(with_database("quote.show", |config, pool| show_in(config, pool, QuotationId(id), viewer)))
}

pub fn list() -> CommandResult {
    settle(with_database("quote.list", list_in))
}

/// `status` accepts a status name (`Sent`) or its wire code (`1`).
pub fn transition(id: i64, status: &str, user: &str, role_claim: &str) -> CommandResult {
    let correlation_id = new_correlation_id();
    let requested = match status.parse::<QuotationStatus>() {
        Ok(requested) => requested,
        Err(error) => {
            return interface_failure("quote.transition", error.into(), &correlation_id);
        }
    };
    let actor = Actor::from_claims(user, role_claim);

    settle(with_database("quote.transition", |config, pool| {
        transition_in(config, pool, QuotationId(id), requested, actor, correlation_id)
    }))
}

async fn create_in(
    config: AppConfig,
    pool: DbPool,
    new: NewQuotation,
    actor: Actor,
) -> Result<CommandResult, CommandFailure> {
    let service = QuotationService::sql(pool, config.pricing.currency);
    let correlation_id = new_correlation_id();

    match service.create_quotation(&new, &actor, &correlation_id).await {
        Ok(quotation) => Ok(CommandResult::success_with_data(
            "quote.create",
            format!("created quotation {} in Draft", quotation.id),
            detail_json(&quotation, service.currency(), &actor)?,
        )),
        Err(error) => Ok(interface_failure("quote.create", error.into(), &correlation_id)),
    }
}

async fn draft_in(
    pool: DbPool,
    templates: Vec<ProductTemplateId>,
    customer_id: CustomerId,
    out: Option<PathBuf>,
) -> Result<CommandResult, CommandFailure> {
    let catalog = CatalogService::sql(pool);

    let new = match catalog.draft_from_templates(&templates, customer_id).await {
        Ok(new) => new,
        Err(error) => {
            return Ok(interface_failure("quote.draft", error.into(), &new_correlation_id()));
        }
    };

    let message = match &out {
        Some(path) => {
            let body = serde_json::to_string_pretty(&new)
                .map_err(|error| ("serialization", error.to_string(), 12u8))?;
            fs::write(path, body).map_err(|error| {
                ("input", format!("could not write `{}`: {error}", path.display()), 7u8)
            })?;
            format!("draft with {} line(s) written to {}", new.items.len(), path.display())
        }
        None => format!("draft with {} line(s)", new.items.len()),
    };

    Ok(CommandResult::success_with_data("quote.draft", message, to_json(&new)?))
}

async fn preview_in(
    config: AppConfig,
    pool: DbPool,
    new: NewQuotation,
) -> Result<CommandResult, CommandFailure> {
    let service = QuotationService::sql(pool, config.pricing.currency);

    match service.preview(&new).await {
        Ok(evaluation) => {
            let message = if evaluation.constraints.valid {
                "draft is valid".to_string()
            } else {
                format!("draft has {} problem(s)", evaluation.constraints.violations.len())
            };
            Ok(CommandResult::success_with_data("quote.preview", message, to_json(&evaluation)?))
        }
        Err(error) => Ok(interface_failure("quote.preview", error.into(), &new_correlation_id())),
    }
}

async fn show_in(
    config: AppConfig,
    pool: DbPool,
    id: QuotationId,
    viewer: Actor,
) -> Result<CommandResult, CommandFailure> {
    let service = QuotationService::sql(pool, config.pricing.currency);

    match service.get(&id).await {
        Ok(quotation) => Ok(CommandResult::success_with_data(
            "quote.show",
            format!("quotation {} is {}", quotation.id, quotation.status),
            detail_json(&quotation, service.currency(), &viewer)?,
        )),
        Err(error) => Ok(interface_failure("quote.show", error.into(), &new_correlation_id())),
    }
}

async fn list_in(config: AppConfig, pool: DbPool) -> Result<CommandResult, CommandFailure> {
    let service = QuotationService::sql(pool, config.pricing.currency);

    match service.list().await {
        Ok(quotations) => {
            let rows: Vec<Value> = quotations
                .iter()
                .map(|quotation| {
                    json!({
                        "id": quotation.id,
                        "customer_id": quotation.customer_id,
                        "status": quotation.status,
                        "item_count": quotation.items.len(),
                        "total_amount": quotation.total_amount,
                        "created_at": quotation.created_at,
                    })
                })
                .collect();
            Ok(CommandResult::success_with_data(
                "quote.list",
                format!("{} quotation(s)", rows.len()),
                json!({ "currency": service.currency(), "quotations": rows }),
            ))
        }
        Err(error) => Ok(interface_failure("quote.list", error.into(), &new_correlation_id())),
    }
}

async fn transition_in(
    config: AppConfig,
    pool: DbPool,
    id: QuotationId,
    requested: QuotationStatus,
    actor: Actor,
    correlation_id: String,
) -> Result<CommandResult, CommandFailure> {
    let service = QuotationService::sql(pool, config.pricing.currency);

    match service.transition(&id, requested, &actor, &correlation_id).await {
        Ok(quotation) => Ok(CommandResult::success_with_data(
            "quote.transition",
            format!("quotation {} moved to {}", quotation.id, quotation.status),
            detail_json(&quotation, service.currency(), &actor)?,
        )),
        Err(error) => Ok(interface_failure("quote.transition", error.into(), &correlation_id)),
    }
}

fn read_new_quotation(command: &str, file: &Path) -> Result<NewQuotation, CommandResult> {
    let raw = fs::read_to_string(file).map_err(|error| {
        CommandResult::failure(
            command,
            "input",
            format!("could not read `{}`: {error}", file.display()),
            7,
        )
    })?;
    serde_json::from_str(&raw).map_err(|error| {
        CommandResult::failure(
            command,
            "input",
            format!("`{}` is not a valid quotation payload: {error}", file.display()),
            7,
        )
    })
}

fn detail_json(
    quotation: &Quotation,
    currency: &str,
    viewer: &Actor,
) -> Result<Value, CommandFailure> {
    let breakdown =
        frozen_breakdown(quotation).map_err(|error| ("invariant", error.to_string(), 12u8))?;

    Ok(json!({
        "currency": currency,
        "quotation": to_json(quotation)?,
        "breakdown": to_json(&breakdown)?,
        "available_transitions": available_transitions(quotation.status, viewer.role),
    }))
}
