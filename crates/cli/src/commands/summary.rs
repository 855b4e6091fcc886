use serde_json::json;

use quotecraft_core::config::AppConfig;
use quotecraft_core::errors::{ApplicationError, DomainError};
use quotecraft_core::reporting::summarize;
use quotecraft_db::repositories::{
    CustomerRepository, ProductTemplateRepository, SqlCustomerRepository,
    SqlProductTemplateRepository,
};
use quotecraft_db::{DbPool, QuotationService};

use crate::commands::{
    interface_failure, new_correlation_id, settle, to_json, with_database, CommandFailure,
    CommandResult,
};

pub fn run() -> CommandResult {
    settle(with_database("summary", dashboard))
}

async fn dashboard(config: AppConfig, pool: DbPool) -> Result<CommandResult, CommandFailure> {
    let customers = SqlCustomerRepository::new(pool.clone());
    let templates = SqlProductTemplateRepository::new(pool.clone());
    let service = QuotationService::sql(pool, config.pricing.currency);

    let quotations = match service.list().await {
        Ok(quotations) => quotations,
        Err(error) => {
            return Ok(interface_failure("summary", error.into(), &new_correlation_id()));
        }
    };
    let customer_count =
        customers.list().await.map_err(|error| ("persistence", error.to_string(), 12u8))?.len();
    let product_count =
        templates.list().await.map_err(|error| ("persistence", error.to_string(), 12u8))?.len();

    let summary = match summarize(&quotations, customer_count, product_count) {
        Ok(summary) => summary,
        Err(error) => {
            let error = ApplicationError::from(DomainError::from(error));
            return Ok(interface_failure("summary", error, &new_correlation_id()));
        }
    };
    tracing::debug!(
        event_name = "reporting.summary_built",
        quotations = summary.total_quotations,
        chart_points = summary.chart_data.len(),
        "dashboard summary built"
    );

    Ok(CommandResult::success_with_data(
        "summary",
        format!(
            "approved revenue {} {} across {} quotation(s)",
            summary.total_revenue,
            service.currency(),
            summary.total_quotations
        ),
        json!({ "currency": service.currency(), "summary": to_json(&summary)? }),
    ))
}
