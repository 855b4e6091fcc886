//! Dashboard figures derived from stored quotations.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::quotation::{Quotation, QuotationStatus};
use crate::errors::PricingError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartDataPoint {
    pub date: NaiveDate,
    pub revenue: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_revenue: Decimal,
    pub total_quotations: usize,
    pub total_customers: usize,
    pub total_products: usize,
    pub chart_data: Vec<ChartDataPoint>,
}

/// Revenue only counts approved quotations, at their frozen totals.
pub fn summarize(
    quotations: &[Quotation],
    customer_count: usize,
    product_count: usize,
) -> Result<DashboardSummary, PricingError> {
    let mut by_day: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    let mut total_revenue = Decimal::ZERO;

    for quotation in quotations.iter().filter(|q| q.status == QuotationStatus::Approved) {
        total_revenue = add_revenue(total_revenue, quotation.total_amount)?;
        let day = by_day.entry(quotation.created_at.date_naive()).or_insert(Decimal::ZERO);
        *day = add_revenue(*day, quotation.total_amount)?;
    }

    Ok(DashboardSummary {
        total_revenue,
        total_quotations: quotations.len(),
        total_customers: customer_count,
        total_products: product_count,
        chart_data: by_day
            .into_iter()
            .map(|(date, revenue)| ChartDataPoint { date, revenue })
            .collect(),
    })
}

fn add_revenue(sum: Decimal, amount: Decimal) -> Result<Decimal, PricingError> {
    sum.checked_add(amount).ok_or(PricingError::AmountOverflow { stage: "revenue" })
}
