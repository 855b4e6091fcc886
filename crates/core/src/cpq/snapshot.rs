//! Freezing live catalog prices into quotation lines.
//!
//! [`materialize`] is the only place a material's current `unit_price` is read into a
//! quotation. Everything downstream works from `unit_price_snapshot` / `total_price`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::cpq::catalog::MaterialLookup;
use crate::cpq::pricing::{self, PricingBreakdown};
use crate::domain::quotation::{
    NewQuotation, Quotation, QuotationId, QuotationItem, QuotationItemDraft, QuotationStatus,
};
use crate::errors::{DomainError, PricingError};

pub fn materialize<L>(
    items: &[QuotationItemDraft],
    materials: &L,
) -> Result<Vec<QuotationItem>, PricingError>
where
    L: MaterialLookup + ?Sized,
{
    items
        .iter()
        .map(|item| {
            let material = pricing::resolve_material(item, materials)?;
            let unit_price_snapshot = pricing::line_unit_price(item, material)?;
            let total_price = pricing::extend(item, unit_price_snapshot)?;
            Ok(QuotationItem {
                product_name: item.product_name.clone(),
                width: item.width,
                height: item.height,
                depth: item.depth,
                material_id: item.material_id,
                quantity: item.quantity,
                unit_price_snapshot,
                total_price,
            })
        })
        .collect()
}

/// Assembles a new `Draft` quotation with frozen line prices and a derived total.
pub fn build_quotation<L>(
    id: QuotationId,
    new_quotation: &NewQuotation,
    materials: &L,
    created_at: DateTime<Utc>,
) -> Result<Quotation, DomainError>
where
    L: MaterialLookup + ?Sized,
{
    if new_quotation.customer_id.0 <= 0 {
        return Err(DomainError::MissingCustomer);
    }
    if new_quotation.items.is_empty() {
        return Err(DomainError::EmptyQuotation);
    }

    let items = materialize(&new_quotation.items, materials)?;
    let breakdown = aggregate_frozen(
        &items,
        new_quotation.discount_percent,
        new_quotation.tax_percent,
    )?;

    Ok(Quotation {
        id,
        customer_id: new_quotation.customer_id,
        status: QuotationStatus::Draft,
        discount_percent: new_quotation.discount_percent,
        tax_percent: new_quotation.tax_percent,
        items,
        total_amount: breakdown.grand_total,
        created_at,
        version: 0,
    })
}

/// Breakdown of a stored quotation, derived from its frozen line totals only.
pub fn frozen_breakdown(quotation: &Quotation) -> Result<PricingBreakdown, PricingError> {
    aggregate_frozen(&quotation.items, quotation.discount_percent, quotation.tax_percent)
}

/// Confirms a loaded quotation's `total_amount` still matches its frozen lines.
pub fn verify_frozen_total(quotation: &Quotation) -> Result<(), DomainError> {
    for item in &quotation.items {
        let expected = item.unit_price_snapshot.checked_mul(Decimal::from(item.quantity));
        if expected != Some(item.total_price) {
            return Err(DomainError::InvariantViolation(format!(
                "line `{}` total {} does not equal snapshot {} x {}",
                item.product_name, item.total_price, item.unit_price_snapshot, item.quantity
            )));
        }
    }

    let breakdown = frozen_breakdown(quotation).map_err(|error| {
        DomainError::InvariantViolation(format!(
            "quotation {} cannot be re-totalled from its frozen lines: {error}",
            quotation.id
        ))
    })?;
    if breakdown.grand_total != quotation.total_amount {
        return Err(DomainError::InvariantViolation(format!(
            "quotation {} total {} does not match frozen lines {}",
            quotation.id, quotation.total_amount, breakdown.grand_total
        )));
    }
    Ok(())
}

fn aggregate_frozen(
    items: &[QuotationItem],
    discount_percent: Decimal,
    tax_percent: Decimal,
) -> Result<PricingBreakdown, PricingError> {
    let subtotal = items.iter().try_fold(Decimal::ZERO, |sum, item| {
        pricing::checked("subtotal", sum.checked_add(item.total_price))
    })?;
    pricing::aggregate(subtotal, discount_percent, tax_percent)
}
