//! Area-based line pricing and document totals.
//!
//! Width and height are millimetres and a material's `unit_price` is a price per square
//! metre, so a line's unit price is `width * height / 1_000_000 * unit_price`. Depth is
//! carried for display and never priced. All arithmetic is exact `Decimal`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cpq::catalog::MaterialLookup;
use crate::domain::material::Material;
use crate::domain::quotation::QuotationItemDraft;
use crate::errors::PricingError;

const SQUARE_MILLIMETRES_PER_SQUARE_METRE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub taxable_amount: Decimal,
    pub tax_amount: Decimal,
    pub grand_total: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTraceStep {
    pub stage: String,
    pub detail: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTrace {
    pub currency: String,
    pub steps: Vec<PricingTraceStep>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingResult {
    pub breakdown: PricingBreakdown,
    pub trace: PricingTrace,
}

#[derive(Clone, Copy, Debug)]
pub struct PricingInput<'a> {
    pub items: &'a [QuotationItemDraft],
    pub discount_percent: Decimal,
    pub tax_percent: Decimal,
    pub currency: &'a str,
}

pub trait PricingEngine: Send + Sync {
    fn price(
        &self,
        input: PricingInput<'_>,
        materials: &dyn MaterialLookup,
    ) -> Result<PricingResult, PricingError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DeterministicPricingEngine;

impl PricingEngine for DeterministicPricingEngine {
    fn price(
        &self,
        input: PricingInput<'_>,
        materials: &dyn MaterialLookup,
    ) -> Result<PricingResult, PricingError> {
        price_with_trace(input, materials)
    }
}

pub fn line_unit_price(
    item: &QuotationItemDraft,
    material: &Material,
) -> Result<Decimal, PricingError> {
    if item.width <= Decimal::ZERO || item.height <= Decimal::ZERO {
        return Err(PricingError::InvalidDimension {
            product_name: item.product_name.clone(),
            width: item.width,
            height: item.height,
        });
    }
    if material.id != item.material_id {
        return Err(PricingError::UnknownMaterial(item.material_id));
    }
    if material.unit_price < Decimal::ZERO {
        return Err(PricingError::InvalidUnitPrice {
            material_id: material.id,
            unit_price: material.unit_price,
        });
    }

    let area = checked("area", item.width.checked_mul(item.height))?;
    let area = checked("area", area.checked_div(SQUARE_MILLIMETRES_PER_SQUARE_METRE))?;
    checked("unit price", area.checked_mul(material.unit_price))
}

pub fn line_total(item: &QuotationItemDraft, material: &Material) -> Result<Decimal, PricingError> {
    let unit_price = line_unit_price(item, material)?;
    extend(item, unit_price)
}

/// Multiplies an already-computed unit price by the item quantity.
pub(crate) fn extend(item: &QuotationItemDraft, unit_price: Decimal) -> Result<Decimal, PricingError> {
    if item.quantity < 1 {
        return Err(PricingError::InvalidQuantity { product_name: item.product_name.clone() });
    }
    checked("line total", unit_price.checked_mul(Decimal::from(item.quantity)))
}

/// Turns a failed `checked_*` operation into a caller-facing error instead of a panic.
pub(crate) fn checked(stage: &'static str, value: Option<Decimal>) -> Result<Decimal, PricingError> {
    value.ok_or(PricingError::AmountOverflow { stage })
}

/// Resolves the item's material, reporting dimension errors ahead of lookup errors.
pub fn resolve_material<'m, L>(
    item: &QuotationItemDraft,
    materials: &'m L,
) -> Result<&'m Material, PricingError>
where
    L: MaterialLookup + ?Sized,
{
    if item.width <= Decimal::ZERO || item.height <= Decimal::ZERO {
        return Err(PricingError::InvalidDimension {
            product_name: item.product_name.clone(),
            width: item.width,
            height: item.height,
        });
    }
    materials.find_material(&item.material_id).ok_or(PricingError::UnknownMaterial(item.material_id))
}

pub fn subtotal<L>(items: &[QuotationItemDraft], materials: &L) -> Result<Decimal, PricingError>
where
    L: MaterialLookup + ?Sized,
{
    items.iter().try_fold(Decimal::ZERO, |sum, item| {
        let material = resolve_material(item, materials)?;
        checked("subtotal", sum.checked_add(line_total(item, material)?))
    })
}

pub fn aggregate(
    subtotal: Decimal,
    discount_percent: Decimal,
    tax_percent: Decimal,
) -> Result<PricingBreakdown, PricingError> {
    validate_percent("discount", discount_percent)?;
    validate_percent("tax", tax_percent)?;

    let discount_amount = percent_of("discount", subtotal, discount_percent)?;
    let taxable_amount = checked("taxable", subtotal.checked_sub(discount_amount))?;
    let tax_amount = percent_of("tax", taxable_amount, tax_percent)?;
    let grand_total = checked("grand total", taxable_amount.checked_add(tax_amount))?;

    Ok(PricingBreakdown { subtotal, discount_amount, taxable_amount, tax_amount, grand_total })
}

fn percent_of(stage: &'static str, base: Decimal, percent: Decimal) -> Result<Decimal, PricingError> {
    let scaled = checked(stage, base.checked_mul(percent))?;
    checked(stage, scaled.checked_div(Decimal::ONE_HUNDRED))
}

fn validate_percent(field: &'static str, value: Decimal) -> Result<(), PricingError> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(PricingError::InvalidPercent { field, value });
    }
    Ok(())
}

pub fn price_with_trace<L>(
    input: PricingInput<'_>,
    materials: &L,
) -> Result<PricingResult, PricingError>
where
    L: MaterialLookup + ?Sized,
{
    let mut steps = Vec::with_capacity(input.items.len() + 4);
    let mut running = Decimal::ZERO;

    for (index, item) in input.items.iter().enumerate() {
        let material = resolve_material(item, materials)?;
        let unit_price = line_unit_price(item, material)?;
        let total = extend(item, unit_price)?;
        running = checked("subtotal", running.checked_add(total))?;
        steps.push(PricingTraceStep {
            stage: format!("line[{index}]"),
            detail: format!(
                "{} {}x{}mm @ {} per m2 x {}",
                item.product_name, item.width, item.height, material.unit_price, item.quantity
            ),
            amount: total,
        });
    }

    let breakdown = aggregate(running, input.discount_percent, input.tax_percent)?;
    steps.push(step("subtotal", "sum(unit_price * quantity)".to_string(), breakdown.subtotal));
    steps.push(step(
        "discount",
        format!("subtotal * {}%", input.discount_percent),
        breakdown.discount_amount,
    ));
    steps.push(step(
        "tax",
        format!("(subtotal - discount) * {}%", input.tax_percent),
        breakdown.tax_amount,
    ));
    steps.push(step("grand_total", "taxable + tax".to_string(), breakdown.grand_total));

    Ok(PricingResult {
        breakdown,
        trace: PricingTrace { currency: input.currency.to_string(), steps },
    })
}

fn step(stage: &str, detail: String, amount: Decimal) -> PricingTraceStep {
    PricingTraceStep { stage: stage.to_string(), detail, amount }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{
        aggregate, line_total, line_unit_price, subtotal, DeterministicPricingEngine,
        PricingEngine, PricingInput,
    };
    use crate::cpq::catalog::MaterialCatalog;
    use crate::domain::material::{Material, MaterialId};
    use crate::domain::quotation::QuotationItemDraft;
    use crate::errors::PricingError;

    fn material(id: i64, unit_price: i64) -> Material {
        Material {
            id: MaterialId(id),
            name: format!("material-{id}"),
            unit: "m2".to_string(),
            unit_price: Decimal::from(unit_price),
        }
    }

    fn item(width: i64, height: i64, material_id: i64, quantity: u32) -> QuotationItemDraft {
        QuotationItemDraft {
            product_name: "Cabinet".to_string(),
            width: Decimal::from(width),
            height: Decimal::from(height),
            depth: Decimal::from(550),
            material_id: MaterialId(material_id),
            quantity,
        }
    }

    #[test]
    fn unit_price_is_area_in_square_metres_times_material_price() {
        let line = item(2000, 1000, 1, 3);
        let oak = material(1, 500_000);

        assert_eq!(line_unit_price(&line, &oak), Ok(Decimal::from(1_000_000)));
        assert_eq!(line_total(&line, &oak), Ok(Decimal::from(3_000_000)));
    }

    #[test]
    fn fractional_areas_stay_exact() {
        let line = item(600, 450, 1, 1);
        let price = line_unit_price(&line, &material(1, 1_000_000)).expect("price");
        assert_eq!(price, Decimal::from(270_000));

        let odd = item(333, 333, 1, 1);
        let price = line_unit_price(&odd, &material(1, 1)).expect("price");
        assert_eq!(price, Decimal::new(110_889, 6));
    }

    #[test]
    fn depth_does_not_affect_price() {
        let mut shallow = item(1000, 1000, 1, 1);
        let mut deep = shallow.clone();
        shallow.depth = Decimal::ZERO;
        deep.depth = Decimal::from(900);

        let oak = material(1, 100);
        assert_eq!(line_unit_price(&shallow, &oak), line_unit_price(&deep, &oak));
    }

    #[test]
    fn rejects_non_positive_dimensions_and_zero_quantity() {
        let oak = material(1, 500_000);

        assert!(matches!(
            line_unit_price(&item(0, 1000, 1, 1), &oak),
            Err(PricingError::InvalidDimension { .. })
        ));
        assert!(matches!(
            line_unit_price(&item(1000, -5, 1, 1), &oak),
            Err(PricingError::InvalidDimension { .. })
        ));
        assert!(matches!(
            line_total(&item(1000, 1000, 1, 0), &oak),
            Err(PricingError::InvalidQuantity { .. })
        ));
    }

    #[test]
    fn rejects_mismatched_or_negative_material() {
        assert_eq!(
            line_unit_price(&item(1000, 1000, 2, 1), &material(1, 10)),
            Err(PricingError::UnknownMaterial(MaterialId(2)))
        );
        assert!(matches!(
            line_unit_price(&item(1000, 1000, 1, 1), &material(1, -10)),
            Err(PricingError::InvalidUnitPrice { .. })
        ));
    }

    #[test]
    fn subtotal_sums_lines_and_reports_unknown_material() {
        let catalog = MaterialCatalog::new(vec![material(1, 500_000), material(2, 200_000)]);
        let items = vec![item(2000, 1000, 1, 3), item(1000, 500, 2, 2)];

        assert_eq!(subtotal(&items, &catalog), Ok(Decimal::from(3_200_000)));

        let unknown = vec![item(1000, 1000, 9, 1)];
        assert_eq!(subtotal(&unknown, &catalog), Err(PricingError::UnknownMaterial(MaterialId(9))));
        assert_eq!(subtotal(&[], &catalog), Ok(Decimal::ZERO));
    }

    #[test]
    fn dimension_errors_win_over_unknown_material() {
        let catalog = MaterialCatalog::default();
        let result = subtotal(&[item(0, 1000, 9, 1)], &catalog);
        assert!(matches!(result, Err(PricingError::InvalidDimension { .. })));
    }

    #[test]
    fn aggregate_applies_discount_before_tax() {
        let breakdown =
            aggregate(Decimal::from(10_000_000), Decimal::from(10), Decimal::from(8)).expect("ok");

        assert_eq!(breakdown.discount_amount, Decimal::from(1_000_000));
        assert_eq!(breakdown.taxable_amount, Decimal::from(9_000_000));
        assert_eq!(breakdown.tax_amount, Decimal::from(720_000));
        assert_eq!(breakdown.grand_total, Decimal::from(9_720_000));
    }

    #[test]
    fn zero_percents_leave_subtotal_unchanged() {
        let subtotal = Decimal::new(12_345_678, 2);
        let breakdown = aggregate(subtotal, Decimal::ZERO, Decimal::ZERO).expect("ok");
        assert_eq!(breakdown.grand_total, subtotal);
        assert_eq!(breakdown.discount_amount, Decimal::ZERO);
        assert_eq!(breakdown.tax_amount, Decimal::ZERO);
    }

    #[test]
    fn aggregate_rejects_out_of_range_percents() {
        let subtotal = Decimal::from(1000);
        assert_eq!(
            aggregate(subtotal, Decimal::from(101), Decimal::ZERO),
            Err(PricingError::InvalidPercent { field: "discount", value: Decimal::from(101) })
        );
        assert_eq!(
            aggregate(subtotal, Decimal::ZERO, Decimal::NEGATIVE_ONE),
            Err(PricingError::InvalidPercent { field: "tax", value: Decimal::NEGATIVE_ONE })
        );
        assert!(aggregate(subtotal, Decimal::ONE_HUNDRED, Decimal::ONE_HUNDRED).is_ok());
    }

    #[test]
    fn oversized_dimensions_report_overflow_instead_of_panicking() {
        let huge = QuotationItemDraft {
            width: Decimal::from(100_000_000_000_000i64),
            height: Decimal::from(100_000_000_000_000i64),
            ..item(1, 1, 1, 1)
        };

        assert!(matches!(
            line_unit_price(&huge, &material(1, 100_000_000)),
            Err(PricingError::AmountOverflow { .. })
        ));
    }

    #[test]
    fn oversized_quantity_or_subtotal_report_overflow() {
        let wide = item(1_000_000, 1_000_000, 1, u32::MAX);
        assert_eq!(
            line_total(&wide, &material(1, i64::MAX)),
            Err(PricingError::AmountOverflow { stage: "line total" })
        );

        assert_eq!(
            aggregate(Decimal::MAX, Decimal::from(50), Decimal::from(8)),
            Err(PricingError::AmountOverflow { stage: "discount" })
        );
    }

    #[test]
    fn engine_trace_lists_each_stage() {
        let catalog = MaterialCatalog::new(vec![material(1, 500_000)]);
        let items = vec![item(2000, 1000, 1, 3)];
        let result = DeterministicPricingEngine
            .price(
                PricingInput {
                    items: &items,
                    discount_percent: Decimal::from(10),
                    tax_percent: Decimal::from(8),
                    currency: "VND",
                },
                &catalog,
            )
            .expect("priced");

        assert_eq!(result.breakdown.subtotal, Decimal::from(3_000_000));
        assert_eq!(result.breakdown.grand_total, Decimal::from(2_916_000));
        assert_eq!(result.trace.currency, "VND");
        let stages: Vec<&str> = result.trace.steps.iter().map(|step| step.stage.as_str()).collect();
        assert_eq!(stages, vec!["line[0]", "subtotal", "discount", "tax", "grand_total"]);
    }

    mod properties {
        use proptest::prelude::*;
        use rust_decimal::Decimal;

        use crate::cpq::pricing::aggregate;

        fn percent() -> impl Strategy<Value = Decimal> {
            (0u32..=10_000).prop_map(|basis_points| Decimal::new(i64::from(basis_points), 2))
        }

        fn amount() -> impl Strategy<Value = Decimal> {
            (0i64..=1_000_000_000_000).prop_map(|minor| Decimal::new(minor, 2))
        }

        proptest! {
            #![proptest_config(ProptestConfig { cases: 512, ..ProptestConfig::default() })]

            #[test]
            fn aggregate_is_idempotent(subtotal in amount(), discount in percent(), tax in percent()) {
                let first = aggregate(subtotal, discount, tax).expect("valid input");
                let second = aggregate(subtotal, discount, tax).expect("valid input");
                prop_assert_eq!(first, second);
            }

            #[test]
            fn more_discount_never_raises_grand_total(
                subtotal in amount(),
                low in percent(),
                high in percent(),
                tax in percent(),
            ) {
                let (low, high) = if low <= high { (low, high) } else { (high, low) };
                let cheaper = aggregate(subtotal, high, tax).expect("valid input");
                let dearer = aggregate(subtotal, low, tax).expect("valid input");
                prop_assert!(cheaper.grand_total <= dearer.grand_total);
            }

            #[test]
            fn more_tax_never_lowers_grand_total(
                subtotal in amount(),
                discount in percent(),
                low in percent(),
                high in percent(),
            ) {
                let (low, high) = if low <= high { (low, high) } else { (high, low) };
                let lighter = aggregate(subtotal, discount, low).expect("valid input");
                let heavier = aggregate(subtotal, discount, high).expect("valid input");
                prop_assert!(heavier.grand_total >= lighter.grand_total);
            }
        }
    }
}
