use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cpq::catalog::MaterialLookup;
use crate::domain::quotation::NewQuotation;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintViolation {
    pub code: String,
    pub message: String,
    pub line_index: Option<usize>,
    pub suggestion: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintResult {
    pub valid: bool,
    pub violations: Vec<ConstraintViolation>,
}

impl Default for ConstraintResult {
    fn default() -> Self {
        Self { valid: true, violations: Vec::new() }
    }
}

pub trait ConstraintEngine: Send + Sync {
    fn validate(&self, input: &NewQuotation, materials: &dyn MaterialLookup) -> ConstraintResult;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DeterministicConstraintEngine;

impl ConstraintEngine for DeterministicConstraintEngine {
    fn validate(&self, input: &NewQuotation, materials: &dyn MaterialLookup) -> ConstraintResult {
        validate_new_quotation(input, materials)
    }
}

/// Collects every problem with a draft at once, unlike pricing which stops at the first.
pub fn validate_new_quotation<L>(input: &NewQuotation, materials: &L) -> ConstraintResult
where
    L: MaterialLookup + ?Sized,
{
    let mut result = ConstraintResult::default();

    if input.customer_id.0 <= 0 {
        result.violations.push(violation(
            "MISSING_CUSTOMER",
            "Quotation has no customer selected".to_string(),
            None,
            "Choose a customer before saving",
        ));
    }

    if input.items.is_empty() {
        result.violations.push(violation(
            "EMPTY_QUOTATION",
            "Quotation must contain at least one line item".to_string(),
            None,
            "Add a row or pick a product from the library",
        ));
    }

    for (field, value) in [("discount", input.discount_percent), ("tax", input.tax_percent)] {
        if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
            result.violations.push(violation(
                "PERCENT_OUT_OF_RANGE",
                format!("{field} percent {value} is outside 0..=100"),
                None,
                "Use a percentage between 0 and 100",
            ));
        }
    }

    for (index, item) in input.items.iter().enumerate() {
        let label = if item.product_name.trim().is_empty() {
            format!("row {}", index + 1)
        } else {
            item.product_name.trim().to_string()
        };

        if item.width <= Decimal::ZERO || item.height <= Decimal::ZERO {
            result.violations.push(violation(
                "NON_POSITIVE_DIMENSION",
                format!("{label} has width {} and height {}", item.width, item.height),
                Some(index),
                "Width and height are millimetres and must be greater than zero",
            ));
        }

        if item.depth < Decimal::ZERO {
            result.violations.push(violation(
                "NEGATIVE_DEPTH",
                format!("{label} has negative depth {}", item.depth),
                Some(index),
                "Use zero when depth does not apply",
            ));
        }

        if item.quantity == 0 {
            result.violations.push(violation(
                "ZERO_QUANTITY",
                format!("{label} has zero quantity"),
                Some(index),
                "Use a positive integer quantity",
            ));
        }

        if materials.find_material(&item.material_id).is_none() {
            result.violations.push(violation(
                "UNKNOWN_MATERIAL",
                format!("{label} references unknown material {}", item.material_id),
                Some(index),
                "Pick a material from the catalog",
            ));
        }
    }

    if !result.violations.is_empty() {
        result.valid = false;
    }

    result
}

fn violation(
    code: &str,
    message: String,
    line_index: Option<usize>,
    suggestion: &str,
) -> ConstraintViolation {
    ConstraintViolation {
        code: code.to_string(),
        message,
        line_index,
        suggestion: Some(suggestion.to_string()),
    }
}
