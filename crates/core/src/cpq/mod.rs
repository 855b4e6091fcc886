pub mod catalog;
pub mod constraints;
pub mod pricing;
pub mod snapshot;

use serde::{Deserialize, Serialize};

use crate::domain::quotation::NewQuotation;
use crate::errors::PricingError;

use self::{
    catalog::MaterialLookup,
    constraints::{ConstraintEngine, ConstraintResult, DeterministicConstraintEngine},
    pricing::{DeterministicPricingEngine, PricingEngine, PricingInput, PricingResult},
};

#[derive(Clone, Copy, Debug)]
pub struct CpqEvaluationInput<'a> {
    pub quotation: &'a NewQuotation,
    pub currency: &'a str,
}

/// Live preview of a draft: validation findings plus totals when the draft prices cleanly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpqEvaluation {
    pub constraints: ConstraintResult,
    pub pricing: Option<PricingResult>,
    pub pricing_error: Option<String>,
}

pub trait CpqRuntime: Send + Sync {
    fn evaluate(&self, input: CpqEvaluationInput<'_>, materials: &dyn MaterialLookup)
        -> CpqEvaluation;
}

pub struct DeterministicCpqRuntime<C, P> {
    constraint_engine: C,
    pricing_engine: P,
}

impl<C, P> DeterministicCpqRuntime<C, P> {
    pub fn new(constraint_engine: C, pricing_engine: P) -> Self {
        Self { constraint_engine, pricing_engine }
    }
}

impl Default for DeterministicCpqRuntime<DeterministicConstraintEngine, DeterministicPricingEngine> {
    fn default() -> Self {
        Self::new(DeterministicConstraintEngine, DeterministicPricingEngine)
    }
}

impl<C, P> CpqRuntime for DeterministicCpqRuntime<C, P>
where
    C: ConstraintEngine,
    P: PricingEngine,
{
    fn evaluate(
        &self,
        input: CpqEvaluationInput<'_>,
        materials: &dyn MaterialLookup,
    ) -> CpqEvaluation {
        let constraints = self.constraint_engine.validate(input.quotation, materials);
        let priced: Result<PricingResult, PricingError> = self.pricing_engine.price(
            PricingInput {
                items: &input.quotation.items,
                discount_percent: input.quotation.discount_percent,
                tax_percent: input.quotation.tax_percent,
                currency: input.currency,
            },
            materials,
        );

        match priced {
            Ok(pricing) => CpqEvaluation { constraints, pricing: Some(pricing), pricing_error: None },
            Err(error) => {
                CpqEvaluation { constraints, pricing: None, pricing_error: Some(error.to_string()) }
            }
        }
    }
}
