use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::material::MaterialId;
use crate::domain::quotation::QuotationItemDraft;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductTemplateId(pub i64);

/// Library entry used to pre-fill quotation lines.
///
/// `pricing_formula` and `base_labor_cost` are stored for the catalog screens only.
/// Pricing always uses the area formula in [`crate::cpq::pricing`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductTemplate {
    pub id: ProductTemplateId,
    pub name: String,
    pub image_url: Option<String>,
    pub default_width: Decimal,
    pub default_height: Decimal,
    pub default_depth: Decimal,
    pub pricing_formula: String,
    pub base_labor_cost: Decimal,
    pub default_material_id: MaterialId,
}

impl ProductTemplate {
    pub fn draft_item(&self) -> QuotationItemDraft {
        QuotationItemDraft {
            product_name: self.name.clone(),
            width: self.default_width,
            height: self.default_height,
            depth: self.default_depth,
            material_id: self.default_material_id,
            quantity: 1,
        }
    }
}
