pub mod audit;
pub mod config;
pub mod cpq;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod reporting;

pub use cpq::catalog::{MaterialCatalog, MaterialLookup};
pub use cpq::pricing::{
    DeterministicPricingEngine, PricingBreakdown, PricingEngine, PricingInput, PricingResult,
    PricingTrace,
};
pub use cpq::snapshot::{build_quotation, frozen_breakdown, materialize, verify_frozen_total};
pub use domain::actor::{Actor, Role};
pub use domain::customer::{Customer, CustomerId};
pub use domain::material::{Material, MaterialId};
pub use domain::product::{ProductTemplate, ProductTemplateId};
pub use domain::quotation::{
    NewQuotation, Quotation, QuotationId, QuotationItem, QuotationItemDraft, QuotationStatus,
};
pub use errors::{
    ApplicationError, DomainError, InterfaceError, LifecycleError, PricingError,
};
pub use flows::{QuotationLifecycle, TransitionOutcome};
pub use reporting::{ChartDataPoint, DashboardSummary};
