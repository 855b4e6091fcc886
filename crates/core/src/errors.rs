use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::actor::Role;
use crate::domain::material::MaterialId;
use crate::domain::quotation::QuotationStatus;

/// Input-validation failures raised while pricing line items. Always caller-correctable.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("invalid dimensions for `{product_name}`: width {width} and height {height} must be greater than zero")]
    InvalidDimension { product_name: String, width: Decimal, height: Decimal },
    #[error("invalid quantity for `{product_name}`: must be at least 1")]
    InvalidQuantity { product_name: String },
    #[error("{field} percent {value} must be within 0..=100")]
    InvalidPercent { field: &'static str, value: Decimal },
    #[error("material {0} does not resolve against the supplied catalog")]
    UnknownMaterial(MaterialId),
    #[error("material {material_id} has negative unit price {unit_price}")]
    InvalidUnitPrice { material_id: MaterialId, unit_price: Decimal },
    #[error("{stage} amount is too large to represent")]
    AmountOverflow { stage: &'static str },
}

/// Workflow-policy rejections from the quotation lifecycle.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("illegal quotation transition from {from} to {to}")]
    IllegalTransition { from: QuotationStatus, to: QuotationStatus },
    #[error("quotation is in terminal state {state} and cannot move to {requested}")]
    TerminalState { state: QuotationStatus, requested: QuotationStatus },
    #[error("quotation is already in state {state}")]
    NoOpTransition { state: QuotationStatus },
    #[error("role {role} may not move a quotation from {from} to {to}")]
    Unauthorized { role: Role, from: QuotationStatus, to: QuotationStatus },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error("quotation must contain at least one item")]
    EmptyQuotation,
    #[error("quotation must reference a customer")]
    MissingCustomer,
    #[error("unknown quotation status `{0}`")]
    UnknownStatus(String),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("{entity} `{id}` was not found")]
    NotFound { entity: &'static str, id: String },
    #[error("concurrent update conflict: {0}")]
    Conflict(String),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("forbidden: {message}")]
    Forbidden { message: String, correlation_id: String },
    #[error("not found: {message}")]
    NotFound { message: String, correlation_id: String },
    #[error("conflict: {message}")]
    Conflict { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::Forbidden { .. } => "You are not allowed to perform this action.",
            Self::NotFound { .. } => "The requested record does not exist.",
            Self::Conflict { .. } => {
                "The quotation was changed by someone else. Reload it and try again."
            }
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::Forbidden { correlation_id, .. }
            | Self::NotFound { correlation_id, .. }
            | Self::Conflict { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::Forbidden { correlation_id: id, .. }
            | InterfaceError::NotFound { correlation_id: id, .. }
            | InterfaceError::Conflict { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::Domain(DomainError::Lifecycle(
                error @ LifecycleError::Unauthorized { .. },
            )) => Self::Forbidden { message: error.to_string(), correlation_id },
            ApplicationError::Domain(error @ DomainError::InvariantViolation(_)) => {
                Self::Internal { message: error.to_string(), correlation_id }
            }
            ApplicationError::Domain(error) => {
                Self::BadRequest { message: error.to_string(), correlation_id }
            }
            ApplicationError::NotFound { .. } => {
                Self::NotFound { message: value.to_string(), correlation_id }
            }
            ApplicationError::Conflict(message) => Self::Conflict { message, correlation_id },
            ApplicationError::Persistence(message) => {
                Self::ServiceUnavailable { message, correlation_id }
            }
            ApplicationError::Configuration(message) => Self::Internal { message, correlation_id },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::actor::Role;
    use crate::domain::quotation::QuotationStatus;
    use crate::errors::{
        ApplicationError, DomainError, InterfaceError, LifecycleError, PricingError,
    };

    #[test]
    fn validation_error_maps_to_bad_request_interface_error() {
        let interface = ApplicationError::from(DomainError::Pricing(
            PricingError::InvalidQuantity { product_name: "Shelf".to_owned() },
        ))
        .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest {
                ref correlation_id,
                ..
            } if correlation_id == "req-1"
        ));
        assert_eq!(
            interface.user_message(),
            "The request could not be processed. Check inputs and try again."
        );
    }

    #[test]
    fn unauthorized_transition_maps_to_forbidden() {
        let interface = ApplicationError::from(DomainError::from(LifecycleError::Unauthorized {
            role: Role::Staff,
            from: QuotationStatus::Sent,
            to: QuotationStatus::Approved,
        }))
        .into_interface("req-2");

        assert!(matches!(interface, InterfaceError::Forbidden { .. }));
        assert_eq!(interface.correlation_id(), "req-2");
    }

    #[test]
    fn illegal_transition_maps_to_bad_request() {
        let interface = ApplicationError::from(DomainError::from(
            LifecycleError::IllegalTransition {
                from: QuotationStatus::Draft,
                to: QuotationStatus::Approved,
            },
        ))
        .into_interface("req-3");

        assert!(matches!(interface, InterfaceError::BadRequest { .. }));
    }

    #[test]
    fn conflict_and_persistence_errors_map_to_retryable_messages() {
        let conflict =
            ApplicationError::Conflict("version 2 expected".to_owned()).into_interface("req-4");
        assert!(matches!(conflict, InterfaceError::Conflict { .. }));
        assert_eq!(
            conflict.user_message(),
            "The quotation was changed by someone else. Reload it and try again."
        );

        let persistence =
            ApplicationError::Persistence("database lock timeout".to_owned()).into_interface("req-5");
        assert!(matches!(persistence, InterfaceError::ServiceUnavailable { .. }));
    }

    #[test]
    fn not_found_and_configuration_errors_map_cleanly() {
        let not_found = ApplicationError::NotFound { entity: "quotation", id: "42".to_owned() }
            .into_interface("req-6");
        assert!(matches!(
            not_found,
            InterfaceError::NotFound { ref message, .. } if message.contains("42")
        ));

        let config = ApplicationError::Configuration("bad currency".to_owned()).into_interface("req-7");
        assert_eq!(config.user_message(), "An unexpected internal error occurred.");
    }

    #[test]
    fn corrupted_stored_totals_are_internal_not_caller_errors() {
        let interface = ApplicationError::from(DomainError::InvariantViolation(
            "total_amount 10 does not match frozen lines".to_owned(),
        ))
        .into_interface("req-8");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
    }
}
