pub mod lifecycle;

pub use lifecycle::{
    available_transitions, can_transition, check_transition, request_transition,
    QuotationLifecycle, TransitionOutcome,
};
