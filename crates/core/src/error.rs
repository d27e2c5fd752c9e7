//! Validation errors raised before any network call is made.

use thiserror::Error;

use crate::types::{CustomerId, LineItemId, PhoneError};

/// Result type used across the domain layer.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// A locally detected problem that blocks the requested operation.
///
/// These never reach the backend: the operation is refused and the in-memory
/// state is left exactly as it was.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The operation needs a resolved customer and none is bound.
    #[error("select a customer first")]
    CustomerRequired,

    /// The order already belongs to a different customer.
    #[error("order is already bound to customer {bound}")]
    CustomerAlreadyBound {
        /// Customer currently bound to the order.
        bound: CustomerId,
    },

    /// A sale cannot be submitted without line items.
    #[error("add at least one product or service")]
    EmptyCart,

    /// No line item with this id exists in the cart.
    #[error("no line item {0} in this sale")]
    UnknownLineItem(LineItemId),

    /// A required name was blank.
    #[error("name is required")]
    NameRequired,

    /// The phone number failed validation.
    #[error("invalid phone: {0}")]
    Phone(#[from] PhoneError),

    /// The customer is not among the current search results.
    #[error("customer {0} is not in the current results")]
    UnknownCustomer(CustomerId),

    /// The requested step is not allowed from the current state.
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        /// What was attempted.
        action: &'static str,
        /// The state that refused it.
        state: &'static str,
    },

    /// The form is open read-only.
    #[error("form is read-only")]
    ReadOnly,

    /// An amount that must be positive was zero.
    #[error("{0} must be greater than zero")]
    ZeroAmount(&'static str),
}

impl ValidationError {
    pub(crate) const fn transition(action: &'static str, state: &'static str) -> Self {
        Self::InvalidTransition { action, state }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        assert_eq!(
            ValidationError::CustomerRequired.to_string(),
            "select a customer first"
        );
        assert_eq!(
            ValidationError::CustomerAlreadyBound {
                bound: CustomerId::new(3)
            }
            .to_string(),
            "order is already bound to customer 3"
        );
        assert_eq!(
            ValidationError::Phone(PhoneError::Empty).to_string(),
            "invalid phone: phone cannot be empty"
        );
        assert_eq!(
            ValidationError::transition("create a customer", "resolved").to_string(),
            "cannot create a customer while resolved"
        );
    }
}
