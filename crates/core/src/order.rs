//! The order composer: the in-progress sale ("cart").
//!
//! The composer owns the line items, the discount and the received amount for
//! one composition session. Totals are never stored; [`OrderComposer::snapshot_totals`]
//! derives them from the current state every time it is called:
//!
//! ```text
//! subtotal        = Σ line totals
//! discount_amount = discount% × subtotal / 100
//! net_amount      = max(0, subtotal − discount_amount)
//! due_amount      = max(0, net_amount − received_amount)
//! ```
//!
//! Arithmetic is exact decimal; each figure is rounded to two places only once
//! all four have been computed.
//!
//! The customer is held by id only. No line can be added before a customer is
//! bound, and a bound customer cannot be swapped for another.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};
use crate::line_item::{LineItem, LineItemPatch, LineItemSeed, StepDirection, StepField};
use crate::types::{CustomerId, DiscountPercent, LineItemId, Money};

/// Derived figures for the current cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Money,
    pub discount_amount: Money,
    pub net_amount: Money,
    pub due_amount: Money,
}

impl Totals {
    fn compute(lines: &[LineItem], discount: DiscountPercent, received: Money) -> Self {
        let subtotal: Money = lines.iter().map(LineItem::total).sum();
        let discount_amount = subtotal.percentage(discount);
        let net_amount = subtotal.saturating_sub(discount_amount);
        let due_amount = net_amount.saturating_sub(received);
        Self {
            subtotal: subtotal.rounded(),
            discount_amount: discount_amount.rounded(),
            net_amount: net_amount.rounded(),
            due_amount: due_amount.rounded(),
        }
    }

    /// True when nothing remains to be paid.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        self.due_amount.is_zero()
    }
}

/// What to do when a sale with no line items is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyCartPolicy {
    /// Refuse with [`ValidationError::EmptyCart`].
    #[default]
    Reject,
    /// Let a zero-amount sale through.
    AllowZeroAmount,
}

/// A validated snapshot of the cart, ready to be mapped to a sale request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleDraft {
    pub customer_id: CustomerId,
    pub lines: Vec<LineItem>,
    pub discount_percent: DiscountPercent,
    pub received_amount: Money,
    pub totals: Totals,
}

/// The mutable cart for one composition session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderComposer {
    customer_id: Option<CustomerId>,
    lines: Vec<LineItem>,
    discount: DiscountPercent,
    received: Money,
}

impl OrderComposer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    /// Bind the resolved customer.
    ///
    /// Re-binding the same customer is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::CustomerAlreadyBound`] if a different
    /// customer is already bound.
    pub fn bind_customer(&mut self, customer_id: CustomerId) -> ValidationResult<()> {
        match self.customer_id {
            Some(bound) if bound != customer_id => {
                Err(ValidationError::CustomerAlreadyBound { bound })
            }
            _ => {
                self.customer_id = Some(customer_id);
                Ok(())
            }
        }
    }

    #[must_use]
    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    #[must_use]
    pub fn line(&self, id: LineItemId) -> Option<&LineItem> {
        self.lines.iter().find(|line| line.id() == id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Append a new line built from `seed`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::CustomerRequired`] if no customer is bound;
    /// the cart is left unchanged.
    pub fn add_line_item(&mut self, seed: LineItemSeed) -> ValidationResult<LineItemId> {
        if self.customer_id.is_none() {
            return Err(ValidationError::CustomerRequired);
        }
        let mut id = LineItemId::generate();
        while self.line(id).is_some() {
            id = LineItemId::generate();
        }
        self.lines.push(seed.into_line(id));
        Ok(id)
    }

    /// Apply a partial update to one line.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownLineItem`] if `id` is not in the cart.
    pub fn update_line_item(&mut self, id: LineItemId, patch: LineItemPatch) -> ValidationResult<()> {
        self.line_mut(id)?.apply(patch);
        Ok(())
    }

    /// Step a line's price or quantity.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownLineItem`] if `id` is not in the cart.
    pub fn step_line_item(
        &mut self,
        id: LineItemId,
        field: StepField,
        direction: StepDirection,
    ) -> ValidationResult<()> {
        self.line_mut(id)?.step(field, direction);
        Ok(())
    }

    /// Remove a line and return it.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownLineItem`] if `id` is not in the cart.
    pub fn remove_line_item(&mut self, id: LineItemId) -> ValidationResult<LineItem> {
        let index = self
            .lines
            .iter()
            .position(|line| line.id() == id)
            .ok_or(ValidationError::UnknownLineItem(id))?;
        Ok(self.lines.remove(index))
    }

    /// Set the discount, clamped into `0..=100`. Returns the stored value.
    pub fn set_discount_percent(&mut self, value: Decimal) -> DiscountPercent {
        self.discount = DiscountPercent::clamped(value);
        self.discount
    }

    #[must_use]
    pub const fn discount_percent(&self) -> DiscountPercent {
        self.discount
    }

    /// Set the received amount from free text. Returns the stored value.
    ///
    /// See [`Money::parse_lenient`] for the sanitizing rules.
    pub fn set_received_amount(&mut self, raw: &str) -> Money {
        self.received = Money::parse_lenient(raw);
        self.received
    }

    /// Set the received amount from an already numeric value.
    pub fn set_received(&mut self, amount: Money) {
        self.received = amount;
    }

    #[must_use]
    pub const fn received_amount(&self) -> Money {
        self.received
    }

    /// Derive the totals from the current state. Pure and idempotent.
    #[must_use]
    pub fn snapshot_totals(&self) -> Totals {
        Totals::compute(&self.lines, self.discount, self.received)
    }

    /// Validate the cart and capture it for submission.
    ///
    /// The composer is not modified; call [`Self::clear`] once the sale has
    /// been accepted by the backend.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::CustomerRequired`] without a bound customer,
    /// or [`ValidationError::EmptyCart`] for an empty cart under
    /// [`EmptyCartPolicy::Reject`].
    pub fn prepare_submission(&self, policy: EmptyCartPolicy) -> ValidationResult<SaleDraft> {
        let customer_id = self.customer_id.ok_or(ValidationError::CustomerRequired)?;
        if self.lines.is_empty() && policy == EmptyCartPolicy::Reject {
            return Err(ValidationError::EmptyCart);
        }
        Ok(SaleDraft {
            customer_id,
            lines: self.lines.clone(),
            discount_percent: self.discount,
            received_amount: self.received,
            totals: self.snapshot_totals(),
        })
    }

    /// Reset to an empty session with no customer.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn line_mut(&mut self, id: LineItemId) -> ValidationResult<&mut LineItem> {
        self.lines
            .iter_mut()
            .find(|line| line.id() == id)
            .ok_or(ValidationError::UnknownLineItem(id))
    }
}
