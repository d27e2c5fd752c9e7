//! Payments against sales and cashbook entries.

use chrono::NaiveDate;
use optic_desk_core::{EntryType, Money, PaymentMethod, SaleId, ValidationError, ValidationResult};
use serde::Serialize;
use tracing::instrument;

use super::{ApiClient, ApiError, CreatedRecord};

/// A payment received against an existing sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPayment {
    sale_id: SaleId,
    amount: Money,
    method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
}

impl NewPayment {
    /// # Errors
    ///
    /// Returns [`ValidationError::ZeroAmount`] for a zero amount.
    pub fn new(sale_id: SaleId, amount: Money, method: PaymentMethod) -> ValidationResult<Self> {
        if amount.is_zero() {
            return Err(ValidationError::ZeroAmount("payment amount"));
        }
        Ok(Self {
            sale_id,
            amount,
            method,
            date: None,
            note: None,
        })
    }

    #[must_use]
    pub const fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note.filter(|n| !n.trim().is_empty());
        self
    }

    #[must_use]
    pub const fn sale_id(&self) -> SaleId {
        self.sale_id
    }

    #[must_use]
    pub const fn amount(&self) -> Money {
        self.amount
    }
}

/// A cashbook entry: money into or out of the till that is not a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewExpense {
    date: NaiveDate,
    amount: Money,
    method: PaymentMethod,
    #[serde(rename = "type")]
    entry_type: EntryType,
    notes: String,
}

impl NewExpense {
    /// # Errors
    ///
    /// Returns [`ValidationError::ZeroAmount`] for a zero amount.
    pub fn new(
        date: NaiveDate,
        amount: Money,
        method: PaymentMethod,
        entry_type: EntryType,
    ) -> ValidationResult<Self> {
        if amount.is_zero() {
            return Err(ValidationError::ZeroAmount("expense amount"));
        }
        Ok(Self {
            date,
            amount,
            method,
            entry_type,
            notes: String::new(),
        })
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    #[must_use]
    pub const fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    #[must_use]
    pub const fn amount(&self) -> Money {
        self.amount
    }
}

impl ApiClient {
    /// Record a payment against a sale.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, payment), fields(sale_id = %payment.sale_id(), amount = %payment.amount()))]
    pub async fn create_payment(&self, payment: &NewPayment) -> Result<CreatedRecord, ApiError> {
        let url = self.endpoint(&["payments"])?;
        self.post(url, payment).await
    }

    /// Record a cashbook entry.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, expense), fields(entry_type = %expense.entry_type(), amount = %expense.amount()))]
    pub async fn create_expense(&self, expense: &NewExpense) -> Result<CreatedRecord, ApiError> {
        let url = self.endpoint(&["expenses"])?;
        self.post(url, expense).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_requires_amount() {
        assert_eq!(
            NewPayment::new(SaleId::new(1), Money::ZERO, PaymentMethod::Cash).unwrap_err(),
            ValidationError::ZeroAmount("payment amount")
        );
        let body = serde_json::to_value(
            NewPayment::new(SaleId::new(9), Money::from_units(250), PaymentMethod::Upi)
                .unwrap()
                .with_note(Some(" ".to_string())),
        )
        .unwrap();
        assert_eq!(body["sale_id"], 9);
        assert_eq!(body["method"], "upi");
        assert!(body.get("note").is_none());
        assert!(body.get("date").is_none());
    }

    #[test]
    fn test_expense_wire_shape() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let body = serde_json::to_value(
            NewExpense::new(date, Money::from_units(120), PaymentMethod::Cash, EntryType::Debit)
                .unwrap()
                .with_notes("tea"),
        )
        .unwrap();
        assert_eq!(body["type"], "debit");
        assert_eq!(body["date"], "2024-06-01");
        assert_eq!(body["notes"], "tea");
        assert!(
            NewExpense::new(date, Money::ZERO, PaymentMethod::Card, EntryType::Credit).is_err()
        );
    }
}
