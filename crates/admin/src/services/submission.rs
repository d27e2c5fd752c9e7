//! Mapping of composed sales and prescriptions to request bodies.
//!
//! Pure functions: no I/O, no business rules. Validation happens before a
//! draft exists; figures come from the draft's totals snapshot untouched.

use chrono::NaiveDate;
use optic_desk_core::{CustomerId, LineItem, PrescriptionRecord, SaleDraft, SaleStatus};

use crate::api::{NewSale, NewSaleItem};

/// Sale fields that are not part of the cart itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleContext {
    /// Day the sale is booked on.
    pub date: NaiveDate,
    /// Day the customer should be called back for a check-up.
    pub recall_date: Option<NaiveDate>,
    pub note: Option<String>,
}

impl SaleContext {
    #[must_use]
    pub const fn on(date: NaiveDate) -> Self {
        Self {
            date,
            recall_date: None,
            note: None,
        }
    }

    #[must_use]
    pub const fn with_recall_date(mut self, recall_date: Option<NaiveDate>) -> Self {
        self.recall_date = recall_date;
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note.filter(|n| !n.trim().is_empty());
        self
    }
}

/// Build the create-sale body for a validated draft.
#[must_use]
pub fn sale_body(draft: &SaleDraft, context: &SaleContext) -> NewSale {
    let totals = draft.totals;
    let status = if totals.is_settled() {
        SaleStatus::Completed
    } else {
        SaleStatus::Pending
    };
    NewSale {
        customer_id: draft.customer_id,
        date: context.date,
        recall_date: context.recall_date,
        items: draft.lines.iter().map(line_body).collect(),
        total_amount: totals.subtotal,
        discount_percent: draft.discount_percent,
        discount: totals.discount_amount,
        net_amount: totals.net_amount,
        received_amount: draft.received_amount,
        remaining_amount: totals.due_amount,
        status,
        note: context.note.clone(),
    }
}

fn line_body(line: &LineItem) -> NewSaleItem {
    match line {
        LineItem::Product(product) => NewSaleItem::Product {
            product_id: product.catalog_id,
            product_name: product.name.clone(),
            category: product.category,
            quantity: product.quantity,
            price: product.unit_price,
            amount: line.total().rounded(),
        },
        LineItem::Service(service) => NewSaleItem::Service {
            service_id: service.catalog_id,
            service_name: service.name.clone(),
            quantity: line.quantity(),
            price: service.price,
            amount: line.total().rounded(),
        },
    }
}

/// Build the create-prescription body, filling in the customer if the form
/// was opened without one.
#[must_use]
pub fn prescription_body(record: &PrescriptionRecord, customer_id: CustomerId) -> PrescriptionRecord {
    let mut body = record.clone();
    body.customer_id.get_or_insert(customer_id);
    body
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use optic_desk_core::{
        EmptyCartPolicy, LineItemSeed, Money, OrderComposer, ProductCategory, Quantity,
    };
    use rust_decimal::Decimal;

    use super::*;

    fn worked_example() -> OrderComposer {
        let mut composer = OrderComposer::new();
        composer.bind_customer(CustomerId::new(7)).unwrap();
        composer
            .add_line_item(
                LineItemSeed::product()
                    .named("Blue Cut")
                    .in_category(ProductCategory::Lens)
                    .priced(Money::from_units(1000))
                    .with_quantity(Quantity::new(2)),
            )
            .unwrap();
        composer
            .add_line_item(LineItemSeed::service().priced(Money::from_units(500)))
            .unwrap();
        composer.set_discount_percent(Decimal::from(10));
        composer.set_received_amount("2000");
        composer
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 15).unwrap()
    }

    #[test]
    fn test_sale_body_carries_totals() {
        let draft = worked_example()
            .prepare_submission(EmptyCartPolicy::Reject)
            .unwrap();
        let body = sale_body(
            &draft,
            &SaleContext::on(date()).with_recall_date(NaiveDate::from_ymd_opt(2025, 7, 15)),
        );

        assert_eq!(body.customer_id, CustomerId::new(7));
        assert_eq!(body.total_amount, Money::from_units(2500));
        assert_eq!(body.discount, Money::from_units(250));
        assert_eq!(body.net_amount, Money::from_units(2250));
        assert_eq!(body.received_amount, Money::from_units(2000));
        assert_eq!(body.remaining_amount, Money::from_units(250));
        assert_eq!(body.status, SaleStatus::Pending);
        assert_eq!(body.items.len(), 2);
        assert_eq!(body.items[0].amount(), Money::from_units(2000));
        assert_eq!(body.items[1].amount(), Money::from_units(500));
    }

    #[test]
    fn test_settled_sale_is_completed() {
        let mut composer = worked_example();
        composer.set_received_amount("2250");
        let draft = composer.prepare_submission(EmptyCartPolicy::Reject).unwrap();
        let body = sale_body(&draft, &SaleContext::on(date()));
        assert_eq!(body.status, SaleStatus::Completed);
        assert_eq!(body.remaining_amount, Money::ZERO);
    }

    #[test]
    fn test_sale_body_wire_shape() {
        let draft = worked_example()
            .prepare_submission(EmptyCartPolicy::Reject)
            .unwrap();
        let value = serde_json::to_value(sale_body(
            &draft,
            &SaleContext::on(date()).with_note(Some("  ".to_string())),
        ))
        .unwrap();
        assert_eq!(value["date"], "2024-07-15");
        assert!(value["recall_date"].is_null());
        assert!(value.get("note").is_none());
        assert_eq!(value["items"][0]["kind"], "product");
        assert_eq!(value["items"][0]["product_name"], "Blue Cut");
        assert_eq!(value["items"][1]["service_name"], "Eye Testing");
        assert_eq!(value["discount_percent"], 10.0);
    }

    #[test]
    fn test_prescription_body_fills_missing_customer() {
        let record = PrescriptionRecord::default();
        assert_eq!(
            prescription_body(&record, CustomerId::new(3)).customer_id,
            Some(CustomerId::new(3))
        );

        let owned = PrescriptionRecord::for_customer(Some(CustomerId::new(8)));
        assert_eq!(
            prescription_body(&owned, CustomerId::new(3)).customer_id,
            Some(CustomerId::new(8))
        );
    }
}
