//! Sale endpoints and their wire types.

use chrono::NaiveDate;
use optic_desk_core::types::text::{
    blank_as_none, blank_text_as_none, lenient_money, opaque_text, parse_or_default,
};
use optic_desk_core::{
    CustomerId, DiscountPercent, LineItemKind, Money, ProductCategory, ProductId, Quantity, SaleId,
    SaleStatus, ServiceId,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{ApiClient, ApiError, CreatedRecord};

/// One row of the sales list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SaleSummary {
    pub id: SaleId,
    #[serde(default, deserialize_with = "opaque_text")]
    pub date: String,
    #[serde(default, deserialize_with = "opaque_text")]
    pub customer_name: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub items_count: Option<u32>,
    #[serde(default, deserialize_with = "lenient_money")]
    pub discount: Money,
    #[serde(default, deserialize_with = "lenient_money")]
    pub net_amount: Money,
    #[serde(default, deserialize_with = "parse_or_default")]
    pub status: SaleStatus,
}

/// A line of a stored sale.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SaleDetailItem {
    #[serde(default, deserialize_with = "blank_text_as_none")]
    pub product_name: Option<String>,
    #[serde(default, deserialize_with = "blank_text_as_none")]
    pub service_name: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub quantity: Option<u32>,
    #[serde(default, deserialize_with = "lenient_money")]
    pub price: Money,
    #[serde(default, deserialize_with = "lenient_money")]
    pub amount: Money,
    #[serde(default, deserialize_with = "blank_text_as_none")]
    pub note: Option<String>,
}

impl SaleDetailItem {
    /// Display name: the product name, else the service name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.product_name
            .as_deref()
            .or(self.service_name.as_deref())
            .unwrap_or("")
    }
}

/// A stored sale with its lines and payment summary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SaleDetail {
    pub id: SaleId,
    #[serde(default, deserialize_with = "opaque_text")]
    pub customer_name: String,
    #[serde(default, deserialize_with = "opaque_text")]
    pub customer_phone: String,
    #[serde(default, deserialize_with = "opaque_text")]
    pub date: String,
    #[serde(default, deserialize_with = "blank_text_as_none")]
    pub recall_date: Option<String>,
    #[serde(default)]
    pub items: Vec<SaleDetailItem>,
    #[serde(default, deserialize_with = "lenient_money")]
    pub total_amount: Money,
    #[serde(default, deserialize_with = "lenient_money")]
    pub discount: Money,
    #[serde(default, deserialize_with = "lenient_money")]
    pub net_amount: Money,
    #[serde(default, deserialize_with = "lenient_money")]
    pub received_amount: Money,
    #[serde(default, deserialize_with = "lenient_money")]
    pub remaining_amount: Money,
    #[serde(default, deserialize_with = "parse_or_default")]
    pub status: SaleStatus,
}

/// Filters for the sales list. Unset filters are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaleFilters {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub customer_name: Option<String>,
    pub status: Option<SaleStatus>,
}

impl SaleFilters {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(start) = self.start_date {
            pairs.push(("start_date", start.to_string()));
        }
        if let Some(end) = self.end_date {
            pairs.push(("end_date", end.to_string()));
        }
        if let Some(name) = self.customer_name.as_deref().map(str::trim)
            && !name.is_empty()
        {
            pairs.push(("customer_name", name.to_owned()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.to_string()));
        }
        pairs
    }
}

/// One line of a sale being created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NewSaleItem {
    Product {
        product_id: Option<ProductId>,
        product_name: String,
        category: ProductCategory,
        quantity: Quantity,
        price: Money,
        amount: Money,
    },
    Service {
        service_id: Option<ServiceId>,
        service_name: String,
        quantity: Quantity,
        price: Money,
        amount: Money,
    },
}

impl NewSaleItem {
    #[must_use]
    pub const fn kind(&self) -> LineItemKind {
        match self {
            Self::Product { .. } => LineItemKind::Product,
            Self::Service { .. } => LineItemKind::Service,
        }
    }

    #[must_use]
    pub const fn amount(&self) -> Money {
        match self {
            Self::Product { amount, .. } | Self::Service { amount, .. } => *amount,
        }
    }
}

/// Body of the create-sale call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSale {
    pub customer_id: CustomerId,
    pub date: NaiveDate,
    pub recall_date: Option<NaiveDate>,
    pub items: Vec<NewSaleItem>,
    pub total_amount: Money,
    pub discount_percent: DiscountPercent,
    pub discount: Money,
    pub net_amount: Money,
    pub received_amount: Money,
    pub remaining_amount: Money,
    pub status: SaleStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ApiClient {
    /// List sales, optionally filtered.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_sales(&self, filters: &SaleFilters) -> Result<Vec<SaleSummary>, ApiError> {
        let mut url = self.endpoint(&["sales"])?;
        let pairs = filters.query_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        self.get_list(url).await
    }

    /// Fetch one sale with its lines.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_sale(&self, id: SaleId) -> Result<SaleDetail, ApiError> {
        let url = self.endpoint(&["sales", &id.to_string()])?;
        self.get(url).await
    }

    /// Record a sale.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(
        skip(self, sale),
        fields(customer_id = %sale.customer_id, items = sale.items.len(), net = %sale.net_amount)
    )]
    pub async fn create_sale(&self, sale: &NewSale) -> Result<CreatedRecord, ApiError> {
        let url = self.endpoint(&["sales"])?;
        self.post(url, sale).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_filters_skip_unset_and_blank() {
        assert!(SaleFilters::default().query_pairs().is_empty());

        let filters = SaleFilters {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            customer_name: Some("  ".to_string()),
            status: Some(SaleStatus::Pending),
            ..SaleFilters::default()
        };
        assert_eq!(
            filters.query_pairs(),
            vec![
                ("start_date", "2024-01-01".to_string()),
                ("status", "pending".to_string())
            ]
        );
    }

    #[test]
    fn test_sale_summary_is_lenient() {
        let summary: SaleSummary = serde_json::from_value(json!({
            "id": 31,
            "date": "2024-02-10",
            "customer_name": "Anita",
            "items_count": null,
            "discount": "0",
            "net_amount": 2250,
            "status": "partial"
        }))
        .unwrap();
        assert_eq!(summary.items_count, None);
        assert_eq!(summary.net_amount, Money::from_units(2250));
        assert_eq!(summary.status, SaleStatus::Pending);
    }

    #[test]
    fn test_sale_detail_items() {
        let detail: SaleDetail = serde_json::from_value(json!({
            "id": 5,
            "customer_name": "Ravi",
            "items": [
                {"product_name": "Blue Cut", "quantity": 2, "price": 1000, "amount": 2000},
                {"service_name": "Eye Testing", "price": 500, "amount": 500, "note": ""}
            ],
            "remaining_amount": 250,
            "status": "completed"
        }))
        .unwrap();
        assert_eq!(detail.items.len(), 2);
        assert_eq!(detail.items[0].name(), "Blue Cut");
        assert_eq!(detail.items[1].name(), "Eye Testing");
        assert!(detail.items[1].note.is_none());
        assert!(detail.recall_date.is_none());
        assert_eq!(detail.status, SaleStatus::Completed);
    }

    #[test]
    fn test_new_sale_item_wire_shape() {
        let item = NewSaleItem::Service {
            service_id: None,
            service_name: "Eye Testing".to_string(),
            quantity: Quantity::ONE,
            price: Money::from_units(500),
            amount: Money::from_units(500),
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["kind"], "service");
        assert_eq!(value["service_name"], "Eye Testing");
        assert_eq!(value["amount"], 500.0);
        assert_eq!(item.kind(), LineItemKind::Service);
    }
}
