//! Line items: the priced entries of a sale being composed.
//!
//! A line is either a stocked [`ProductLine`] (unit price × quantity) or a
//! flat-fee [`ServiceLine`]. All numeric writes go through [`Money`] and
//! [`Quantity`], so no negative value can be stored.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogProduct, CatalogService};
use crate::types::{LineItemId, Money, ProductCategory, ProductId, Quantity, ServiceId};

/// Name given to a product line added without one.
pub const DEFAULT_PRODUCT_NAME: &str = "New Product";
/// Name given to a service line added without one.
pub const DEFAULT_SERVICE_NAME: &str = "Eye Testing";
/// Amount the price moves by on one step.
pub const PRICE_STEP_UNITS: i64 = 50;

/// Which variant of line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineItemKind {
    Product,
    Service,
}

impl core::str::FromStr for LineItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "product" => Ok(Self::Product),
            "service" => Ok(Self::Service),
            _ => Err(format!("invalid line item kind: {s}")),
        }
    }
}

/// A stocked product sold by quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductLine {
    pub id: LineItemId,
    pub name: String,
    pub category: ProductCategory,
    pub unit_price: Money,
    pub quantity: Quantity,
    /// Catalog entry the line was picked from, if any.
    pub catalog_id: Option<ProductId>,
}

/// A flat-fee service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceLine {
    pub id: LineItemId,
    pub name: String,
    pub price: Money,
    pub catalog_id: Option<ServiceId>,
}

/// One entry in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineItem {
    Product(ProductLine),
    Service(ServiceLine),
}

impl LineItem {
    #[must_use]
    pub const fn id(&self) -> LineItemId {
        match self {
            Self::Product(p) => p.id,
            Self::Service(s) => s.id,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Product(p) => &p.name,
            Self::Service(s) => &s.name,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> LineItemKind {
        match self {
            Self::Product(_) => LineItemKind::Product,
            Self::Service(_) => LineItemKind::Service,
        }
    }

    /// Price of one unit (the flat price for a service).
    #[must_use]
    pub const fn unit_price(&self) -> Money {
        match self {
            Self::Product(p) => p.unit_price,
            Self::Service(s) => s.price,
        }
    }

    /// Units sold; services always count as one.
    #[must_use]
    pub const fn quantity(&self) -> Quantity {
        match self {
            Self::Product(p) => p.quantity,
            Self::Service(_) => Quantity::ONE,
        }
    }

    /// Contribution of this line to the subtotal.
    #[must_use]
    pub fn total(&self) -> Money {
        match self {
            Self::Product(p) => p.unit_price.times(p.quantity),
            Self::Service(s) => s.price,
        }
    }

    /// Apply a partial update, clamping numeric fields at zero.
    ///
    /// Category and quantity do not exist on services and are ignored there.
    pub fn apply(&mut self, patch: LineItemPatch) {
        let LineItemPatch {
            name,
            category,
            price,
            quantity,
        } = patch;
        match self {
            Self::Product(p) => {
                if let Some(name) = name {
                    p.name = name;
                }
                if let Some(category) = category {
                    p.category = category;
                }
                if let Some(price) = price {
                    p.unit_price = Money::new(price);
                }
                if let Some(quantity) = quantity {
                    p.quantity = Quantity::clamped(quantity);
                }
            }
            Self::Service(s) => {
                if let Some(name) = name {
                    s.name = name;
                }
                if let Some(price) = price {
                    s.price = Money::new(price);
                }
            }
        }
    }

    /// Nudge price by [`PRICE_STEP_UNITS`] or quantity by one.
    ///
    /// Stepping the quantity of a service does nothing.
    pub fn step(&mut self, field: StepField, direction: StepDirection) {
        let up = direction == StepDirection::Up;
        let price_step = Decimal::from(PRICE_STEP_UNITS);
        match (self, field) {
            (Self::Product(p), StepField::Price) => p.unit_price = p.unit_price.stepped(price_step, up),
            (Self::Product(p), StepField::Quantity) => p.quantity = p.quantity.stepped(up),
            (Self::Service(s), StepField::Price) => s.price = s.price.stepped(price_step, up),
            (Self::Service(_), StepField::Quantity) => {}
        }
    }
}

/// Partial update of a line item. Unset fields are left alone.
///
/// Numeric fields take raw values as entered; they are clamped when applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineItemPatch {
    pub name: Option<String>,
    pub category: Option<ProductCategory>,
    pub price: Option<Decimal>,
    pub quantity: Option<i64>,
}

impl LineItemPatch {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub const fn category(mut self, category: ProductCategory) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub const fn price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    #[must_use]
    pub const fn quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }
}

/// Field moved by the increment/decrement affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepField {
    Price,
    Quantity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDirection {
    Up,
    Down,
}

/// Starting values for a new line item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineItemSeed {
    Product {
        name: String,
        category: ProductCategory,
        unit_price: Money,
        quantity: Quantity,
        catalog_id: Option<ProductId>,
    },
    Service {
        name: String,
        price: Money,
        catalog_id: Option<ServiceId>,
    },
}

impl LineItemSeed {
    /// Default seed for a kind: a free lens at quantity one, or a free eye test.
    #[must_use]
    pub fn for_kind(kind: LineItemKind) -> Self {
        match kind {
            LineItemKind::Product => Self::Product {
                name: DEFAULT_PRODUCT_NAME.to_owned(),
                category: ProductCategory::Lens,
                unit_price: Money::ZERO,
                quantity: Quantity::ONE,
                catalog_id: None,
            },
            LineItemKind::Service => Self::Service {
                name: DEFAULT_SERVICE_NAME.to_owned(),
                price: Money::ZERO,
                catalog_id: None,
            },
        }
    }

    #[must_use]
    pub fn product() -> Self {
        Self::for_kind(LineItemKind::Product)
    }

    #[must_use]
    pub fn service() -> Self {
        Self::for_kind(LineItemKind::Service)
    }

    /// Seed a quantity-one product line from a catalog entry.
    #[must_use]
    pub fn from_catalog_product(product: &CatalogProduct) -> Self {
        Self::Product {
            name: product.name.clone(),
            category: product.category,
            unit_price: product.price,
            quantity: Quantity::ONE,
            catalog_id: Some(product.id),
        }
    }

    #[must_use]
    pub fn from_catalog_service(service: &CatalogService) -> Self {
        Self::Service {
            name: service.name.clone(),
            price: service.price,
            catalog_id: Some(service.id),
        }
    }

    #[must_use]
    pub fn named(mut self, new_name: impl Into<String>) -> Self {
        match &mut self {
            Self::Product { name, .. } | Self::Service { name, .. } => *name = new_name.into(),
        }
        self
    }

    #[must_use]
    pub fn priced(mut self, amount: Money) -> Self {
        match &mut self {
            Self::Product { unit_price, .. } => *unit_price = amount,
            Self::Service { price, .. } => *price = amount,
        }
        self
    }

    /// Set the quantity; ignored for services.
    #[must_use]
    pub fn with_quantity(mut self, count: Quantity) -> Self {
        if let Self::Product { quantity, .. } = &mut self {
            *quantity = count;
        }
        self
    }

    /// Set the category; ignored for services.
    #[must_use]
    pub fn in_category(mut self, new_category: ProductCategory) -> Self {
        if let Self::Product { category, .. } = &mut self {
            *category = new_category;
        }
        self
    }

    pub(crate) fn into_line(self, id: LineItemId) -> LineItem {
        match self {
            Self::Product {
                name,
                category,
                unit_price,
                quantity,
                catalog_id,
            } => LineItem::Product(ProductLine {
                id,
                name,
                category,
                unit_price,
                quantity,
                catalog_id,
            }),
            Self::Service {
                name,
                price,
                catalog_id,
            } => LineItem::Service(ServiceLine {
                id,
                name,
                price,
                catalog_id,
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_default_seeds() {
        let line = LineItemSeed::product().into_line(LineItemId::generate());
        assert_eq!(line.name(), DEFAULT_PRODUCT_NAME);
        assert_eq!(line.quantity(), Quantity::ONE);
        assert_eq!(line.total(), Money::ZERO);
        assert!(matches!(&line, LineItem::Product(p) if p.category == ProductCategory::Lens));

        let line = LineItemSeed::service().into_line(LineItemId::generate());
        assert_eq!(line.name(), "Eye Testing");
        assert_eq!(line.kind(), LineItemKind::Service);
    }

    #[test]
    fn test_product_total_is_price_times_quantity() {
        let line = LineItemSeed::product()
            .priced(Money::from_units(1000))
            .with_quantity(Quantity::new(2))
            .into_line(LineItemId::generate());
        assert_eq!(line.total(), Money::from_units(2000));
    }

    #[test]
    fn test_zero_quantity_contributes_nothing() {
        let line = LineItemSeed::product()
            .priced(Money::from_units(700))
            .with_quantity(Quantity::ZERO)
            .into_line(LineItemId::generate());
        assert_eq!(line.total(), Money::ZERO);
    }

    #[test]
    fn test_patch_clamps_negative_numbers() {
        let mut line = LineItemSeed::product().into_line(LineItemId::generate());
        line.apply(LineItemPatch::default().price(dec("-20")).quantity(-4));
        assert_eq!(line.unit_price(), Money::ZERO);
        assert_eq!(line.quantity(), Quantity::ZERO);
    }

    #[test]
    fn test_patch_ignores_product_fields_on_service() {
        let mut line = LineItemSeed::service().into_line(LineItemId::generate());
        line.apply(
            LineItemPatch::default()
                .name("Contact lens fitting")
                .category(ProductCategory::Frame)
                .quantity(9)
                .price(dec("300")),
        );
        assert_eq!(line.name(), "Contact lens fitting");
        assert_eq!(line.quantity(), Quantity::ONE);
        assert_eq!(line.total(), Money::from_units(300));
    }

    #[test]
    fn test_step_price_and_quantity() {
        let mut line = LineItemSeed::product()
            .priced(Money::from_units(20))
            .into_line(LineItemId::generate());
        line.step(StepField::Price, StepDirection::Up);
        assert_eq!(line.unit_price(), Money::from_units(70));
        line.step(StepField::Price, StepDirection::Down);
        line.step(StepField::Price, StepDirection::Down);
        assert_eq!(line.unit_price(), Money::ZERO);
        line.step(StepField::Quantity, StepDirection::Down);
        line.step(StepField::Quantity, StepDirection::Down);
        assert_eq!(line.quantity(), Quantity::ZERO);

        let mut service = LineItemSeed::service().into_line(LineItemId::generate());
        service.step(StepField::Quantity, StepDirection::Up);
        assert_eq!(service.quantity(), Quantity::ONE);
    }

    #[test]
    fn test_seed_from_catalog() {
        let product = CatalogProduct {
            id: ProductId::new(4),
            name: "Tortoise frame".to_string(),
            category: ProductCategory::Frame,
            price: Money::from_units(1800),
            sku: Some("FR-4".to_string()),
        };
        let line = LineItemSeed::from_catalog_product(&product).into_line(LineItemId::generate());
        assert!(matches!(&line, LineItem::Product(p) if p.catalog_id == Some(ProductId::new(4))));
        assert_eq!(line.total(), Money::from_units(1800));
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("Service".parse::<LineItemKind>().unwrap(), LineItemKind::Service);
        assert!("gift".parse::<LineItemKind>().is_err());
    }
}
