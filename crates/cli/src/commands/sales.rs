//! Sale commands.
//!
//! # Usage
//!
//! ```bash
//! optic-cli sales list --from 2024-07-01 --status pending
//! optic-cli sales show 31
//! optic-cli sales create --customer 7 \
//!     --product "Blue Cut:1000:2:lens" --catalog-service 3 \
//!     --discount 10 --received 2000 --recall-date 2025-07-15 \
//!     --rx right_d_sph=-1.25 --rx left_d_sph=-1.00
//! ```
//!
//! Ad-hoc lines are written `NAME:PRICE[:QTY[:CATEGORY]]` for products and
//! `NAME:PRICE` for services. Catalog lines are written `ID[:QTY]`.

use chrono::NaiveDate;
use clap::Subcommand;
use optic_desk_admin::AppError;
use optic_desk_admin::api::{SaleDetail, SaleFilters, SaleSummary};
use optic_desk_admin::services::{CheckoutReceipt, CheckoutService, SaleContext};
use optic_desk_core::{
    CustomerId, LineItemSeed, Money, OrderComposer, PrescriptionEditor, ProductCategory,
    ProductId, Quantity, SaleId, SaleStatus, ServiceId,
};
use rust_decimal::Decimal;

use super::prescriptions::{PrescriptionArgs, report_outcome};
use super::{Context, emit, today};

#[derive(Subcommand)]
pub enum SaleAction {
    /// List sales
    List {
        /// First day to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day to include (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Customer name contains
        #[arg(long)]
        customer: Option<String>,

        /// completed or pending
        #[arg(long)]
        status: Option<SaleStatus>,
    },
    /// Show one sale with its lines
    Show { id: SaleId },
    /// Compose and submit a sale
    Create {
        #[arg(short, long)]
        customer: CustomerId,

        /// Product line as NAME:PRICE[:QTY[:CATEGORY]]
        #[arg(long = "product", value_parser = parse_product_line)]
        products: Vec<LineItemSeed>,

        /// Service line as NAME:PRICE
        #[arg(long = "service", value_parser = parse_service_line)]
        services: Vec<LineItemSeed>,

        /// Catalog product as ID[:QTY]
        #[arg(long = "catalog-product", value_parser = parse_catalog_ref)]
        catalog_products: Vec<(i64, Quantity)>,

        /// Catalog service by ID
        #[arg(long = "catalog-service")]
        catalog_services: Vec<ServiceId>,

        /// Discount percent, clamped to 0-100
        #[arg(short, long)]
        discount: Option<Decimal>,

        /// Amount received now
        #[arg(short, long)]
        received: Option<String>,

        /// Booking date (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Check-up reminder date
        #[arg(long)]
        recall_date: Option<NaiveDate>,

        #[arg(long)]
        note: Option<String>,

        /// Prescription written during this visit
        #[command(flatten)]
        prescription: PrescriptionArgs,
    },
}

pub async fn run(ctx: &Context, action: SaleAction) -> Result<(), AppError> {
    match action {
        SaleAction::List {
            from,
            to,
            customer,
            status,
        } => {
            let filters = SaleFilters {
                start_date: from,
                end_date: to,
                customer_name: customer,
                status,
            };
            let sales = ctx.client.list_sales(&filters).await?;
            for sale in &sales {
                emit(summary_row(sale));
            }
            emit(format!("{} sales", sales.len()));
        }
        SaleAction::Show { id } => {
            let sale = ctx.client.get_sale(id).await?;
            print_detail(&sale);
        }
        SaleAction::Create {
            customer,
            products,
            services,
            catalog_products,
            catalog_services,
            discount,
            received,
            date,
            recall_date,
            note,
            prescription,
        } => {
            let mut seeds = products;
            seeds.extend(services);
            if !catalog_products.is_empty() || !catalog_services.is_empty() {
                seeds.extend(catalog_seeds(ctx, &catalog_products, &catalog_services).await?);
            }

            let mut composer = OrderComposer::new();
            composer.bind_customer(customer)?;
            for seed in seeds {
                composer.add_line_item(seed)?;
            }
            if let Some(discount) = discount {
                composer.set_discount_percent(discount);
            }
            if let Some(received) = received {
                composer.set_received_amount(&received);
            }

            let editor = if prescription.is_empty() {
                None
            } else {
                let mut editor = PrescriptionEditor::new_create(Some(customer));
                prescription.apply(&mut editor)?;
                Some(editor)
            };

            let context = SaleContext::on(date.unwrap_or_else(today))
                .with_recall_date(recall_date)
                .with_note(note);
            let checkout = CheckoutService::new(ctx.client.clone(), ctx.config.empty_cart_policy);
            let receipt = checkout
                .submit(&mut composer, &context, editor.as_ref())
                .await?;
            print_receipt(receipt);
        }
    }
    Ok(())
}

async fn catalog_seeds(
    ctx: &Context,
    products: &[(i64, Quantity)],
    services: &[ServiceId],
) -> Result<Vec<LineItemSeed>, AppError> {
    let (catalog_products, catalog_services) = ctx.client.load_catalog().await?;
    let mut seeds = Vec::with_capacity(products.len() + services.len());
    for &(id, quantity) in products {
        let id = ProductId::new(id);
        let product = catalog_products
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
        seeds.push(LineItemSeed::from_catalog_product(product).with_quantity(quantity));
    }
    for &id in services {
        let service = catalog_services
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| AppError::NotFound(format!("service {id}")))?;
        seeds.push(LineItemSeed::from_catalog_service(service));
    }
    Ok(seeds)
}

fn print_receipt(receipt: CheckoutReceipt) {
    let totals = receipt.totals;
    match receipt.sale.id {
        Some(id) => emit(format!("Sale {id} created")),
        None => emit("Sale created"),
    }
    emit(format!("  subtotal  {:>10}", totals.subtotal.to_string()));
    emit(format!("  discount  {:>10}", totals.discount_amount.to_string()));
    emit(format!("  net       {:>10}", totals.net_amount.to_string()));
    emit(format!("  due       {:>10}", totals.due_amount.to_string()));
    if let Some(outcome) = receipt.prescription {
        report_outcome(outcome);
    }
}

fn summary_row(sale: &SaleSummary) -> String {
    format!(
        "{:>6}  {:<10}  {:<24} {:>3} items  {:>10}  {}",
        sale.id.as_i64(),
        sale.date,
        sale.customer_name,
        sale.items_count.unwrap_or(0),
        sale.net_amount.to_string(),
        sale.status.as_str()
    )
}

fn print_detail(sale: &SaleDetail) {
    emit(format!(
        "Sale {} on {} for {} ({})",
        sale.id, sale.date, sale.customer_name, sale.customer_phone
    ));
    for item in &sale.items {
        emit(format!(
            "  {:<30} {:>3} x {:>10} = {:>10}",
            item.name(),
            item.quantity.unwrap_or(1),
            item.price.to_string(),
            item.amount.to_string()
        ));
    }
    emit(format!("  total     {:>10}", sale.total_amount.to_string()));
    emit(format!("  discount  {:>10}", sale.discount.to_string()));
    emit(format!("  net       {:>10}", sale.net_amount.to_string()));
    emit(format!("  received  {:>10}", sale.received_amount.to_string()));
    emit(format!("  remaining {:>10}", sale.remaining_amount.to_string()));
    emit(format!("  status    {}", sale.status));
    if let Some(recall) = &sale.recall_date {
        emit(format!("  recall on {recall}"));
    }
}

fn parse_price(raw: &str) -> Result<Money, String> {
    raw.trim()
        .parse::<Money>()
        .map_err(|e| format!("invalid price '{raw}': {e}"))
}

fn parse_quantity(raw: &str) -> Result<Quantity, String> {
    raw.trim()
        .parse::<u32>()
        .map(Quantity::new)
        .map_err(|e| format!("invalid quantity '{raw}': {e}"))
}

/// Parse `NAME:PRICE[:QTY[:CATEGORY]]`.
fn parse_product_line(raw: &str) -> Result<LineItemSeed, String> {
    let mut parts = raw.split(':');
    let name = parts.next().unwrap_or_default();
    let price = parts
        .next()
        .ok_or_else(|| format!("expected NAME:PRICE, got '{raw}'"))?;
    let mut seed = LineItemSeed::product()
        .named(name.trim())
        .priced(parse_price(price)?);
    if let Some(quantity) = parts.next() {
        seed = seed.with_quantity(parse_quantity(quantity)?);
    }
    if let Some(category) = parts.next() {
        seed = seed.in_category(category.parse::<ProductCategory>()?);
    }
    if parts.next().is_some() {
        return Err(format!("too many fields in '{raw}'"));
    }
    Ok(seed)
}

/// Parse `NAME:PRICE`.
fn parse_service_line(raw: &str) -> Result<LineItemSeed, String> {
    let (name, price) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:PRICE, got '{raw}'"))?;
    Ok(LineItemSeed::service()
        .named(name.trim())
        .priced(parse_price(price)?))
}

/// Parse `ID[:QTY]`.
fn parse_catalog_ref(raw: &str) -> Result<(i64, Quantity), String> {
    let (id, quantity) = match raw.split_once(':') {
        Some((id, quantity)) => (id, parse_quantity(quantity)?),
        None => (raw, Quantity::ONE),
    };
    let id = id
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("invalid id '{id}': {e}"))?;
    Ok((id, quantity))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use optic_desk_core::{EmptyCartPolicy, LineItem};

    use super::*;

    fn compose(seeds: Vec<LineItemSeed>) -> OrderComposer {
        let mut composer = OrderComposer::new();
        composer.bind_customer(CustomerId::new(1)).unwrap();
        for seed in seeds {
            composer.add_line_item(seed).unwrap();
        }
        composer
    }

    #[test]
    fn test_parse_product_line() {
        let composer = compose(vec![
            parse_product_line("Blue Cut:1000:2").unwrap(),
            parse_product_line("Aviator:2499.50:1:sunglass").unwrap(),
            parse_product_line("Daily:300").unwrap(),
        ]);
        let lines = composer.lines();
        assert_eq!(lines[0].name(), "Blue Cut");
        assert_eq!(lines[0].total(), Money::from_units(2000));
        match &lines[1] {
            LineItem::Product(p) => assert_eq!(p.category, ProductCategory::Sunglass),
            LineItem::Service(_) => panic!("expected a product"),
        }
        assert_eq!(lines[2].quantity(), Quantity::ONE);
    }

    #[test]
    fn test_parse_product_line_errors() {
        assert!(parse_product_line("Blue Cut").is_err());
        assert!(parse_product_line("Blue Cut:abc").is_err());
        assert!(parse_product_line("Blue Cut:100:two").is_err());
        assert!(parse_product_line("Blue Cut:100:1:hat").is_err());
        assert!(parse_product_line("Blue Cut:100:1:lens:extra").is_err());
    }

    #[test]
    fn test_parse_service_line() {
        let composer = compose(vec![parse_service_line("Fitting:150").unwrap()]);
        let draft = composer.prepare_submission(EmptyCartPolicy::Reject).unwrap();
        assert_eq!(draft.totals.subtotal, Money::from_units(150));
        assert_eq!(draft.lines[0].name(), "Fitting");
        assert!(parse_service_line("Fitting").is_err());
    }

    #[test]
    fn test_parse_catalog_ref() {
        assert_eq!(parse_catalog_ref("12").unwrap(), (12, Quantity::ONE));
        assert_eq!(parse_catalog_ref("12:3").unwrap(), (12, Quantity::new(3)));
        assert!(parse_catalog_ref("x").is_err());
    }
}
