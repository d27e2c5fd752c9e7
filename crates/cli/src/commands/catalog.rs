//! Product and service catalog commands.

use clap::Subcommand;
use optic_desk_admin::AppError;
use optic_desk_core::{
    CatalogProduct, CatalogService, Money, NewProduct, NewService, ProductCategory, ProductId,
    ServiceId, filter_products,
};

use super::{Context, emit};

#[derive(Subcommand)]
pub enum ProductAction {
    /// List products
    List {
        /// Only this category (lens, frame, sunglass, contact)
        #[arg(short, long)]
        category: Option<ProductCategory>,

        /// Match against name, category and SKU
        #[arg(short, long, default_value = "")]
        search: String,
    },
    /// Add a product
    Add {
        #[arg(short, long)]
        name: String,

        #[arg(short, long, default_value = "lens")]
        category: ProductCategory,

        #[arg(short, long)]
        price: Money,

        #[arg(long)]
        sku: Option<String>,
    },
    /// Delete a product
    Delete { id: ProductId },
}

#[derive(Subcommand)]
pub enum ServiceAction {
    /// List services
    List,
    /// Add a service
    Add {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        price: Money,

        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete a service
    Delete { id: ServiceId },
}

pub async fn run_products(ctx: &Context, action: ProductAction) -> Result<(), AppError> {
    match action {
        ProductAction::List { category, search } => {
            let products = ctx.client.list_products().await?;
            let shown = filter_products(&products, category, &search);
            for product in &shown {
                emit(product_row(product));
            }
            emit(format!("{} of {} products", shown.len(), products.len()));
        }
        ProductAction::Add {
            name,
            category,
            price,
            sku,
        } => {
            let product = NewProduct::new(&name, category, price)?.with_sku(sku);
            let created = ctx.client.create_product(&product).await?;
            emit(created_line("product", product.name(), created.id));
        }
        ProductAction::Delete { id } => {
            ctx.client.delete_product(id).await?;
            emit(format!("Deleted product {id}"));
        }
    }
    Ok(())
}

pub async fn run_services(ctx: &Context, action: ServiceAction) -> Result<(), AppError> {
    match action {
        ServiceAction::List => {
            for service in &ctx.client.list_services().await? {
                emit(service_row(service));
            }
        }
        ServiceAction::Add {
            name,
            price,
            description,
        } => {
            let service = NewService::new(&name, price)?.with_description(description);
            let created = ctx.client.create_service(&service).await?;
            emit(created_line("service", service.name(), created.id));
        }
        ServiceAction::Delete { id } => {
            ctx.client.delete_service(id).await?;
            emit(format!("Deleted service {id}"));
        }
    }
    Ok(())
}

fn product_row(product: &CatalogProduct) -> String {
    format!(
        "{:>6}  {:<9} {:<30} {:>10}  {}",
        product.id.as_i64(),
        product.category.as_str(),
        product.name,
        product.price.to_string(),
        product.sku.as_deref().unwrap_or("")
    )
}

fn service_row(service: &CatalogService) -> String {
    format!(
        "{:>6}  {:<30} {:>10}  {}",
        service.id.as_i64(),
        service.name,
        service.price.to_string(),
        service.description.as_deref().unwrap_or("")
    )
}

fn created_line(what: &str, name: &str, id: Option<i64>) -> String {
    id.map_or_else(
        || format!("Created {what} {name}"),
        |id| format!("Created {what} {id}: {name}"),
    )
}
