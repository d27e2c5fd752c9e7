//! Customer commands.
//!
//! # Usage
//!
//! ```bash
//! optic-cli customers search "98450"
//! optic-cli customers resolve "asha" --pick 7
//! optic-cli customers resolve "new person" --phone 9000000001
//! optic-cli customers add -n "Asha Rao" -p 9845011223 --gender F
//! optic-cli customers update 7 --notes "prefers evening calls"
//! ```

use chrono::NaiveDate;
use clap::Subcommand;
use optic_desk_admin::AppError;
use optic_desk_admin::services::{ResolverDriver, ResolverSettings};
use optic_desk_core::{Customer, CustomerForm, CustomerId, Gender, ResolverState};

use super::{Context, emit};

#[derive(Subcommand)]
pub enum CustomerAction {
    /// Search customers by name or phone
    Search {
        /// Text to match
        query: String,
    },
    /// Run the search-or-create flow for one query
    Resolve {
        /// Text typed into the customer box
        query: String,

        /// Bind this customer from the results
        #[arg(long)]
        pick: Option<CustomerId>,

        /// Create the customer with this phone when nobody matches
        #[arg(long)]
        phone: Option<String>,

        /// Name for the new customer (defaults to the query)
        #[arg(long)]
        name: Option<String>,
    },
    /// Add a customer
    Add {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        phone: String,

        /// `M` or `F`
        #[arg(long)]
        gender: Option<Gender>,

        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        dob: Option<NaiveDate>,

        #[arg(long)]
        notes: Option<String>,
    },
    /// Show one customer
    Show { id: CustomerId },
    /// Change a customer's details; unset options keep their current value
    Update {
        id: CustomerId,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        phone: Option<String>,

        #[arg(long)]
        gender: Option<Gender>,

        #[arg(long)]
        dob: Option<NaiveDate>,

        #[arg(long)]
        notes: Option<String>,
    },
}

pub async fn run(ctx: &Context, action: CustomerAction) -> Result<(), AppError> {
    match action {
        CustomerAction::Search { query } => {
            let customers = ctx.client.search_customers(&query).await?;
            if customers.is_empty() {
                emit(format!("No customers match '{query}'"));
            }
            for customer in &customers {
                emit(row(customer));
            }
        }
        CustomerAction::Resolve {
            query,
            pick,
            phone,
            name,
        } => resolve(ctx, &query, pick, phone.as_deref(), name.as_deref()).await?,
        CustomerAction::Add {
            name,
            phone,
            gender,
            dob,
            notes,
        } => {
            let form = CustomerForm::new(&name, &phone)?
                .with_gender(gender)
                .with_dob(dob)
                .with_notes(notes);
            let created = ctx.client.create_customer(&form).await?;
            match created.id {
                Some(id) => emit(format!("Created customer {id}: {}", form.name())),
                None => emit(format!("Created customer {}", form.name())),
            }
        }
        CustomerAction::Show { id } => {
            let customer = ctx.client.get_customer(id).await?;
            emit(row(&customer));
            if let Some(dob) = customer.dob {
                emit(format!("  born {dob}"));
            }
            if let Some(notes) = &customer.notes {
                emit(format!("  {notes}"));
            }
        }
        CustomerAction::Update {
            id,
            name,
            phone,
            gender,
            dob,
            notes,
        } => {
            let current = ctx.client.get_customer(id).await?;
            let form = CustomerForm::new(
                name.as_deref().unwrap_or(&current.name),
                phone.as_deref().unwrap_or(&current.phone),
            )?
            .with_gender(gender.or(current.gender))
            .with_dob(dob.or(current.dob))
            .with_notes(notes.or(current.notes));
            ctx.client.update_customer(id, &form).await?;
            emit(format!("Updated customer {id}"));
        }
    }
    Ok(())
}

async fn resolve(
    ctx: &Context,
    query: &str,
    pick: Option<CustomerId>,
    phone: Option<&str>,
    name: Option<&str>,
) -> Result<(), AppError> {
    let driver = ResolverDriver::new(
        ctx.client.clone(),
        ResolverSettings::from_config(&ctx.config),
    );
    driver.input(query).await;
    driver.settle().await;

    match driver.state().await {
        ResolverState::Results { customers, .. } => match pick {
            Some(id) => {
                let customer = driver.select(id).await?;
                emit(format!("Resolved {}", row(&customer)));
            }
            None => {
                for customer in &customers {
                    emit(row(customer));
                }
                emit("Pass --pick <ID> to bind one of these");
            }
        },
        ResolverState::NoMatch { query } => match phone {
            Some(phone) => {
                let seed = driver.begin_create().await?;
                let form = CustomerForm::new(name.unwrap_or(&seed), phone)?;
                let customer = driver.create(&form).await?;
                emit(format!("Created and resolved {}", row(&customer)));
            }
            None => emit(format!("No customers match '{query}'. Pass --phone to create one")),
        },
        other => emit(format!("Resolver is {}", other.label())),
    }
    Ok(())
}

fn row(customer: &Customer) -> String {
    let gender = customer.gender.map_or("-", |g| g.as_str());
    format!("{:>6}  {}  {gender}", customer.id.as_i64(), customer.label())
}
