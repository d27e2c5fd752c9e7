//! Payment and expense commands.

use chrono::NaiveDate;
use clap::Subcommand;
use optic_desk_admin::AppError;
use optic_desk_admin::api::{NewExpense, NewPayment};
use optic_desk_core::{EntryType, Money, PaymentMethod, SaleId};

use super::{Context, emit, today};

#[derive(Subcommand)]
pub enum PaymentAction {
    /// Record money received against a sale
    Add {
        #[arg(short, long)]
        sale: SaleId,

        #[arg(short, long)]
        amount: Money,

        /// cash, card or upi
        #[arg(short, long, default_value = "cash")]
        method: PaymentMethod,

        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        note: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ExpenseAction {
    /// Record a cashbook entry
    Add {
        #[arg(short, long)]
        amount: Money,

        /// cash, card or upi
        #[arg(short, long, default_value = "cash")]
        method: PaymentMethod,

        /// debit (money out) or credit (money in)
        #[arg(short = 't', long = "type", default_value = "debit")]
        entry_type: EntryType,

        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(short, long, default_value = "")]
        notes: String,
    },
}

pub async fn run_payments(ctx: &Context, action: PaymentAction) -> Result<(), AppError> {
    match action {
        PaymentAction::Add {
            sale,
            amount,
            method,
            date,
            note,
        } => {
            let payment = NewPayment::new(sale, amount, method)?
                .on(date.unwrap_or_else(today))
                .with_note(note);
            ctx.client.create_payment(&payment).await?;
            emit(format!("Recorded {amount} {method} against sale {sale}"));
        }
    }
    Ok(())
}

pub async fn run_expenses(ctx: &Context, action: ExpenseAction) -> Result<(), AppError> {
    match action {
        ExpenseAction::Add {
            amount,
            method,
            entry_type,
            date,
            notes,
        } => {
            let expense = NewExpense::new(date.unwrap_or_else(today), amount, method, entry_type)?
                .with_notes(notes);
            ctx.client.create_expense(&expense).await?;
            emit(format!("Recorded {entry_type} of {amount} ({method})"));
        }
    }
    Ok(())
}
