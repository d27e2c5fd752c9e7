//! Optic Desk CLI - store operations against the backend API.
//!
//! # Usage
//!
//! ```bash
//! # Find a customer, creating one if nobody matches
//! optic-cli customers resolve "asha" --phone 9845011223
//!
//! # Ring up a sale: two lenses, an eye test, 10% off, 2000 received
//! optic-cli sales create --customer 7 \
//!     --product "Blue Cut:1000:2:lens" --service "Eye Testing:500" \
//!     --discount 10 --received 2000
//!
//! # Record the balance later
//! optic-cli payments add --sale 31 --amount 250 --method upi
//! ```
//!
//! # Commands
//!
//! - `customers` - Search, resolve, add, show and update customers
//! - `products` / `services` - Manage the catalog
//! - `sales` - List, show and create sales
//! - `prescriptions` - List and add prescriptions
//! - `payments` / `expenses` - Cashbook entries
//!
//! Configuration comes from the environment; see `optic_desk_admin::config`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use optic_desk_admin::{ApiClient, AppConfig, AppError};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::Context;

#[derive(Parser)]
#[command(name = "optic-cli")]
#[command(author, version, about = "Optic Desk store tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search, add and edit customers
    Customers {
        #[command(subcommand)]
        action: commands::customers::CustomerAction,
    },
    /// Manage catalog products
    Products {
        #[command(subcommand)]
        action: commands::catalog::ProductAction,
    },
    /// Manage catalog services
    Services {
        #[command(subcommand)]
        action: commands::catalog::ServiceAction,
    },
    /// List, show and create sales
    Sales {
        #[command(subcommand)]
        action: commands::sales::SaleAction,
    },
    /// List and add prescriptions
    Prescriptions {
        #[command(subcommand)]
        action: commands::prescriptions::PrescriptionAction,
    },
    /// Record payments against sales
    Payments {
        #[command(subcommand)]
        action: commands::cashbook::PaymentAction,
    },
    /// Record cashbook expenses
    Expenses {
        #[command(subcommand)]
        action: commands::cashbook::ExpenseAction,
    },
}

impl Commands {
    const fn operation(&self) -> &'static str {
        match self {
            Self::Customers { .. } => "customers",
            Self::Products { .. } => "products",
            Self::Services { .. } => "services",
            Self::Sales { .. } => "sales",
            Self::Prescriptions { .. } => "prescriptions",
            Self::Payments { .. } => "payments",
            Self::Expenses { .. } => "expenses",
        }
    }
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &AppConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing(log_json: bool) {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "optic_desk_admin=info,optic_desk_cli=info".into());

    // Logs go to stderr so command output on stdout stays clean
    let json_layer = log_json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer =
        (!log_json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let operation = cli.command.operation();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(false);
            AppError::from(e).report("load configuration");
            return ExitCode::FAILURE;
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing(config.log_json);

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.report(operation);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: AppConfig) -> Result<(), AppError> {
    let client = ApiClient::new(&config.api)?;
    tracing::debug!(base_url = %client.base_url(), "API client ready");
    let ctx = Context { client, config };

    match command {
        Commands::Customers { action } => commands::customers::run(&ctx, action).await,
        Commands::Products { action } => commands::catalog::run_products(&ctx, action).await,
        Commands::Services { action } => commands::catalog::run_services(&ctx, action).await,
        Commands::Sales { action } => commands::sales::run(&ctx, action).await,
        Commands::Prescriptions { action } => commands::prescriptions::run(&ctx, action).await,
        Commands::Payments { action } => commands::cashbook::run_payments(&ctx, action).await,
        Commands::Expenses { action } => commands::cashbook::run_expenses(&ctx, action).await,
    }
}
