//! Command implementations.
//!
//! Results go to stdout; logs go to stderr.

pub mod cashbook;
pub mod catalog;
pub mod customers;
pub mod prescriptions;
pub mod sales;

use chrono::NaiveDate;
use optic_desk_admin::{ApiClient, AppConfig};

/// Shared state for a single command run.
pub struct Context {
    pub client: ApiClient,
    pub config: AppConfig,
}

/// Write one line of command output.
#[allow(clippy::print_stdout)]
pub fn emit(line: impl AsRef<str>) {
    println!("{}", line.as_ref());
}

/// Pretty-print a JSON-serializable value.
pub fn emit_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => emit(text),
        Err(e) => tracing::warn!(error = %e, "Could not render output"),
    }
}

/// Date to book an entry on when none was given.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
