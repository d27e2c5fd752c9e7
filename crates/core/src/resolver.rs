//! Search-or-create workflow that binds a sale to a customer.
//!
//! [`CustomerResolver`] is a synchronous state machine over one text query.
//! It performs no I/O: every lookup it wants is handed out as a
//! [`SearchTicket`], and the caller reports the outcome back with the same
//! ticket. Each query change bumps a generation counter; outcomes carrying an
//! older generation are discarded, so a slow response for `"jo"` can never
//! overwrite the results for `"joh"` no matter which arrives last.
//!
//! ```text
//! Idle ──type──▶ Searching ──▶ Results ──select──▶ Resolved
//!                    │            │
//!                    ▼            ▼
//!                 NoMatch ──create──▶ Creating ──created + re-query──▶ Resolved
//! ```

use crate::customer::Customer;
use crate::error::{ValidationError, ValidationResult};
use crate::types::CustomerId;

/// Message recorded when a freshly created customer cannot be found again.
pub const CREATED_NOT_FOUND: &str = "customer was created but could not be found";

/// A lookup the caller should perform, tagged with the generation it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    generation: u64,
    query: String,
}

impl SearchTicket {
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// Where the resolver currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResolverState {
    /// Empty query.
    #[default]
    Idle,
    /// A lookup for `query` is pending.
    Searching { query: String },
    /// The latest lookup returned matches.
    Results {
        query: String,
        customers: Vec<Customer>,
    },
    /// The latest lookup found nothing (or failed).
    NoMatch { query: String },
    /// A new customer is being created, seeded with the query text.
    Creating {
        seed: String,
        /// Last creation failure, shown to the user until retried.
        error: Option<String>,
    },
    /// A customer has been chosen.
    Resolved(Customer),
}

impl ResolverState {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Searching { .. } => "searching",
            Self::Results { .. } => "showing results",
            Self::NoMatch { .. } => "showing no match",
            Self::Creating { .. } => "creating",
            Self::Resolved(_) => "resolved",
        }
    }
}

/// The search-or-create state machine.
#[derive(Debug, Clone, Default)]
pub struct CustomerResolver {
    state: ResolverState,
    query: String,
    generation: u64,
}

impl CustomerResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> &ResolverState {
        &self.state
    }

    /// The raw text currently in the search box.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub const fn resolved(&self) -> Option<&Customer> {
        match &self.state {
            ResolverState::Resolved(customer) => Some(customer),
            _ => None,
        }
    }

    /// True if `ticket` still belongs to the latest query.
    #[must_use]
    pub const fn is_current(&self, ticket: &SearchTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Record a change of the search text.
    ///
    /// Returns the lookup to perform, or `None` for a blank query (which moves
    /// to `Idle`). Any previously issued ticket becomes stale.
    pub fn set_query(&mut self, text: &str) -> Option<SearchTicket> {
        self.query = text.to_owned();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            self.bump();
            self.state = ResolverState::Idle;
            return None;
        }
        let ticket = self.issue(trimmed);
        self.state = ResolverState::Searching {
            query: trimmed.to_owned(),
        };
        Some(ticket)
    }

    /// Report the outcome of a search lookup.
    ///
    /// A failed lookup is shown as "no match". Returns `false` if the ticket
    /// was stale and the outcome was discarded.
    pub fn apply_results<E>(
        &mut self,
        ticket: &SearchTicket,
        outcome: Result<Vec<Customer>, E>,
    ) -> bool {
        if !self.is_current(ticket) || !matches!(self.state, ResolverState::Searching { .. }) {
            return false;
        }
        let query = ticket.query.clone();
        self.state = match outcome {
            Ok(customers) if !customers.is_empty() => ResolverState::Results { query, customers },
            Ok(_) | Err(_) => ResolverState::NoMatch { query },
        };
        true
    }

    /// Pick one of the listed customers.
    ///
    /// # Errors
    ///
    /// Fails if no results are showing or `id` is not among them.
    pub fn select(&mut self, id: CustomerId) -> ValidationResult<Customer> {
        let ResolverState::Results { customers, .. } = &self.state else {
            return Err(ValidationError::transition(
                "select a customer",
                self.state.label(),
            ));
        };
        let customer = customers
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(ValidationError::UnknownCustomer(id))?;
        self.bump();
        self.query = customer.label();
        self.state = ResolverState::Resolved(customer.clone());
        Ok(customer)
    }

    /// Open the create path, seeded with the current query text.
    ///
    /// Allowed while showing results or no match, and again from `Creating`
    /// to retry. Returns the seed name.
    ///
    /// # Errors
    ///
    /// Fails from any other state.
    pub fn begin_create(&mut self) -> ValidationResult<String> {
        let seed = match &self.state {
            ResolverState::Results { query, .. } | ResolverState::NoMatch { query } => {
                query.clone()
            }
            ResolverState::Creating { seed, .. } => seed.clone(),
            other => {
                return Err(ValidationError::transition(
                    "create a customer",
                    other.label(),
                ));
            }
        };
        self.bump();
        self.state = ResolverState::Creating {
            seed: seed.clone(),
            error: None,
        };
        Ok(seed)
    }

    /// Record a failed creation. The form stays open for a retry.
    pub fn create_failed(&mut self, message: impl Into<String>) {
        if let ResolverState::Creating { error, .. } = &mut self.state {
            *error = Some(message.into());
        }
    }

    /// Record a successful creation and get the re-query to run.
    ///
    /// The creation response does not carry the full record, so the seed text
    /// is searched again and the first match is bound.
    ///
    /// # Errors
    ///
    /// Fails unless the resolver is `Creating`.
    pub fn create_succeeded(&mut self) -> ValidationResult<SearchTicket> {
        let ResolverState::Creating { seed, .. } = &self.state else {
            return Err(ValidationError::transition(
                "finish creating a customer",
                self.state.label(),
            ));
        };
        let seed = seed.clone();
        Ok(self.issue(&seed))
    }

    /// Report the outcome of the post-creation re-query.
    ///
    /// Binds the first match. If nothing comes back the resolver stays in
    /// `Creating` with [`CREATED_NOT_FOUND`]. Returns `false` for a stale ticket.
    pub fn apply_created_lookup<E: core::fmt::Display>(
        &mut self,
        ticket: &SearchTicket,
        outcome: Result<Vec<Customer>, E>,
    ) -> bool {
        if !self.is_current(ticket) || !matches!(self.state, ResolverState::Creating { .. }) {
            return false;
        }
        match outcome {
            Ok(mut customers) if !customers.is_empty() => {
                let customer = customers.swap_remove(0);
                self.bump();
                self.query = customer.label();
                self.state = ResolverState::Resolved(customer);
            }
            Ok(_) => self.create_failed(CREATED_NOT_FOUND),
            Err(e) => self.create_failed(format!("{CREATED_NOT_FOUND}: {e}")),
        }
        true
    }

    /// Clear everything and invalidate outstanding tickets.
    pub fn reset(&mut self) {
        self.bump();
        self.query.clear();
        self.state = ResolverState::Idle;
    }

    fn bump(&mut self) {
        self.generation += 1;
    }

    fn issue(&mut self, query: &str) -> SearchTicket {
        self.bump();
        SearchTicket {
            generation: self.generation,
            query: query.to_owned(),
        }
    }
}
