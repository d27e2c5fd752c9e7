//! Async driver for the customer search-or-create workflow.
//!
//! Wraps the [`CustomerResolver`] state machine with the parts that need a
//! runtime: a debounce timer per keystroke, a bounded timeout per lookup, and
//! a watch channel that publishes every state change. At most one lookup task
//! is pending at a time; a new keystroke aborts it. Results are still checked
//! against the resolver's generation before they are applied, so a lookup that
//! slipped past the abort can never overwrite a newer query.
//!
//! Lookup failures and timeouts are logged at warn and shown as "no match".

use std::sync::Arc;
use std::time::Duration;

use optic_desk_core::{
    Customer, CustomerForm, CustomerId, CustomerResolver, ResolverState, SearchTicket,
    ValidationResult,
};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{Instrument, instrument};

use super::CustomerDirectory;
use crate::api::ApiError;
use crate::config::AppConfig;
use crate::error::AppError;

/// Timing knobs for the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverSettings {
    /// Quiet period after the last keystroke before searching.
    pub debounce: Duration,
    /// Upper bound on a single lookup.
    pub lookup_timeout: Duration,
}

impl ResolverSettings {
    #[must_use]
    pub const fn from_config(config: &AppConfig) -> Self {
        Self {
            debounce: config.search_debounce,
            lookup_timeout: config.api.timeout,
        }
    }
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            lookup_timeout: Duration::from_secs(5),
        }
    }
}

/// Runs a [`CustomerResolver`] against a [`CustomerDirectory`].
pub struct ResolverDriver<D> {
    inner: Arc<DriverInner<D>>,
}

struct DriverInner<D> {
    directory: D,
    settings: ResolverSettings,
    machine: Mutex<CustomerResolver>,
    pending: Mutex<Option<JoinHandle<()>>>,
    state_tx: watch::Sender<ResolverState>,
}

impl<D> Clone for ResolverDriver<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: CustomerDirectory + 'static> ResolverDriver<D> {
    #[must_use]
    pub fn new(directory: D, settings: ResolverSettings) -> Self {
        let (state_tx, _) = watch::channel(ResolverState::Idle);
        Self {
            inner: Arc::new(DriverInner {
                directory,
                settings,
                machine: Mutex::new(CustomerResolver::new()),
                pending: Mutex::new(None),
                state_tx,
            }),
        }
    }

    /// The directory this driver searches.
    #[must_use]
    pub fn directory(&self) -> &D {
        &self.inner.directory
    }

    /// Receive every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ResolverState> {
        self.inner.state_tx.subscribe()
    }

    pub async fn state(&self) -> ResolverState {
        self.inner.machine.lock().await.state().clone()
    }

    pub async fn resolved(&self) -> Option<Customer> {
        self.inner.machine.lock().await.resolved().cloned()
    }

    /// Feed a new value of the search box.
    ///
    /// Restarts the debounce timer. A blank value clears the results.
    #[instrument(skip(self))]
    pub async fn input(&self, text: &str) {
        let ticket = {
            let mut machine = self.inner.machine.lock().await;
            let ticket = machine.set_query(text);
            self.inner.publish(&machine);
            ticket
        };

        let mut pending = self.inner.pending.lock().await;
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        if let Some(ticket) = ticket {
            let span = tracing::debug_span!(
                "customer_lookup",
                query = %ticket.query(),
                generation = ticket.generation()
            );
            let inner = Arc::clone(&self.inner);
            *pending = Some(tokio::spawn(
                async move { inner.debounced_lookup(ticket).await }.instrument(span),
            ));
        }
    }

    /// Wait for the pending lookup, if any, to finish.
    pub async fn settle(&self) {
        let handle = self.inner.pending.lock().await.take();
        if let Some(handle) = handle
            && let Err(e) = handle.await
            && !e.is_cancelled()
        {
            tracing::warn!(error = %e, "Customer lookup task failed");
        }
    }

    /// Choose one of the listed customers.
    ///
    /// # Errors
    ///
    /// Fails if `id` is not among the current results.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn select(&self, id: CustomerId) -> ValidationResult<Customer> {
        self.cancel_pending().await;
        let mut machine = self.inner.machine.lock().await;
        let customer = machine.select(id)?;
        self.inner.publish(&machine);
        Ok(customer)
    }

    /// Open the create path. Returns the seed name taken from the query.
    ///
    /// # Errors
    ///
    /// Fails unless results or "no match" are showing.
    pub async fn begin_create(&self) -> ValidationResult<String> {
        self.cancel_pending().await;
        let mut machine = self.inner.machine.lock().await;
        let seed = machine.begin_create()?;
        self.inner.publish(&machine);
        Ok(seed)
    }

    /// Create a customer, then find and bind it.
    ///
    /// On failure the resolver stays in `Creating` with the error recorded, so
    /// the caller can correct the form and retry.
    ///
    /// # Errors
    ///
    /// Returns the creation failure, a validation error if the resolver is not
    /// in a state that allows creating, or [`AppError::NotFound`] if the new
    /// customer could not be found again or the query changed while it was
    /// being created.
    #[instrument(skip(self, form), fields(name = %form.name()))]
    pub async fn create(&self, form: &CustomerForm) -> Result<Customer, AppError> {
        self.cancel_pending().await;
        {
            let mut machine = self.inner.machine.lock().await;
            if !matches!(machine.state(), ResolverState::Creating { .. }) {
                machine.begin_create()?;
            }
            self.inner.publish(&machine);
        }

        if let Err(e) = self.inner.directory.create_customer(form).await {
            tracing::warn!(error = %e, "Customer creation failed");
            let mut machine = self.inner.machine.lock().await;
            machine.create_failed(e.to_string());
            self.inner.publish(&machine);
            return Err(e.into());
        }

        // Typing while the call was in flight moves the resolver out of
        // `Creating`; the customer exists but is left unbound.
        let ticket = match self.inner.machine.lock().await.create_succeeded() {
            Ok(ticket) => ticket,
            Err(e) => {
                tracing::warn!(error = %e, "Customer created but the query changed; not binding");
                return Err(AppError::NotFound(format!(
                    "created customer '{}' was not bound",
                    form.name()
                )));
            }
        };
        let outcome = self.inner.lookup(&ticket).await;

        let mut machine = self.inner.machine.lock().await;
        machine.apply_created_lookup(&ticket, outcome);
        self.inner.publish(&machine);
        let customer = machine
            .resolved()
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("customer matching '{}'", ticket.query())))?;
        tracing::info!(customer_id = %customer.id, "Customer created and bound");
        Ok(customer)
    }

    /// Clear the query and any result.
    pub async fn reset(&self) {
        self.cancel_pending().await;
        let mut machine = self.inner.machine.lock().await;
        machine.reset();
        self.inner.publish(&machine);
    }

    async fn cancel_pending(&self) {
        if let Some(handle) = self.inner.pending.lock().await.take() {
            handle.abort();
        }
    }
}

impl<D: CustomerDirectory> DriverInner<D> {
    fn publish(&self, machine: &CustomerResolver) {
        self.state_tx.send_replace(machine.state().clone());
    }

    async fn debounced_lookup(&self, ticket: SearchTicket) {
        tokio::time::sleep(self.settings.debounce).await;
        if !self.machine.lock().await.is_current(&ticket) {
            return;
        }

        let outcome = self.lookup(&ticket).await;

        let mut machine = self.machine.lock().await;
        if machine.apply_results(&ticket, outcome) {
            self.publish(&machine);
        } else {
            tracing::debug!("Discarded stale customer search result");
        }
    }

    async fn lookup(&self, ticket: &SearchTicket) -> Result<Vec<Customer>, ApiError> {
        let timeout = self.settings.lookup_timeout;
        let result = tokio::time::timeout(timeout, self.directory.search_customers(ticket.query()))
            .await
            .unwrap_or(Err(ApiError::Timeout(timeout)));
        if let Err(e) = &result {
            tracing::warn!(error = %e, query = ticket.query(), "Customer search failed");
        }
        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::Mutex as StdMutex;

    use crate::api::CreatedRecord;

    use super::*;

    fn customer(id: i64, name: &str) -> Customer {
        Customer {
            id: CustomerId::new(id),
            name: name.to_string(),
            phone: format!("90000000{id:02}"),
            gender: None,
            dob: None,
            notes: None,
        }
    }

    /// Scripted lookups by exact query; unscripted queries match stored
    /// customers by name.
    #[derive(Default)]
    struct FakeDirectory {
        scripted: HashMap<String, (Duration, Vec<Customer>)>,
        stored: StdMutex<Vec<Customer>>,
        calls: StdMutex<Vec<String>>,
        fail_search: bool,
        fail_create: bool,
        create_delay: Duration,
    }

    impl FakeDirectory {
        fn script(mut self, query: &str, delay_ms: u64, customers: Vec<Customer>) -> Self {
            self.scripted.insert(
                query.to_string(),
                (Duration::from_millis(delay_ms), customers),
            );
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CustomerDirectory for FakeDirectory {
        fn search_customers(
            &self,
            query: &str,
        ) -> impl Future<Output = Result<Vec<Customer>, ApiError>> + Send {
            self.calls.lock().unwrap().push(query.to_string());
            let scripted = self.scripted.get(query).cloned();
            let needle = query.to_lowercase();
            let stored: Vec<Customer> = self
                .stored
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.name.to_lowercase().contains(&needle))
                .cloned()
                .collect();
            let fail = self.fail_search;
            async move {
                if fail {
                    return Err(ApiError::Status {
                        status: 502,
                        status_text: "Bad Gateway".to_string(),
                    });
                }
                match scripted {
                    Some((delay, customers)) => {
                        tokio::time::sleep(delay).await;
                        Ok(customers)
                    }
                    None => Ok(stored),
                }
            }
        }

        fn create_customer(
            &self,
            form: &CustomerForm,
        ) -> impl Future<Output = Result<CreatedRecord, ApiError>> + Send {
            let result = if self.fail_create {
                Err(ApiError::Status {
                    status: 500,
                    status_text: "Internal Server Error".to_string(),
                })
            } else {
                let mut stored = self.stored.lock().unwrap();
                let id = i64::try_from(stored.len()).unwrap() + 100;
                stored.push(Customer {
                    id: CustomerId::new(id),
                    name: form.name().to_string(),
                    phone: form.phone().to_string(),
                    gender: None,
                    dob: None,
                    notes: None,
                });
                Ok(CreatedRecord::default())
            };
            let delay = self.create_delay;
            async move {
                tokio::time::sleep(delay).await;
                result
            }
        }
    }

    fn settings() -> ResolverSettings {
        ResolverSettings {
            debounce: Duration::from_millis(300),
            lookup_timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_only_searches_last_query() {
        let directory = FakeDirectory::default().script("joh", 0, vec![customer(1, "John")]);
        let driver = ResolverDriver::new(directory, settings());

        driver.input("j").await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        driver.input("jo").await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        driver.input("joh").await;
        driver.settle().await;

        assert_eq!(driver.directory().calls(), vec!["joh".to_string()]);
        assert!(matches!(
            driver.state().await,
            ResolverState::Results { query, customers } if query == "joh" && customers.len() == 1
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_lookup_never_lands() {
        let directory = FakeDirectory::default()
            .script("jo", 800, vec![customer(1, "John")])
            .script("joh", 10, vec![]);
        let driver = ResolverDriver::new(directory, settings());
        let rx = driver.subscribe();

        driver.input("jo").await;
        // Past the debounce: the slow "jo" lookup is in flight.
        tokio::time::sleep(Duration::from_millis(400)).await;
        driver.input("joh").await;
        driver.settle().await;
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(
            driver.directory().calls(),
            vec!["jo".to_string(), "joh".to_string()]
        );
        let expected = ResolverState::NoMatch {
            query: "joh".to_string(),
        };
        assert_eq!(driver.state().await, expected);
        assert_eq!(*rx.borrow(), expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_input_goes_idle_without_searching() {
        let driver = ResolverDriver::new(FakeDirectory::default(), settings());
        driver.input("   ").await;
        driver.settle().await;
        assert_eq!(driver.state().await, ResolverState::Idle);
        assert!(driver.directory().calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_failure_shows_no_match() {
        let directory = FakeDirectory {
            fail_search: true,
            ..FakeDirectory::default()
        };
        let driver = ResolverDriver::new(directory, settings());
        driver.input("ann").await;
        driver.settle().await;
        assert_eq!(
            driver.state().await,
            ResolverState::NoMatch {
                query: "ann".to_string()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_search_times_out_to_no_match() {
        let directory = FakeDirectory::default().script("slow", 5_000, vec![customer(3, "Slow")]);
        let driver = ResolverDriver::new(directory, settings());
        driver.input("slow").await;
        driver.settle().await;
        assert!(matches!(driver.state().await, ResolverState::NoMatch { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_binds_customer() {
        let directory = FakeDirectory::default().script("ra", 0, vec![customer(4, "Ravi")]);
        let driver = ResolverDriver::new(directory, settings());
        driver.input("ra").await;
        driver.settle().await;

        let chosen = driver.select(CustomerId::new(4)).await.unwrap();
        assert_eq!(chosen.name, "Ravi");
        assert_eq!(driver.resolved().await.unwrap().id, CustomerId::new(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_then_bind_first_match() {
        let driver = ResolverDriver::new(FakeDirectory::default(), settings());
        driver.input("Meera").await;
        driver.settle().await;
        assert_eq!(driver.begin_create().await.unwrap(), "Meera");

        let form = CustomerForm::new("Meera", "9876543210").unwrap();
        let created = driver.create(&form).await.unwrap();
        assert_eq!(created.name, "Meera");
        assert_eq!(created.id, CustomerId::new(100));
        assert!(matches!(driver.state().await, ResolverState::Resolved(c) if c.id == created.id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_failure_is_recorded_and_retryable() {
        let directory = FakeDirectory {
            fail_create: true,
            ..FakeDirectory::default()
        };
        let driver = ResolverDriver::new(directory, settings());
        driver.input("Zed").await;
        driver.settle().await;

        let form = CustomerForm::new("Zed", "9000000000").unwrap();
        let err = driver.create(&form).await.unwrap_err();
        assert!(matches!(err, AppError::Api(ApiError::Status { status: 500, .. })));
        assert!(matches!(
            driver.state().await,
            ResolverState::Creating { seed, error: Some(_) } if seed == "Zed"
        ));
        assert_eq!(driver.begin_create().await.unwrap(), "Zed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_during_create_leaves_customer_unbound() {
        let directory = FakeDirectory {
            create_delay: Duration::from_millis(500),
            ..FakeDirectory::default()
        };
        let driver = ResolverDriver::new(directory, settings());
        driver.input("Meera").await;
        driver.settle().await;
        driver.begin_create().await.unwrap();

        let creating = driver.clone();
        let task = tokio::spawn(async move {
            let form = CustomerForm::new("Meera", "9876543210").unwrap();
            creating.create(&form).await
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        driver.input("Mee").await;

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(driver.directory().stored.lock().unwrap().len(), 1);
        assert!(driver.resolved().await.is_none());
    }
}
