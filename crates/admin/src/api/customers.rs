//! Customer and prescription endpoints.

use optic_desk_core::{Customer, CustomerForm, CustomerId, PrescriptionRecord};
use tracing::instrument;

use super::{ApiClient, ApiError, CreatedRecord};

impl ApiClient {
    /// Search customers by free text (name or phone).
    ///
    /// A blank query lists customers without a filter.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn search_customers(&self, query: &str) -> Result<Vec<Customer>, ApiError> {
        let mut url = self.endpoint(&["customers"])?;
        let query = query.trim();
        if !query.is_empty() {
            url.query_pairs_mut().append_pair("q", query);
        }
        let customers: Vec<Customer> = self.get_list(url).await?;
        tracing::debug!(count = customers.len(), "Customer search returned");
        Ok(customers)
    }

    /// Create a customer.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, form), fields(name = %form.name()))]
    pub async fn create_customer(&self, form: &CustomerForm) -> Result<CreatedRecord, ApiError> {
        let url = self.endpoint(&["customers"])?;
        self.post(url, form).await
    }

    /// Fetch one customer.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_customer(&self, id: CustomerId) -> Result<Customer, ApiError> {
        let url = self.endpoint(&["customers", &id.to_string()])?;
        self.get(url).await
    }

    /// Replace a customer's details.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, form), fields(id = %id))]
    pub async fn update_customer(
        &self,
        id: CustomerId,
        form: &CustomerForm,
    ) -> Result<CreatedRecord, ApiError> {
        let url = self.endpoint(&["customers", &id.to_string()])?;
        self.put(url, form).await
    }

    /// List a customer's prescriptions.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn list_prescriptions(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<PrescriptionRecord>, ApiError> {
        let url = self.endpoint(&["customers", &customer_id.to_string(), "prescriptions"])?;
        self.get_list(url).await
    }
}
