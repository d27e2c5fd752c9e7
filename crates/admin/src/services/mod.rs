//! Sale workflows built on the API client.
//!
//! # Services
//!
//! - `customer_resolver` - Debounced search-or-create customer lookup
//! - `submission` - Mapping of composed sales and prescriptions to request bodies
//! - `checkout` - Submitting the composed sale
//! - `prescriptions` - Saving prescriptions with local fallback
//!
//! Each service is generic over the narrow backend trait it needs, so tests
//! can substitute an in-memory backend for [`ApiClient`].

pub mod checkout;
pub mod customer_resolver;
pub mod prescriptions;
pub mod submission;

pub use checkout::{CheckoutReceipt, CheckoutService};
pub use customer_resolver::{ResolverDriver, ResolverSettings};
pub use prescriptions::{PrescriptionSaveOutcome, PrescriptionService};
pub use submission::{SaleContext, prescription_body, sale_body};

use std::future::Future;

use optic_desk_core::{Customer, CustomerForm, CustomerId, PrescriptionRecord};

use crate::api::{ApiClient, ApiError, CreatedRecord, NewSale};

/// Customer lookup and creation.
pub trait CustomerDirectory: Send + Sync {
    fn search_customers(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<Customer>, ApiError>> + Send;

    fn create_customer(
        &self,
        form: &CustomerForm,
    ) -> impl Future<Output = Result<CreatedRecord, ApiError>> + Send;
}

/// Sale creation.
pub trait SalesBackend: Send + Sync {
    fn create_sale(&self, sale: &NewSale)
    -> impl Future<Output = Result<CreatedRecord, ApiError>> + Send;
}

/// Prescription storage.
pub trait PrescriptionStore: Send + Sync {
    fn create_prescription(
        &self,
        record: &PrescriptionRecord,
    ) -> impl Future<Output = Result<CreatedRecord, ApiError>> + Send;

    fn list_prescriptions(
        &self,
        customer_id: CustomerId,
    ) -> impl Future<Output = Result<Vec<PrescriptionRecord>, ApiError>> + Send;
}

impl CustomerDirectory for ApiClient {
    fn search_customers(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<Customer>, ApiError>> + Send {
        Self::search_customers(self, query)
    }

    fn create_customer(
        &self,
        form: &CustomerForm,
    ) -> impl Future<Output = Result<CreatedRecord, ApiError>> + Send {
        Self::create_customer(self, form)
    }
}

impl SalesBackend for ApiClient {
    fn create_sale(&self, sale: &NewSale)
    -> impl Future<Output = Result<CreatedRecord, ApiError>> + Send {
        Self::create_sale(self, sale)
    }
}

impl PrescriptionStore for ApiClient {
    fn create_prescription(
        &self,
        record: &PrescriptionRecord,
    ) -> impl Future<Output = Result<CreatedRecord, ApiError>> + Send {
        Self::create_prescription(self, record)
    }

    fn list_prescriptions(
        &self,
        customer_id: CustomerId,
    ) -> impl Future<Output = Result<Vec<PrescriptionRecord>, ApiError>> + Send {
        Self::list_prescriptions(self, customer_id)
    }
}
