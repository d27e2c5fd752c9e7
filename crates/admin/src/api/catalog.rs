//! Product and service catalog endpoints.

use optic_desk_core::{CatalogProduct, CatalogService, NewProduct, NewService, ProductId, ServiceId};
use tracing::instrument;

use super::{ApiClient, ApiError, CreatedRecord};

impl ApiClient {
    /// List every product.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<CatalogProduct>, ApiError> {
        let url = self.endpoint(&["products"])?;
        self.get_list(url).await
    }

    /// Add a product.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, product), fields(name = %product.name()))]
    pub async fn create_product(&self, product: &NewProduct) -> Result<CreatedRecord, ApiError> {
        let url = self.endpoint(&["products"])?;
        self.post(url, product).await
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), ApiError> {
        let url = self.endpoint(&["products", &id.to_string()])?;
        self.delete(url).await
    }

    /// List every service.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_services(&self) -> Result<Vec<CatalogService>, ApiError> {
        let url = self.endpoint(&["services"])?;
        self.get_list(url).await
    }

    /// Add a service.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, service), fields(name = %service.name()))]
    pub async fn create_service(&self, service: &NewService) -> Result<CreatedRecord, ApiError> {
        let url = self.endpoint(&["services"])?;
        self.post(url, service).await
    }

    /// Delete a service.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete_service(&self, id: ServiceId) -> Result<(), ApiError> {
        let url = self.endpoint(&["services", &id.to_string()])?;
        self.delete(url).await
    }

    /// Load products and services together.
    ///
    /// # Errors
    ///
    /// Returns the first error if either request fails.
    #[instrument(skip(self))]
    pub async fn load_catalog(&self) -> Result<(Vec<CatalogProduct>, Vec<CatalogService>), ApiError> {
        futures::try_join!(self.list_products(), self.list_services())
    }
}
