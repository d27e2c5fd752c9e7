//! Prescription creation.

use optic_desk_core::PrescriptionRecord;
use tracing::instrument;

use super::{ApiClient, ApiError, CreatedRecord};

impl ApiClient {
    /// Store a prescription. The record must carry its `customer_id`.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(
        skip(self, record),
        fields(customer_id = ?record.customer_id, kind = %record.kind)
    )]
    pub async fn create_prescription(
        &self,
        record: &PrescriptionRecord,
    ) -> Result<CreatedRecord, ApiError> {
        let url = self.endpoint(&["prescriptions"])?;
        self.post(url, record).await
    }
}
