//! Prescription save workflow.
//!
//! A failed save does not discard the form: the record is handed back as
//! [`PrescriptionSaveOutcome::SavedLocally`] together with the error, so the
//! caller can keep it on screen and retry.

use optic_desk_core::{
    CustomerId, PrescriptionEditor, PrescriptionRecord, SubmitAction, ValidationError,
};
use tracing::instrument;

use super::PrescriptionStore;
use crate::api::{ApiError, CreatedRecord};

/// Result of submitting the prescription form.
#[derive(Debug)]
pub enum PrescriptionSaveOutcome {
    /// The backend stored the record.
    Saved(CreatedRecord),
    /// The backend call failed; the record is kept locally.
    SavedLocally {
        record: PrescriptionRecord,
        error: ApiError,
    },
    /// The form was read-only; nothing was sent.
    Closed,
}

impl PrescriptionSaveOutcome {
    /// True when the backend acknowledged the record.
    #[must_use]
    pub const fn is_persisted(&self) -> bool {
        matches!(self, Self::Saved(_))
    }
}

/// Saves and lists prescriptions.
#[derive(Debug, Clone)]
pub struct PrescriptionService<S> {
    store: S,
}

impl<S: PrescriptionStore> PrescriptionService<S> {
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Submit the editor's current record.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::CustomerRequired`] when a writable form has
    /// no customer. Backend failures are not errors here; see
    /// [`PrescriptionSaveOutcome::SavedLocally`].
    #[instrument(skip_all, fields(mode = ?editor.mode()))]
    pub async fn submit(
        &self,
        editor: &PrescriptionEditor,
    ) -> Result<PrescriptionSaveOutcome, ValidationError> {
        match editor.prepare_submit()? {
            SubmitAction::Close => Ok(PrescriptionSaveOutcome::Closed),
            SubmitAction::Save(record) => Ok(self.save(record).await),
        }
    }

    /// Send a record to the backend.
    pub async fn save(&self, record: PrescriptionRecord) -> PrescriptionSaveOutcome {
        save_to(&self.store, record).await
    }

    /// All prescriptions on file for a customer.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    pub async fn list(&self, customer_id: CustomerId) -> Result<Vec<PrescriptionRecord>, ApiError> {
        self.store.list_prescriptions(customer_id).await
    }
}

pub(crate) async fn save_to<S: PrescriptionStore>(
    store: &S,
    record: PrescriptionRecord,
) -> PrescriptionSaveOutcome {
    match store.create_prescription(&record).await {
        Ok(created) => {
            tracing::info!(
                prescription = %record.id,
                customer_id = ?record.customer_id,
                "Prescription saved"
            );
            PrescriptionSaveOutcome::Saved(created)
        }
        Err(error) => {
            tracing::warn!(
                error = %error,
                prescription = %record.id,
                "Prescription save failed, keeping local copy"
            );
            PrescriptionSaveOutcome::SavedLocally { record, error }
        }
    }
}
