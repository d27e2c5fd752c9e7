//! Submitting the composed sale.
//!
//! The cart is validated and snapshotted, mapped to a create-sale body and
//! sent. The composer is cleared only after the backend accepts the sale; on
//! any failure it is left exactly as it was so the operator can retry. A
//! prescription filled in alongside the sale is saved afterwards and never
//! fails the checkout.

use optic_desk_core::{EditorMode, EmptyCartPolicy, OrderComposer, PrescriptionEditor, Totals};
use tracing::instrument;

use super::prescriptions::save_to;
use super::submission::{SaleContext, prescription_body, sale_body};
use super::{PrescriptionSaveOutcome, PrescriptionStore, SalesBackend};
use crate::api::CreatedRecord;
use crate::error::AppError;

/// What a successful checkout produced.
#[derive(Debug)]
pub struct CheckoutReceipt {
    /// Backend acknowledgement for the sale.
    pub sale: CreatedRecord,
    /// Figures the sale was submitted with.
    pub totals: Totals,
    /// Result of saving the attached prescription, if one was attached.
    pub prescription: Option<PrescriptionSaveOutcome>,
}

/// Sends composed sales to a backend.
#[derive(Debug, Clone)]
pub struct CheckoutService<B> {
    backend: B,
    policy: EmptyCartPolicy,
}

impl<B> CheckoutService<B>
where
    B: SalesBackend + PrescriptionStore,
{
    #[must_use]
    pub const fn new(backend: B, policy: EmptyCartPolicy) -> Self {
        Self { backend, policy }
    }

    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub const fn policy(&self) -> EmptyCartPolicy {
        self.policy
    }

    /// Submit the cart, then save the attached prescription.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the cart cannot be submitted and
    /// `AppError::Api` if the backend refuses the sale. The composer is
    /// unchanged in both cases.
    #[instrument(skip_all, fields(date = %context.date, lines = composer.lines().len()))]
    pub async fn submit(
        &self,
        composer: &mut OrderComposer,
        context: &SaleContext,
        prescription: Option<&PrescriptionEditor>,
    ) -> Result<CheckoutReceipt, AppError> {
        let draft = composer.prepare_submission(self.policy)?;
        let body = sale_body(&draft, context);

        let sale = self.backend.create_sale(&body).await?;
        tracing::info!(
            sale_id = ?sale.id,
            customer_id = %draft.customer_id,
            net_amount = %draft.totals.net_amount,
            due_amount = %draft.totals.due_amount,
            status = %body.status,
            "Sale created"
        );
        composer.clear();

        let prescription = match prescription {
            Some(editor) if editor.mode() != EditorMode::ReadOnly => {
                let record = prescription_body(editor.record(), draft.customer_id);
                Some(save_to(&self.backend, record).await)
            }
            _ => None,
        };

        Ok(CheckoutReceipt {
            sale,
            totals: draft.totals,
            prescription,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::future::Future;
    use std::sync::Mutex;

    use optic_desk_core::{
        CustomerId, LineItemSeed, Money, PrescriptionRecord, SaleStatus, ValidationError,
    };

    use super::*;
    use crate::api::{ApiError, NewSale};
    use crate::error::FailureKind;

    #[derive(Default)]
    struct FakeBackend {
        sales: Mutex<Vec<NewSale>>,
        prescriptions: Mutex<Vec<PrescriptionRecord>>,
        reject_sales: bool,
        prescriptions_offline: bool,
    }

    impl SalesBackend for FakeBackend {
        fn create_sale(
            &self,
            sale: &NewSale,
        ) -> impl Future<Output = Result<CreatedRecord, ApiError>> + Send {
            let result = if self.reject_sales {
                Err(ApiError::Status {
                    status: 422,
                    status_text: "Unprocessable Entity".to_string(),
                })
            } else {
                self.sales.lock().unwrap().push(sale.clone());
                Ok(CreatedRecord {
                    id: Some(31),
                    message: Some("Sale created".to_string()),
                })
            };
            async move { result }
        }
    }

    impl PrescriptionStore for FakeBackend {
        fn create_prescription(
            &self,
            record: &PrescriptionRecord,
        ) -> impl Future<Output = Result<CreatedRecord, ApiError>> + Send {
            let result = if self.prescriptions_offline {
                Err(ApiError::Status {
                    status: 503,
                    status_text: "Service Unavailable".to_string(),
                })
            } else {
                self.prescriptions.lock().unwrap().push(record.clone());
                Ok(CreatedRecord::default())
            };
            async move { result }
        }

        fn list_prescriptions(
            &self,
            _customer_id: CustomerId,
        ) -> impl Future<Output = Result<Vec<PrescriptionRecord>, ApiError>> + Send {
            async { Ok(Vec::new()) }
        }
    }

    fn composer() -> OrderComposer {
        let mut composer = OrderComposer::new();
        composer.bind_customer(CustomerId::new(12)).unwrap();
        composer
            .add_line_item(LineItemSeed::product().priced(Money::from_units(1800)))
            .unwrap();
        composer.set_received_amount("1800");
        composer
    }

    fn context() -> SaleContext {
        SaleContext::on(chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
    }

    #[tokio::test]
    async fn test_checkout_clears_composer_on_success() {
        let service = CheckoutService::new(FakeBackend::default(), EmptyCartPolicy::Reject);
        let mut composer = composer();

        let receipt = service.submit(&mut composer, &context(), None).await.unwrap();

        assert_eq!(receipt.sale.id, Some(31));
        assert_eq!(receipt.totals.net_amount, Money::from_units(1800));
        assert!(receipt.prescription.is_none());
        assert!(composer.is_empty());
        assert!(composer.customer_id().is_none());

        let sales = service.backend().sales.lock().unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].status, SaleStatus::Completed);
    }

    #[tokio::test]
    async fn test_rejected_sale_leaves_composer_untouched() {
        let service = CheckoutService::new(
            FakeBackend {
                reject_sales: true,
                ..FakeBackend::default()
            },
            EmptyCartPolicy::Reject,
        );
        let mut composer = composer();
        let before = composer.clone();

        let err = service.submit(&mut composer, &context(), None).await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::Validation);
        assert_eq!(composer, before);
    }

    #[tokio::test]
    async fn test_empty_cart_follows_policy() {
        let mut composer = OrderComposer::new();
        composer.bind_customer(CustomerId::new(12)).unwrap();

        let strict = CheckoutService::new(FakeBackend::default(), EmptyCartPolicy::Reject);
        let err = strict.submit(&mut composer, &context(), None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ValidationError::EmptyCart)));
        assert!(strict.backend().sales.lock().unwrap().is_empty());

        let lenient =
            CheckoutService::new(FakeBackend::default(), EmptyCartPolicy::AllowZeroAmount);
        let receipt = lenient.submit(&mut composer, &context(), None).await.unwrap();
        assert_eq!(receipt.totals.net_amount, Money::ZERO);
    }

    #[tokio::test]
    async fn test_checkout_without_customer_sends_nothing() {
        let service = CheckoutService::new(FakeBackend::default(), EmptyCartPolicy::Reject);
        let mut composer = OrderComposer::new();
        composer.add_line_item(LineItemSeed::service()).unwrap();

        let err = service.submit(&mut composer, &context(), None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ValidationError::CustomerRequired)));
        assert!(service.backend().sales.lock().unwrap().is_empty());
        assert_eq!(composer.lines().len(), 1);
    }

    #[tokio::test]
    async fn test_attached_prescription_takes_sale_customer() {
        let service = CheckoutService::new(FakeBackend::default(), EmptyCartPolicy::Reject);
        let mut composer = composer();
        let mut editor = PrescriptionEditor::new_create(None);
        editor.set_doctor("Dr. Rao").unwrap();

        let receipt = service
            .submit(&mut composer, &context(), Some(&editor))
            .await
            .unwrap();

        assert!(receipt.prescription.unwrap().is_persisted());
        let saved = service.backend().prescriptions.lock().unwrap();
        assert_eq!(saved[0].customer_id, Some(CustomerId::new(12)));
        assert_eq!(saved[0].doctor, "Dr. Rao");
    }

    #[tokio::test]
    async fn test_prescription_failure_does_not_fail_checkout() {
        let service = CheckoutService::new(
            FakeBackend {
                prescriptions_offline: true,
                ..FakeBackend::default()
            },
            EmptyCartPolicy::Reject,
        );
        let mut composer = composer();
        let editor = PrescriptionEditor::new_create(Some(CustomerId::new(12)));

        let receipt = service
            .submit(&mut composer, &context(), Some(&editor))
            .await
            .unwrap();

        assert!(matches!(
            receipt.prescription,
            Some(PrescriptionSaveOutcome::SavedLocally { .. })
        ));
        assert!(composer.is_empty());
    }

    #[tokio::test]
    async fn test_read_only_prescription_is_not_saved() {
        let service = CheckoutService::new(FakeBackend::default(), EmptyCartPolicy::Reject);
        let mut composer = composer();
        let record = PrescriptionRecord::for_customer(Some(CustomerId::new(12)));
        let editor = PrescriptionEditor::open_read_only(&record);

        let receipt = service
            .submit(&mut composer, &context(), Some(&editor))
            .await
            .unwrap();

        assert!(receipt.prescription.is_none());
        assert!(service.backend().prescriptions.lock().unwrap().is_empty());
    }
}
