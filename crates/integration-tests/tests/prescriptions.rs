//! Integration tests for saving and listing prescriptions.
//!
//! Run with: cargo test -p optic-desk-integration-tests --test prescriptions

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use optic_desk_admin::services::{PrescriptionSaveOutcome, PrescriptionService};
use optic_desk_core::{
    CustomerId, EditorMode, PrescriptionEditor, PrescriptionField, PrescriptionRecord,
    PrescriptionType, ValidationError,
};
use optic_desk_integration_tests::FakeBackend;

/// A record with every one of the 26 fields filled with a distinct value.
fn full_record(customer: i64) -> PrescriptionRecord {
    let mut record = PrescriptionRecord::for_customer(Some(CustomerId::new(customer)));
    record.id = "RX-2024-117".to_string();
    record.kind = PrescriptionType::Contacts;
    record.date = "2024-07-15".to_string();
    record.doctor = "Dr. Menon".to_string();
    for (i, field) in PrescriptionField::all().into_iter().enumerate() {
        record.set(field, format!("{}.{i:02}", field.key().len()));
    }
    record
}

#[tokio::test]
async fn test_every_field_survives_the_round_trip() {
    let backend = FakeBackend::start().await;
    let customer = backend.seed_customer("Asha Rao", "98450 11223");
    let service = PrescriptionService::new(backend.client());
    let record = full_record(customer);

    let outcome = service.save(record.clone()).await;
    assert!(outcome.is_persisted());

    let stored = &backend.prescriptions()[0];
    for field in PrescriptionField::all() {
        assert_eq!(stored[field.key()], record.get(field), "{field}");
    }

    let listed = service.list(CustomerId::new(customer)).await.unwrap();
    assert_eq!(listed, vec![record]);
}

#[tokio::test]
async fn test_list_is_scoped_to_the_customer() {
    let backend = FakeBackend::start().await;
    let asha = backend.seed_customer("Asha Rao", "98450 11223");
    let ravi = backend.seed_customer("Ravi Kumar", "90000 00001");
    let service = PrescriptionService::new(backend.client());

    service.save(full_record(asha)).await;
    service.save(full_record(asha)).await;
    service.save(full_record(ravi)).await;

    assert_eq!(service.list(CustomerId::new(asha)).await.unwrap().len(), 2);
    assert_eq!(service.list(CustomerId::new(ravi)).await.unwrap().len(), 1);
    assert!(service.list(CustomerId::new(999)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_edit_resubmits_changed_values() {
    let backend = FakeBackend::start().await;
    let customer = backend.seed_customer("Asha Rao", "98450 11223");
    let service = PrescriptionService::new(backend.client());
    service.save(full_record(customer)).await;

    let on_file = service.list(CustomerId::new(customer)).await.unwrap();
    let mut editor = PrescriptionEditor::open_edit(&on_file[0]);
    let sph = "left_n_sph".parse::<PrescriptionField>().unwrap();
    editor.set_field(sph, "+2.00").unwrap();

    let outcome = service.submit(&editor).await.unwrap();
    assert!(outcome.is_persisted());
    let stored = backend.prescriptions();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[1]["left_n_sph"], "+2.00");
    assert_eq!(stored[1]["right_n_sph"], on_file[0].get("right_n_sph".parse().unwrap()));
}

#[tokio::test]
async fn test_read_only_submit_sends_nothing() {
    let backend = FakeBackend::start().await;
    let service = PrescriptionService::new(backend.client());
    let editor = PrescriptionEditor::open_read_only(&full_record(1));
    assert_eq!(editor.mode(), EditorMode::ReadOnly);

    let outcome = service.submit(&editor).await.unwrap();
    assert!(matches!(outcome, PrescriptionSaveOutcome::Closed));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_missing_customer_is_refused_locally() {
    let backend = FakeBackend::start().await;
    let service = PrescriptionService::new(backend.client());
    let mut editor = PrescriptionEditor::new_create(None);
    editor.set_doctor("Dr. Menon").unwrap();

    let err = service.submit(&editor).await.unwrap_err();
    assert_eq!(err, ValidationError::CustomerRequired);
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_backend_failure_keeps_a_local_copy() {
    let backend = FakeBackend::start().await;
    let customer = backend.seed_customer("Asha Rao", "98450 11223");
    backend.fail("POST /prescriptions", StatusCode::BAD_GATEWAY);
    let service = PrescriptionService::new(backend.client());
    let editor = PrescriptionEditor::open_edit(&full_record(customer));

    match service.submit(&editor).await.unwrap() {
        PrescriptionSaveOutcome::SavedLocally { record, error } => {
            assert_eq!(&record, editor.record());
            assert_eq!(error.status(), Some(502));
        }
        other => panic!("expected a local copy, got {other:?}"),
    }
    assert!(backend.prescriptions().is_empty());
}
