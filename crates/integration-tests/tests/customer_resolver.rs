//! Integration tests for the customer search-or-create driver over HTTP.
//!
//! Run with: cargo test -p optic-desk-integration-tests --test customer_resolver

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use optic_desk_admin::services::{ResolverDriver, ResolverSettings};
use optic_desk_admin::{ApiClient, AppError};
use optic_desk_core::{CustomerForm, CustomerId, ResolverState};
use optic_desk_integration_tests::FakeBackend;

fn driver(backend: &FakeBackend, lookup_timeout: Duration) -> ResolverDriver<ApiClient> {
    ResolverDriver::new(
        backend.client(),
        ResolverSettings {
            debounce: Duration::from_millis(40),
            lookup_timeout,
        },
    )
}

fn searched_queries(backend: &FakeBackend) -> Vec<String> {
    backend
        .requests_to("GET /customers")
        .into_iter()
        .filter_map(|r| r.query)
        .collect()
}

#[tokio::test]
async fn test_typing_burst_searches_once() {
    let backend = FakeBackend::start().await;
    backend.seed_customer("Asha Rao", "98450 11223");
    let driver = driver(&backend, Duration::from_secs(2));

    for text in ["a", "as", "ash", "asha"] {
        driver.input(text).await;
    }
    driver.settle().await;

    assert_eq!(searched_queries(&backend), vec!["q=asha".to_string()]);
    match driver.state().await {
        ResolverState::Results { query, customers } => {
            assert_eq!(query, "asha");
            assert_eq!(customers[0].name, "Asha Rao");
        }
        other => panic!("expected results, got {}", other.label()),
    }
}

#[tokio::test]
async fn test_slow_earlier_search_is_discarded() {
    let backend = FakeBackend::start().await;
    backend.seed_customer("Ravi Kumar", "90000 00001");
    backend.seed_customer("Ravina Shah", "90000 00002");
    backend.delay_search("ravi", Duration::from_millis(400));
    let driver = driver(&backend, Duration::from_secs(2));
    let rx = driver.subscribe();

    driver.input("ravi").await;
    // Let the debounce elapse so the slow lookup is in flight.
    tokio::time::sleep(Duration::from_millis(120)).await;
    driver.input("ravin").await;
    driver.settle().await;
    tokio::time::sleep(Duration::from_millis(500)).await;

    let state = driver.state().await;
    match &state {
        ResolverState::Results { query, customers } => {
            assert_eq!(query, "ravin");
            assert_eq!(customers.len(), 1);
            assert_eq!(customers[0].name, "Ravina Shah");
        }
        other => panic!("expected results, got {}", other.label()),
    }
    assert_eq!(*rx.borrow(), state);
}

#[tokio::test]
async fn test_no_match_then_create_binds_new_customer() {
    let backend = FakeBackend::start().await;
    let driver = driver(&backend, Duration::from_secs(2));

    driver.input("Meera").await;
    driver.settle().await;
    assert_eq!(
        driver.state().await,
        ResolverState::NoMatch {
            query: "Meera".to_string()
        }
    );

    let seed = driver.begin_create().await.unwrap();
    let form = CustomerForm::new(&seed, "98860 44556").unwrap();
    let customer = driver.create(&form).await.unwrap();

    assert_eq!(customer.name, "Meera");
    assert_eq!(customer.phone, "98860 44556");
    assert_eq!(driver.resolved().await.unwrap().id, customer.id);
    assert_eq!(backend.customers().len(), 1);
    assert_eq!(
        searched_queries(&backend),
        vec!["q=Meera".to_string(), "q=Meera".to_string()]
    );
}

#[tokio::test]
async fn test_created_customer_missing_on_requery() {
    let backend = FakeBackend::start().await;
    backend.hide_created_customers();
    let driver = driver(&backend, Duration::from_secs(2));

    driver.input("Ghost").await;
    driver.settle().await;
    driver.begin_create().await.unwrap();

    let err = driver
        .create(&CustomerForm::new("Ghost", "90000 09999").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(matches!(
        driver.state().await,
        ResolverState::Creating { error: Some(_), .. }
    ));
    assert!(driver.resolved().await.is_none());
}

#[tokio::test]
async fn test_rejected_create_stays_in_creating() {
    let backend = FakeBackend::start().await;
    let driver = driver(&backend, Duration::from_secs(2));

    driver.input("Zed").await;
    driver.settle().await;
    backend.fail("POST /customers", axum::http::StatusCode::UNPROCESSABLE_ENTITY);

    let err = driver
        .create(&CustomerForm::new("Zed", "90000 01234").unwrap())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), optic_desk_admin::FailureKind::Validation);
    assert!(matches!(
        driver.state().await,
        ResolverState::Creating { seed, error: Some(_) } if seed == "Zed"
    ));

    backend.recover("POST /customers");
    let customer = driver
        .create(&CustomerForm::new("Zed", "90000 01234").unwrap())
        .await
        .unwrap();
    assert_eq!(customer.name, "Zed");
}

#[tokio::test]
async fn test_search_timeout_shows_no_match() {
    let backend = FakeBackend::start().await;
    backend.seed_customer("Slow Sam", "90000 00003");
    backend.delay_search("slow", Duration::from_millis(500));
    let driver = driver(&backend, Duration::from_millis(100));

    driver.input("slow").await;
    driver.settle().await;

    assert_eq!(
        driver.state().await,
        ResolverState::NoMatch {
            query: "slow".to_string()
        }
    );
}

#[tokio::test]
async fn test_select_from_results() {
    let backend = FakeBackend::start().await;
    let id = backend.seed_customer("Nisha Iyer", "97400 55667");
    backend.seed_customer("Nishant Rao", "97400 55668");
    let driver = driver(&backend, Duration::from_secs(2));

    driver.input("nish").await;
    driver.settle().await;

    let chosen = driver.select(CustomerId::new(id)).await.unwrap();
    assert_eq!(chosen.name, "Nisha Iyer");
    assert!(matches!(driver.state().await, ResolverState::Resolved(c) if c.id == chosen.id));
    assert!(driver.select(CustomerId::new(999)).await.is_err());
}
