mod common;

use common::{SaleScript, ScriptedGateway, SpyOrderRepository, payment, test_config};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use storefront_checkout::application::checkout::CheckoutService;
use storefront_checkout::domain::order::UserId;
use storefront_checkout::domain::ports::{OrderRepositoryRef, PaymentGatewayRef};
use storefront_checkout::error::CheckoutError;
use storefront_checkout::infrastructure::in_memory::InMemoryOrderRepository;
use storefront_checkout::infrastructure::sandbox::SandboxGateway;

#[tokio::test]
async fn test_ports_as_trait_objects() {
    let gateway: PaymentGatewayRef =
        Arc::new(SandboxGateway::new().with_latency(Duration::from_millis(5)));
    let orders: OrderRepositoryRef = Arc::new(InMemoryOrderRepository::new());
    let service = Arc::new(CheckoutService::new(gateway, orders.clone(), test_config()));

    // Verify Send + Sync by spawning tasks
    let mut handles = Vec::new();
    for i in 0..20 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            let cart = json!([{ "_id": format!("p{i}"), "price": i + 1 }]);
            service
                .pay(payment(&format!("nonce-{i}"), cart), UserId::new(format!("u{}", i % 4)))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(orders.list(None).await.unwrap().len(), 20);
    assert_eq!(
        orders
            .list(Some(&UserId::new("u0")))
            .await
            .unwrap()
            .len(),
        5
    );
}

#[tokio::test]
async fn test_concurrent_duplicate_submission_charges_once() {
    let gateway = Arc::new(SandboxGateway::new().with_latency(Duration::from_millis(20)));
    let orders: OrderRepositoryRef = Arc::new(InMemoryOrderRepository::new());
    let service = Arc::new(CheckoutService::new(
        gateway.clone(),
        orders.clone(),
        test_config(),
    ));

    let submit = |nonce: &'static str| {
        let service = service.clone();
        tokio::spawn(async move {
            let mut request = payment(nonce, json!([{ "_id": "p1", "price": 20 }]));
            request.idempotency_key = Some("double-click".to_string());
            service.pay(request, UserId::new("1")).await
        })
    };
    let first = submit("nonce-a");
    let second = submit("nonce-b");
    let results = [first.await.unwrap(), second.await.unwrap()];

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(CheckoutError::DuplicateCheckout(_))))
        .count();
    assert_eq!(succeeded + rejected, 2);
    assert!(succeeded >= 1);
    assert_eq!(gateway.sales().len(), 1);
    assert_eq!(orders.list(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_checkout_releases_idempotency_key() {
    let declining = ScriptedGateway::new(SaleScript::Decline("Test Error"));
    let orders = SpyOrderRepository::new();
    let service = CheckoutService::new(declining.clone(), orders.clone(), test_config());

    for _ in 0..2 {
        let mut request = payment("test", json!([{ "_id": "p1", "price": 20 }]));
        request.idempotency_key = Some("retry-me".to_string());
        let err = service.pay(request, UserId::new("1")).await.unwrap_err();
        assert!(matches!(err, CheckoutError::GatewayDeclined(_)));
    }

    assert_eq!(declining.sale_calls(), 2);
    assert_eq!(orders.create_calls(), 0);
}
