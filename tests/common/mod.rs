#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use storefront_checkout::application::checkout::{CheckoutService, PaymentRequest};
use storefront_checkout::config::CheckoutConfig;
use storefront_checkout::domain::gateway::{
    ClientToken, GatewayCallback, GatewayError, GatewayFailure, PaymentAuthorization, SaleRequest,
    Transaction, TransactionStatus,
};
use storefront_checkout::domain::order::{Order, OrderDraft, OrderId, UserId};
use storefront_checkout::domain::ports::{OrderRepository, PaymentGateway};
use storefront_checkout::error::{CheckoutError, Result};
use storefront_checkout::infrastructure::in_memory::InMemoryOrderRepository;

/// How the scripted gateway answers a sale.
#[derive(Clone, Copy)]
pub enum SaleScript {
    Approve,
    Decline(&'static str),
    Throw,
    Hang,
}

/// Gateway double that records every sale request it receives.
pub struct ScriptedGateway {
    script: SaleScript,
    sales: Mutex<Vec<SaleRequest>>,
    parked: Mutex<Vec<GatewayCallback<Transaction>>>,
}

impl ScriptedGateway {
    pub fn new(script: SaleScript) -> Arc<Self> {
        Arc::new(Self {
            script,
            sales: Mutex::new(Vec::new()),
            parked: Mutex::new(Vec::new()),
        })
    }

    pub fn sale_calls(&self) -> usize {
        self.sales.lock().unwrap().len()
    }

    pub fn sales(&self) -> Vec<SaleRequest> {
        self.sales.lock().unwrap().clone()
    }
}

impl PaymentGateway for ScriptedGateway {
    fn generate_client_token(
        &self,
        callback: GatewayCallback<ClientToken>,
    ) -> std::result::Result<(), GatewayError> {
        match self.script {
            SaleScript::Decline(message) => callback(Err(GatewayFailure::new(message))),
            SaleScript::Throw => return Err(GatewayError::Transport("Test Error".into())),
            SaleScript::Hang => {}
            SaleScript::Approve => callback(Ok(ClientToken {
                client_token: "test".to_string(),
            })),
        }
        Ok(())
    }

    fn sale(
        &self,
        request: SaleRequest,
        callback: GatewayCallback<Transaction>,
    ) -> std::result::Result<(), GatewayError> {
        let amount = request.amount.value();
        let count = {
            let mut sales = self.sales.lock().unwrap();
            sales.push(request);
            sales.len()
        };
        match self.script {
            SaleScript::Approve => callback(Ok(Transaction {
                id: format!("txn_{count}"),
                amount,
                status: TransactionStatus::SubmittedForSettlement,
                success: true,
            })),
            SaleScript::Decline(message) => callback(Err(GatewayFailure::new(message))),
            SaleScript::Throw => return Err(GatewayError::Transport("Test Error".into())),
            SaleScript::Hang => self.parked.lock().unwrap().push(callback),
        }
        Ok(())
    }
}

/// Repository double that counts inserts and can fail the first few of them.
#[derive(Default)]
pub struct SpyOrderRepository {
    inner: InMemoryOrderRepository,
    creates: AtomicUsize,
    failures_left: AtomicUsize,
    key_taken_elsewhere: AtomicBool,
    drafts: Mutex<Vec<OrderDraft>>,
}

impl SpyOrderRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(times: usize) -> Arc<Self> {
        let spy = Self::default();
        spy.failures_left.store(times, Ordering::SeqCst);
        Arc::new(spy)
    }

    /// Rejects every keyed insert as if another process had recorded the key.
    pub fn key_taken_elsewhere() -> Arc<Self> {
        let spy = Self::default();
        spy.key_taken_elsewhere.store(true, Ordering::SeqCst);
        Arc::new(spy)
    }

    pub fn create_calls(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn drafts(&self) -> Vec<OrderDraft> {
        self.drafts.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrderRepository for SpyOrderRepository {
    async fn create(&self, draft: OrderDraft) -> Result<Order> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.drafts.lock().unwrap().push(draft.clone());
        if self.key_taken_elsewhere.load(Ordering::SeqCst)
            && let Some(key) = draft.idempotency_key()
        {
            return Err(CheckoutError::DuplicateCheckout(key.to_string()));
        }
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(CheckoutError::InternalError("database unavailable".into()));
        }
        self.inner.create(draft).await
    }

    async fn update(&self, order: Order) -> Result<()> {
        self.inner.update(order).await
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        self.inner.get(id).await
    }

    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Order>> {
        self.inner.find_by_idempotency_key(key).await
    }

    async fn list(&self, buyer: Option<&UserId>) -> Result<Vec<Order>> {
        self.inner.list(buyer).await
    }
}

pub fn test_config() -> CheckoutConfig {
    CheckoutConfig::default()
        .with_gateway_timeout(Duration::from_millis(100))
        .with_persist_backoff(Duration::ZERO)
}

pub fn checkout(
    gateway: &Arc<ScriptedGateway>,
    orders: &Arc<SpyOrderRepository>,
) -> CheckoutService {
    CheckoutService::new(gateway.clone(), orders.clone(), test_config())
}

pub fn payment(nonce: &str, cart: serde_json::Value) -> PaymentRequest {
    PaymentRequest {
        nonce: PaymentAuthorization::new(nonce),
        cart: Some(cart),
        idempotency_key: None,
    }
}
