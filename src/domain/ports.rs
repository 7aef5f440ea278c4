use super::gateway::{ClientToken, GatewayCallback, GatewayError, SaleRequest, Transaction};
use super::order::{Order, OrderDraft, OrderId, UserId};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Persistence for orders. Writes are single-document inserts or replacements.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create(&self, draft: OrderDraft) -> Result<Order>;
    async fn update(&self, order: Order) -> Result<()>;
    async fn get(&self, id: OrderId) -> Result<Option<Order>>;
    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Order>>;
    /// Orders newest first, optionally restricted to one buyer.
    async fn list(&self, buyer: Option<&UserId>) -> Result<Vec<Order>>;
}

/// Third-party payment processor, in the callback shape of its SDK.
///
/// A returned `Err` means the call could not be issued and the callback will
/// never run. Otherwise the callback is invoked at most once, with either the
/// result or the failure the gateway reported.
pub trait PaymentGateway: Send + Sync {
    fn generate_client_token(
        &self,
        callback: GatewayCallback<ClientToken>,
    ) -> std::result::Result<(), GatewayError>;

    fn sale(
        &self,
        request: SaleRequest,
        callback: GatewayCallback<Transaction>,
    ) -> std::result::Result<(), GatewayError>;
}

pub type OrderRepositoryRef = Arc<dyn OrderRepository>;
pub type PaymentGatewayRef = Arc<dyn PaymentGateway>;
