use crate::domain::order::{Order, OrderDraft, OrderId, UserId};
use crate::domain::ports::OrderRepository;
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Documents {
    orders: HashMap<OrderId, Order>,
    idempotency: HashMap<String, OrderId>,
}

/// A thread-safe in-memory order store.
///
/// Uses `Arc<RwLock<..>>` so clones share the same documents.
/// Ideal for testing or when persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryOrderRepository {
    documents: Arc<RwLock<Documents>>,
}

impl InMemoryOrderRepository {
    /// Creates a new, empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(&self, draft: OrderDraft) -> Result<Order> {
        let mut documents = self.documents.write().await;
        if let Some(key) = draft.idempotency_key()
            && documents.idempotency.contains_key(key)
        {
            return Err(CheckoutError::DuplicateCheckout(key.to_string()));
        }

        let order = draft.into_order(Utc::now());
        if let Some(key) = &order.idempotency_key {
            documents.idempotency.insert(key.clone(), order.id);
        }
        documents.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn update(&self, order: Order) -> Result<()> {
        let mut documents = self.documents.write().await;
        if !documents.orders.contains_key(&order.id) {
            return Err(CheckoutError::OrderNotFound(order.id));
        }
        documents.orders.insert(order.id, order);
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        let documents = self.documents.read().await;
        Ok(documents.orders.get(&id).cloned())
    }

    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Order>> {
        let documents = self.documents.read().await;
        Ok(documents
            .idempotency
            .get(key)
            .and_then(|id| documents.orders.get(id))
            .cloned())
    }

    async fn list(&self, buyer: Option<&UserId>) -> Result<Vec<Order>> {
        let documents = self.documents.read().await;
        let mut orders: Vec<Order> = documents
            .orders
            .values()
            .filter(|order| buyer.is_none_or(|buyer| &order.buyer == buyer))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}
