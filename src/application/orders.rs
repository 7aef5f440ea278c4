use crate::domain::order::{Order, OrderId, OrderStatus, UserId};
use crate::domain::ports::OrderRepositoryRef;
use crate::error::{CheckoutError, Result};
use chrono::Utc;
use tracing::{info, instrument};

/// Read and administration access to recorded orders.
pub struct OrderService {
    orders: OrderRepositoryRef,
}

impl OrderService {
    pub fn new(orders: OrderRepositoryRef) -> Self {
        Self { orders }
    }

    /// All orders, or one buyer's orders, newest first.
    pub async fn list(&self, buyer: Option<&UserId>) -> Result<Vec<Order>> {
        self.orders.list(buyer).await
    }

    #[instrument(skip(self))]
    pub async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Order> {
        let mut order = self
            .orders
            .get(id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(id))?;

        let previous = order.status;
        order.transition(status, Utc::now())?;
        self.orders.update(order.clone()).await?;

        info!(order_id = %id, from = %previous, to = %status, "Order status updated");
        Ok(order)
    }
}
