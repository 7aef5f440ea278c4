use crate::domain::cart::ProductId;
use crate::domain::gateway::{GatewayError, GatewayFailure};
use crate::domain::order::{OrderId, OrderStatus};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("Invalid cart: {0}")]
    InvalidCart(String),
    #[error("Price is invalid for product at line {index}{}", product_suffix(.product))]
    InvalidPrice {
        index: usize,
        product: Option<ProductId>,
    },
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("At least one product is required")]
    EmptyOrder,
    #[error("Invalid order id: {0}")]
    InvalidOrderId(String),
    #[error("Unknown order status: {0}")]
    UnknownStatus(String),
    #[error("Order status cannot change from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),
    #[error("Gateway declined the request: {0}")]
    GatewayDeclined(GatewayFailure),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("A checkout with idempotency key {0} is already in progress")]
    DuplicateCheckout(String),
    #[error("Transaction {transaction_id} was charged but its order was not recorded: {reason}")]
    Unrecorded {
        transaction_id: String,
        reason: String,
    },
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDbError(#[from] rocksdb::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

impl CheckoutError {
    /// Rejections raised before any gateway call was made.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidCart(_) | Self::InvalidPrice { .. } | Self::InvalidAmount(_) | Self::EmptyOrder
        )
    }
}

fn product_suffix(product: &Option<ProductId>) -> String {
    product
        .as_ref()
        .map(|id| format!(" ({id})"))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, CheckoutError>;
