use crate::domain::cart::CartLine;
use crate::domain::gateway::Transaction;
use crate::error::{CheckoutError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub Uuid);

impl OrderId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for OrderId {
    type Err = CheckoutError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| CheckoutError::InvalidOrderId(format!("{s}: {e}")))
    }
}

/// The authenticated user placing the order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fulfilment lifecycle of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    #[serde(rename = "Not Processed")]
    NotProcessed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [Self; 5] = [
        Self::NotProcessed,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotProcessed => "Not Processed",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    pub fn can_transition_to(&self, next: Self) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (NotProcessed, Processing)
                | (NotProcessed, Cancelled)
                | (Processing, Shipped)
                | (Processing, Cancelled)
                | (Shipped, Delivered)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = CheckoutError;

    /// Accepts the display name in any case, with or without the space.
    fn from_str(s: &str) -> Result<Self> {
        let wanted: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .collect();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().replace(' ', "").eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| CheckoutError::UnknownStatus(s.to_string()))
    }
}

/// What the orchestrator hands to the repository after a successful charge.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    products: Vec<CartLine>,
    payment: Transaction,
    buyer: UserId,
    idempotency_key: Option<String>,
}

impl OrderDraft {
    pub fn new(products: Vec<CartLine>, payment: Transaction, buyer: UserId) -> Result<Self> {
        if products.is_empty() {
            return Err(CheckoutError::EmptyOrder);
        }
        Ok(Self {
            products,
            payment,
            buyer,
            idempotency_key: None,
        })
    }

    pub fn with_idempotency_key(mut self, key: Option<String>) -> Self {
        self.idempotency_key = key;
        self
    }

    pub fn products(&self) -> &[CartLine] {
        &self.products
    }

    pub fn payment(&self) -> &Transaction {
        &self.payment
    }

    pub fn buyer(&self) -> &UserId {
        &self.buyer
    }

    pub fn idempotency_key(&self) -> Option<&str> {
        self.idempotency_key.as_deref()
    }

    /// Materializes the persisted document with a fresh id and timestamps.
    pub fn into_order(self, now: DateTime<Utc>) -> Order {
        Order {
            id: OrderId::generate(),
            products: self.products,
            payment: self.payment,
            buyer: self.buyer,
            status: OrderStatus::default(),
            idempotency_key: self.idempotency_key,
            created_at: now,
            updated_at: now,
        }
    }
}

/// The storefront's durable record that a purchase was paid for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    /// The cart lines as the buyer supplied them.
    pub products: Vec<CartLine>,
    pub payment: Transaction,
    pub buyer: UserId,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Moves the order along its lifecycle, refusing transitions the table does not allow.
    pub fn transition(&mut self, next: OrderStatus, now: DateTime<Utc>) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(CheckoutError::InvalidStatusTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }
}
