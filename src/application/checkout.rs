use crate::application::gateway_client::GatewayClient;
use crate::config::CheckoutConfig;
use crate::domain::cart::Cart;
use crate::domain::gateway::{ClientToken, GatewayOutcome, PaymentAuthorization, Transaction};
use crate::domain::money::{self, Amount};
use crate::domain::order::{Order, OrderDraft, OrderId, UserId};
use crate::domain::ports::{OrderRepositoryRef, PaymentGatewayRef};
use crate::error::{CheckoutError, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Mutex;
use tracing::{error, info, instrument, warn};

/// A checkout attempt as submitted by the client.
///
/// `cart` is kept as raw JSON because its shape is only trusted after validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub nonce: PaymentAuthorization,
    #[serde(default)]
    pub cart: Option<Value>,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// Acknowledgement of a paid and recorded checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentAck {
    pub order_id: OrderId,
    pub transaction_id: String,
    /// True when the idempotency key matched an earlier order and nothing was charged.
    pub replayed: bool,
}

impl PaymentAck {
    fn for_order(order: &Order, replayed: bool) -> Self {
        Self {
            order_id: order.id,
            transaction_id: order.payment.id.clone(),
            replayed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStage {
    Validating,
    Charging,
    Recording,
    Done,
}

impl fmt::Display for CheckoutStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Validating => "validating",
            Self::Charging => "charging",
            Self::Recording => "recording",
            Self::Done => "done",
        })
    }
}

/// Orchestrates a checkout: validate the cart, charge it, then record the order.
///
/// An order is only ever created after the gateway confirmed the charge, and a
/// rejected or failed charge never creates one. Each call to `pay` is independent;
/// the only state shared between concurrent checkouts is the order repository and
/// the set of idempotency keys currently in flight.
///
/// Idempotency keys belong to the buyer who first paid with them. The in-flight
/// guard is per process: two processes sharing one store can both charge the same
/// key, and the later one ends as `Unrecorded` when the store rejects its insert.
pub struct CheckoutService {
    gateway: GatewayClient,
    orders: OrderRepositoryRef,
    config: CheckoutConfig,
    in_flight: Mutex<HashSet<String>>,
}

impl CheckoutService {
    pub fn new(
        gateway: PaymentGatewayRef,
        orders: OrderRepositoryRef,
        config: CheckoutConfig,
    ) -> Self {
        Self {
            gateway: GatewayClient::new(gateway, config.gateway_timeout),
            orders,
            config,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Obtains a token the client needs to render its payment form.
    pub async fn client_token(&self) -> Result<ClientToken> {
        match self.gateway.request_client_token().await? {
            GatewayOutcome::Success(token) => Ok(token),
            GatewayOutcome::Failure(failure) => {
                error!(error = %failure, "Gateway refused to issue a client token");
                Err(CheckoutError::GatewayDeclined(failure))
            }
        }
    }

    #[instrument(skip(self, request), fields(buyer = %buyer))]
    pub async fn pay(&self, request: PaymentRequest, buyer: UserId) -> Result<PaymentAck> {
        let (cart, total) = validate(&request).inspect_err(|e| {
            warn!(stage = %CheckoutStage::Validating, error = %e, "Checkout rejected");
        })?;

        let _reservation = match &request.idempotency_key {
            Some(key) => {
                let reservation = self.reserve(key)?;
                if let Some(order) = self.orders.find_by_idempotency_key(key).await? {
                    if order.buyer != buyer {
                        warn!(
                            idempotency_key = key.as_str(),
                            "Idempotency key belongs to another buyer"
                        );
                        return Err(CheckoutError::DuplicateCheckout(key.clone()));
                    }
                    info!(order_id = %order.id, "Idempotency key already paid; replaying");
                    return Ok(PaymentAck::for_order(&order, true));
                }
                Some(reservation)
            }
            None => None,
        };

        let transaction = self.charge(total, request.nonce).await?;

        let draft = OrderDraft::new(cart.into_lines(), transaction, buyer)?
            .with_idempotency_key(request.idempotency_key);
        let order = self.record(draft).await?;

        info!(
            stage = %CheckoutStage::Done,
            order_id = %order.id,
            transaction_id = %order.payment.id,
            "Checkout complete"
        );
        Ok(PaymentAck::for_order(&order, false))
    }

    async fn charge(&self, total: Amount, nonce: PaymentAuthorization) -> Result<Transaction> {
        info!(stage = %CheckoutStage::Charging, amount = %total, "Submitting sale");
        match self.gateway.submit_sale(total, nonce).await {
            Ok(GatewayOutcome::Success(transaction)) => Ok(transaction),
            Ok(GatewayOutcome::Failure(failure)) => {
                error!(stage = %CheckoutStage::Charging, error = %failure, "Gateway declined the sale");
                Err(CheckoutError::GatewayDeclined(failure))
            }
            Err(e) => {
                error!(
                    stage = %CheckoutStage::Charging,
                    error = %e,
                    "Sale outcome unknown; no order recorded"
                );
                Err(e.into())
            }
        }
    }

    /// Inserts the order, retrying because the money has already moved.
    ///
    /// A key conflict is not retried: another process recorded the same key first.
    async fn record(&self, draft: OrderDraft) -> Result<Order> {
        let attempts = self.config.persist_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.orders.create(draft.clone()).await {
                Ok(order) => return Ok(order),
                Err(e @ CheckoutError::DuplicateCheckout(_)) => {
                    last_error = Some(e);
                    break;
                }
                Err(e) => {
                    warn!(
                        stage = %CheckoutStage::Recording,
                        attempt,
                        attempts,
                        error = %e,
                        "Order insert failed"
                    );
                    last_error = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(self.config.persist_backoff).await;
                    }
                }
            }
        }

        let transaction_id = draft.payment().id.clone();
        let reason = last_error.map(|e| e.to_string()).unwrap_or_default();
        error!(
            stage = %CheckoutStage::Recording,
            transaction_id = %transaction_id,
            buyer = %draft.buyer(),
            amount = %draft.payment().amount,
            reason = %reason,
            "Charge captured but order not recorded; reconciliation required"
        );
        Err(CheckoutError::Unrecorded {
            transaction_id,
            reason,
        })
    }

    fn reserve(&self, key: &str) -> Result<Reservation<'_>> {
        let mut in_flight = self
            .in_flight
            .lock()
            .map_err(|_| CheckoutError::InternalError("idempotency registry poisoned".into()))?;
        if !in_flight.insert(key.to_string()) {
            warn!(idempotency_key = key, "Duplicate checkout submitted while in flight");
            return Err(CheckoutError::DuplicateCheckout(key.to_string()));
        }
        Ok(Reservation {
            registry: &self.in_flight,
            key: key.to_string(),
        })
    }
}

/// Shape, price and emptiness checks. Runs before any network call.
fn validate(request: &PaymentRequest) -> Result<(Cart, Amount)> {
    let cart = Cart::from_json(request.cart.as_ref())?;
    if cart.is_empty() {
        return Err(CheckoutError::InvalidCart("cart is empty".to_string()));
    }
    let total = money::cart_total(&cart)?;
    Ok((cart, total))
}

/// Holds an idempotency key for the duration of one checkout.
struct Reservation<'a> {
    registry: &'a Mutex<HashSet<String>>,
    key: String,
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if let Ok(mut in_flight) = self.registry.lock() {
            in_flight.remove(&self.key);
        }
    }
}
