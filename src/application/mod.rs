//! Application layer containing the checkout orchestration.
//!
//! `CheckoutService` is the entry point for payments. It drives the gateway
//! through `GatewayClient` and persists orders through the repository port.
//! `OrderService` covers listing and status administration of recorded orders.

pub mod checkout;
pub mod gateway_client;
pub mod orders;
