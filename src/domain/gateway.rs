use crate::domain::money::Amount;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Single-use payment method token produced by the client-side payment form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentAuthorization(pub String);

impl PaymentAuthorization {
    pub fn new(nonce: impl Into<String>) -> Self {
        Self(nonce.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Short-lived credential handed to the client so it can collect payment details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientToken {
    pub client_token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleOptions {
    pub submit_for_settlement: bool,
}

/// Charge request sent to the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRequest {
    pub amount: Amount,
    pub payment_method_nonce: PaymentAuthorization,
    pub options: SaleOptions,
}

impl SaleRequest {
    /// Builds a sale that is captured immediately rather than only authorized.
    pub fn settled(amount: Amount, authorization: PaymentAuthorization) -> Self {
        Self {
            amount,
            payment_method_nonce: authorization,
            options: SaleOptions {
                submit_for_settlement: true,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Authorized,
    SubmittedForSettlement,
}

/// The gateway's record of a charge attempt, mirrored into the order's `payment` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub success: bool,
}

/// A failure the gateway reported through its error slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayFailure {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl GatewayFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: Some(code.into()),
        }
    }
}

impl fmt::Display for GatewayFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({})", self.message, code),
            None => f.write_str(&self.message),
        }
    }
}

/// Settled result of a gateway call that completed.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayOutcome<T> {
    Success(T),
    Failure(GatewayFailure),
}

impl<T> GatewayOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl<T> From<Result<T, GatewayFailure>> for GatewayOutcome<T> {
    fn from(result: Result<T, GatewayFailure>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(failure) => Self::Failure(failure),
        }
    }
}

/// The gateway call itself did not complete.
///
/// Whether money moved is unknown when one of these is returned from a sale.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("gateway call failed: {0}")]
    Transport(String),
    #[error("gateway did not respond within {0:?}")]
    Timeout(Duration),
    #[error("gateway dropped the request without responding")]
    Abandoned,
}

/// Error-first completion handler in the shape the vendor SDK expects.
pub type GatewayCallback<T> = Box<dyn FnOnce(Result<T, GatewayFailure>) + Send + 'static>;
