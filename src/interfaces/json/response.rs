use crate::application::checkout::PaymentAck;
use crate::domain::gateway::{ClientToken, GatewayFailure};
use crate::error::{CheckoutError, Result};
use serde::Serialize;

pub const PAYMENT_FAILED: &str = "Payment failed";
pub const TOKEN_FAILED: &str = "Could not obtain a payment token";

/// What the checkout caller receives after `pay`.
///
/// Failures never reveal whether money was captured. Only a gateway-reported
/// decline carries details, because it is the gateway's own payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<GatewayFailure>,
}

impl PaymentResponse {
    pub fn from_result(result: &Result<PaymentAck>) -> Self {
        match result {
            Ok(_) => Self {
                ok: true,
                message: None,
                error: None,
            },
            Err(e) => Self {
                ok: false,
                message: Some(PAYMENT_FAILED),
                error: declined(e),
            },
        }
    }
}

/// What the checkout caller receives when asking for a client token.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TokenResponse {
    Issued(ClientToken),
    Failed {
        ok: bool,
        message: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<GatewayFailure>,
    },
}

impl TokenResponse {
    pub fn from_result(result: &Result<ClientToken>) -> Self {
        match result {
            Ok(token) => Self::Issued(token.clone()),
            Err(e) => Self::Failed {
                ok: false,
                message: TOKEN_FAILED,
                error: declined(e),
            },
        }
    }
}

fn declined(error: &CheckoutError) -> Option<GatewayFailure> {
    match error {
        CheckoutError::GatewayDeclined(failure) => Some(failure.clone()),
        _ => None,
    }
}
