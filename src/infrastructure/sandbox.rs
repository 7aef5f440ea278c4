//! A self-contained stand-in for the payment processor's sandbox environment.
//!
//! Nonces follow the processor's published test values so that client-side
//! payment forms configured for sandbox produce the same outcomes here.

use crate::domain::gateway::{
    ClientToken, GatewayCallback, GatewayError, GatewayFailure, SaleRequest, Transaction,
    TransactionStatus,
};
use crate::domain::ports::PaymentGateway;
use rust_decimal::Decimal;
use std::any::Any;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

pub const VALID_NONCE: &str = "fake-valid-nonce";
pub const PROCESSOR_DECLINED_NONCE: &str = "fake-processor-declined-visa-nonce";
pub const GATEWAY_REJECTED_FRAUD_NONCE: &str = "fake-gateway-rejected-fraud-nonce";
pub const CONSUMED_NONCE: &str = "fake-consumed-nonce";

/// Callbacks an unresponsive sandbox holds on to; older ones are dropped first.
pub const MAX_UNANSWERED: usize = 64;

/// How the sandbox reacts to calls, for exercising failure handling end to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SandboxMode {
    /// Calls are answered through the callback.
    #[default]
    Online,
    /// Calls fail before anything is sent.
    Offline,
    /// Calls are accepted but never answered.
    Unresponsive,
}

pub struct SandboxGateway {
    mode: SandboxMode,
    latency: Duration,
    consumed: Mutex<HashSet<String>>,
    sales: Mutex<Vec<SaleRequest>>,
    unanswered: Mutex<VecDeque<Box<dyn Any + Send>>>,
}

impl Default for SandboxGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl SandboxGateway {
    pub fn new() -> Self {
        Self::with_mode(SandboxMode::Online)
    }

    pub fn with_mode(mode: SandboxMode) -> Self {
        Self {
            mode,
            latency: Duration::ZERO,
            consumed: Mutex::new(HashSet::new()),
            sales: Mutex::new(Vec::new()),
            unanswered: Mutex::new(VecDeque::new()),
        }
    }

    /// Delays every callback, simulating the network round-trip.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Sale requests that reached the processor, in arrival order.
    pub fn sales(&self) -> Vec<SaleRequest> {
        self.sales
            .lock()
            .map(|sales| sales.clone())
            .unwrap_or_default()
    }

    fn admit(&self) -> Result<(), GatewayError> {
        match self.mode {
            SandboxMode::Offline => Err(GatewayError::Transport(
                "sandbox gateway is offline".to_string(),
            )),
            _ => Ok(()),
        }
    }

    fn respond<T: Send + 'static>(
        &self,
        callback: GatewayCallback<T>,
        result: Result<T, GatewayFailure>,
    ) {
        if self.mode == SandboxMode::Unresponsive {
            // Keep the callback alive so the caller sees silence rather than a drop.
            // Only the most recent ones are held; their callers have long timed out.
            if let Ok(mut parked) = self.unanswered.lock() {
                if parked.len() == MAX_UNANSWERED {
                    parked.pop_front();
                }
                parked.push_back(Box::new((callback, result)));
            }
            return;
        }

        if self.latency.is_zero() {
            callback(result);
        } else {
            let latency = self.latency;
            tokio::spawn(async move {
                tokio::time::sleep(latency).await;
                callback(result);
            });
        }
    }

    fn settle(&self, request: &SaleRequest) -> Result<Transaction, GatewayFailure> {
        let amount: Decimal = request.amount.into();
        if amount <= Decimal::ZERO {
            return Err(GatewayFailure::with_code(
                "Amount must be greater than zero.",
                "81531",
            ));
        }
        if request.amount.fraction_digits() > 2 {
            return Err(GatewayFailure::with_code(
                "Amount is an invalid format.",
                "81503",
            ));
        }

        let nonce = request.payment_method_nonce.as_str();
        if nonce.is_empty() {
            return Err(GatewayFailure::with_code(
                "Unknown or expired payment_method_nonce.",
                "91565",
            ));
        }

        let first_use = self
            .consumed
            .lock()
            .map(|mut consumed| consumed.insert(nonce.to_string()))
            .unwrap_or(false);
        if !first_use || nonce == CONSUMED_NONCE {
            return Err(GatewayFailure::with_code(
                "Cannot use a payment_method_nonce more than once.",
                "93107",
            ));
        }

        match nonce {
            PROCESSOR_DECLINED_NONCE => Err(GatewayFailure::with_code("Do Not Honor", "2000")),
            GATEWAY_REJECTED_FRAUD_NONCE => Err(GatewayFailure::new("Gateway Rejected: fraud")),
            _ => Ok(Transaction {
                id: format!("sandbox_{}", Uuid::new_v4().simple()),
                amount,
                status: if request.options.submit_for_settlement {
                    TransactionStatus::SubmittedForSettlement
                } else {
                    TransactionStatus::Authorized
                },
                success: true,
            }),
        }
    }
}

impl PaymentGateway for SandboxGateway {
    fn generate_client_token(
        &self,
        callback: GatewayCallback<ClientToken>,
    ) -> Result<(), GatewayError> {
        self.admit()?;
        let token = ClientToken {
            client_token: format!("sandbox_{}", Uuid::new_v4().simple()),
        };
        self.respond(callback, Ok(token));
        Ok(())
    }

    fn sale(
        &self,
        request: SaleRequest,
        callback: GatewayCallback<Transaction>,
    ) -> Result<(), GatewayError> {
        self.admit()?;
        let result = self.settle(&request);
        debug!(amount = %request.amount, approved = result.is_ok(), "Sandbox sale");
        if let Ok(mut sales) = self.sales.lock() {
            sales.push(request);
        }
        self.respond(callback, result);
        Ok(())
    }
}
