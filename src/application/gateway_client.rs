use crate::domain::gateway::{
    ClientToken, GatewayCallback, GatewayError, GatewayFailure, GatewayOutcome,
    PaymentAuthorization, SaleRequest, Transaction,
};
use crate::domain::money::Amount;
use crate::domain::ports::PaymentGatewayRef;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, error, instrument};

/// Bridges the callback-style gateway into awaited, single-settlement results.
///
/// Two failure modes stay distinct: a gateway-reported failure comes back as
/// `Ok(GatewayOutcome::Failure)`, while a call that could not be issued, was
/// dropped, or outlived the timeout comes back as `Err(GatewayError)`.
///
/// Nothing is retried here. Every `submit_sale` is exactly one charge attempt.
#[derive(Clone)]
pub struct GatewayClient {
    gateway: PaymentGatewayRef,
    timeout: Duration,
}

impl GatewayClient {
    pub fn new(gateway: PaymentGatewayRef, timeout: Duration) -> Self {
        Self { gateway, timeout }
    }

    #[instrument(skip(self))]
    pub async fn request_client_token(
        &self,
    ) -> Result<GatewayOutcome<ClientToken>, GatewayError> {
        let gateway = self.gateway.clone();
        self.bridge("client_token", move |callback| {
            gateway.generate_client_token(callback)
        })
        .await
    }

    /// Charges `amount` against the authorization with settlement submitted immediately.
    #[instrument(skip(self, authorization), fields(amount = %amount))]
    pub async fn submit_sale(
        &self,
        amount: Amount,
        authorization: PaymentAuthorization,
    ) -> Result<GatewayOutcome<Transaction>, GatewayError> {
        let request = SaleRequest::settled(amount, authorization);
        let gateway = self.gateway.clone();
        let outcome = self
            .bridge("sale", move |callback| gateway.sale(request, callback))
            .await?;

        Ok(match outcome {
            GatewayOutcome::Success(transaction) if !transaction.success => {
                GatewayOutcome::Failure(GatewayFailure::new(format!(
                    "transaction {} was not successful",
                    transaction.id
                )))
            }
            other => other,
        })
    }

    async fn bridge<T, F>(
        &self,
        operation: &'static str,
        call: F,
    ) -> Result<GatewayOutcome<T>, GatewayError>
    where
        T: Send + 'static,
        F: FnOnce(GatewayCallback<T>) -> Result<(), GatewayError>,
    {
        let (respond_to, response) = oneshot::channel();
        let callback: GatewayCallback<T> = Box::new(move |result| {
            let _ = respond_to.send(result);
        });

        if let Err(e) = call(callback) {
            error!(operation, error = %e, "Gateway call could not be issued");
            return Err(e);
        }

        match tokio::time::timeout(self.timeout, response).await {
            Ok(Ok(result)) => {
                debug!(operation, success = result.is_ok(), "Gateway responded");
                Ok(result.into())
            }
            Ok(Err(_)) => {
                error!(operation, "Gateway dropped the callback without responding");
                Err(GatewayError::Abandoned)
            }
            Err(_) => {
                error!(operation, timeout = ?self.timeout, "Gateway timed out");
                Err(GatewayError::Timeout(self.timeout))
            }
        }
    }
}
