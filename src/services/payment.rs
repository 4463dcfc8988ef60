use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::entities::PaymentMethod;
use crate::errors::ServiceError;

/// Proof of a captured charge.
#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    pub transaction_id: String,
}

/// External payment capability. The booking workflow only ever calls
/// `charge`; swapping in a real processor is a construction-time choice.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Attempt to capture `amount` with the given method. A decline surfaces
    /// as `ServiceError::PaymentFailed`; no state is retained either way.
    async fn charge(
        &self,
        amount: Decimal,
        method: PaymentMethod,
    ) -> Result<PaymentReceipt, ServiceError>;
}

/// Simulated gateway: fixed latency, uniform-random outcome. A draw below
/// `1 - success_rate` declines; the boundary itself succeeds.
pub struct MockPaymentGateway {
    success_rate: f64,
    latency: Duration,
}

impl MockPaymentGateway {
    pub fn new(success_rate: f64, latency: Duration) -> Self {
        Self {
            success_rate: success_rate.clamp(0.0, 1.0),
            latency,
        }
    }

    fn next_transaction_id() -> String {
        let suffix: u32 = rand::thread_rng().gen_range(0..1000);
        format!("TXN{}{:03}", Utc::now().timestamp_millis(), suffix)
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    #[instrument(skip(self), fields(amount = %amount, method = %method.as_str()))]
    async fn charge(
        &self,
        amount: Decimal,
        method: PaymentMethod,
    ) -> Result<PaymentReceipt, ServiceError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let draw: f64 = rand::thread_rng().gen();
        if draw < 1.0 - self.success_rate {
            warn!("payment declined");
            return Err(ServiceError::PaymentFailed("Payment failed".to_string()));
        }

        let receipt = PaymentReceipt {
            transaction_id: Self::next_transaction_id(),
        };
        info!(transaction_id = %receipt.transaction_id, "payment captured");
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn always_approving_gateway_returns_receipts() {
        let gateway = MockPaymentGateway::new(1.0, Duration::ZERO);
        let receipt = gateway
            .charge(dec!(100), PaymentMethod::Upi)
            .await
            .unwrap();
        assert!(receipt.transaction_id.starts_with("TXN"));
    }

    #[tokio::test]
    async fn always_declining_gateway_fails_with_payment_error() {
        let gateway = MockPaymentGateway::new(0.0, Duration::ZERO);
        let err = gateway
            .charge(dec!(100), PaymentMethod::Cash)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::PaymentFailed(_)));
    }

    #[tokio::test]
    async fn transaction_ids_vary() {
        let gateway = MockPaymentGateway::new(1.0, Duration::ZERO);
        let mut ids = std::collections::HashSet::new();
        for _ in 0..10 {
            let receipt = gateway.charge(dec!(1), PaymentMethod::Upi).await.unwrap();
            ids.insert(receipt.transaction_id);
        }
        assert!(ids.len() > 1);
    }
}
