use async_trait::async_trait;
use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::config::RazorpayConfig;
use crate::domain::errors::DomainError;
use crate::domain::order::{GatewayOrder, GatewayOrderRequest};
use crate::domain::ports::PaymentGateway;

/// Client for the Razorpay orders API.
pub struct RazorpayClient {
    http: reqwest::Client,
    config: RazorpayConfig,
}

#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

#[derive(Debug, Deserialize)]
struct RazorpayOrder {
    id: String,
    amount: i64,
    currency: String,
    receipt: Option<String>,
    status: String,
}

impl RazorpayClient {
    pub fn new(config: RazorpayConfig) -> Result<Self, DomainError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DomainError::Configuration(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    fn orders_url(&self) -> String {
        format!("{}/orders", self.config.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl PaymentGateway for RazorpayClient {
    async fn create_order(
        &self,
        request: GatewayOrderRequest,
    ) -> Result<GatewayOrder, DomainError> {
        let (key_id, key_secret) = self.config.credentials()?;
        debug!("Creating Razorpay order for {} {}", request.amount, request.currency);

        let response = self
            .http
            .post(self.orders_url())
            .basic_auth(key_id, Some(key_secret))
            .json(&CreateOrderBody {
                amount: request.amount,
                currency: &request.currency,
                receipt: &request.receipt,
            })
            .send()
            .await
            .map_err(|e| DomainError::Gateway(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Razorpay rejected order creation ({status}): {body}");
            return Err(DomainError::Gateway(format!(
                "order creation failed with status {status}"
            )));
        }

        let order: RazorpayOrder = response
            .json()
            .await
            .map_err(|e| DomainError::Gateway(format!("unreadable order response: {e}")))?;
        Ok(GatewayOrder {
            id: order.id,
            amount: order.amount,
            currency: order.currency,
            receipt: order.receipt,
            status: order.status,
        })
    }
}
