//! HTTP gateway to the KDS server
//!
//! Wraps the REST surface behind [`OrdersGateway`] so the controller can
//! run against an in-memory fake in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use shared::order::{DisplayOrder, OrderStatus};

use crate::config::DisplayConfig;
use crate::error::{ClientError, ClientResult};

/// KDS server REST surface used by a display
#[async_trait]
pub trait OrdersGateway: Send + Sync {
    /// `GET /api/displays/{id}/orders?tenant={tid}`
    async fn fetch_orders(&self) -> ClientResult<Vec<DisplayOrder>>;

    /// `PUT /api/order-status/{displayOrderId}`
    async fn update_status(
        &self,
        display_order_id: &str,
        status: OrderStatus,
    ) -> ClientResult<DisplayOrder>;
}

/// Server response envelope
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T> Envelope<T> {
    fn into_data(self) -> ClientResult<T> {
        if !self.success {
            return Err(ClientError::InvalidResponse(
                self.error.unwrap_or_else(|| "Server reported failure".to_string()),
            ));
        }
        self.data
            .ok_or_else(|| ClientError::InvalidResponse("Missing data field".to_string()))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateStatusRequest<'a> {
    status: OrderStatus,
    tenant_id: &'a str,
    display_id: &'a str,
}

/// HTTP implementation of [`OrdersGateway`]
#[derive(Debug, Clone)]
pub struct OrdersClient {
    config: DisplayConfig,
    client: reqwest::Client,
}

impl OrdersClient {
    pub fn new(config: DisplayConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_default();
        Self { config, client }
    }
}

#[async_trait]
impl OrdersGateway for OrdersClient {
    async fn fetch_orders(&self) -> ClientResult<Vec<DisplayOrder>> {
        let url = format!(
            "{}/api/displays/{}/orders?tenant={}",
            self.config.server_base_url, self.config.display_id, self.config.tenant_id
        );
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(ClientError::Load(format!(
                "Server returned {}",
                response.status()
            )));
        }

        let envelope: Envelope<Vec<DisplayOrder>> = response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        envelope.into_data()
    }

    async fn update_status(
        &self,
        display_order_id: &str,
        status: OrderStatus,
    ) -> ClientResult<DisplayOrder> {
        let url = format!(
            "{}/api/order-status/{}",
            self.config.server_base_url, display_order_id
        );
        let response = self
            .client
            .put(&url)
            .json(&UpdateStatusRequest {
                status,
                tenant_id: &self.config.tenant_id,
                display_id: &self.config.display_id,
            })
            .send()
            .await?;

        let http_status = response.status();
        if !http_status.is_success() {
            let envelope: Envelope<DisplayOrder> = response
                .json()
                .await
                .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
            let message = envelope
                .error
                .unwrap_or_else(|| http_status.to_string());
            return Err(match http_status.as_u16() {
                409 => ClientError::InvalidTransition(message),
                502 => ClientError::Persistence(message),
                _ => ClientError::InvalidResponse(message),
            });
        }

        let envelope: Envelope<DisplayOrder> = response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        envelope.into_data()
    }
}
