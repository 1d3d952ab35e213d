//! External Orders API contract
//!
//! The Orders API owns order persistence and lifecycle; the KDS core only
//! fetches snapshots and pushes status writes through it. The trait seam
//! keeps the transition engine testable with an in-memory fake.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::order::{DisplayOrder, OrderStatus};
use std::time::Duration;

use crate::utils::AppError;

/// Upstream orders subsystem, reached over REST
#[async_trait]
pub trait OrdersApi: Send + Sync {
    /// `GET /displays/{id}/orders?tenant={tid}`
    async fn fetch_display_orders(
        &self,
        display_id: &str,
        tenant_id: &str,
    ) -> Result<Vec<DisplayOrder>, AppError>;

    /// `PUT /order-status/{displayOrderId}` with `{status, tenantId}`
    async fn persist_status(
        &self,
        display_order_id: &str,
        tenant_id: &str,
        status: OrderStatus,
    ) -> Result<(), AppError>;
}

#[derive(Debug, Deserialize)]
struct FetchOrdersResponse {
    success: bool,
    #[serde(default)]
    orders: Vec<DisplayOrder>,
}

#[derive(Debug, Deserialize)]
struct PersistStatusResponse {
    success: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PersistStatusRequest<'a> {
    status: OrderStatus,
    tenant_id: &'a str,
}

/// HTTP implementation of [`OrdersApi`]
#[derive(Debug, Clone)]
pub struct HttpOrdersApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpOrdersApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into(),
            client,
        }
    }
}

#[async_trait]
impl OrdersApi for HttpOrdersApi {
    async fn fetch_display_orders(
        &self,
        display_id: &str,
        tenant_id: &str,
    ) -> Result<Vec<DisplayOrder>, AppError> {
        let url = format!(
            "{}/displays/{}/orders?tenant={}",
            self.base_url, display_id, tenant_id
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Load(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::Load(format!(
                "Orders API returned {}",
                response.status()
            )));
        }

        let body: FetchOrdersResponse = response
            .json()
            .await
            .map_err(|e| AppError::Load(format!("Invalid orders payload: {}", e)))?;

        if !body.success {
            return Err(AppError::Load("Orders API reported failure".to_string()));
        }

        Ok(body.orders)
    }

    async fn persist_status(
        &self,
        display_order_id: &str,
        tenant_id: &str,
        status: OrderStatus,
    ) -> Result<(), AppError> {
        let url = format!("{}/order-status/{}", self.base_url, display_order_id);
        let response = self
            .client
            .put(&url)
            .json(&PersistStatusRequest { status, tenant_id })
            .send()
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::Persistence(format!(
                "Orders API returned {}",
                response.status()
            )));
        }

        let body: PersistStatusResponse = response
            .json()
            .await
            .map_err(|e| AppError::Persistence(format!("Invalid response payload: {}", e)))?;

        if !body.success {
            return Err(AppError::Persistence(
                "Orders API rejected the status write".to_string(),
            ));
        }

        Ok(())
    }
}
