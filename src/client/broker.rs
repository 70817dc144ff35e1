use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::client::strategy::{BrokerProvider, BrokerSelectionStrategy};
use crate::config::BrokerConfig;
use crate::errors::{AfftrackError, Result};
use crate::storage::Transaction;

/// Classified reply from the broker-selection round
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerReplyStatus {
    /// A provider enrolled the user
    Registered,
    /// No eligible provider for this transaction
    NoBrokers,
    /// Every eligible provider refused the enrollment
    AllRejected,
    /// A provider flagged the enrollment as a duplicate/fraud attempt
    Fraud,
}

#[derive(Debug, Clone)]
pub struct BrokerReply {
    pub status: BrokerReplyStatus,
    pub customer_id: Option<String>,
    pub provider_ref: Option<String>,
    pub provider_name: Option<String>,
    /// Raw provider response, forwarded on the conversion-report path
    pub raw: serde_json::Value,
}

impl BrokerReply {
    fn terminal(status: BrokerReplyStatus) -> Self {
        Self {
            status,
            customer_id: None,
            provider_ref: None,
            provider_name: None,
            raw: serde_json::Value::Null,
        }
    }
}

/// Broker-selection collaborator seam
#[async_trait]
pub trait BrokerGateway: Send + Sync {
    /// Run one registration round. Retry/backoff/timeout live here; the
    /// caller sees a single deterministic result.
    async fn register(&self, tx: &Transaction, payload: &serde_json::Value)
    -> Result<BrokerReply>;
}

/// 单个 provider 的应答
#[derive(Debug, Deserialize)]
struct ProviderResponse {
    status: String,
    #[serde(default)]
    customer_id: Option<String>,
    #[serde(default)]
    provider_ref: Option<String>,
}

/// HTTP implementation over the configured provider endpoints
pub struct HttpBrokerGateway {
    client: reqwest::Client,
    strategy: Arc<dyn BrokerSelectionStrategy>,
    retry_count: u32,
    retry_delay: Duration,
}

impl HttpBrokerGateway {
    pub fn new(config: &BrokerConfig, strategy: Arc<dyn BrokerSelectionStrategy>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AfftrackError::broker_gateway(format!("HTTP client build: {}", e)))?;

        Ok(Self {
            client,
            strategy,
            retry_count: config.retry_count,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    /// 调用单个 provider，带固定次数重试 + 固定退避
    async fn call_provider(
        &self,
        provider: &BrokerProvider,
        body: &serde_json::Value,
    ) -> Result<ProviderResponse> {
        let mut attempt = 0;
        loop {
            let result = self
                .client
                .post(&provider.endpoint)
                .bearer_auth(&provider.api_key)
                .json(body)
                .send()
                .await;

            match result {
                Ok(response) => {
                    let response = response.error_for_status().map_err(|e| {
                        AfftrackError::broker_gateway(format!(
                            "provider '{}' returned error status: {}",
                            provider.name, e
                        ))
                    })?;

                    return response.json::<ProviderResponse>().await.map_err(|e| {
                        AfftrackError::broker_gateway(format!(
                            "provider '{}' returned malformed body: {}",
                            provider.name, e
                        ))
                    });
                }
                Err(e) if attempt < self.retry_count => {
                    attempt += 1;
                    warn!(
                        "Provider '{}' request failed (attempt {}/{}): {}; retrying",
                        provider.name,
                        attempt,
                        self.retry_count + 1,
                        e
                    );
                    sleep(self.retry_delay).await;
                }
                Err(e) => {
                    return Err(AfftrackError::broker_gateway(format!(
                        "provider '{}' unreachable: {}",
                        provider.name, e
                    )));
                }
            }
        }
    }

    fn request_body(tx: &Transaction, payload: &serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "transaction_id": tx.uuid,
            "click_uuid": tx.click_uuid,
            "offer_id": tx.offer_id,
            "country_id": tx.country_id,
            "client_ip": tx.client_ip,
            "fields": payload,
        })
    }
}

#[async_trait]
impl BrokerGateway for HttpBrokerGateway {
    async fn register(
        &self,
        tx: &Transaction,
        payload: &serde_json::Value,
    ) -> Result<BrokerReply> {
        let providers = self.strategy.providers_for(tx);
        if providers.is_empty() {
            debug!("No eligible providers for transaction {}", tx.uuid);
            return Ok(BrokerReply::terminal(BrokerReplyStatus::NoBrokers));
        }

        let body = Self::request_body(tx, payload);
        let mut rejected = 0usize;
        let mut last_error: Option<AfftrackError> = None;

        for provider in &providers {
            let response = match self.call_provider(provider, &body).await {
                Ok(r) => r,
                Err(e) => {
                    // 技术故障不能当作业务拒绝，留到循环结束统一上抛
                    warn!("Provider '{}' technical failure: {}", provider.name, e);
                    last_error = Some(e);
                    continue;
                }
            };

            match response.status.as_str() {
                "registered" => {
                    info!(
                        "Provider '{}' registered transaction {}",
                        provider.name, tx.uuid
                    );
                    let raw = serde_json::json!({
                        "provider": provider.name,
                        "status": response.status,
                        "customer_id": response.customer_id,
                        "provider_ref": response.provider_ref,
                    });
                    return Ok(BrokerReply {
                        status: BrokerReplyStatus::Registered,
                        customer_id: response.customer_id,
                        provider_ref: response.provider_ref,
                        provider_name: Some(provider.name.clone()),
                        raw,
                    });
                }
                "fraud" | "duplicate" => {
                    info!(
                        "Provider '{}' flagged transaction {} as fraud",
                        provider.name, tx.uuid
                    );
                    return Ok(BrokerReply::terminal(BrokerReplyStatus::Fraud));
                }
                "rejected" => {
                    debug!(
                        "Provider '{}' rejected transaction {}",
                        provider.name, tx.uuid
                    );
                    rejected += 1;
                }
                other => {
                    return Err(AfftrackError::broker_gateway(format!(
                        "provider '{}' replied with unknown status '{}'",
                        provider.name, other
                    )));
                }
            }
        }

        // 全部 provider 都没有完成注册
        if rejected == providers.len() {
            return Ok(BrokerReply::terminal(BrokerReplyStatus::AllRejected));
        }

        // 有 provider 技术性失败：整轮按技术故障处理
        Err(last_error.unwrap_or_else(|| {
            AfftrackError::broker_gateway("registration round ended without a classified result")
        }))
    }
}
