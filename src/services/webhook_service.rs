//! Webhook ingestion gateway
//!
//! Two very different contracts share this service. Deposit callbacks
//! are best-effort: the sender retries on anything but success, so the
//! wire answer is always success and failures go to a dedicated error
//! channel. Conversion-report forwarding is synchronous and answers
//! with real errors.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::client::{BrokerGateway, BrokerReplyStatus};
use crate::errors::{AfftrackError, Result};
use crate::services::conversion_service::{ConversionService, StatusLabelMap};
use crate::storage::{Conversion, ConversionStatus, RegistrationStore, TransactionStore, TransitionPatch};

/// Dedicated tracing targets, the equivalent of the per-integration
/// log channels in classic affiliate stacks.
pub const DEPOSIT_ERROR_TARGET: &str = "integration::deposit";
pub const PROVIDER_ERROR_TARGET: &str = "integration::provider";

/// Explicit result of a deposit ingest.
///
/// The wire response is uniformly success; this type keeps the real
/// outcome observable for tests and logs.
#[derive(Debug, Clone)]
pub enum DepositOutcome {
    /// Transition applied (or already in the requested state)
    Applied(Conversion),
    /// Unknown (customer_id, provider_ref) — acknowledged, nothing done
    NotFound,
    /// Processing failed; logged and acknowledged anyway
    Acknowledged,
}

/// Forwarded broker response for a conversion report
#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub response: serde_json::Value,
    pub fraud: bool,
}

pub struct WebhookService {
    registrations: Arc<dyn RegistrationStore>,
    transactions: Arc<dyn TransactionStore>,
    conversions: Arc<ConversionService>,
    broker: Arc<dyn BrokerGateway>,
    labels: StatusLabelMap,
    default_status: ConversionStatus,
}

impl WebhookService {
    pub fn new(
        registrations: Arc<dyn RegistrationStore>,
        transactions: Arc<dyn TransactionStore>,
        conversions: Arc<ConversionService>,
        broker: Arc<dyn BrokerGateway>,
        labels: StatusLabelMap,
        default_status: ConversionStatus,
    ) -> Self {
        Self {
            registrations,
            transactions,
            conversions,
            broker,
            labels,
            default_status,
        }
    }

    /// Ingest a deposit callback, idempotently.
    ///
    /// Never returns an error: webhook senders must not be retried into
    /// an error loop. Failures land on the deposit error channel.
    pub async fn ingest_deposit(
        &self,
        customer_id: &str,
        provider_ref: &str,
        status_label: Option<&str>,
    ) -> DepositOutcome {
        let registration = match self
            .registrations
            .find_registration(customer_id, provider_ref)
            .await
        {
            Ok(Some(registration)) => registration,
            Ok(None) => {
                debug!(
                    "Deposit for unknown registration ({}, {})",
                    customer_id, provider_ref
                );
                return DepositOutcome::NotFound;
            }
            Err(e) => {
                error!(
                    target: DEPOSIT_ERROR_TARGET,
                    customer_id,
                    provider_ref,
                    error = %e,
                    "Registration lookup failed"
                );
                return DepositOutcome::Acknowledged;
            }
        };

        // 未带 status 的 deposit 默认按 approved 处理
        let status = match status_label {
            Some(label) => match self.labels.translate(label) {
                Ok(status) => status,
                Err(e) => {
                    error!(
                        target: DEPOSIT_ERROR_TARGET,
                        customer_id,
                        provider_ref,
                        label = status_label,
                        error = %e,
                        "Unmapped deposit status label"
                    );
                    return DepositOutcome::Acknowledged;
                }
            },
            None => self.default_status,
        };

        match self
            .conversions
            .transition(&registration.click_uuid, status, TransitionPatch::default())
            .await
        {
            Ok(conversion) => {
                info!(
                    "Deposit applied: click {} -> {}",
                    registration.click_uuid, status
                );
                DepositOutcome::Applied(conversion)
            }
            Err(e) => {
                // 软失败：记录后吞掉，响应仍然是 success
                error!(
                    target: DEPOSIT_ERROR_TARGET,
                    customer_id,
                    provider_ref,
                    click_uuid = %registration.click_uuid,
                    requested = %status,
                    error = %e,
                    "Deposit transition failed"
                );
                DepositOutcome::Acknowledged
            }
        }
    }

    /// Forward a conversion report through the broker round.
    ///
    /// Synchronous path: an unknown transaction is a hard `NotFound`,
    /// technical failures propagate for the HTTP layer to classify.
    pub async fn ingest_conversion_report(&self, transaction_id: &str) -> Result<ConversionReport> {
        let tx = self
            .transactions
            .find_transaction(transaction_id)
            .await?
            .ok_or_else(|| {
                AfftrackError::not_found(format!("Transaction '{}' is not known", transaction_id))
            })?;

        let reply = self.broker.register(&tx, &tx.payload).await?;

        match reply.status {
            BrokerReplyStatus::NoBrokers | BrokerReplyStatus::AllRejected => {
                Err(AfftrackError::broker_unavailable(
                    "A suitable broker was not found or each of them refused a register"
                        .to_string(),
                ))
            }
            BrokerReplyStatus::Fraud => Ok(ConversionReport {
                response: reply.raw,
                fraud: true,
            }),
            BrokerReplyStatus::Registered => Ok(ConversionReport {
                response: reply.raw,
                fraud: false,
            }),
        }
    }
}
