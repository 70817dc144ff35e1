//! Conversion status machine
//!
//! Canonical lifecycle lives on `ConversionStatus`; this service adds
//! label translation, the authorization invariant and the guarded,
//! idempotent persistence of transitions.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::{AfftrackError, Result};
use crate::storage::{Click, ClickStore, Conversion, ConversionStatus, ConversionStore, TransitionPatch};

/// Translation table from caller-defined status labels to canonical states.
///
/// Webhook senders and advertisers each speak their own vocabulary; the
/// table is explicit so an unmapped label is an error, not a silent
/// fallthrough.
#[derive(Debug, Clone, Default)]
pub struct StatusLabelMap {
    map: HashMap<String, ConversionStatus>,
}

impl StatusLabelMap {
    /// Build from the per-request label fields an advertiser submits
    /// alongside a status update.
    pub fn from_request_labels(pending: &str, approved: &str, rejected: &str, paid: &str) -> Self {
        let mut map = HashMap::with_capacity(4);
        map.insert(pending.to_string(), ConversionStatus::Pending);
        map.insert(approved.to_string(), ConversionStatus::Approved);
        map.insert(rejected.to_string(), ConversionStatus::Rejected);
        map.insert(paid.to_string(), ConversionStatus::Paid);
        Self { map }
    }

    /// Build from a configured `{label: canonical}` table. Fails on
    /// unknown canonical values, so a bad table dies at startup.
    pub fn from_config(labels: &HashMap<String, String>) -> Result<Self> {
        let mut map = HashMap::with_capacity(labels.len());
        for (label, canonical) in labels {
            let status = ConversionStatus::parse(canonical).ok_or_else(|| {
                AfftrackError::validation(format!(
                    "status label '{}' maps to unknown status '{}'",
                    label, canonical
                ))
            })?;
            map.insert(label.clone(), status);
        }
        Ok(Self { map })
    }

    pub fn translate(&self, label: &str) -> Result<ConversionStatus> {
        self.map.get(label).copied().ok_or_else(|| {
            AfftrackError::unknown_status_label(format!("Unknown status label '{}'", label))
        })
    }
}

/// Status transitions against the durable conversion store
pub struct ConversionService {
    clicks: Arc<dyn ClickStore>,
    conversions: Arc<dyn ConversionStore>,
}

impl ConversionService {
    pub fn new(clicks: Arc<dyn ClickStore>, conversions: Arc<dyn ConversionStore>) -> Self {
        Self { clicks, conversions }
    }

    /// Authorization invariant for status updates: the click must exist
    /// and belong to the calling advertiser. Runs before any mutation.
    pub async fn authorize(&self, click_uuid: &str, advertiser_id: i64) -> Result<Click> {
        let click = self
            .clicks
            .find_click(click_uuid)
            .await?
            .ok_or_else(|| {
                AfftrackError::authorization(format!("Click '{}' is not known", click_uuid))
            })?;

        if click.advertiser_id != advertiser_id {
            return Err(AfftrackError::authorization(format!(
                "Click '{}' does not belong to advertiser {}",
                click_uuid, advertiser_id
            )));
        }

        Ok(click)
    }

    /// Apply a status transition.
    ///
    /// Requesting the current status is a no-op (webhooks are delivered
    /// at-least-once); an unreachable status is `InvalidTransition`.
    /// The store-level guard re-checks the source status, so two
    /// concurrent writers for the same key serialize there.
    pub async fn transition(
        &self,
        click_uuid: &str,
        requested: ConversionStatus,
        patch: TransitionPatch,
    ) -> Result<Conversion> {
        let current = self
            .conversions
            .find_conversion(click_uuid)
            .await?
            .ok_or_else(|| {
                AfftrackError::not_found(format!("No conversion for click '{}'", click_uuid))
            })?;

        if current.status == requested {
            debug!(
                "Conversion {} already {}, idempotent no-op",
                click_uuid, requested
            );
            return Ok(current);
        }

        if !current.status.can_transition_to(requested) {
            return Err(AfftrackError::invalid_transition(format!(
                "Conversion '{}' cannot go {} -> {}",
                click_uuid, current.status, requested
            )));
        }

        let applied = self
            .conversions
            .apply_transition(click_uuid, current.status, requested, &patch)
            .await?;

        let conversion = self
            .conversions
            .find_conversion(click_uuid)
            .await?
            .ok_or_else(|| {
                AfftrackError::database_operation(format!(
                    "conversion '{}' vanished mid-transition",
                    click_uuid
                ))
            })?;

        if applied {
            info!(
                "Conversion {}: {} -> {}",
                click_uuid, current.status, requested
            );
            return Ok(conversion);
        }

        // Guard matched no row: a concurrent writer moved the status
        // first. Re-decide against what is stored now.
        if conversion.status == requested {
            return Ok(conversion);
        }
        Err(AfftrackError::invalid_transition(format!(
            "Conversion '{}' cannot go {} -> {}",
            click_uuid, conversion.status, requested
        )))
    }
}

#[cfg(test)]
mod label_map_tests {
    use super::*;

    #[test]
    fn test_request_labels_translate() {
        let map = StatusLabelMap::from_request_labels("wait", "ok", "bad", "payout");
        assert_eq!(map.translate("ok").unwrap(), ConversionStatus::Approved);
        assert_eq!(map.translate("payout").unwrap(), ConversionStatus::Paid);
    }

    #[test]
    fn test_unknown_label_is_explicit_error() {
        let map = StatusLabelMap::from_request_labels("wait", "ok", "bad", "payout");
        assert!(matches!(
            map.translate("confirmed"),
            Err(AfftrackError::UnknownStatusLabel(_))
        ));
    }

    #[test]
    fn test_config_map_rejects_bad_canonical_value() {
        let mut labels = HashMap::new();
        labels.insert("confirmed".to_string(), "accepted".to_string());
        assert!(StatusLabelMap::from_config(&labels).is_err());
    }

    #[test]
    fn test_config_map_accepts_canonical_values() {
        let mut labels = HashMap::new();
        labels.insert("confirmed".to_string(), "approved".to_string());
        labels.insert("declined".to_string(), "rejected".to_string());
        let map = StatusLabelMap::from_config(&labels).unwrap();
        assert_eq!(
            map.translate("confirmed").unwrap(),
            ConversionStatus::Approved
        );
    }
}
