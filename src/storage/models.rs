use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical conversion lifecycle.
///
/// `Pending → {Approved, Rejected}`, `Approved → Paid`.
/// Rejected and Paid are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionStatus {
    Pending,
    Approved,
    Rejected,
    Paid,
}

impl ConversionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionStatus::Pending => "pending",
            ConversionStatus::Approved => "approved",
            ConversionStatus::Rejected => "rejected",
            ConversionStatus::Paid => "paid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ConversionStatus::Pending),
            "approved" => Some(ConversionStatus::Approved),
            "rejected" => Some(ConversionStatus::Rejected),
            "paid" => Some(ConversionStatus::Paid),
            _ => None,
        }
    }

    /// 终态：不允许再转出
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConversionStatus::Rejected | ConversionStatus::Paid)
    }

    /// 状态机转移规则。相同状态的重复请求不算转移（由调用方幂等处理）。
    pub fn can_transition_to(&self, next: ConversionStatus) -> bool {
        use ConversionStatus::*;
        matches!(
            (self, next),
            (Pending, Approved) | (Pending, Rejected) | (Approved, Paid)
        )
    }
}

impl std::fmt::Display for ConversionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Landing kind attached to a registration attempt. Trading-platform
/// landings get a one-time auto-login URL after a successful enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LandingKind {
    Standard,
    Trading,
}

impl LandingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LandingKind::Standard => "standard",
            LandingKind::Trading => "trading",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "standard" => Some(LandingKind::Standard),
            "trading" => Some(LandingKind::Trading),
            _ => None,
        }
    }

    pub fn requires_auto_login(&self) -> bool {
        matches!(self, LandingKind::Trading)
    }
}

/// Traffic click, written by the statistics pipeline. Read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Click {
    pub uuid: String,
    pub advertiser_id: i64,
    pub offer_id: i64,
    pub country_id: i64,
    pub user_id: i64,
    pub session_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Commission rule mapping. `user_id = None` marks the generic
/// per-(offer, country) catch-all row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub offer_id: i64,
    pub user_id: Option<i64>,
    pub country_id: i64,
    pub goal_id: i64,
    pub created_at: DateTime<Utc>,
}

/// One broker registration attempt. Immutable after creation except
/// for `goal_id`, attached once resolution has run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub uuid: String,
    pub click_uuid: String,
    pub offer_id: i64,
    pub country_id: i64,
    pub user_id: i64,
    pub goal_id: Option<i64>,
    pub client_ip: Option<String>,
    pub landing_kind: LandingKind,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Durable record of a successful broker enrollment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub id: i64,
    pub customer_id: String,
    pub provider_ref: String,
    pub click_uuid: String,
    pub transaction_uuid: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a registration row
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub customer_id: String,
    pub provider_ref: String,
    pub click_uuid: String,
    pub transaction_uuid: String,
}

/// Business-facing conversion record, 1:1 with a click.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversion {
    pub click_uuid: String,
    pub advertiser_id: i64,
    pub adv_internal_id: Option<String>,
    pub status: ConversionStatus,
    pub payout: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
}

/// Fields recorded alongside a status transition
#[derive(Debug, Clone, Default)]
pub struct TransitionPatch {
    pub adv_internal_id: Option<String>,
    pub payout: Option<f64>,
}

#[cfg(test)]
mod status_tests {
    use super::*;

    #[test]
    fn test_pending_can_approve_or_reject() {
        assert!(ConversionStatus::Pending.can_transition_to(ConversionStatus::Approved));
        assert!(ConversionStatus::Pending.can_transition_to(ConversionStatus::Rejected));
        assert!(!ConversionStatus::Pending.can_transition_to(ConversionStatus::Paid));
    }

    #[test]
    fn test_paid_only_from_approved() {
        assert!(ConversionStatus::Approved.can_transition_to(ConversionStatus::Paid));
        assert!(!ConversionStatus::Rejected.can_transition_to(ConversionStatus::Paid));
    }

    #[test]
    fn test_terminal_states_never_transition_out() {
        for next in [
            ConversionStatus::Pending,
            ConversionStatus::Approved,
            ConversionStatus::Rejected,
            ConversionStatus::Paid,
        ] {
            assert!(!ConversionStatus::Rejected.can_transition_to(next));
            assert!(!ConversionStatus::Paid.can_transition_to(next));
        }
    }

    #[test]
    fn test_no_cycle_back_to_pending() {
        assert!(!ConversionStatus::Approved.can_transition_to(ConversionStatus::Pending));
    }

    #[test]
    fn test_parse_round_trip() {
        for status in [
            ConversionStatus::Pending,
            ConversionStatus::Approved,
            ConversionStatus::Rejected,
            ConversionStatus::Paid,
        ] {
            assert_eq!(ConversionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ConversionStatus::parse("refunded"), None);
    }
}
