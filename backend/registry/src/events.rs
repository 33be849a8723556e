//! Canonical event types emitted by the hydrogen subsidy contract.
//!
//! These mirror the Soroban contract events defined in
//! `contracts/hydrogen_subsidy/src/events.rs`.

use serde::{Deserialize, Serialize};

/// All recognised event kinds from a subsidy instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// The instance was deployed (`created` topic).
    SubsidyCreated,
    /// Funds were deposited (`funded` topic).
    SubsidyFunded,
    /// The oracle reported production (`produced` topic).
    ProductionRecorded,
    /// A milestone was paid (`claimed` topic).
    MilestoneClaimed,
    /// The last milestone was paid (`completed` topic).
    SubsidyCompleted,
    /// The government recovered surplus funds (`surplus` topic).
    SurplusWithdrawn,
    /// The instance was stopped by both parties (`terminated` topic).
    SubsidyTerminated,
    /// An event from this contract that we don't recognise yet.
    Unknown,
}

impl EventKind {
    /// Parse the leading topic symbol string produced by Soroban into an [`EventKind`].
    pub fn from_topic(topic: &str) -> Self {
        match topic {
            "created" => Self::SubsidyCreated,
            "funded" => Self::SubsidyFunded,
            "produced" => Self::ProductionRecorded,
            "claimed" => Self::MilestoneClaimed,
            "completed" => Self::SubsidyCompleted,
            "surplus" => Self::SurplusWithdrawn,
            "terminated" => Self::SubsidyTerminated,
            _ => Self::Unknown,
        }
    }

    /// Return a short identifier string suitable for storage in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SubsidyCreated => "subsidy_created",
            Self::SubsidyFunded => "subsidy_funded",
            Self::ProductionRecorded => "production_recorded",
            Self::MilestoneClaimed => "milestone_claimed",
            Self::SubsidyCompleted => "subsidy_completed",
            Self::SurplusWithdrawn => "surplus_withdrawn",
            Self::SubsidyTerminated => "subsidy_terminated",
            Self::Unknown => "unknown",
        }
    }
}

/// A fully decoded subsidy event, ready to be stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubsidyEvent {
    /// Unique RPC event id; the idempotency key for inserts.
    pub event_key: String,
    pub event_type: String,
    pub contract_id: String,
    pub milestone_id: Option<i64>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub tx_hash: Option<String>,
}

/// A raw event record as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub event_key: String,
    pub event_type: String,
    pub contract_id: String,
    pub milestone_id: Option<i64>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub tx_hash: Option<String>,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kind_from_topic() {
        assert_eq!(EventKind::from_topic("created"), EventKind::SubsidyCreated);
        assert_eq!(EventKind::from_topic("funded"), EventKind::SubsidyFunded);
        assert_eq!(
            EventKind::from_topic("produced"),
            EventKind::ProductionRecorded
        );
        assert_eq!(EventKind::from_topic("claimed"), EventKind::MilestoneClaimed);
        assert_eq!(
            EventKind::from_topic("completed"),
            EventKind::SubsidyCompleted
        );
        assert_eq!(EventKind::from_topic("surplus"), EventKind::SurplusWithdrawn);
        assert_eq!(
            EventKind::from_topic("terminated"),
            EventKind::SubsidyTerminated
        );
        assert_eq!(EventKind::from_topic("something_else"), EventKind::Unknown);
    }

    #[test]
    fn event_kind_as_str() {
        assert_eq!(EventKind::MilestoneClaimed.as_str(), "milestone_claimed");
        assert_eq!(EventKind::ProductionRecorded.as_str(), "production_recorded");
        assert_eq!(EventKind::SubsidyTerminated.as_str(), "subsidy_terminated");
        assert_eq!(EventKind::Unknown.as_str(), "unknown");
    }
}
