//! # Types
//!
//! Shared data structures used across all modules of the subsidy contract.
//!
//! ## Config / State split
//!
//! A subsidy instance is stored as three ledger entries:
//!
//! - [`SubsidyConfig`] — written once by the constructor; never mutated.
//! - [`SubsidyState`] — written on every accepted production submission.
//! - the milestone list — written when at least one milestone is claimed.
//!
//! ## Status as a Finite-State Machine
//!
//! ```text
//! Active ──► Completed      (last unclaimed milestone paid)
//!    └─────► Terminated     (government and company agree to stop)
//! ```
//!
//! Both `Completed` and `Terminated` are terminal.

use soroban_sdk::{contracttype, Address, Vec};

/// Lifecycle status of a subsidy instance.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SubsidyStatus {
    /// At least one milestone is still unclaimed.
    Active,
    /// Every milestone has been claimed and paid.
    Completed,
    /// Stopped by mutual agreement before completion.
    Terminated,
}

/// A production threshold paired with the amount paid once it is reached.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Milestone {
    /// Position in the list supplied at construction.
    pub id: u32,
    /// Cumulative production (kg) that must be met or exceeded.
    pub hydrogen_required: u64,
    /// Amount transferred to the company when claimed.
    pub subsidy_amount: i128,
    /// Flips to `true` exactly once.
    pub is_claimed: bool,
}

/// Immutable parties and funding asset, written once by the constructor.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubsidyConfig {
    pub government: Address,
    pub company: Address,
    pub oracle: Address,
    pub token: Address,
}

/// Mutable counters, updated on each accepted production submission.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubsidyState {
    pub total_produced_hydrogen: u64,
    pub total_subsidy_paid: i128,
    pub status: SubsidyStatus,
}

/// One milestone payout made by a production submission.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Disbursement {
    pub milestone_id: u32,
    pub amount: i128,
}

/// Snapshot of every read accessor, returned by `get_summary`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubsidySummary {
    pub government: Address,
    pub company: Address,
    pub oracle: Address,
    pub token: Address,
    pub total_produced_hydrogen: u64,
    pub total_subsidy_paid: i128,
    pub contract_active: bool,
    pub status: SubsidyStatus,
    pub milestones: Vec<Milestone>,
}
