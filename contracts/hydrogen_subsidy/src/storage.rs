//! # Storage
//!
//! Typed helpers over the two Soroban storage tiers used by one subsidy instance.
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key      | Type            | Description                          |
//! |----------|-----------------|--------------------------------------|
//! | `Config` | `SubsidyConfig` | Parties and funding asset (immutable) |
//! | `State`  | `SubsidyState`  | Cumulative production, paid, status  |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key          | Type             | Description                     |
//! |--------------|------------------|---------------------------------|
//! | `Milestones` | `Vec<Milestone>` | Milestone list in creation order |
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days remaining.
//!
//! The constructor writes all three entries, so a missing entry is unreachable
//! and the loaders panic instead of returning an error.

use soroban_sdk::{contracttype, Env, Vec};

use crate::types::{Milestone, SubsidyConfig, SubsidyState};

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    /// Immutable parties and token (Instance).
    Config,
    /// Mutable counters and status (Instance).
    State,
    /// Milestone list (Persistent).
    Milestones,
}

// ── Instance Storage Helpers ─────────────────────────────────────────

fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

pub fn save_config(env: &Env, config: &SubsidyConfig) {
    env.storage().instance().set(&DataKey::Config, config);
    bump_instance(env);
}

pub fn load_config(env: &Env) -> SubsidyConfig {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .expect("config not initialised")
}

pub fn save_state(env: &Env, state: &SubsidyState) {
    env.storage().instance().set(&DataKey::State, state);
    bump_instance(env);
}

pub fn load_state(env: &Env) -> SubsidyState {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::State)
        .expect("state not initialised")
}

// ── Persistent Storage Helpers ───────────────────────────────────────

fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

pub fn save_milestones(env: &Env, milestones: &Vec<Milestone>) {
    let key = DataKey::Milestones;
    env.storage().persistent().set(&key, milestones);
    bump_persistent(env, &key);
}

pub fn load_milestones(env: &Env) -> Vec<Milestone> {
    let key = DataKey::Milestones;
    let milestones: Vec<Milestone> = env
        .storage()
        .persistent()
        .get(&key)
        .expect("milestones not initialised");
    bump_persistent(env, &key);
    milestones
}
