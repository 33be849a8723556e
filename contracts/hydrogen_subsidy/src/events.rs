//! # Events
//!
//! Every state change of a subsidy instance publishes exactly one event.
//! Topics are `(symbol,)` or `(symbol, milestone_id)`; the data is one of the
//! structs below. The off-chain indexer keys on the leading symbol.
//!
//! | Topic                        | Data                  |
//! |------------------------------|-----------------------|
//! | `created`                    | [`SubsidyCreated`]    |
//! | `funded`                     | [`SubsidyFunded`]     |
//! | `produced`                   | [`ProductionRecorded`] |
//! | `claimed`, `milestone_id`    | [`MilestoneClaimed`]  |
//! | `completed`                  | [`SubsidyCompleted`]  |
//! | `surplus`                    | [`SurplusWithdrawn`]  |
//! | `terminated`                 | [`SubsidyTerminated`] |

use soroban_sdk::{contracttype, symbol_short, Address, Env, Symbol};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubsidyCreated {
    pub government: Address,
    pub company: Address,
    pub oracle: Address,
    pub milestone_count: u32,
    pub total_subsidy: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubsidyFunded {
    pub funder: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProductionRecorded {
    pub oracle: Address,
    pub amount: u64,
    pub total_produced: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MilestoneClaimed {
    pub milestone_id: u32,
    pub company: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubsidyCompleted {
    pub total_paid: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SurplusWithdrawn {
    pub government: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubsidyTerminated {
    pub government: Address,
    pub company: Address,
    pub refunded: i128,
}

pub fn emit_subsidy_created(
    env: &Env,
    government: Address,
    company: Address,
    oracle: Address,
    milestone_count: u32,
    total_subsidy: i128,
) {
    env.events().publish(
        (symbol_short!("created"),),
        SubsidyCreated {
            government,
            company,
            oracle,
            milestone_count,
            total_subsidy,
        },
    );
}

pub fn emit_subsidy_funded(env: &Env, funder: Address, amount: i128) {
    env.events()
        .publish((symbol_short!("funded"),), SubsidyFunded { funder, amount });
}

pub fn emit_production_recorded(env: &Env, oracle: Address, amount: u64, total_produced: u64) {
    env.events().publish(
        (symbol_short!("produced"),),
        ProductionRecorded {
            oracle,
            amount,
            total_produced,
        },
    );
}

pub fn emit_milestone_claimed(env: &Env, milestone_id: u32, company: Address, amount: i128) {
    env.events().publish(
        (symbol_short!("claimed"), milestone_id),
        MilestoneClaimed {
            milestone_id,
            company,
            amount,
        },
    );
}

pub fn emit_subsidy_completed(env: &Env, total_paid: i128) {
    env.events()
        .publish((symbol_short!("completed"),), SubsidyCompleted { total_paid });
}

pub fn emit_surplus_withdrawn(env: &Env, government: Address, amount: i128) {
    env.events().publish(
        (symbol_short!("surplus"),),
        SurplusWithdrawn { government, amount },
    );
}

pub fn emit_subsidy_terminated(env: &Env, government: Address, company: Address, refunded: i128) {
    env.events().publish(
        (Symbol::new(env, "terminated"),),
        SubsidyTerminated {
            government,
            company,
            refunded,
        },
    );
}
