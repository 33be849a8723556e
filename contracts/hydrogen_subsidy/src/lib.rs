//! # Hydrogen Subsidy Contract
//!
//! One instance of `HydrogenSubsidy` is deployed per subsidy program. The
//! government deploys and funds it, a single designated oracle reports
//! verified hydrogen production, and the contract pays the producing company
//! a fixed amount for every production milestone reached.
//!
//! | Phase        | Entry Point(s)                                              |
//! |--------------|-------------------------------------------------------------|
//! | Creation     | `__constructor`                                             |
//! | Funding      | [`HydrogenSubsidy::fund`], [`HydrogenSubsidy::withdraw_surplus`] |
//! | Production   | [`HydrogenSubsidy::submit_production`]                      |
//! | Termination  | [`HydrogenSubsidy::terminate`]                              |
//! | Queries      | `company`, `government`, `oracle`, `token`, `total_produced_hydrogen`, `total_subsidy_paid`, `contract_active`, `status`, `get_all_milestones`, `outstanding_subsidy`, `get_summary` |
//!
//! ## Architecture
//!
//! Authorization lives in [`access`], milestone bookkeeping in [`ledger`],
//! payout selection in [`disbursement`] and persistence in [`storage`]. This
//! file wires them together and emits events.
//!
//! Production is reported as an *increment*, not an absolute reading: the
//! oracle submits the kilograms produced since its last report.
//!
//! Every entry point either commits all of its effects or fails with an
//! [`Error`] before any state is written.

#![no_std]

use soroban_sdk::{contract, contracterror, contractimpl, panic_with_error, token, Address, Env, Vec};

mod access;
mod disbursement;
pub mod events;
mod ledger;
mod storage;
mod types;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_events;

pub use ledger::MAX_MILESTONES;
pub use types::{Disbursement, Milestone, SubsidyConfig, SubsidyState, SubsidyStatus, SubsidySummary};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    /// Caller does not hold the identity required by the entry point.
    Unauthorized = 1,
    /// Malformed milestones at creation, or a zero/overflowing amount.
    InvalidInput = 2,
    /// Held balance cannot cover the payouts (or there is no surplus).
    InsufficientFunds = 3,
    /// The instance is `Completed` or `Terminated`.
    InstanceInactive = 4,
}

#[contract]
pub struct HydrogenSubsidy;

#[contractimpl]
impl HydrogenSubsidy {
    // ─────────────────────────────────────────────────────────
    // Creation
    // ─────────────────────────────────────────────────────────

    /// Create the instance.
    ///
    /// - `government` deploys the contract and must authorise.
    /// - `company` receives every payout.
    /// - `oracle` is the only address allowed to report production; it must
    ///   differ from `company`.
    /// - `token` is the Stellar Asset Contract of the funding asset.
    /// - `hydrogen_required[i]` / `subsidy_amounts[i]` define milestone `i`.
    ///
    /// Panics with `Error::InvalidInput` on malformed milestones.
    pub fn __constructor(
        env: Env,
        government: Address,
        company: Address,
        oracle: Address,
        token: Address,
        hydrogen_required: Vec<u64>,
        subsidy_amounts: Vec<i128>,
    ) {
        government.require_auth();

        let config = SubsidyConfig {
            government,
            company,
            oracle,
            token,
        };
        if let Err(e) = access::validate_parties(&config) {
            panic_with_error!(&env, e);
        }

        let milestones = match ledger::build(&env, &hydrogen_required, &subsidy_amounts) {
            Ok(m) => m,
            Err(e) => panic_with_error!(&env, e),
        };

        storage::save_config(&env, &config);
        storage::save_state(
            &env,
            &SubsidyState {
                total_produced_hydrogen: 0,
                total_subsidy_paid: 0,
                status: SubsidyStatus::Active,
            },
        );
        storage::save_milestones(&env, &milestones);

        events::emit_subsidy_created(
            &env,
            config.government,
            config.company,
            config.oracle,
            milestones.len(),
            ledger::committed_total(&milestones),
        );
    }

    // ─────────────────────────────────────────────────────────
    // Funding
    // ─────────────────────────────────────────────────────────

    /// Move `amount` of the funding asset from `funder` into the contract.
    pub fn fund(env: Env, funder: Address, amount: i128) -> Result<(), Error> {
        let state = storage::load_state(&env);
        if state.status != SubsidyStatus::Active {
            return Err(Error::InstanceInactive);
        }
        if amount <= 0 {
            return Err(Error::InvalidInput);
        }
        funder.require_auth();

        let config = storage::load_config(&env);
        token::Client::new(&env, &config.token).transfer(
            &funder,
            &env.current_contract_address(),
            &amount,
        );

        events::emit_subsidy_funded(&env, funder, amount);
        Ok(())
    }

    /// Return to the government whatever exceeds the unclaimed commitments.
    ///
    /// While active, funds backing unclaimed milestones stay locked. Once the
    /// instance is completed or terminated the whole balance is surplus.
    pub fn withdraw_surplus(env: Env, government: Address) -> Result<i128, Error> {
        let config = storage::load_config(&env);
        access::require_government(&config, &government)?;

        let state = storage::load_state(&env);
        let locked = match state.status {
            SubsidyStatus::Active => ledger::outstanding(&storage::load_milestones(&env)),
            SubsidyStatus::Completed | SubsidyStatus::Terminated => 0,
        };
        let surplus = disbursement::held_balance(&env, &config.token) - locked;
        if surplus <= 0 {
            return Err(Error::InsufficientFunds);
        }

        token::Client::new(&env, &config.token).transfer(
            &env.current_contract_address(),
            &government,
            &surplus,
        );

        events::emit_surplus_withdrawn(&env, government, surplus);
        Ok(surplus)
    }

    // ─────────────────────────────────────────────────────────
    // Production
    // ─────────────────────────────────────────────────────────

    /// Record `amount` kg of newly verified production and pay every
    /// milestone it unlocks.
    ///
    /// - `oracle` must be the instance's oracle and must authorise.
    /// - Fails with `InstanceInactive` once the instance is completed or
    ///   terminated, and with `InvalidInput` for a zero amount.
    /// - Fails with `InsufficientFunds`, recording nothing, when the balance
    ///   cannot cover all unlocked milestones.
    ///
    /// Returns the payouts made, in ascending threshold order.
    pub fn submit_production(
        env: Env,
        oracle: Address,
        amount: u64,
    ) -> Result<Vec<Disbursement>, Error> {
        let config = storage::load_config(&env);
        access::require_oracle(&config, &oracle)?;

        let mut state = storage::load_state(&env);
        if state.status != SubsidyStatus::Active {
            return Err(Error::InstanceInactive);
        }
        if amount == 0 {
            return Err(Error::InvalidInput);
        }
        state.total_produced_hydrogen = state
            .total_produced_hydrogen
            .checked_add(amount)
            .ok_or(Error::InvalidInput)?;

        let mut milestones = storage::load_milestones(&env);
        let payouts = disbursement::evaluate(&env, &config, &mut state, &mut milestones)?;

        storage::save_state(&env, &state);
        if !payouts.is_empty() {
            storage::save_milestones(&env, &milestones);
        }

        events::emit_production_recorded(&env, oracle, amount, state.total_produced_hydrogen);
        disbursement::pay(&env, &config, &payouts);
        if state.status == SubsidyStatus::Completed {
            events::emit_subsidy_completed(&env, state.total_subsidy_paid);
        }

        Ok(payouts)
    }

    // ─────────────────────────────────────────────────────────
    // Termination
    // ─────────────────────────────────────────────────────────

    /// Stop an active instance by mutual agreement and refund the balance to
    /// the government. Both `government` and `company` must authorise.
    pub fn terminate(env: Env, government: Address, company: Address) -> Result<i128, Error> {
        let config = storage::load_config(&env);
        access::require_government(&config, &government)?;
        access::require_company(&config, &company)?;

        let mut state = storage::load_state(&env);
        if state.status != SubsidyStatus::Active {
            return Err(Error::InstanceInactive);
        }
        state.status = SubsidyStatus::Terminated;
        storage::save_state(&env, &state);

        let refunded = disbursement::held_balance(&env, &config.token);
        if refunded > 0 {
            token::Client::new(&env, &config.token).transfer(
                &env.current_contract_address(),
                &government,
                &refunded,
            );
        }

        events::emit_subsidy_terminated(&env, government, company, refunded);
        Ok(refunded)
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    pub fn company(env: Env) -> Address {
        storage::load_config(&env).company
    }

    pub fn government(env: Env) -> Address {
        storage::load_config(&env).government
    }

    pub fn oracle(env: Env) -> Address {
        storage::load_config(&env).oracle
    }

    pub fn token(env: Env) -> Address {
        storage::load_config(&env).token
    }

    pub fn total_produced_hydrogen(env: Env) -> u64 {
        storage::load_state(&env).total_produced_hydrogen
    }

    pub fn total_subsidy_paid(env: Env) -> i128 {
        storage::load_state(&env).total_subsidy_paid
    }

    /// `true` until the instance is completed or terminated.
    pub fn contract_active(env: Env) -> bool {
        storage::load_state(&env).status == SubsidyStatus::Active
    }

    pub fn status(env: Env) -> SubsidyStatus {
        storage::load_state(&env).status
    }

    /// Every milestone in creation order, with current claimed flags.
    pub fn get_all_milestones(env: Env) -> Vec<Milestone> {
        storage::load_milestones(&env)
    }

    /// Sum still owed to the company across unclaimed milestones.
    pub fn outstanding_subsidy(env: Env) -> i128 {
        ledger::outstanding(&storage::load_milestones(&env))
    }

    /// All read accessors in a single call.
    pub fn get_summary(env: Env) -> SubsidySummary {
        let config = storage::load_config(&env);
        let state = storage::load_state(&env);
        SubsidySummary {
            government: config.government,
            company: config.company,
            oracle: config.oracle,
            token: config.token,
            total_produced_hydrogen: state.total_produced_hydrogen,
            total_subsidy_paid: state.total_subsidy_paid,
            contract_active: state.status == SubsidyStatus::Active,
            status: state.status,
            milestones: storage::load_milestones(&env),
        }
    }
}
