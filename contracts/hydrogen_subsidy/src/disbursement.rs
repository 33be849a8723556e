//! # Disbursement Engine
//!
//! Turns a new cumulative production figure into milestone payouts.
//!
//! Evaluation runs in two phases so that a submission is all-or-nothing:
//!
//! 1. [`evaluate`] selects every unclaimed milestone whose threshold is met,
//!    in ascending threshold order (ties by id), checks that the held balance
//!    covers their sum, and only then flips the claimed flags and updates the
//!    in-memory state. On any error nothing has been modified.
//! 2. [`pay`] transfers the amounts and emits one `claimed` event per payout.
//!    The caller persists state *between* the two phases.
//!
//! Input order of the milestone list is irrelevant: the set claimed after a
//! cumulative value `X` is exactly the milestones with `hydrogen_required <= X`.

use soroban_sdk::{token, Address, Env, Vec};

use crate::events;
use crate::ledger;
use crate::types::{Disbursement, Milestone, SubsidyConfig, SubsidyState, SubsidyStatus};
use crate::Error;

/// Unclaimed milestones reached by `cumulative`, ordered by threshold.
pub fn qualifying(env: &Env, milestones: &Vec<Milestone>, cumulative: u64) -> Vec<Milestone> {
    let mut ordered: Vec<Milestone> = Vec::new(env);
    for milestone in milestones.iter() {
        if milestone.is_claimed || milestone.hydrogen_required > cumulative {
            continue;
        }
        // Stable insertion: equal thresholds keep ascending id order.
        let mut pos = ordered.len();
        for (i, queued) in ordered.iter().enumerate() {
            if queued.hydrogen_required > milestone.hydrogen_required {
                pos = i as u32;
                break;
            }
        }
        ordered.insert(pos, milestone);
    }
    ordered
}

/// Balance of `token` held by this contract.
pub fn held_balance(env: &Env, token: &Address) -> i128 {
    token::Client::new(env, token).balance(&env.current_contract_address())
}

/// Claim every milestone reached by `state.total_produced_hydrogen`.
///
/// Fails with [`Error::InsufficientFunds`] when the held balance cannot cover
/// all of them, leaving `state` and `milestones` untouched.
pub fn evaluate(
    env: &Env,
    config: &SubsidyConfig,
    state: &mut SubsidyState,
    milestones: &mut Vec<Milestone>,
) -> Result<Vec<Disbursement>, Error> {
    let due_milestones = qualifying(env, milestones, state.total_produced_hydrogen);

    let mut due: i128 = 0;
    for milestone in due_milestones.iter() {
        due = due
            .checked_add(milestone.subsidy_amount)
            .ok_or(Error::InvalidInput)?;
    }
    if due > 0 && held_balance(env, &config.token) < due {
        return Err(Error::InsufficientFunds);
    }
    let total_paid = state
        .total_subsidy_paid
        .checked_add(due)
        .ok_or(Error::InvalidInput)?;

    let mut payouts = Vec::new(env);
    for milestone in due_milestones.iter() {
        let amount = ledger::claim(milestones, milestone.id)?;
        payouts.push_back(Disbursement {
            milestone_id: milestone.id,
            amount,
        });
    }

    state.total_subsidy_paid = total_paid;
    if ledger::all_claimed(milestones) {
        state.status = SubsidyStatus::Completed;
    }

    Ok(payouts)
}

/// Transfer each payout to the company and announce it.
pub fn pay(env: &Env, config: &SubsidyConfig, payouts: &Vec<Disbursement>) {
    let contract_address = env.current_contract_address();
    let token_client = token::Client::new(env, &config.token);

    for payout in payouts.iter() {
        if payout.amount > 0 {
            token_client.transfer(&contract_address, &config.company, &payout.amount);
        }
        events::emit_milestone_claimed(
            env,
            payout.milestone_id,
            config.company.clone(),
            payout.amount,
        );
    }
}
