//! # Milestone Ledger
//!
//! Owns the milestone list of one subsidy instance: construction-time
//! validation, the single mutation that flips a claimed flag, and the sums the
//! rest of the contract derives from it.
//!
//! Milestones keep the order they were supplied in. Nothing here assumes the
//! thresholds are sorted; the disbursement engine orders payouts itself.

use soroban_sdk::{Env, Vec};

use crate::types::Milestone;
use crate::Error;

/// Upper bound on milestones per instance, keeping a full scan cheap.
pub const MAX_MILESTONES: u32 = 64;

/// Build the initial (all unclaimed) milestone list.
///
/// Fails with [`Error::InvalidInput`] when the two lists differ in length,
/// are empty, exceed [`MAX_MILESTONES`], contain a negative amount, or when
/// the amounts together overflow `i128`.
pub fn build(
    env: &Env,
    hydrogen_required: &Vec<u64>,
    subsidy_amounts: &Vec<i128>,
) -> Result<Vec<Milestone>, Error> {
    let count = hydrogen_required.len();
    if count == 0 || count != subsidy_amounts.len() || count > MAX_MILESTONES {
        return Err(Error::InvalidInput);
    }

    let mut total: i128 = 0;
    let mut milestones = Vec::new(env);
    for id in 0..count {
        let required = hydrogen_required.get(id).ok_or(Error::InvalidInput)?;
        let amount = subsidy_amounts.get(id).ok_or(Error::InvalidInput)?;
        if amount < 0 {
            return Err(Error::InvalidInput);
        }
        total = total.checked_add(amount).ok_or(Error::InvalidInput)?;

        milestones.push_back(Milestone {
            id,
            hydrogen_required: required,
            subsidy_amount: amount,
            is_claimed: false,
        });
    }

    Ok(milestones)
}

/// Mark milestone `id` as claimed and return the amount to disburse.
///
/// A milestone that is already claimed is never paid twice: the call fails
/// and the list is left untouched.
pub fn claim(milestones: &mut Vec<Milestone>, id: u32) -> Result<i128, Error> {
    let mut milestone = milestones.get(id).ok_or(Error::InvalidInput)?;
    if milestone.is_claimed {
        return Err(Error::InvalidInput);
    }
    milestone.is_claimed = true;
    let amount = milestone.subsidy_amount;
    milestones.set(id, milestone);
    Ok(amount)
}

/// `true` once every milestone has been claimed.
pub fn all_claimed(milestones: &Vec<Milestone>) -> bool {
    milestones.iter().all(|m| m.is_claimed)
}

/// Sum of the amounts of milestones that are still unclaimed.
pub fn outstanding(milestones: &Vec<Milestone>) -> i128 {
    milestones
        .iter()
        .filter(|m| !m.is_claimed)
        .map(|m| m.subsidy_amount)
        .sum()
}

/// Sum of the amounts of milestones already claimed.
pub fn claimed_total(milestones: &Vec<Milestone>) -> i128 {
    milestones
        .iter()
        .filter(|m| m.is_claimed)
        .map(|m| m.subsidy_amount)
        .sum()
}

/// Total subsidy committed across all milestones.
pub fn committed_total(milestones: &Vec<Milestone>) -> i128 {
    milestones.iter().map(|m| m.subsidy_amount).sum()
}
