#![allow(dead_code)]

extern crate std;

use soroban_sdk::Vec;

use crate::types::{Milestone, SubsidyStatus, SubsidySummary};

/// INV-1: cumulative production never decreases.
pub fn assert_production_monotonic(before: u64, after: u64) {
    assert!(
        after >= before,
        "INV-1 violated: total_produced_hydrogen decreased from {} to {}",
        before,
        after
    );
}

/// INV-2: total paid equals the sum of claimed milestone amounts.
pub fn assert_paid_matches_claimed(milestones: &Vec<Milestone>, total_paid: i128) {
    let claimed: i128 = milestones
        .iter()
        .filter(|m| m.is_claimed)
        .map(|m| m.subsidy_amount)
        .sum();
    assert_eq!(
        claimed, total_paid,
        "INV-2 violated: claimed sum {} != total_subsidy_paid {}",
        claimed, total_paid
    );
}

/// INV-3: a claimed milestone's threshold has been reached.
pub fn assert_claims_respect_threshold(milestones: &Vec<Milestone>, total_produced: u64) {
    for m in milestones.iter() {
        if m.is_claimed {
            assert!(
                m.hydrogen_required <= total_produced,
                "INV-3 violated: milestone {} claimed at {} kg but requires {} kg",
                m.id,
                total_produced,
                m.hydrogen_required
            );
        }
    }
}

/// INV-4: every reached milestone is claimed while the instance is active
/// or completed (no payable milestone is left behind after a submission).
pub fn assert_reached_are_claimed(milestones: &Vec<Milestone>, total_produced: u64) {
    for m in milestones.iter() {
        if m.hydrogen_required <= total_produced {
            assert!(
                m.is_claimed,
                "INV-4 violated: milestone {} reached ({} kg >= {} kg) but unclaimed",
                m.id,
                total_produced,
                m.hydrogen_required
            );
        }
    }
}

/// INV-5: a claimed flag never reverts to unclaimed.
pub fn assert_claims_never_revert(before: &Vec<Milestone>, after: &Vec<Milestone>) {
    assert_eq!(before.len(), after.len(), "INV-5 violated: milestone count changed");
    for (old, new) in before.iter().zip(after.iter()) {
        assert_eq!(old.id, new.id, "INV-5 violated: milestone id changed");
        assert_eq!(
            old.hydrogen_required, new.hydrogen_required,
            "INV-5 violated: milestone {} threshold changed",
            old.id
        );
        assert_eq!(
            old.subsidy_amount, new.subsidy_amount,
            "INV-5 violated: milestone {} amount changed",
            old.id
        );
        if old.is_claimed {
            assert!(new.is_claimed, "INV-5 violated: milestone {} unclaimed", old.id);
        }
    }
}

/// INV-6: status matches the milestone list.
///   Completed  <=> every milestone claimed
///   Active     =>  at least one milestone unclaimed
pub fn assert_status_consistent(milestones: &Vec<Milestone>, status: &SubsidyStatus) {
    let all_claimed = milestones.iter().all(|m| m.is_claimed);
    match status {
        SubsidyStatus::Active => assert!(
            !all_claimed,
            "INV-6 violated: active instance has every milestone claimed"
        ),
        SubsidyStatus::Completed => assert!(
            all_claimed,
            "INV-6 violated: completed instance has unclaimed milestones"
        ),
        SubsidyStatus::Terminated => {}
    }
}

/// INV-7: `contract_active` mirrors the status.
pub fn assert_active_flag(summary: &SubsidySummary) {
    assert_eq!(
        summary.contract_active,
        summary.status == SubsidyStatus::Active,
        "INV-7 violated: contract_active {} with status {:?}",
        summary.contract_active,
        summary.status
    );
}

/// Run all stateless invariants against one snapshot.
pub fn assert_all_invariants(summary: &SubsidySummary) {
    assert_paid_matches_claimed(&summary.milestones, summary.total_subsidy_paid);
    assert_claims_respect_threshold(&summary.milestones, summary.total_produced_hydrogen);
    assert_status_consistent(&summary.milestones, &summary.status);
    assert_active_flag(summary);
}
