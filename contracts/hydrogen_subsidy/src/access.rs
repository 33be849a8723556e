//! # Access Control Guard
//!
//! Capability checks run before any state is read for mutation.
//!
//! Each instance has exactly three privileged identities, fixed by the
//! constructor:
//!
//! | Identity     | May call                                        |
//! |--------------|-------------------------------------------------|
//! | `oracle`     | `submit_production`                             |
//! | `government` | `withdraw_surplus`, `terminate` (with company)  |
//! | `company`    | `terminate` (with government)                   |
//!
//! The company can never report production and nobody can trigger a payout
//! directly; payouts only happen as a consequence of an oracle submission.
//!
//! Every check compares the claimed identity with the stored one *before*
//! requiring its signature, so a wrong caller fails with
//! [`Error::Unauthorized`] rather than an auth-host error.

use soroban_sdk::Address;

use crate::types::SubsidyConfig;
use crate::Error;

fn require(expected: &Address, caller: &Address) -> Result<(), Error> {
    if caller != expected {
        return Err(Error::Unauthorized);
    }
    caller.require_auth();
    Ok(())
}

pub fn require_oracle(config: &SubsidyConfig, caller: &Address) -> Result<(), Error> {
    require(&config.oracle, caller)
}

pub fn require_government(config: &SubsidyConfig, caller: &Address) -> Result<(), Error> {
    require(&config.government, caller)
}

pub fn require_company(config: &SubsidyConfig, caller: &Address) -> Result<(), Error> {
    require(&config.company, caller)
}

/// Constructor-time check: an oracle that is also the company could report
/// its own production.
pub fn validate_parties(config: &SubsidyConfig) -> Result<(), Error> {
    if config.oracle == config.company {
        return Err(Error::InvalidInput);
    }
    Ok(())
}
