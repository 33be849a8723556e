//! Validated registry operations on top of [`crate::db`].

use sqlx::SqlitePool;
use tracing::info;

use crate::db::{
    self, NewSubsidy, OracleRecord, ProducerRecord, Registration, SubsidyFilter, SubsidyRecord,
};
use crate::directory::{validate_address, Role};
use crate::errors::{RegistryError, Result};

pub const UNKNOWN_SUBSIDY: &str = "Unknown Subsidy";

fn validate_name(what: &str, name: &str, min: usize, max: usize) -> Result<String> {
    let trimmed = name.trim();
    let len = trimmed.chars().count();
    if len < min || len > max {
        return Err(RegistryError::InvalidInput(format!(
            "{what} name must be {min}-{max} characters"
        )));
    }
    Ok(trimmed.to_string())
}

pub async fn add_producer(pool: &SqlitePool, address: &str, name: &str) -> Result<ProducerRecord> {
    validate_address(address)?;
    let name = validate_name("producer", name, 2, 100)?;
    let record = db::save_producer(pool, address, Some(&name)).await?;
    info!("Producer {address} saved as {name:?}");
    Ok(record)
}

pub async fn add_oracle(pool: &SqlitePool, address: &str, name: &str) -> Result<OracleRecord> {
    validate_address(address)?;
    let name = validate_name("oracle", name, 2, 100)?;
    let record = db::save_oracle(pool, address, &name).await?;
    info!("Oracle {address} saved as {name:?}");
    Ok(record)
}

pub async fn register_subsidy(pool: &SqlitePool, new: NewSubsidy) -> Result<Registration> {
    let name = validate_name("subsidy", &new.name, 3, 100)?;
    validate_address(&new.government_address)?;
    validate_address(&new.producer_address)?;
    validate_address(&new.contract_address)?;
    for oracle in &new.oracles {
        validate_address(oracle)?;
    }
    if new.deployed_ledger.is_some_and(|l| l < 0) {
        return Err(RegistryError::InvalidInput(
            "deployed_ledger must not be negative".to_string(),
        ));
    }

    let registration = db::register_subsidy(pool, &NewSubsidy { name, ..new }).await?;
    if registration.created {
        info!(
            "Subsidy {} registered at {}",
            registration.record.name, registration.record.contract_address
        );
    }
    Ok(registration)
}

/// Subsidies visible to `address` acting as `role`, newest first.
pub async fn list_subsidies(pool: &SqlitePool, role: Role, address: &str) -> Result<Vec<SubsidyRecord>> {
    let filter = match role {
        Role::Government => SubsidyFilter::Government(address),
        Role::Applicant => SubsidyFilter::Producer(address),
        Role::Oracle => SubsidyFilter::Oracle(address),
        Role::Unregistered => return Ok(Vec::new()),
    };
    db::list_subsidies(pool, filter).await
}

/// Subsidies of one producer, or of every producer when `producer` is `None`.
pub async fn list_producer_subsidies(
    pool: &SqlitePool,
    producer: Option<&str>,
) -> Result<Vec<SubsidyRecord>> {
    let filter = match producer {
        Some(address) => SubsidyFilter::Producer(address),
        None => SubsidyFilter::All,
    };
    db::list_subsidies(pool, filter).await
}

pub async fn subsidy_name(pool: &SqlitePool, contract_address: &str) -> Result<String> {
    Ok(db::subsidy_name(pool, contract_address)
        .await?
        .unwrap_or_else(|| UNKNOWN_SUBSIDY.to_string()))
}
