//! Address directory — role resolution, login and display names.
//!
//! An address can sit in several identity tables at once; the first match in
//! the order government, producer (applicant), oracle decides its role.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use crate::db;
use crate::errors::{RegistryError, Result};

const STRKEY_LEN: usize = 56;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Government,
    Applicant,
    Oracle,
    Unregistered,
}

/// Returned by [`login`]; the caller owns it; nothing is cached server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub address: String,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameKind {
    Producer,
    Oracle,
    Government,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayName {
    pub name: String,
    pub kind: NameKind,
}

/// Check that `address` looks like a Stellar account (`G…`) or contract (`C…`) strkey.
pub fn validate_address(address: &str) -> Result<()> {
    let well_formed = address.len() == STRKEY_LEN
        && matches!(address.as_bytes().first(), Some(b'G') | Some(b'C'))
        && address
            .bytes()
            .all(|b| b.is_ascii_uppercase() || (b'2'..=b'7').contains(&b));

    if well_formed {
        Ok(())
    } else {
        Err(RegistryError::InvalidInput(format!(
            "not a Stellar address: {address}"
        )))
    }
}

pub async fn resolve_role(pool: &SqlitePool, address: &str) -> Result<Role> {
    if db::find_government(pool, address).await?.is_some() {
        return Ok(Role::Government);
    }
    if db::find_producer(pool, address).await?.is_some() {
        return Ok(Role::Applicant);
    }
    if db::find_oracle(pool, address).await?.is_some() {
        return Ok(Role::Oracle);
    }
    Ok(Role::Unregistered)
}

/// Resolve the caller's role, registering unknown addresses as producers.
pub async fn login(pool: &SqlitePool, address: &str) -> Result<Session> {
    validate_address(address)?;

    let role = match resolve_role(pool, address).await? {
        Role::Unregistered => {
            db::save_producer(pool, address, None).await?;
            info!("Registered new applicant {address}");
            Role::Applicant
        }
        role => role,
    };

    Ok(Session {
        address: address.to_string(),
        role,
    })
}

/// Human-readable name for `address`, falling back to the address itself.
pub async fn display_name(pool: &SqlitePool, address: &str) -> Result<DisplayName> {
    let producer = db::find_producer(pool, address).await?;
    if let Some(name) = producer.as_ref().and_then(|p| p.name.clone()) {
        return Ok(DisplayName {
            name,
            kind: NameKind::Producer,
        });
    }

    if let Some(oracle) = db::find_oracle(pool, address).await? {
        return Ok(DisplayName {
            name: oracle.name,
            kind: NameKind::Oracle,
        });
    }

    if db::find_government(pool, address).await?.is_some() {
        return Ok(DisplayName {
            name: "Government".to_string(),
            kind: NameKind::Government,
        });
    }

    // Unnamed producers are still producers.
    let kind = if producer.is_some() {
        NameKind::Producer
    } else {
        NameKind::Unknown
    };
    Ok(DisplayName {
        name: address.to_string(),
        kind,
    })
}

#[cfg(test)]
pub(crate) fn test_address(prefix: char, fill: char) -> String {
    let mut address = String::with_capacity(STRKEY_LEN);
    address.push(prefix);
    address.extend(std::iter::repeat(fill).take(STRKEY_LEN - 1));
    address
}
