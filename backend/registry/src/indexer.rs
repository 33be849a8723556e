//! Long-running background task that polls the Soroban RPC and writes
//! decoded subsidy events to the database.
//!
//! The set of watched contracts is every registered subsidy, re-read on each
//! poll so newly registered instances are picked up without a restart. Each
//! contract keeps its own indexed ledger: a contract registered after the
//! global cursor has moved on is backfilled from its deployment ledger, so its
//! `created` event and early funding are not skipped.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::db::{self, WatchedContract};
use crate::errors::Result;
use crate::rpc;

pub struct IndexerState {
    pub pool: SqlitePool,
    pub config: Config,
    pub client: Client,
}

/// Run the indexer loop until `shutdown` is cancelled.
pub async fn run(state: Arc<IndexerState>, shutdown: CancellationToken) {
    info!("Indexer starting — rpc: {}", state.config.rpc_url);

    // Load the cursor from the DB; fall back to config start_ledger.
    let last_ledger = db::get_last_ledger(&state.pool).await.unwrap_or(0);
    let mut current_ledger = if last_ledger > 0 {
        last_ledger as u32
    } else {
        state.config.start_ledger
    };

    info!("Resuming from ledger {current_ledger}");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            polled = poll_once(&state.pool, &state.client, &state.config, current_ledger) => {
                match polled {
                    Ok(next_ledger) => current_ledger = next_ledger,
                    Err(e) => error!("Indexer poll error: {e}"),
                }
            }
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(Duration::from_secs(state.config.poll_interval_secs)) => {}
        }
    }

    info!("Indexer stopped at ledger {current_ledger}");
}

/// Contracts whose next poll starts at the same ledger.
#[derive(Debug, PartialEq, Eq)]
struct PollGroup {
    from_ledger: u32,
    contracts: Vec<String>,
}

/// Group contracts by the ledger their next poll starts at, lowest first.
///
/// An indexed contract resumes from its indexed ledger; a new one starts at
/// its deployment ledger, or at `backfill_from` when that is unknown.
fn plan_groups(watched: Vec<WatchedContract>, backfill_from: u32) -> Vec<PollGroup> {
    let mut groups: BTreeMap<u32, Vec<String>> = BTreeMap::new();
    for contract in watched {
        let from_ledger = contract
            .indexed_ledger
            .or(contract.deployed_ledger)
            .map(|l| u32::try_from(l).unwrap_or(0))
            .unwrap_or(backfill_from);
        groups
            .entry(from_ledger)
            .or_default()
            .push(contract.contract_address);
    }
    groups
        .into_iter()
        .map(|(from_ledger, contracts)| PollGroup {
            from_ledger,
            contracts,
        })
        .collect()
}

/// Perform a single poll iteration over every registered contract.
///
/// `cursor` is the latest ledger seen by the previous poll. Returns the
/// latest ledger seen by this one.
async fn poll_once(
    pool: &SqlitePool,
    client: &Client,
    config: &Config,
    cursor: u32,
) -> Result<u32> {
    let watched = db::list_watched_contracts(pool).await?;
    if watched.is_empty() {
        debug!("No registered subsidies; nothing to index");
        return Ok(cursor);
    }

    let backfill_from = cursor.saturating_sub(config.backfill_ledgers);
    let mut latest = cursor;
    for group in plan_groups(watched, backfill_from) {
        for batch in group.contracts.chunks(rpc::MAX_CONTRACTS_PER_REQUEST) {
            let seen = index_batch(pool, client, config, batch, group.from_ledger).await?;
            // Re-polling the boundary ledger is harmless: inserts dedupe on event_key.
            db::mark_indexed(pool, batch, seen as i64).await?;
            latest = latest.max(seen);
        }
    }

    db::save_cursor(pool, latest as i64).await?;
    Ok(latest)
}

/// Page through `getEvents` for one batch of contracts.
/// Returns the latest ledger reported by the RPC.
async fn index_batch(
    pool: &SqlitePool,
    client: &Client,
    config: &Config,
    contracts: &[String],
    start_ledger: u32,
) -> Result<u32> {
    let mut cursor: Option<String> = None;
    let mut latest = start_ledger;

    loop {
        let page = rpc::fetch_events(
            client,
            &config.rpc_url,
            contracts,
            start_ledger,
            cursor.as_deref(),
            config.events_per_page,
        )
        .await?;

        if let Some(l) = page.latest_ledger {
            latest = latest.max(l as u32);
        }

        let fetched = page.events.len();
        if fetched > 0 {
            let decoded = rpc::decode_events(&page.events);
            let inserted = db::insert_events(pool, &decoded).await?;
            info!("Polled {fetched} raw events → {inserted} new records stored");
        }

        match page.cursor {
            Some(next) if fetched as u32 >= config.events_per_page => cursor = Some(next),
            _ => break,
        }
    }

    Ok(latest)
}
