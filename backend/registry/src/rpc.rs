//! Soroban RPC client — polls `getEvents` and decodes subsidy events.
//!
//! ## Resilience
//!
//! * Exponential back-off is applied when the RPC returns an error or rate-limit
//!   response, up to [`MAX_BACKOFF_SECS`] seconds.
//! * Transient network errors (connection reset, timeout) are retried silently.
//!
//! ## Filters
//!
//! `getEvents` accepts at most [`MAX_FILTERS`] filters of at most
//! [`IDS_PER_FILTER`] contract ids each, so one request can cover up to
//! [`MAX_CONTRACTS_PER_REQUEST`] subsidy instances.
//!
//! ## Decoding
//!
//! Topics and values arrive as base64 XDR `ScVal`s and are decoded with
//! `stellar-xdr` into JSON before the actor and amount are picked out.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use stellar_xdr::curr::{Int128Parts, Limits, ReadXdr, ScVal, UInt128Parts};
use tracing::{debug, warn};

use crate::errors::{RegistryError, Result};
use crate::events::{EventKind, SubsidyEvent};

const MAX_BACKOFF_SECS: u64 = 60;
const INITIAL_BACKOFF_SECS: u64 = 2;

pub const IDS_PER_FILTER: usize = 5;
pub const MAX_FILTERS: usize = 5;
pub const MAX_CONTRACTS_PER_REQUEST: usize = IDS_PER_FILTER * MAX_FILTERS;

// ─────────────────────────────────────────────────────────
// JSON-RPC response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub result: Option<EventsResult>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct EventsResult {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    #[serde(rename = "latestLedger")]
    pub latest_ledger: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawEvent {
    /// Base64 XDR `ScVal` per topic
    pub topic: Vec<String>,
    /// Base64 XDR `ScVal` event data
    pub value: String,
    #[serde(rename = "contractId")]
    pub contract_id: Option<String>,
    #[serde(rename = "txHash")]
    pub tx_hash: Option<String>,
    pub id: Option<String>,
    pub ledger: Option<u64>,
    #[serde(rename = "ledgerClosedAt")]
    pub ledger_closed_at: Option<String>,
    #[serde(rename = "inSuccessfulContractCall")]
    pub in_successful_contract_call: Option<bool>,
    #[serde(rename = "pagingToken")]
    pub paging_token: Option<String>,
}

/// One page of `getEvents` output.
#[derive(Debug)]
pub struct EventsPage {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    pub latest_ledger: Option<u64>,
}

// ─────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────

/// Fetch a page of events emitted by any of `contract_ids`.
///
/// * `start_ledger` — the ledger sequence to scan from (inclusive).
/// * `cursor`       — optional opaque pagination cursor from a previous response.
/// * `limit`        — maximum number of events to return.
pub async fn fetch_events(
    client: &Client,
    rpc_url: &str,
    contract_ids: &[String],
    start_ledger: u32,
    cursor: Option<&str>,
    limit: u32,
) -> Result<EventsPage> {
    if contract_ids.len() > MAX_CONTRACTS_PER_REQUEST {
        return Err(RegistryError::InvalidInput(format!(
            "at most {MAX_CONTRACTS_PER_REQUEST} contracts per getEvents request, got {}",
            contract_ids.len()
        )));
    }

    let mut backoff = INITIAL_BACKOFF_SECS;

    loop {
        let params = build_params(contract_ids, start_ledger, cursor, limit);

        let response = client
            .post(rpc_url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "getEvents",
                "params": params,
            }))
            .send()
            .await;

        match response {
            Err(e) => {
                warn!("RPC request failed (will retry in {backoff}s): {e}");
                tokio::time::sleep(Duration::from_secs(backoff)).await;
                backoff = (backoff * 2).min(MAX_BACKOFF_SECS);
                continue;
            }
            Ok(resp) => {
                let status = resp.status();
                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    warn!("Rate-limited by RPC (will retry in {backoff}s)");
                    tokio::time::sleep(Duration::from_secs(backoff)).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF_SECS);
                    continue;
                }

                let body: RpcResponse = resp.json().await?;

                if let Some(err) = body.error {
                    // Code -32600 / -32601 are hard failures; everything else we retry
                    if err.code == -32600 || err.code == -32601 {
                        return Err(RegistryError::EventParse(format!(
                            "RPC hard error {}: {}",
                            err.code, err.message
                        )));
                    }
                    warn!(
                        "RPC soft error (will retry in {backoff}s): {} {}",
                        err.code, err.message
                    );
                    tokio::time::sleep(Duration::from_secs(backoff)).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF_SECS);
                    continue;
                }

                let result = body.result.ok_or_else(|| {
                    RegistryError::EventParse("Empty result from getEvents".to_string())
                })?;

                debug!(
                    "Fetched {} events for {} contracts (latest_ledger={:?})",
                    result.events.len(),
                    contract_ids.len(),
                    result.latest_ledger
                );

                return Ok(EventsPage {
                    events: result.events,
                    cursor: result.cursor,
                    latest_ledger: result.latest_ledger,
                });
            }
        }
    }
}

fn build_params(
    contract_ids: &[String],
    start_ledger: u32,
    cursor: Option<&str>,
    limit: u32,
) -> Value {
    let filters: Vec<Value> = contract_ids
        .chunks(IDS_PER_FILTER)
        .map(|ids| {
            json!({
                "type": "contract",
                "contractIds": ids
            })
        })
        .collect();

    let mut params = json!({
        "filters": filters,
        "pagination": {
            "limit": limit
        }
    });

    if let Some(cur) = cursor {
        params["pagination"]["cursor"] = json!(cur);
    } else {
        params["startLedger"] = json!(start_ledger);
    }

    params
}

// ─────────────────────────────────────────────────────────
// Event decoding
// ─────────────────────────────────────────────────────────

/// Decode a list of raw RPC events into [`SubsidyEvent`] structs.
/// Events from reverted contract calls are dropped.
pub fn decode_events(raw: &[RawEvent]) -> Vec<SubsidyEvent> {
    raw.iter()
        .filter(|e| e.in_successful_contract_call != Some(false))
        .filter_map(decode_single)
        .collect()
}

fn decode_single(raw: &RawEvent) -> Option<SubsidyEvent> {
    let contract_id = raw.contract_id.clone()?;
    let topics = raw
        .topic
        .iter()
        .map(|t| decode_scval(t))
        .collect::<Option<Vec<Value>>>()?;
    let kind = EventKind::from_topic(topics.first()?.as_str()?);

    let ledger = raw.ledger.unwrap_or(0) as i64;
    let timestamp = raw
        .ledger_closed_at
        .as_deref()
        .and_then(parse_iso_to_unix)
        .unwrap_or(0);

    let milestone_id = match kind {
        EventKind::MilestoneClaimed => topics.get(1).and_then(Value::as_i64),
        _ => None,
    };

    let data = decode_scval(&raw.value).unwrap_or(Value::Null);
    let (actor, amount) = decode_data(&data, &kind);

    let event_key = raw
        .id
        .clone()
        .or_else(|| raw.paging_token.clone())
        .unwrap_or_else(|| {
            format!(
                "{contract_id}:{ledger}:{}:{}",
                raw.tx_hash.as_deref().unwrap_or("-"),
                kind.as_str()
            )
        });

    Some(SubsidyEvent {
        event_key,
        event_type: kind.as_str().to_string(),
        contract_id,
        milestone_id,
        actor,
        amount,
        ledger,
        timestamp,
        tx_hash: raw.tx_hash.clone(),
    })
}

/// Decode one base64 XDR `ScVal` as returned by `getEvents`.
fn decode_scval(raw: &str) -> Option<Value> {
    match ScVal::from_xdr_base64(raw, Limits::none()) {
        Ok(val) => Some(scval_to_json(&val)),
        Err(e) => {
            debug!("Skipping undecodable ScVal {raw:?}: {e}");
            None
        }
    }
}

/// 128-bit integers become decimal strings; unsupported variants become null.
fn scval_to_json(val: &ScVal) -> Value {
    match val {
        ScVal::Bool(b) => json!(b),
        ScVal::U32(n) => json!(n),
        ScVal::I32(n) => json!(n),
        ScVal::U64(n) => json!(n),
        ScVal::I64(n) => json!(n),
        ScVal::U128(UInt128Parts { hi, lo }) => {
            json!((((*hi as u128) << 64) | (*lo as u128)).to_string())
        }
        ScVal::I128(Int128Parts { hi, lo }) => {
            json!((((*hi as i128) << 64) | (*lo as i128)).to_string())
        }
        ScVal::Symbol(s) => json!(s.0.to_utf8_string_lossy()),
        ScVal::String(s) => json!(s.0.to_utf8_string_lossy()),
        ScVal::Address(a) => json!(a.to_string()),
        ScVal::Vec(Some(items)) => Value::Array(items.0.iter().map(scval_to_json).collect()),
        ScVal::Map(Some(entries)) => Value::Object(
            entries.0
                .iter()
                .map(|e| (map_key(&e.key), scval_to_json(&e.val)))
                .collect(),
        ),
        _ => Value::Null,
    }
}

fn map_key(key: &ScVal) -> String {
    match scval_to_json(key) {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Pick the actor and amount out of a decoded event payload.
fn decode_data(value: &Value, kind: &EventKind) -> (Option<String>, Option<String>) {
    match kind {
        EventKind::SubsidyCreated => (
            extract_field(value, "government"),
            extract_field(value, "total_subsidy"),
        ),
        EventKind::SubsidyFunded => (
            extract_field(value, "funder"),
            extract_field(value, "amount"),
        ),
        EventKind::ProductionRecorded => (
            extract_field(value, "oracle"),
            extract_field(value, "amount"),
        ),
        EventKind::MilestoneClaimed => (
            extract_field(value, "company"),
            extract_field(value, "amount"),
        ),
        EventKind::SubsidyCompleted => (None, extract_field(value, "total_paid")),
        EventKind::SurplusWithdrawn => (
            extract_field(value, "government"),
            extract_field(value, "amount"),
        ),
        EventKind::SubsidyTerminated => (
            extract_field(value, "government"),
            extract_field(value, "refunded"),
        ),
        EventKind::Unknown => (None, None),
    }
}

fn extract_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(scalar_to_string)
}

fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse an ISO-8601 timestamp string into a Unix epoch (seconds).
fn parse_iso_to_unix(s: &str) -> Option<i64> {
    use chrono::DateTime;
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.timestamp())
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
