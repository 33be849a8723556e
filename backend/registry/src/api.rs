//! Axum REST API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db::{self, NewSubsidy, OracleRecord, ProducerRecord, SubsidyRecord};
use crate::directory::{self, DisplayName, Role, Session};
use crate::errors::Result;
use crate::events::EventRecord;
use crate::registry;

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
}

type ApiStateRef = State<Arc<ApiState>>;

// ─────────────────────────────────────────────────────────
// Request / response shapes
// ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    pub address: String,
}

#[derive(Deserialize)]
pub struct AddressQuery {
    pub address: String,
}

#[derive(Deserialize)]
pub struct NamedAddress {
    pub address: String,
    pub name: String,
}

#[derive(Deserialize)]
pub struct RoleQuery {
    pub role: Role,
    pub address: String,
}

#[derive(Deserialize)]
pub struct ProducerQuery {
    pub producer_address: Option<String>,
}

#[derive(Serialize)]
pub struct SubsidyNameResponse {
    pub contract_address: String,
    pub name: String,
}

#[derive(Serialize)]
pub struct EventsResponse {
    pub contract_id: String,
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct AllEventsResponse {
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `POST /auth/login`
pub async fn login(State(state): ApiStateRef, Json(req): Json<LoginRequest>) -> Result<Json<Session>> {
    Ok(Json(directory::login(&state.pool, &req.address).await?))
}

/// `GET /address-to-name?address=`
pub async fn address_to_name(
    State(state): ApiStateRef,
    Query(q): Query<AddressQuery>,
) -> Result<Json<DisplayName>> {
    Ok(Json(directory::display_name(&state.pool, &q.address).await?))
}

/// `GET /government/producers`
pub async fn list_producers(State(state): ApiStateRef) -> Result<Json<Vec<ProducerRecord>>> {
    Ok(Json(db::list_producers(&state.pool).await?))
}

/// `POST /government/producers`
pub async fn add_producer(
    State(state): ApiStateRef,
    Json(req): Json<NamedAddress>,
) -> Result<(StatusCode, Json<ProducerRecord>)> {
    let record = registry::add_producer(&state.pool, &req.address, &req.name).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// `GET /government/oracles`
pub async fn list_oracles(State(state): ApiStateRef) -> Result<Json<Vec<OracleRecord>>> {
    Ok(Json(db::list_oracles(&state.pool).await?))
}

/// `POST /government/oracles`
pub async fn add_oracle(
    State(state): ApiStateRef,
    Json(req): Json<NamedAddress>,
) -> Result<(StatusCode, Json<OracleRecord>)> {
    let record = registry::add_oracle(&state.pool, &req.address, &req.name).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// `POST /government/subsidies`
///
/// `201` for a new registration; re-posting an already registered contract
/// address returns the stored record with `200`.
pub async fn register_subsidy(
    State(state): ApiStateRef,
    Json(req): Json<NewSubsidy>,
) -> Result<(StatusCode, Json<SubsidyRecord>)> {
    let registration = registry::register_subsidy(&state.pool, req).await?;
    let status = if registration.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(registration.record)))
}

/// `GET /subsidies?role=&address=`
pub async fn list_subsidies(
    State(state): ApiStateRef,
    Query(q): Query<RoleQuery>,
) -> Result<Json<Vec<SubsidyRecord>>> {
    Ok(Json(
        registry::list_subsidies(&state.pool, q.role, &q.address).await?,
    ))
}

/// `GET /producers/subsidies?producer_address=`
pub async fn list_producer_subsidies(
    State(state): ApiStateRef,
    Query(q): Query<ProducerQuery>,
) -> Result<Json<Vec<SubsidyRecord>>> {
    Ok(Json(
        registry::list_producer_subsidies(&state.pool, q.producer_address.as_deref()).await?,
    ))
}

/// `GET /subsidy-name?address=`
pub async fn subsidy_name(
    State(state): ApiStateRef,
    Query(q): Query<AddressQuery>,
) -> Result<Json<SubsidyNameResponse>> {
    let name = registry::subsidy_name(&state.pool, &q.address).await?;
    Ok(Json(SubsidyNameResponse {
        contract_address: q.address,
        name,
    }))
}

/// `GET /subsidies/:contract/events`
///
/// Returns all indexed events for one subsidy contract.
pub async fn get_contract_events(
    State(state): ApiStateRef,
    Path(contract_id): Path<String>,
) -> Result<Json<EventsResponse>> {
    let events = db::get_events_for_contract(&state.pool, &contract_id).await?;
    Ok(Json(EventsResponse {
        contract_id,
        count: events.len(),
        events,
    }))
}

/// `GET /events`
///
/// Returns all indexed events across all subsidy contracts.
pub async fn get_all_events(State(state): ApiStateRef) -> Result<Json<AllEventsResponse>> {
    let events = db::get_all_events(&state.pool).await?;
    Ok(Json(AllEventsResponse {
        count: events.len(),
        events,
    }))
}
