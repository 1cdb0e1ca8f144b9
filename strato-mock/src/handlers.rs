//! REST handlers for the mock API.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};
use tracing::info;

use crate::state::{PageBody, ResourceBody, Scope, SharedState};

/// API error response.
#[derive(Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: u32,
}

impl ApiError {
    fn not_found(what: impl Into<String>) -> Self {
        Self {
            error: what.into(),
            code: 404,
        }
    }

    fn bad_request(what: impl Into<String>) -> Self {
        Self {
            error: what.into(),
            code: 400,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.code {
            404 => StatusCode::NOT_FOUND,
            409 => StatusCode::CONFLICT,
            400 => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// PUT body for create-or-update.
#[derive(Deserialize)]
pub struct UpsertRequest {
    pub spec: Value,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

// =============================================================================
// Generic resource operations
// =============================================================================

async fn upsert(
    state: &SharedState,
    kind: &str,
    scope: Scope,
    name: &str,
    req: UpsertRequest,
) -> Json<ResourceBody> {
    info!(kind, name, "upsert");
    let body = state
        .upsert(kind, &scope, name, req.spec, req.labels)
        .await;
    Json(body)
}

async fn read(
    state: &SharedState,
    kind: &str,
    scope: Scope,
    name: &str,
) -> Result<Json<ResourceBody>, ApiError> {
    let key = crate::state::MockState::key(kind, &scope, name);
    state
        .read(&key)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("{kind} {name} not found")))
}

async fn remove(
    state: &SharedState,
    kind: &str,
    scope: Scope,
    name: &str,
) -> Result<Json<Value>, ApiError> {
    let key = crate::state::MockState::key(kind, &scope, name);
    if state.remove(&key).await {
        info!(kind, name, "deleted");
        Ok(Json(json!({ "deleted": true })))
    } else {
        Err(ApiError::not_found(format!("{kind} {name} not found")))
    }
}

/// Recognized list query parameters: `limit`, `page_token`, `label.<key>`.
async fn list(
    state: &SharedState,
    kind: &str,
    scope: Scope,
    query: HashMap<String, String>,
) -> Result<Json<PageBody>, ApiError> {
    let limit = match query.get("limit") {
        Some(raw) => Some(
            raw.parse::<usize>()
                .map_err(|_| ApiError::bad_request(format!("invalid limit: {raw}")))?,
        ),
        None => None,
    };
    let labels: BTreeMap<String, String> = query
        .iter()
        .filter_map(|(k, v)| {
            k.strip_prefix("label.")
                .map(|key| (key.to_string(), v.clone()))
        })
        .collect();

    state
        .list(kind, &scope, &labels, limit, query.get("page_token").map(String::as_str))
        .await
        .map(Json)
        .map_err(ApiError::bad_request)
}

// =============================================================================
// Tenants
// =============================================================================

pub async fn put_tenant(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Json(req): Json<UpsertRequest>,
) -> Json<ResourceBody> {
    upsert(&state, "tenant", Scope::root(), &name, req).await
}

pub async fn get_tenant(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<ResourceBody>, ApiError> {
    read(&state, "tenant", Scope::root(), &name).await
}

pub async fn delete_tenant(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    remove(&state, "tenant", Scope::root(), &name).await
}

pub async fn list_tenants(
    State(state): State<SharedState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<PageBody>, ApiError> {
    list(&state, "tenant", Scope::root(), query).await
}

// =============================================================================
// Workspaces
// =============================================================================

pub async fn put_workspace(
    State(state): State<SharedState>,
    Path((tenant, name)): Path<(String, String)>,
    Json(req): Json<UpsertRequest>,
) -> Json<ResourceBody> {
    upsert(&state, "workspace", Scope::tenant(tenant), &name, req).await
}

pub async fn get_workspace(
    State(state): State<SharedState>,
    Path((tenant, name)): Path<(String, String)>,
) -> Result<Json<ResourceBody>, ApiError> {
    read(&state, "workspace", Scope::tenant(tenant), &name).await
}

pub async fn delete_workspace(
    State(state): State<SharedState>,
    Path((tenant, name)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    remove(&state, "workspace", Scope::tenant(tenant), &name).await
}

pub async fn list_workspaces(
    State(state): State<SharedState>,
    Path(tenant): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<PageBody>, ApiError> {
    list(&state, "workspace", Scope::tenant(tenant), query).await
}

// =============================================================================
// Instances
// =============================================================================

pub async fn put_instance(
    State(state): State<SharedState>,
    Path((tenant, workspace, name)): Path<(String, String, String)>,
    Json(req): Json<UpsertRequest>,
) -> Json<ResourceBody> {
    upsert(
        &state,
        "instance",
        Scope::workspace(tenant, workspace),
        &name,
        req,
    )
    .await
}

pub async fn get_instance(
    State(state): State<SharedState>,
    Path((tenant, workspace, name)): Path<(String, String, String)>,
) -> Result<Json<ResourceBody>, ApiError> {
    read(&state, "instance", Scope::workspace(tenant, workspace), &name).await
}

pub async fn delete_instance(
    State(state): State<SharedState>,
    Path((tenant, workspace, name)): Path<(String, String, String)>,
) -> Result<Json<Value>, ApiError> {
    remove(&state, "instance", Scope::workspace(tenant, workspace), &name).await
}

pub async fn list_instances(
    State(state): State<SharedState>,
    Path((tenant, workspace)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<PageBody>, ApiError> {
    list(&state, "instance", Scope::workspace(tenant, workspace), query).await
}

// =============================================================================
// Volumes
// =============================================================================

pub async fn put_volume(
    State(state): State<SharedState>,
    Path((tenant, workspace, name)): Path<(String, String, String)>,
    Json(req): Json<UpsertRequest>,
) -> Json<ResourceBody> {
    upsert(
        &state,
        "volume",
        Scope::workspace(tenant, workspace),
        &name,
        req,
    )
    .await
}

pub async fn get_volume(
    State(state): State<SharedState>,
    Path((tenant, workspace, name)): Path<(String, String, String)>,
) -> Result<Json<ResourceBody>, ApiError> {
    read(&state, "volume", Scope::workspace(tenant, workspace), &name).await
}

pub async fn delete_volume(
    State(state): State<SharedState>,
    Path((tenant, workspace, name)): Path<(String, String, String)>,
) -> Result<Json<Value>, ApiError> {
    remove(&state, "volume", Scope::workspace(tenant, workspace), &name).await
}

pub async fn list_volumes(
    State(state): State<SharedState>,
    Path((tenant, workspace)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<PageBody>, ApiError> {
    list(&state, "volume", Scope::workspace(tenant, workspace), query).await
}

// =============================================================================
// Networks
// =============================================================================

pub async fn put_network(
    State(state): State<SharedState>,
    Path((tenant, name)): Path<(String, String)>,
    Json(req): Json<UpsertRequest>,
) -> Json<ResourceBody> {
    upsert(&state, "network", Scope::tenant(tenant), &name, req).await
}

pub async fn get_network(
    State(state): State<SharedState>,
    Path((tenant, name)): Path<(String, String)>,
) -> Result<Json<ResourceBody>, ApiError> {
    read(&state, "network", Scope::tenant(tenant), &name).await
}

pub async fn delete_network(
    State(state): State<SharedState>,
    Path((tenant, name)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    remove(&state, "network", Scope::tenant(tenant), &name).await
}

pub async fn list_networks(
    State(state): State<SharedState>,
    Path(tenant): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<PageBody>, ApiError> {
    list(&state, "network", Scope::tenant(tenant), query).await
}

// =============================================================================
// Roles
// =============================================================================

pub async fn put_role(
    State(state): State<SharedState>,
    Path((tenant, name)): Path<(String, String)>,
    Json(req): Json<UpsertRequest>,
) -> Json<ResourceBody> {
    upsert(&state, "role", Scope::tenant(tenant), &name, req).await
}

pub async fn get_role(
    State(state): State<SharedState>,
    Path((tenant, name)): Path<(String, String)>,
) -> Result<Json<ResourceBody>, ApiError> {
    read(&state, "role", Scope::tenant(tenant), &name).await
}

pub async fn delete_role(
    State(state): State<SharedState>,
    Path((tenant, name)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    remove(&state, "role", Scope::tenant(tenant), &name).await
}

pub async fn list_roles(
    State(state): State<SharedState>,
    Path(tenant): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<PageBody>, ApiError> {
    list(&state, "role", Scope::tenant(tenant), query).await
}

// =============================================================================
// Catalogs
// =============================================================================

pub async fn list_zones() -> Json<Value> {
    Json(json!([
        { "name": "zone-a", "region": "eu-central" },
        { "name": "zone-b", "region": "eu-central" },
        { "name": "zone-c", "region": "us-east" },
    ]))
}

pub async fn list_skus() -> Json<Value> {
    Json(json!([
        { "name": "s1.small", "cpu_cores": 1, "memory_mb": 2048 },
        { "name": "s1.medium", "cpu_cores": 2, "memory_mb": 4096 },
        { "name": "s1.large", "cpu_cores": 4, "memory_mb": 8192 },
    ]))
}

// =============================================================================
// Control API
// =============================================================================

/// Force a resource into a lifecycle state. `key` is the request path below
/// `/v1/`, e.g. `tenants/acme/workspaces/dev/instances/web-0`.
#[derive(Deserialize)]
pub struct ForceStateRequest {
    pub key: String,
    pub state: String,
}

pub async fn force_state(
    State(state): State<SharedState>,
    Json(req): Json<ForceStateRequest>,
) -> Result<Json<Value>, ApiError> {
    info!(key = %req.key, state = %req.state, "forcing state");
    if state.force_state(&req.key, &req.state).await {
        Ok(Json(json!({ "key": req.key, "state": req.state })))
    } else {
        Err(ApiError::not_found(format!("resource {} not found", req.key)))
    }
}

/// Reconfigure how many reads a transitional resource takes to settle.
#[derive(Deserialize)]
pub struct SettleReadsRequest {
    pub reads: u32,
}

pub async fn set_settle_reads(
    State(state): State<SharedState>,
    Json(req): Json<SettleReadsRequest>,
) -> Json<Value> {
    info!(reads = req.reads, "settle-reads reconfigured");
    state.set_settle_reads(req.reads);
    Json(json!({ "reads": req.reads }))
}
