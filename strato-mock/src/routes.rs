//! Route table for the mock API.

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::SharedState;

pub fn create_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Catalogs
        .route("/v1/zones", get(handlers::list_zones))
        .route("/v1/skus", get(handlers::list_skus))
        // Tenants
        .route("/v1/tenants", get(handlers::list_tenants))
        .route(
            "/v1/tenants/{tenant}",
            put(handlers::put_tenant)
                .get(handlers::get_tenant)
                .delete(handlers::delete_tenant),
        )
        // Workspaces
        .route(
            "/v1/tenants/{tenant}/workspaces",
            get(handlers::list_workspaces),
        )
        .route(
            "/v1/tenants/{tenant}/workspaces/{name}",
            put(handlers::put_workspace)
                .get(handlers::get_workspace)
                .delete(handlers::delete_workspace),
        )
        // Instances
        .route(
            "/v1/tenants/{tenant}/workspaces/{workspace}/instances",
            get(handlers::list_instances),
        )
        .route(
            "/v1/tenants/{tenant}/workspaces/{workspace}/instances/{name}",
            put(handlers::put_instance)
                .get(handlers::get_instance)
                .delete(handlers::delete_instance),
        )
        // Volumes
        .route(
            "/v1/tenants/{tenant}/workspaces/{workspace}/volumes",
            get(handlers::list_volumes),
        )
        .route(
            "/v1/tenants/{tenant}/workspaces/{workspace}/volumes/{name}",
            put(handlers::put_volume)
                .get(handlers::get_volume)
                .delete(handlers::delete_volume),
        )
        // Networks
        .route("/v1/tenants/{tenant}/networks", get(handlers::list_networks))
        .route(
            "/v1/tenants/{tenant}/networks/{name}",
            put(handlers::put_network)
                .get(handlers::get_network)
                .delete(handlers::delete_network),
        )
        // Roles
        .route("/v1/tenants/{tenant}/roles", get(handlers::list_roles))
        .route(
            "/v1/tenants/{tenant}/roles/{name}",
            put(handlers::put_role)
                .get(handlers::get_role)
                .delete(handlers::delete_role),
        )
        // Control API
        .route("/v1/_mock/state", post(handlers::force_state))
        .route("/v1/_mock/settle-reads", post(handlers::set_settle_reads))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
