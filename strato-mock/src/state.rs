//! In-memory resource store with simulated lifecycle transitions.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use tokio::sync::RwLock;

pub const PROVIDER: &str = "strato";
pub const API_VERSION: &str = "v1";

pub const DEFAULT_SETTLE_READS: u32 = 2;
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Lifecycle states the mock reports.
pub mod lifecycle {
    pub const CREATING: &str = "Creating";
    pub const UPDATING: &str = "Updating";
    pub const ACTIVE: &str = "Active";

    pub fn is_transitional(state: &str) -> bool {
        state == CREATING || state == UPDATING
    }
}

/// Scope of a resource collection within the tenant hierarchy.
#[derive(Debug, Clone)]
pub struct Scope {
    pub tenant: Option<String>,
    pub workspace: Option<String>,
}

impl Scope {
    pub fn root() -> Self {
        Self {
            tenant: None,
            workspace: None,
        }
    }

    pub fn tenant(tenant: String) -> Self {
        Self {
            tenant: Some(tenant),
            workspace: None,
        }
    }

    pub fn workspace(tenant: String, workspace: String) -> Self {
        Self {
            tenant: Some(tenant),
            workspace: Some(workspace),
        }
    }
}

/// One stored resource.
#[derive(Debug, Clone)]
pub struct StoredResource {
    pub kind: String,
    pub tenant: String,
    pub workspace: Option<String>,
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub spec: Value,
    pub state: String,
    pub transitions: Vec<Transition>,
    /// Creation sequence number; listing order is ascending seq.
    pub seq: u64,
    /// Reads observed since the last transition into a transitional state.
    pub reads_since_transition: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Transition {
    pub state: String,
    pub at: String,
}

/// Resource as it appears on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceBody {
    pub metadata: MetadataBody,
    pub spec: Value,
    pub status: StatusBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetadataBody {
    pub provider: String,
    pub api_version: String,
    pub kind: String,
    pub verb: String,
    pub tenant: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusBody {
    pub state: String,
    pub transitions: Vec<Transition>,
}

/// One page of a list response.
#[derive(Debug, Clone, Serialize)]
pub struct PageBody {
    pub items: Vec<ResourceBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

impl StoredResource {
    /// Wire view of this resource, stamped with the verb that produced it.
    fn body(&self, verb: &str) -> ResourceBody {
        ResourceBody {
            metadata: MetadataBody {
                provider: PROVIDER.to_string(),
                api_version: API_VERSION.to_string(),
                kind: self.kind.clone(),
                verb: verb.to_string(),
                tenant: self.tenant.clone(),
                workspace: self.workspace.clone(),
                name: self.name.clone(),
                labels: self.labels.clone(),
            },
            spec: self.spec.clone(),
            status: StatusBody {
                state: self.state.clone(),
                transitions: self.transitions.clone(),
            },
        }
    }

    fn transition_to(&mut self, state: &str) {
        self.state = state.to_string();
        self.transitions.push(Transition {
            state: state.to_string(),
            at: Utc::now().to_rfc3339(),
        });
        self.reads_since_transition = 0;
    }
}

/// Mock server state. The resource map is the only mutable state; the
/// settle-reads knob is runtime-adjustable through the control API.
pub struct MockState {
    resources: RwLock<BTreeMap<String, StoredResource>>,
    seq: AtomicU64,
    settle_reads: AtomicU32,
}

pub type SharedState = Arc<MockState>;

impl MockState {
    pub fn new(settle_reads: u32) -> SharedState {
        Arc::new(Self {
            resources: RwLock::new(BTreeMap::new()),
            seq: AtomicU64::new(0),
            settle_reads: AtomicU32::new(settle_reads),
        })
    }

    /// Canonical key: the request path below `/v1/`, e.g.
    /// `tenants/acme/workspaces/dev/instances/web-0`. Control endpoints
    /// address resources by the same key.
    pub fn key(kind: &str, scope: &Scope, name: &str) -> String {
        let collection = Self::collection_prefix(kind, scope);
        format!("{collection}/{name}")
    }

    fn collection_prefix(kind: &str, scope: &Scope) -> String {
        let collection = match kind {
            "tenant" => "tenants",
            "workspace" => "workspaces",
            "instance" => "instances",
            "volume" => "volumes",
            "network" => "networks",
            "role" => "roles",
            other => other,
        };
        match (&scope.tenant, &scope.workspace) {
            (Some(t), Some(w)) => format!("tenants/{t}/workspaces/{w}/{collection}"),
            (Some(t), None) => format!("tenants/{t}/{collection}"),
            (None, _) => collection.to_string(),
        }
    }

    pub fn set_settle_reads(&self, reads: u32) {
        self.settle_reads.store(reads, Ordering::SeqCst);
    }

    /// Create or replace a resource. A new resource starts in Creating, an
    /// existing one moves to Updating with its spec replaced; either way the
    /// server settles it to Active asynchronously (on later reads).
    pub async fn upsert(
        &self,
        kind: &str,
        scope: &Scope,
        name: &str,
        spec: Value,
        labels: BTreeMap<String, String>,
    ) -> ResourceBody {
        let key = Self::key(kind, scope, name);
        let mut resources = self.resources.write().await;
        match resources.get_mut(&key) {
            Some(existing) => {
                existing.spec = spec;
                existing.labels = labels;
                existing.transition_to(lifecycle::UPDATING);
                existing.body("PUT")
            }
            None => {
                let mut resource = StoredResource {
                    kind: kind.to_string(),
                    tenant: scope.tenant.clone().unwrap_or_else(|| name.to_string()),
                    workspace: scope.workspace.clone(),
                    name: name.to_string(),
                    labels,
                    spec,
                    state: String::new(),
                    transitions: Vec::new(),
                    seq: self.seq.fetch_add(1, Ordering::SeqCst),
                    reads_since_transition: 0,
                };
                resource.transition_to(lifecycle::CREATING);
                let body = resource.body("PUT");
                resources.insert(key, resource);
                body
            }
        }
    }

    /// Read a resource. A transitional resource settles to Active once it
    /// has been read `settle_reads` times since its last transition.
    pub async fn read(&self, key: &str) -> Option<ResourceBody> {
        let settle_reads = self.settle_reads.load(Ordering::SeqCst);
        let mut resources = self.resources.write().await;
        let resource = resources.get_mut(key)?;
        if lifecycle::is_transitional(&resource.state) {
            if resource.reads_since_transition >= settle_reads {
                resource.transition_to(lifecycle::ACTIVE);
            } else {
                resource.reads_since_transition += 1;
            }
        }
        Some(resource.body("GET"))
    }

    pub async fn remove(&self, key: &str) -> bool {
        self.resources.write().await.remove(key).is_some()
    }

    /// Force a resource into a state, bypassing the settle simulation.
    pub async fn force_state(&self, key: &str, state: &str) -> bool {
        let mut resources = self.resources.write().await;
        match resources.get_mut(key) {
            Some(resource) => {
                resource.transition_to(state);
                true
            }
            None => false,
        }
    }

    /// List one collection in creation order, filtered by label equality
    /// (AND), paginated by offset tokens. `limit` caps the page size only.
    pub async fn list(
        &self,
        kind: &str,
        scope: &Scope,
        labels: &BTreeMap<String, String>,
        limit: Option<usize>,
        page_token: Option<&str>,
    ) -> Result<PageBody, String> {
        let offset: usize = match page_token {
            Some(token) => token
                .parse()
                .map_err(|_| format!("invalid page token: {token}"))?,
            None => 0,
        };
        let page_size = limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let prefix = format!("{}/", Self::collection_prefix(kind, scope));

        let resources = self.resources.read().await;
        let mut matching: Vec<&StoredResource> = resources
            .iter()
            .filter(|(key, r)| {
                key.starts_with(&prefix)
                    && r.kind == kind
                    && labels.iter().all(|(k, v)| r.labels.get(k) == Some(v))
            })
            .map(|(_, r)| r)
            .collect();
        matching.sort_by_key(|r| r.seq);

        let total = matching.len();
        let end = (offset + page_size).min(total);
        let items = matching
            .get(offset..end)
            .unwrap_or(&[])
            .iter()
            .map(|r| r.body("GET"))
            .collect();
        let next_token = (end < total).then(|| end.to_string());

        Ok(PageBody { items, next_token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ws_scope() -> Scope {
        Scope::workspace("acme".to_string(), "dev".to_string())
    }

    async fn seed(state: &SharedState, name: &str, labels: &[(&str, &str)]) {
        let labels = labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        state
            .upsert("instance", &ws_scope(), name, json!({"sku": "s1.small"}), labels)
            .await;
    }

    #[test]
    fn keys_follow_the_request_path() {
        assert_eq!(
            MockState::key("instance", &ws_scope(), "web-0"),
            "tenants/acme/workspaces/dev/instances/web-0"
        );
        assert_eq!(
            MockState::key("network", &Scope::tenant("acme".to_string()), "default"),
            "tenants/acme/networks/default"
        );
        assert_eq!(MockState::key("tenant", &Scope::root(), "acme"), "tenants/acme");
    }

    #[tokio::test]
    async fn settles_after_the_configured_number_of_reads() {
        let state = MockState::new(2);
        seed(&state, "web-0", &[]).await;
        let key = MockState::key("instance", &ws_scope(), "web-0");

        // Two reads observe Creating, the third sees Active.
        for _ in 0..2 {
            let body = state.read(&key).await.unwrap();
            assert_eq!(body.status.state, lifecycle::CREATING);
        }
        let body = state.read(&key).await.unwrap();
        assert_eq!(body.status.state, lifecycle::ACTIVE);

        // Active is stable.
        let body = state.read(&key).await.unwrap();
        assert_eq!(body.status.state, lifecycle::ACTIVE);
    }

    #[tokio::test]
    async fn upsert_of_existing_resource_restarts_the_settle_clock() {
        let state = MockState::new(1);
        seed(&state, "web-0", &[]).await;
        let key = MockState::key("instance", &ws_scope(), "web-0");

        state.read(&key).await.unwrap();
        assert_eq!(state.read(&key).await.unwrap().status.state, lifecycle::ACTIVE);

        let body = state
            .upsert(
                "instance",
                &ws_scope(),
                "web-0",
                json!({"sku": "s1.large"}),
                BTreeMap::new(),
            )
            .await;
        assert_eq!(body.status.state, lifecycle::UPDATING);
        assert_eq!(body.metadata.verb, "PUT");

        assert_eq!(state.read(&key).await.unwrap().status.state, lifecycle::UPDATING);
        assert_eq!(state.read(&key).await.unwrap().status.state, lifecycle::ACTIVE);
    }

    #[tokio::test]
    async fn force_state_bypasses_the_settle_simulation() {
        let state = MockState::new(2);
        seed(&state, "web-0", &[]).await;
        let key = MockState::key("instance", &ws_scope(), "web-0");

        assert!(state.force_state(&key, "Suspended").await);
        let body = state.read(&key).await.unwrap();
        assert_eq!(body.status.state, "Suspended");

        assert!(!state.force_state("tenants/acme/instances/ghost", "Active").await);
    }

    #[tokio::test]
    async fn list_pages_with_offset_tokens() {
        let state = MockState::new(0);
        for i in 0..5 {
            seed(&state, &format!("inst-{i}"), &[]).await;
        }

        let first = state
            .list("instance", &ws_scope(), &BTreeMap::new(), Some(2), None)
            .await
            .unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.items[0].metadata.name, "inst-0");
        let token = first.next_token.unwrap();

        let second = state
            .list("instance", &ws_scope(), &BTreeMap::new(), Some(2), Some(&token))
            .await
            .unwrap();
        assert_eq!(second.items[0].metadata.name, "inst-2");

        let last = state
            .list(
                "instance",
                &ws_scope(),
                &BTreeMap::new(),
                Some(2),
                second.next_token.as_deref(),
            )
            .await
            .unwrap();
        assert_eq!(last.items.len(), 1);
        assert!(last.next_token.is_none());
    }

    #[tokio::test]
    async fn list_rejects_garbage_tokens() {
        let state = MockState::new(0);
        let err = state
            .list("instance", &ws_scope(), &BTreeMap::new(), None, Some("not-a-token"))
            .await
            .unwrap_err();
        assert!(err.contains("invalid page token"));
    }

    #[tokio::test]
    async fn list_filters_by_all_given_labels() {
        let state = MockState::new(0);
        seed(&state, "a", &[("env", "prod"), ("tier", "web")]).await;
        seed(&state, "b", &[("env", "prod")]).await;
        seed(&state, "c", &[]).await;

        let labels: BTreeMap<String, String> = [
            ("env".to_string(), "prod".to_string()),
            ("tier".to_string(), "web".to_string()),
        ]
        .into_iter()
        .collect();
        let page = state
            .list("instance", &ws_scope(), &labels, None, None)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].metadata.name, "a");
    }

    #[tokio::test]
    async fn listing_does_not_advance_the_settle_clock() {
        let state = MockState::new(1);
        seed(&state, "web-0", &[]).await;

        for _ in 0..3 {
            let page = state
                .list("instance", &ws_scope(), &BTreeMap::new(), None, None)
                .await
                .unwrap();
            assert_eq!(page.items[0].status.state, lifecycle::CREATING);
        }
    }
}
