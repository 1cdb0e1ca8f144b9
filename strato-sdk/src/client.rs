//! HTTP transport shared by the per-kind clients.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use tracing::debug;

use crate::clients::{
    InstanceClient, NetworkClient, RoleClient, TenantClient, VolumeClient, WorkspaceClient,
};
use crate::error::{ClientError, Result};
use crate::pager::{ListOptions, Page, PageFetcher};
use crate::resource::Resource;
use crate::types::{Sku, Zone};

/// Shared API client: base URL, optional bearer token, connection pool.
///
/// Construct once during setup and hand out per-kind clients from it; there
/// is no process-wide singleton. Cloning is cheap, the underlying connection
/// pool is shared.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // === Per-kind clients ===

    pub fn tenants(&self) -> TenantClient {
        TenantClient::new(self.clone())
    }

    pub fn workspaces(&self, tenant: &str) -> WorkspaceClient {
        WorkspaceClient::new(self.clone(), tenant.to_string())
    }

    pub fn instances(&self, tenant: &str, workspace: &str) -> InstanceClient {
        InstanceClient::new(self.clone(), tenant.to_string(), workspace.to_string())
    }

    pub fn volumes(&self, tenant: &str, workspace: &str) -> VolumeClient {
        VolumeClient::new(self.clone(), tenant.to_string(), workspace.to_string())
    }

    pub fn networks(&self, tenant: &str) -> NetworkClient {
        NetworkClient::new(self.clone(), tenant.to_string())
    }

    pub fn roles(&self, tenant: &str) -> RoleClient {
        RoleClient::new(self.clone(), tenant.to_string())
    }

    // === Catalogs (read-only reference data) ===

    pub async fn zones(&self) -> Result<Vec<Zone>> {
        self.get_json("/v1/zones", &[]).await
    }

    pub async fn skus(&self) -> Result<Vec<Sku>> {
        self.get_json("/v1/skus", &[]).await
    }

    // === Request plumbing ===

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T> {
        debug!(path, "GET");
        let resp = self
            .authed(self.http.get(self.url(path)))
            .query(query)
            .send()
            .await?;
        Self::decode(resp).await
    }

    pub(crate) async fn put_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        debug!(path, "PUT");
        let resp = self
            .authed(self.http.put(self.url(path)))
            .json(body)
            .send()
            .await?;
        Self::decode(resp).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<()> {
        debug!(path, "DELETE");
        let resp = self.authed(self.http.delete(self.url(path))).send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_for(resp).await)
        }
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
        if resp.status().is_success() {
            Ok(resp.json::<T>().await?)
        } else {
            Err(Self::error_for(resp).await)
        }
    }

    async fn error_for(resp: reqwest::Response) -> ClientError {
        let status = resp.status();
        let message = resp
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or_else(|| status.to_string());
        match status {
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            StatusCode::CONFLICT => ClientError::Conflict(message),
            _ => ClientError::Api {
                status: status.as_u16(),
                message,
            },
        }
    }
}

/// PUT body for create-or-update.
#[derive(Serialize)]
pub(crate) struct UpsertBody<'a, S> {
    pub spec: &'a S,
    pub labels: &'a BTreeMap<String, String>,
}

/// Page fetcher bound to one collection path and one set of list options.
/// Shared by every per-kind `list()`.
pub struct ListFetcher<S> {
    api: ApiClient,
    path: String,
    options: ListOptions,
    _spec: PhantomData<fn() -> S>,
}

impl<S> ListFetcher<S> {
    pub(crate) fn new(api: ApiClient, path: String, options: ListOptions) -> Self {
        Self {
            api,
            path,
            options,
            _spec: PhantomData,
        }
    }
}

#[async_trait]
impl<S> PageFetcher for ListFetcher<S>
where
    S: DeserializeOwned + Send + Sync,
{
    type Item = Resource<S>;

    async fn fetch_page(&self, token: Option<&str>) -> Result<Page<Resource<S>>> {
        let mut query = self.options.to_query();
        if let Some(token) = token {
            query.push(("page_token".to_string(), token.to_string()));
        }
        self.api.get_json(&self.path, &query).await
    }
}
