//! Tenant client.

use std::collections::BTreeMap;

use crate::client::{ApiClient, ListFetcher, UpsertBody};
use crate::error::{ClientError, Result};
use crate::pager::{ListOptions, Pager};
use crate::poller::{PollError, RetryBudget, StateCheck, converge};
use crate::resource::Resource;
use crate::types::TenantSpec;

/// Client for tenants, the top of the resource hierarchy.
#[derive(Debug, Clone)]
pub struct TenantClient {
    api: ApiClient,
}

impl TenantClient {
    pub(crate) fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn path(&self, name: &str) -> String {
        format!("/v1/tenants/{name}")
    }

    pub async fn create_or_update(
        &self,
        name: &str,
        spec: &TenantSpec,
        labels: &BTreeMap<String, String>,
    ) -> Result<Resource<TenantSpec>> {
        self.api
            .put_json(&self.path(name), &UpsertBody { spec, labels })
            .await
    }

    pub async fn get(&self, name: &str) -> Result<Resource<TenantSpec>> {
        self.api.get_json(&self.path(name), &[]).await
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        self.api.delete(&self.path(name)).await
    }

    pub fn list(&self, options: ListOptions) -> Pager<ListFetcher<TenantSpec>> {
        Pager::new(ListFetcher::new(
            self.api.clone(),
            "/v1/tenants".to_string(),
            options,
        ))
    }

    /// Poll `get` until the tenant reaches a state accepted by `check`.
    pub async fn await_state(
        &self,
        name: &str,
        check: &StateCheck,
        budget: RetryBudget,
    ) -> std::result::Result<Resource<TenantSpec>, PollError<ClientError>> {
        let operation = format!("tenants/{name}");
        converge(&operation, budget, check, || {
            let client = self.clone();
            let name = name.to_string();
            async move {
                let resource = client.get(&name).await?;
                let state = resource.state().unwrap_or_default().to_string();
                Ok::<_, ClientError>((resource, state))
            }
        })
        .await
    }
}
