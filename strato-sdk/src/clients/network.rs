//! Network client.

use std::collections::BTreeMap;

use crate::client::{ApiClient, ListFetcher, UpsertBody};
use crate::error::{ClientError, Result};
use crate::pager::{ListOptions, Pager};
use crate::poller::{PollError, RetryBudget, StateCheck, converge};
use crate::resource::Resource;
use crate::types::NetworkSpec;

/// Client for networks within one tenant.
#[derive(Debug, Clone)]
pub struct NetworkClient {
    api: ApiClient,
    tenant: String,
}

impl NetworkClient {
    pub(crate) fn new(api: ApiClient, tenant: String) -> Self {
        Self { api, tenant }
    }

    fn collection_path(&self) -> String {
        format!("/v1/tenants/{}/networks", self.tenant)
    }

    fn path(&self, name: &str) -> String {
        format!("{}/{}", self.collection_path(), name)
    }

    pub async fn create_or_update(
        &self,
        name: &str,
        spec: &NetworkSpec,
        labels: &BTreeMap<String, String>,
    ) -> Result<Resource<NetworkSpec>> {
        self.api
            .put_json(&self.path(name), &UpsertBody { spec, labels })
            .await
    }

    pub async fn get(&self, name: &str) -> Result<Resource<NetworkSpec>> {
        self.api.get_json(&self.path(name), &[]).await
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        self.api.delete(&self.path(name)).await
    }

    pub fn list(&self, options: ListOptions) -> Pager<ListFetcher<NetworkSpec>> {
        Pager::new(ListFetcher::new(
            self.api.clone(),
            self.collection_path(),
            options,
        ))
    }

    /// Poll `get` until the network reaches a state accepted by `check`.
    pub async fn await_state(
        &self,
        name: &str,
        check: &StateCheck,
        budget: RetryBudget,
    ) -> std::result::Result<Resource<NetworkSpec>, PollError<ClientError>> {
        let operation = format!("networks/{name}");
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
