//! Compute instance client.

use std::collections::BTreeMap;

use crate::client::{ApiClient, ListFetcher, UpsertBody};
use crate::error::{ClientError, Result};
use crate::pager::{ListOptions, Pager};
use crate::poller::{PollError, RetryBudget, StateCheck, converge};
use crate::resource::Resource;
use crate::types::InstanceSpec;

/// Client for compute instances within one workspace.
#[derive(Debug, Clone)]
pub struct InstanceClient {
    api: ApiClient,
    tenant: String,
    workspace: String,
}

impl InstanceClient {
    pub(crate) fn new(api: ApiClient, tenant: String, workspace: String) -> Self {
        Self {
            api,
            tenant,
            workspace,
        }
    }

    fn collection_path(&self) -> String {
        format!(
            "/v1/tenants/{}/workspaces/{}/instances",
            self.tenant, self.workspace
        )
    }

    fn path(&self, name: &str) -> String {
        format!("{}/{}", self.collection_path(), name)
    }

    /// Create the instance, or replace its spec if it already exists. The
    /// returned view carries verb `PUT`; the server settles the lifecycle
    /// state asynchronously afterwards.
    pub async fn create_or_update(
        &self,
        name: &str,
        spec: &InstanceSpec,
        labels: &BTreeMap<String, String>,
    ) -> Result<Resource<InstanceSpec>> {
        self.api
            .put_json(&self.path(name), &UpsertBody { spec, labels })
            .await
    }

    pub async fn get(&self, name: &str) -> Result<Resource<InstanceSpec>> {
        self.api.get_json(&self.path(name), &[]).await
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        self.api.delete(&self.path(name)).await
    }

    /// List instances in the workspace. Label predicates are ANDed; `limit`
    /// caps the page size, not the result count.
    pub fn list(&self, options: ListOptions) -> Pager<ListFetcher<InstanceSpec>> {
        Pager::new(ListFetcher::new(
            self.api.clone(),
            self.collection_path(),
            options,
        ))
    }

    /// Poll `get` until the instance reaches a state accepted by `check`,
    /// returning the last observed snapshot.
    pub async fn await_state(
        &self,
        name: &str,
        check: &StateCheck,
        budget: RetryBudget,
    ) -> std::result::Result<Resource<InstanceSpec>, PollError<ClientError>> {
        let operation = format!("instances/{name}");
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
