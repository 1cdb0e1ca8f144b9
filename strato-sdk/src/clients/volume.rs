//! Storage volume client.

use std::collections::BTreeMap;

use crate::client::{ApiClient, ListFetcher, UpsertBody};
use crate::error::{ClientError, Result};
use crate::pager::{ListOptions, Pager};
use crate::poller::{PollError, RetryBudget, StateCheck, converge};
use crate::resource::Resource;
use crate::types::VolumeSpec;

/// Client for storage volumes within one workspace.
#[derive(Debug, Clone)]
pub struct VolumeClient {
    api: ApiClient,
    tenant: String,
    workspace: String,
}

impl VolumeClient {
    pub(crate) fn new(api: ApiClient, tenant: String, workspace: String) -> Self {
        Self {
            api,
            tenant,
            workspace,
        }
    }

    fn collection_path(&self) -> String {
        format!(
            "/v1/tenants/{}/workspaces/{}/volumes",
            self.tenant, self.workspace
        )
    }

    fn path(&self, name: &str) -> String {
        format!("{}/{}", self.collection_path(), name)
    }

    pub async fn create_or_update(
        &self,
        name: &str,
        spec: &VolumeSpec,
        labels: &BTreeMap<String, String>,
    ) -> Result<Resource<VolumeSpec>> {
        self.api
            .put_json(&self.path(name), &UpsertBody { spec, labels })
            .await
    }

    pub async fn get(&self, name: &str) -> Result<Resource<VolumeSpec>> {
        self.api.get_json(&self.path(name), &[]).await
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        self.api.delete(&self.path(name)).await
    }

    pub fn list(&self, options: ListOptions) -> Pager<ListFetcher<VolumeSpec>> {
        Pager::new(ListFetcher::new(
            self.api.clone(),
            self.collection_path(),
            options,
        ))
    }

    /// Poll `get` until the volume reaches a state accepted by `check`.
    pub async fn await_state(
        &self,
        name: &str,
        check: &StateCheck,
        budget: RetryBudget,
    ) -> std::result::Result<Resource<VolumeSpec>, PollError<ClientError>> {
        let operation = format!("volumes/{name}");
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
