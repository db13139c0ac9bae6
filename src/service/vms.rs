//! VM operations.

use std::collections::HashSet;
use std::fmt;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::api::ApiClient;
use crate::context::Context;
use crate::convergence::{Fetch, Poller, RunState};
use crate::error::{Error, Result};
use crate::service::environments::environment_path;
use crate::service::segment;
use crate::types::{CreateVmRequest, Environment, RunStateRequest, UpdateVmRequest, Vm};

/// Locates a VM within its environment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VmKey {
    pub environment_id: String,
    pub vm_id: String,
}

impl VmKey {
    /// Key for `vm_id` in `environment_id`.
    pub fn new(environment_id: impl Into<String>, vm_id: impl Into<String>) -> Self {
        Self {
            environment_id: environment_id.into(),
            vm_id: vm_id.into(),
        }
    }

    pub(crate) fn path(&self) -> String {
        format!("{}/vms/{}", environment_path(&self.environment_id), segment(&self.vm_id))
    }
}

impl fmt::Display for VmKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vm {} in environment {}", self.vm_id, self.environment_id)
    }
}

/// VM facade borrowed from a [`crate::service::Client`].
#[derive(Debug, Clone, Copy)]
pub struct Vms<'a> {
    api: &'a ApiClient,
    poller: &'a Poller,
}

impl<'a> Vms<'a> {
    pub(crate) fn new(api: &'a ApiClient, poller: &'a Poller) -> Self {
        Self { api, poller }
    }

    /// Fetch one VM.
    pub async fn get(&self, ctx: &Context, key: &VmKey) -> Result<Vm> {
        self.api.get(ctx, &key.path()).await
    }

    /// Copy VMs from a template into an existing environment.
    ///
    /// The API answers with the whole environment, so the new VMs are found
    /// by comparing VM ids before and after. Each is waited on until ready.
    pub async fn create(
        &self,
        ctx: &Context,
        environment_id: &str,
        request: &CreateVmRequest,
    ) -> Result<Vec<Vm>> {
        let path = environment_path(environment_id);
        let before: Environment = self.api.get(ctx, &path).await?;
        let existing: HashSet<String> = before.vms.into_iter().filter_map(|vm| vm.id).collect();

        let after: Environment = self.api.put(ctx, &path, request).await?;
        let added: Vec<String> = after
            .vms
            .into_iter()
            .filter_map(|vm| vm.id)
            .filter(|id| !existing.contains(id))
            .collect();
        if added.is_empty() {
            return Err(Error::NotFound(format!(
                "no new VM in environment {} after adding template {}",
                environment_id, request.template_id
            )));
        }
        debug!("Template {} added VMs {:?}", request.template_id, added);

        let mut vms = Vec::with_capacity(added.len());
        for vm_id in added {
            let key = VmKey::new(environment_id, vm_id);
            vms.push(self.poller.wait_until_ready(ctx, self, &key).await?);
            info!("Created {}", key);
        }
        Ok(vms)
    }

    /// Apply a partial update and wait until every requested field reads back.
    pub async fn update(&self, ctx: &Context, key: &VmKey, request: &UpdateVmRequest) -> Result<Vm> {
        let _: Vm = self.api.put(ctx, &key.path(), request).await?;
        self.poller.wait_until_fields(ctx, self, key, request).await
    }

    /// Request a run-state and wait until it is reached.
    pub async fn set_runstate(&self, ctx: &Context, key: &VmKey, runstate: RunState) -> Result<Vm> {
        let _: Vm = self
            .api
            .put(ctx, &key.path(), &RunStateRequest { runstate })
            .await?;
        self.poller
            .wait_until_state(ctx, self, key, None, &[runstate], false)
            .await
    }

    /// Power-cycle a VM.
    ///
    /// A reset ends in the state the VM started in, so the wait only accepts
    /// a settled state once a transition away from it has been seen.
    pub async fn reset(&self, ctx: &Context, key: &VmKey) -> Result<Vm> {
        let current = self.get(ctx, key).await?;
        let _: Vm = self
            .api
            .put(
                ctx,
                &key.path(),
                &RunStateRequest {
                    runstate: RunState::Reset,
                },
            )
            .await?;
        self.poller
            .wait_until_state(ctx, self, key, current.runstate, &RunState::SETTLED, true)
            .await
    }

    /// Remove a VM from its environment.
    pub async fn delete(&self, ctx: &Context, key: &VmKey) -> Result<()> {
        self.api.delete(ctx, &key.path()).await
    }
}

#[async_trait]
impl Fetch for Vms<'_> {
    type Key = VmKey;
    type Resource = Vm;

    async fn fetch(&self, ctx: &Context, key: &VmKey) -> Result<Vm> {
        self.get(ctx, key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vm_key_path() {
        let key = VmKey::new("12", "34");
        assert_eq!(key.path(), "v2/configurations/12/vms/34");
        assert_eq!(key.to_string(), "vm 34 in environment 12");
    }
}
