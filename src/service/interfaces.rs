//! Network interface operations.
//!
//! Interface changes put the owning VM into `busy`; every mutation waits for
//! the VM to settle, then polls the interface until the requested fields
//! read back.

use std::fmt;

use async_trait::async_trait;
use tracing::info;

use crate::api::ApiClient;
use crate::context::Context;
use crate::convergence::{Fetch, Poller};
use crate::error::{Error, Result};
use crate::service::segment;
use crate::service::vms::{VmKey, Vms};
use crate::types::{CreateInterfaceRequest, Interface, UpdateInterfaceRequest};

/// Locates an interface on a VM.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InterfaceKey {
    pub vm: VmKey,
    pub interface_id: String,
}

impl InterfaceKey {
    /// Key for `interface_id` on `vm`.
    pub fn new(vm: VmKey, interface_id: impl Into<String>) -> Self {
        Self {
            vm,
            interface_id: interface_id.into(),
        }
    }

    pub(crate) fn path(&self) -> String {
        format!("{}/{}", collection_path(&self.vm), segment(&self.interface_id))
    }
}

impl fmt::Display for InterfaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "interface {} on {}", self.interface_id, self.vm)
    }
}

fn collection_path(vm: &VmKey) -> String {
    format!("{}/interfaces", vm.path())
}

/// Interface facade borrowed from a [`crate::service::Client`].
#[derive(Debug, Clone, Copy)]
pub struct Interfaces<'a> {
    api: &'a ApiClient,
    poller: &'a Poller,
}

impl<'a> Interfaces<'a> {
    pub(crate) fn new(api: &'a ApiClient, poller: &'a Poller) -> Self {
        Self { api, poller }
    }

    /// Fetch one interface.
    pub async fn get(&self, ctx: &Context, key: &InterfaceKey) -> Result<Interface> {
        self.api.get(ctx, &key.path()).await
    }

    /// All interfaces on `vm`.
    pub async fn list(&self, ctx: &Context, vm: &VmKey) -> Result<Vec<Interface>> {
        self.api.get(ctx, &collection_path(vm)).await
    }

    /// Add an interface to `vm` and wait until it is attached as requested.
    pub async fn create(&self, ctx: &Context, vm: &VmKey, request: &CreateInterfaceRequest) -> Result<Interface> {
        let created: Interface = self.api.post(ctx, &collection_path(vm), request).await?;
        let id = created
            .id
            .ok_or_else(|| Error::NotFound(format!("interface created on {} has no id", vm)))?;
        let key = InterfaceKey::new(vm.clone(), id);
        info!("Created {}", key);

        self.wait_for_vm(ctx, vm).await?;
        self.poller.wait_until_fields(ctx, self, &key, request).await
    }

    /// Apply a partial update and wait until every requested field reads back.
    pub async fn update(
        &self,
        ctx: &Context,
        key: &InterfaceKey,
        request: &UpdateInterfaceRequest,
    ) -> Result<Interface> {
        let _: Interface = self.api.put(ctx, &key.path(), request).await?;
        self.wait_for_vm(ctx, &key.vm).await?;
        self.poller.wait_until_fields(ctx, self, key, request).await
    }

    /// Remove an interface and wait for its VM to settle.
    pub async fn delete(&self, ctx: &Context, key: &InterfaceKey) -> Result<()> {
        self.api.delete(ctx, &key.path()).await?;
        self.wait_for_vm(ctx, &key.vm).await.map(|_| ())
    }

    async fn wait_for_vm(&self, ctx: &Context, vm: &VmKey) -> Result<()> {
        let vms = Vms::new(self.api, self.poller);
        self.poller.wait_until_ready(ctx, &vms, vm).await.map(|_| ())
    }
}

#[async_trait]
impl Fetch for Interfaces<'_> {
    type Key = InterfaceKey;
    type Resource = Interface;

    async fn fetch(&self, ctx: &Context, key: &InterfaceKey) -> Result<Interface> {
        self.get(ctx, key).await
    }
}
