//! Environment operations.

use async_trait::async_trait;
use tracing::info;

use crate::api::ApiClient;
use crate::context::Context;
use crate::convergence::{Fetch, Poller, RunState};
use crate::error::{Error, Result};
use crate::service::segment;
use crate::types::{CreateEnvironmentRequest, Environment, RunStateRequest, UpdateEnvironmentRequest};

const COLLECTION: &str = "v2/configurations";

pub(crate) fn environment_path(id: &str) -> String {
    format!("{}/{}", COLLECTION, segment(id))
}

/// Environment facade borrowed from a [`crate::service::Client`].
#[derive(Debug, Clone, Copy)]
pub struct Environments<'a> {
    api: &'a ApiClient,
    poller: &'a Poller,
}

impl<'a> Environments<'a> {
    pub(crate) fn new(api: &'a ApiClient, poller: &'a Poller) -> Self {
        Self { api, poller }
    }

    /// Fetch one environment.
    pub async fn get(&self, ctx: &Context, id: &str) -> Result<Environment> {
        self.api.get(ctx, &environment_path(id)).await
    }

    /// Every environment visible to the account.
    pub async fn list(&self, ctx: &Context) -> Result<Vec<Environment>> {
        self.api.get(ctx, COLLECTION).await
    }

    /// Create an environment from a template and wait until it has settled.
    pub async fn create(&self, ctx: &Context, request: &CreateEnvironmentRequest) -> Result<Environment> {
        let created: Environment = self.api.post(ctx, COLLECTION, request).await?;
        let id = created.id.ok_or_else(|| {
            Error::NotFound(format!(
                "environment created from template {} has no id",
                request.template_id
            ))
        })?;
        info!("Created environment {} from template {}", id, request.template_id);

        self.poller.wait_until_ready(ctx, self, &id).await
    }

    /// Apply a partial update and wait until every requested field reads back.
    pub async fn update(
        &self,
        ctx: &Context,
        id: &str,
        request: &UpdateEnvironmentRequest,
    ) -> Result<Environment> {
        let _: Environment = self.api.put(ctx, &environment_path(id), request).await?;
        self.poller
            .wait_until_fields(ctx, self, &id.to_string(), request)
            .await
    }

    /// Delete an environment and its VMs.
    pub async fn delete(&self, ctx: &Context, id: &str) -> Result<()> {
        self.api.delete(ctx, &environment_path(id)).await
    }

    /// Request a run-state (start, stop, suspend) and wait until it is reached.
    pub async fn set_runstate(&self, ctx: &Context, id: &str, runstate: RunState) -> Result<Environment> {
        let _: Environment = self
            .api
            .put(ctx, &environment_path(id), &RunStateRequest { runstate })
            .await?;
        self.poller
            .wait_until_state(ctx, self, &id.to_string(), None, &[runstate], false)
            .await
    }
}

#[async_trait]
impl Fetch for Environments<'_> {
    type Key = String;
    type Resource = Environment;

    async fn fetch(&self, ctx: &Context, key: &String) -> Result<Environment> {
        self.get(ctx, key).await
    }
}
