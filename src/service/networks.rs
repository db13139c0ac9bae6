//! Network operations.

use std::fmt;

use async_trait::async_trait;
use tracing::info;

use crate::api::ApiClient;
use crate::context::Context;
use crate::convergence::{Fetch, Poller};
use crate::error::{Error, Result};
use crate::service::environments::environment_path;
use crate::service::segment;
use crate::types::{Network, NetworkRequest};

/// Locates a network within its environment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NetworkKey {
    pub environment_id: String,
    pub network_id: String,
}

impl NetworkKey {
    /// Key for `network_id` in `environment_id`.
    pub fn new(environment_id: impl Into<String>, network_id: impl Into<String>) -> Self {
        Self {
            environment_id: environment_id.into(),
            network_id: network_id.into(),
        }
    }

    fn path(&self) -> String {
        format!(
            "{}/{}",
            collection_path(&self.environment_id),
            segment(&self.network_id)
        )
    }
}

impl fmt::Display for NetworkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "network {} in environment {}", self.network_id, self.environment_id)
    }
}

fn collection_path(environment_id: &str) -> String {
    format!("{}/networks", environment_path(environment_id))
}

/// Network facade borrowed from a [`crate::service::Client`].
#[derive(Debug, Clone, Copy)]
pub struct Networks<'a> {
    api: &'a ApiClient,
    poller: &'a Poller,
}

impl<'a> Networks<'a> {
    pub(crate) fn new(api: &'a ApiClient, poller: &'a Poller) -> Self {
        Self { api, poller }
    }

    /// Fetch one network.
    pub async fn get(&self, ctx: &Context, key: &NetworkKey) -> Result<Network> {
        self.api.get(ctx, &key.path()).await
    }

    /// Networks in an environment.
    pub async fn list(&self, ctx: &Context, environment_id: &str) -> Result<Vec<Network>> {
        self.api.get(ctx, &collection_path(environment_id)).await
    }

    /// Create a network and wait until the requested settings read back.
    pub async fn create(
        &self,
        ctx: &Context,
        environment_id: &str,
        request: &NetworkRequest,
    ) -> Result<Network> {
        let created: Network = self
            .api
            .post(ctx, &collection_path(environment_id), request)
            .await?;
        let id = created.id.ok_or_else(|| {
            Error::NotFound(format!(
                "network created in environment {} has no id",
                environment_id
            ))
        })?;
        let key = NetworkKey::new(environment_id, id);
        info!("Created {}", key);

        self.poller.wait_until_fields(ctx, self, &key, request).await
    }

    /// Apply a partial update and wait until it reads back.
    pub async fn update(&self, ctx: &Context, key: &NetworkKey, request: &NetworkRequest) -> Result<Network> {
        let _: Network = self.api.put(ctx, &key.path(), request).await?;
        self.poller.wait_until_fields(ctx, self, key, request).await
    }

    /// Delete a network.
    pub async fn delete(&self, ctx: &Context, key: &NetworkKey) -> Result<()> {
        self.api.delete(ctx, &key.path()).await
    }
}

#[async_trait]
impl Fetch for Networks<'_> {
    type Key = NetworkKey;
    type Resource = Network;

    async fn fetch(&self, ctx: &Context, key: &NetworkKey) -> Result<Network> {
        self.get(ctx, key).await
    }
}
