//! Published service operations.

use crate::api::ApiClient;
use crate::context::Context;
use crate::error::Result;
use crate::service::interfaces::InterfaceKey;
use crate::service::segment;
use crate::types::{PublishedService, PublishedServiceRequest};

fn collection_path(interface: &InterfaceKey) -> String {
    format!("{}/services", interface.path())
}

fn service_path(interface: &InterfaceKey, id: &str) -> String {
    format!("{}/{}", collection_path(interface), segment(id))
}

/// Published service facade borrowed from a [`crate::service::Client`].
#[derive(Debug, Clone, Copy)]
pub struct PublishedServices<'a> {
    api: &'a ApiClient,
}

impl<'a> PublishedServices<'a> {
    pub(crate) fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// Fetch one published service.
    pub async fn get(&self, ctx: &Context, interface: &InterfaceKey, id: &str) -> Result<PublishedService> {
        self.api.get(ctx, &service_path(interface, id)).await
    }

    /// Services published on an interface.
    pub async fn list(&self, ctx: &Context, interface: &InterfaceKey) -> Result<Vec<PublishedService>> {
        self.api.get(ctx, &collection_path(interface)).await
    }

    /// Publish `internal_port`; the API assigns the external address.
    pub async fn create(&self, ctx: &Context, interface: &InterfaceKey, internal_port: u16) -> Result<PublishedService> {
        self.api
            .post(
                ctx,
                &collection_path(interface),
                &PublishedServiceRequest { internal_port },
            )
            .await
    }

    /// Move a published service to another internal port.
    pub async fn update(
        &self,
        ctx: &Context,
        interface: &InterfaceKey,
        id: &str,
        internal_port: u16,
    ) -> Result<PublishedService> {
        self.api
            .put(
                ctx,
                &service_path(interface, id),
                &PublishedServiceRequest { internal_port },
            )
            .await
    }

    /// Stop publishing a service.
    pub async fn delete(&self, ctx: &Context, interface: &InterfaceKey, id: &str) -> Result<()> {
        self.api.delete(ctx, &service_path(interface, id)).await
    }
}
