//! Service layer for the Skytap API.
//!
//! Each facade turns typed requests into API paths and bodies, then waits
//! through the [`Poller`] until mutations are visible. They hold no state of
//! their own and borrow the [`Client`] they were obtained from.

pub mod environments;
pub mod interfaces;
pub mod label_categories;
pub mod networks;
pub mod projects;
pub mod services;
pub mod vms;

pub use environments::Environments;
pub use interfaces::{InterfaceKey, Interfaces};
pub use label_categories::LabelCategories;
pub use networks::{NetworkKey, Networks};
pub use projects::Projects;
pub use services::PublishedServices;
pub use vms::{VmKey, Vms};

use std::sync::Arc;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::api::{ApiClient, CredentialsProvider};
use crate::config::ClientConfig;
use crate::convergence::Poller;
use crate::error::Result;

/// Characters escaped in a path segment. `/` is included so an id can never
/// address a different resource.
const SEGMENT_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

pub(crate) fn segment(id: &str) -> String {
    utf8_percent_encode(id, SEGMENT_SET).to_string()
}

/// Entry point: an [`ApiClient`] plus the poller configured alongside it.
#[derive(Debug, Clone)]
pub struct Client {
    api: ApiClient,
    poller: Poller,
}

impl Client {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if the configuration is invalid.
    pub fn new(config: &ClientConfig, credentials: Arc<dyn CredentialsProvider>) -> Result<Self> {
        let api = ApiClient::new(config, credentials)?;
        let poller = Poller::new(config.poll.clone()).with_metrics(api.shared_metrics());
        Ok(Self { api, poller })
    }

    /// The underlying request pipeline.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// The convergence poller shared by the facades.
    pub fn poller(&self) -> &Poller {
        &self.poller
    }

    /// Environments.
    pub fn environments(&self) -> Environments<'_> {
        Environments::new(&self.api, &self.poller)
    }

    /// VMs.
    pub fn vms(&self) -> Vms<'_> {
        Vms::new(&self.api, &self.poller)
    }

    /// Environment networks.
    pub fn networks(&self) -> Networks<'_> {
        Networks::new(&self.api, &self.poller)
    }

    /// Projects.
    pub fn projects(&self) -> Projects<'_> {
        Projects::new(&self.api)
    }

    /// Network interfaces on VMs.
    pub fn interfaces(&self) -> Interfaces<'_> {
        Interfaces::new(&self.api, &self.poller)
    }

    /// Services published on interfaces.
    pub fn published_services(&self) -> PublishedServices<'_> {
        PublishedServices::new(&self.api)
    }

    /// Label categories.
    pub fn label_categories(&self) -> LabelCategories<'_> {
        LabelCategories::new(&self.api)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_escapes_separators() {
        assert_eq!(segment("123"), "123");
        assert_eq!(segment("a/b"), "a%2Fb");
        assert_eq!(segment("x?y#z"), "x%3Fy%23z");
        assert_eq!(segment("50%"), "50%25");
    }
}
