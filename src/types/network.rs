//! Environment networks.

use serde::{Deserialize, Serialize};

use crate::convergence::{HasRunState, RunState};

/// Whether the API assigns addresses or the guest does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Automatic,
    Manual,
}

/// A network in an environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Network {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_type: Option<NetworkType>,
    /// CIDR, e.g. `10.0.0.0/24`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tunnelable: Option<bool>,
}

impl HasRunState for Network {
    fn run_state(&self) -> Option<RunState> {
        None
    }
}

/// Body for creating or updating a network. Unset fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NetworkRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_type: Option<NetworkType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tunnelable: Option<bool>,
}

crate::field_match!(NetworkRequest => Network {
    name,
    network_type,
    subnet,
    domain,
    gateway,
    tunnelable,
});
