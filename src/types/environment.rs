//! Environment (a.k.a. configuration) resources.

use serde::{Deserialize, Serialize};

use crate::convergence::{HasRunState, RunState};
use crate::types::network::Network;
use crate::types::vm::Vm;

/// A Skytap environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Environment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runstate: Option<RunState>,
    /// Owner user id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vms: Vec<Vm>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<Network>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outbound_traffic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routable: Option<bool>,
    /// Idle seconds before suspend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspend_on_idle: Option<u64>,
    /// Idle seconds before shutdown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shutdown_on_idle: Option<u64>,
}

impl HasRunState for Environment {
    fn run_state(&self) -> Option<RunState> {
        self.runstate
    }
}

/// A free-form tag on an environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tag {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub value: String,
}

/// Body for creating an environment from a template.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateEnvironmentRequest {
    pub template_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Subset of template VMs to copy; all when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vm_ids: Option<Vec<String>>,
}

impl CreateEnvironmentRequest {
    pub fn from_template(template_id: impl Into<String>) -> Self {
        Self {
            template_id: template_id.into(),
            ..Self::default()
        }
    }
}

/// Partial update of an environment. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateEnvironmentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outbound_traffic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspend_on_idle: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shutdown_on_idle: Option<u64>,
}

crate::field_match!(UpdateEnvironmentRequest => Environment {
    name,
    description,
    owner,
    outbound_traffic,
    routable,
    suspend_on_idle,
    shutdown_on_idle,
});

/// Body that moves an environment or VM to a new run-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunStateRequest {
    pub runstate: RunState,
}
