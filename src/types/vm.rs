//! Virtual machine resources.

use serde::{Deserialize, Serialize};

use crate::convergence::{compare_field, FieldMatch, HasRunState, Mismatches, RunState};
use crate::types::interface::Interface;

/// A VM inside an environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vm {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runstate: Option<RunState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardware: Option<Hardware>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<Interface>,
}

impl HasRunState for Vm {
    fn run_state(&self) -> Option<RunState> {
        self.runstate
    }
}

/// Virtual hardware. `ram` is in MiB.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hardware {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpus: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ram: Option<u32>,
}

/// Body for adding template VMs to an existing environment.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateVmRequest {
    pub template_id: String,
    /// Template VMs to copy; the API copies all of them when empty
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vm_ids: Vec<String>,
}

/// Partial update of a VM.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateVmRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardware: Option<Hardware>,
}

impl FieldMatch<Vm> for UpdateVmRequest {
    fn mismatched_fields(&self, actual: &Vm) -> Mismatches {
        let mut mismatches = Mismatches::new();
        compare_field(&mut mismatches, "name", self.name.as_ref(), actual.name.as_ref());

        if let Some(requested) = &self.hardware {
            let current = actual.hardware.as_ref();
            compare_field(
                &mut mismatches,
                "hardware.cpus",
                requested.cpus.as_ref(),
                current.and_then(|h| h.cpus.as_ref()),
            );
            compare_field(
                &mut mismatches,
                "hardware.ram",
                requested.ram.as_ref(),
                current.and_then(|h| h.ram.as_ref()),
            );
        }
        mismatches
    }
}
