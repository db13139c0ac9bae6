//! VM network interfaces.

use serde::{Deserialize, Serialize};

use crate::convergence::{HasRunState, RunState};
use crate::types::service::PublishedService;

/// Emulated NIC model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NicType {
    Default,
    E1000,
    E1000e,
    Pcnet32,
    Vmxnet,
    Vmxnet3,
}

/// A network adapter on a VM.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Interface {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nic_type: Option<NicType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<PublishedService>,
}

// Interfaces settle with their VM and report no run-state of their own.
impl HasRunState for Interface {
    fn run_state(&self) -> Option<RunState> {
        None
    }
}

/// Body for adding an interface to a VM.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreateInterfaceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nic_type: Option<NicType>,
}

crate::field_match!(CreateInterfaceRequest => Interface { nic_type });

/// Partial update; setting `network_id` attaches the interface to a network.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateInterfaceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
}

crate::field_match!(UpdateInterfaceRequest => Interface {
    ip,
    hostname,
    network_id,
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convergence::FieldMatch;

    #[test]
    fn test_nic_type_wire_format() {
        let nic: Interface =
            serde_json::from_str(r#"{"id":"nic-1","nic_type":"vmxnet3","services":[{"id":"22","internal_port":22}]}"#)
                .unwrap();
        assert_eq!(nic.nic_type, Some(NicType::Vmxnet3));
        assert_eq!(nic.services[0].internal_port, Some(22));
    }

    #[test]
    fn test_attach_body() {
        let request = UpdateInterfaceRequest {
            network_id: Some("4".to_string()),
            ..UpdateInterfaceRequest::default()
        };
        assert_eq!(serde_json::to_string(&request).unwrap(), r#"{"network_id":"4"}"#);
    }

    #[test]
    fn test_update_compares_requested_fields() {
        let request = UpdateInterfaceRequest {
            hostname: Some("new".to_string()),
            ..UpdateInterfaceRequest::default()
        };
        let stale = Interface {
            hostname: Some("old".to_string()),
            ip: Some("10.0.0.5".to_string()),
            ..Interface::default()
        };
        assert_eq!(
            request.mismatched_fields(&stale).into_iter().collect::<Vec<_>>(),
            vec!["hostname"]
        );
        assert_eq!(stale.run_state(), None);
    }
}
