//! Projects group environments for access control.

use serde::{Deserialize, Serialize};

/// A project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Role granted to users added automatically
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_add_role_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_project_members: Option<bool>,
}

/// Body for creating or updating a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_add_role_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_project_members: Option<bool>,
}

crate::field_match!(ProjectRequest => Project {
    name,
    summary,
    auto_add_role_name,
    show_project_members,
});
