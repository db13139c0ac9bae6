//! Project operations. Projects have no asynchronous state, so nothing here polls.

use reqwest::Method;
use tracing::info;

use crate::api::{ApiClient, RequestDescriptor};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::service::segment;
use crate::types::{Environment, Project, ProjectRequest};

const COLLECTION: &str = "v2/projects";

fn project_path(id: &str) -> String {
    format!("{}/{}", COLLECTION, segment(id))
}

fn membership_path(project_id: &str, environment_id: &str) -> String {
    format!(
        "{}/configurations/{}",
        project_path(project_id),
        segment(environment_id)
    )
}

/// Project facade borrowed from a [`crate::service::Client`].
#[derive(Debug, Clone, Copy)]
pub struct Projects<'a> {
    api: &'a ApiClient,
}

impl<'a> Projects<'a> {
    pub(crate) fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// Fetch one project.
    pub async fn get(&self, ctx: &Context, id: &str) -> Result<Project> {
        self.api.get(ctx, &project_path(id)).await
    }

    /// All projects.
    pub async fn list(&self, ctx: &Context) -> Result<Vec<Project>> {
        self.api.get(ctx, COLLECTION).await
    }

    /// Create a project. `name` is required.
    pub async fn create(&self, ctx: &Context, request: &ProjectRequest) -> Result<Project> {
        if request.name.as_deref().map_or(true, str::is_empty) {
            return Err(Error::InvalidRequest("project name is required".to_string()));
        }
        let project: Project = self.api.post(ctx, COLLECTION, request).await?;
        info!("Created project {:?}", project.id);
        Ok(project)
    }

    /// Rename or re-describe a project.
    pub async fn update(&self, ctx: &Context, id: &str, request: &ProjectRequest) -> Result<Project> {
        self.api.put(ctx, &project_path(id), request).await
    }

    /// Delete a project; its environments are left alone.
    pub async fn delete(&self, ctx: &Context, id: &str) -> Result<()> {
        self.api.delete(ctx, &project_path(id)).await
    }

    /// Environments that belong to `project_id`.
    pub async fn list_environments(&self, ctx: &Context, project_id: &str) -> Result<Vec<Environment>> {
        self.api
            .get(ctx, &format!("{}/configurations", project_path(project_id)))
            .await
    }

    /// Add an environment to a project.
    pub async fn add_environment(&self, ctx: &Context, project_id: &str, environment_id: &str) -> Result<()> {
        let descriptor = RequestDescriptor::new(Method::POST, membership_path(project_id, environment_id));
        let _: serde_json::Value = self.api.execute(ctx, descriptor).await?;
        Ok(())
    }

    /// Detach an environment from a project.
    pub async fn remove_environment(&self, ctx: &Context, project_id: &str, environment_id: &str) -> Result<()> {
        self.api
            .delete(ctx, &membership_path(project_id, environment_id))
            .await
    }
}
