//! Label category operations.
//!
//! Deleting a category only disables it, and its name stays taken. Creating
//! it again yields 409 with the existing category's URL in the message; that
//! category is re-enabled instead.

use tracing::info;

use crate::api::ApiClient;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::service::segment;
use crate::types::{CreateLabelCategoryRequest, LabelCategory, UpdateLabelCategoryRequest};

const COLLECTION: &str = "v2/label_categories";

fn category_path(id: &str) -> String {
    format!("{}/{}", COLLECTION, segment(id))
}

/// Id of the resource a conflict points at: the last segment of its URL.
fn conflicting_id(error: &Error) -> Option<String> {
    let api_error = error.api_error().filter(|e| e.is_conflict())?;
    let url = reqwest::Url::parse(api_error.resource_url.as_deref()?).ok()?;
    url.path_segments()?
        .filter(|s| !s.is_empty())
        .last()
        .map(String::from)
}

/// Label category facade borrowed from a [`crate::service::Client`].
#[derive(Debug, Clone, Copy)]
pub struct LabelCategories<'a> {
    api: &'a ApiClient,
}

impl<'a> LabelCategories<'a> {
    pub(crate) fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// Fetch one label category.
    pub async fn get(&self, ctx: &Context, id: &str) -> Result<LabelCategory> {
        self.api.get(ctx, &category_path(id)).await
    }

    /// All label categories, enabled or not.
    pub async fn list(&self, ctx: &Context) -> Result<Vec<LabelCategory>> {
        self.api.get(ctx, COLLECTION).await
    }

    /// Create a category, re-enabling a disabled one with the same name.
    pub async fn create(&self, ctx: &Context, request: &CreateLabelCategoryRequest) -> Result<LabelCategory> {
        match self.api.post(ctx, COLLECTION, request).await {
            Ok(category) => Ok(category),
            Err(e) => match conflicting_id(&e) {
                Some(id) => {
                    info!("Label category {:?} exists as {}, re-enabling", request.name, id);
                    self.set_enabled(ctx, &id, true).await
                }
                None => Err(e),
            },
        }
    }

    /// Enable or disable a category.
    pub async fn set_enabled(&self, ctx: &Context, id: &str, enabled: bool) -> Result<LabelCategory> {
        let request = UpdateLabelCategoryRequest {
            enabled: Some(enabled),
        };
        self.api.put(ctx, &category_path(id), &request).await
    }

    /// Disable a category. The API keeps it, so its name cannot be reused
    /// except through [`LabelCategories::create`] re-enabling it.
    pub async fn delete(&self, ctx: &Context, id: &str) -> Result<()> {
        self.api.delete(ctx, &category_path(id)).await
    }
}
