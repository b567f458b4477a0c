//! Tree nodes
//!
//! A [`TreeNode`] is one navigable item: a resource type from the catalog
//! plus the placeholder values that turn its templates into concrete URLs.

use crate::catalog::{Axis, ResourceType, TemplateValues};
use anyhow::{Context, Result};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct TreeNode<'a> {
    /// ARM id for instances, otherwise the expand URL
    pub id: String,
    /// Name of the object as returned by the API (or the label for static nodes)
    pub name: String,
    /// Text shown in a tree
    pub display: String,
    pub kind: Axis,
    #[serde(skip)]
    pub resource_type: &'a ResourceType,
    /// Path to read in order to expand this node
    pub expand_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_url: Option<String>,
    /// Values for every placeholder this node's templates use
    pub values: TemplateValues,
}

impl<'a> TreeNode<'a> {
    /// Build a node for `resource_type` from the values known at this point
    ///
    /// Only the placeholders used by the type's own templates are kept.
    pub fn from_type(
        resource_type: &'a ResourceType,
        kind: Axis,
        values: &TemplateValues,
    ) -> Result<Self> {
        let endpoint = resource_type
            .primary_endpoint()
            .with_context(|| format!("'{}' has no endpoint", resource_type.display))?;

        let own_values: TemplateValues = resource_type
            .placeholders()
            .into_iter()
            .filter_map(|name| values.get(name).map(|v| (name.to_string(), v.clone())))
            .collect();

        let expand_url = endpoint.build_url(&own_values)?;
        let delete_url = resource_type
            .delete_endpoint
            .as_ref()
            .map(|e| e.build_url(&own_values))
            .transpose()?;

        Ok(Self {
            id: expand_url.clone(),
            name: resource_type.display.clone(),
            display: resource_type.display.clone(),
            kind,
            resource_type,
            expand_url,
            delete_url,
            values: own_values,
        })
    }

    /// Label nodes standing for an instance with the instance's name
    pub(crate) fn with_instance_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.display = name.clone();
        self.name = name;
        self
    }

    /// Value of the trailing placeholder of the read template, if it has one
    pub fn instance_name(&self) -> Option<&str> {
        let endpoint = self.resource_type.primary_endpoint()?;
        let last = *endpoint.placeholders().last()?;
        let ends_with_placeholder = endpoint
            .template_url
            .trim_end_matches('/')
            .ends_with(&format!("{{{}}}", last));

        if ends_with_placeholder {
            self.values.get(last).map(String::as_str)
        } else {
            None
        }
    }
}
