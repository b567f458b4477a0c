//! Resource tree navigation
//!
//! Walks the catalog the way a browser UI would: list the top-level types
//! resolvable from the seed values, descend into a node, expand it from its
//! read response, go back. Placeholder values accumulate along the way and
//! must stay consistent on a single path.
//!
//! - [`node`] - Tree nodes and their resolved URLs
//! - [`expander`] - Children and sub-resource expansion
//! - [`request`] - Request planning per operation

pub mod expander;
pub mod node;
pub mod request;

pub use expander::{expand, merge_values, next_link};
pub use node::TreeNode;
pub use request::{parse_base, plan, RequestPlan, DEFAULT_MANAGEMENT_ENDPOINT};

use crate::catalog::{Axis, Catalog, TemplateValues};
use anyhow::{Context, Result};
use serde_json::Value;

/// Navigation state over a borrowed catalog
#[derive(Debug, Clone)]
pub struct Navigator<'a> {
    catalog: &'a Catalog,
    seed: TemplateValues,
    stack: Vec<TreeNode<'a>>,
}

impl<'a> Navigator<'a> {
    /// `seed` holds values known up front, e.g. `subscriptionId`
    pub fn new(catalog: &'a Catalog, seed: TemplateValues) -> Self {
        Self {
            catalog,
            seed,
            stack: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    /// Top-level nodes whose templates resolve from the seed values alone
    pub fn top_level(&self) -> Vec<TreeNode<'a>> {
        self.catalog
            .resource_types()
            .iter()
            .filter_map(|rt| match TreeNode::from_type(rt, Axis::Root, &self.seed) {
                Ok(node) => Some(node),
                Err(e) => {
                    tracing::trace!("Skipping top-level '{}': {}", rt.display, e);
                    None
                }
            })
            .collect()
    }

    pub fn current(&self) -> Option<&TreeNode<'a>> {
        self.stack.last()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Seed values overlaid with the values of every node on the stack
    pub fn context(&self) -> TemplateValues {
        let mut values = self.seed.clone();
        for node in &self.stack {
            values.extend(node.values.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        values
    }

    /// Step into `node`, rejecting it if it contradicts a value already on the path
    pub fn descend(&mut self, node: TreeNode<'a>) -> Result<&TreeNode<'a>> {
        merge_values(&self.context(), node.values.clone())
            .with_context(|| format!("Cannot descend into '{}'", node.display))?;

        tracing::debug!("Descend into '{}' ({})", node.display, node.expand_url);
        self.stack.push(node);
        self.stack.last().context("navigation stack is empty")
    }

    /// Step back out of the current node
    pub fn back(&mut self) -> Option<TreeNode<'a>> {
        let node = self.stack.pop();
        if let Some(ref node) = node {
            tracing::debug!("Back from '{}'", node.display);
        }
        node
    }

    /// Display labels from the top level down to the current node
    pub fn breadcrumb(&self) -> Vec<String> {
        self.stack.iter().map(|node| node.display.clone()).collect()
    }

    /// Nodes below the current one, or the top level when nothing is selected
    pub fn expand_current(&self, response: Option<&Value>) -> Result<Vec<TreeNode<'a>>> {
        match self.current() {
            Some(node) => expand(node, response),
            None => Ok(self.top_level()),
        }
    }

    /// Replace the stack with the path leading to the resource at `url`
    ///
    /// `url` may be an ARM id, a path or an absolute management URL. Values
    /// taken from it must agree with the seed values.
    pub fn navigate_to(&mut self, url: &str) -> Result<&TreeNode<'a>> {
        let path = self
            .catalog
            .path_for_url(url)
            .with_context(|| format!("No resource type matches {}", url))?;
        let values = merge_values(&self.seed, path.values)
            .with_context(|| format!("Cannot navigate to {}", url))?;

        let mut stack = Vec::with_capacity(path.steps.len());
        for (axis, rt) in &path.steps {
            let node = TreeNode::from_type(*rt, *axis, &values)?;
            let node = match (axis, node.instance_name().map(str::to_string)) {
                (Axis::SubResource, Some(name)) => node.with_instance_name(name),
                _ => node,
            };
            stack.push(node);
        }

        self.stack = stack;
        tracing::info!("Navigated to {} ({})", url, self.breadcrumb().join(" > "));
        self.stack.last().context("navigation stack is empty")
    }
}
