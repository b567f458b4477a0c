//! Node expansion
//!
//! Expanding a node yields the instances listed in its read response
//! (matched against the node type's sub-resources), then its children.

use super::node::TreeNode;
use crate::catalog::{Axis, ResourceType, TemplateValues};
use anyhow::{bail, Context, Result};
use serde_json::Value;

/// Expand `node` into the nodes below it
///
/// `response` is the body returned by reading the node. It is required when
/// the node's type has sub-resources and ignored otherwise.
pub fn expand<'a>(node: &TreeNode<'a>, response: Option<&Value>) -> Result<Vec<TreeNode<'a>>> {
    let rt = node.resource_type;
    let mut nodes = Vec::new();

    if !rt.sub_resources.is_empty() {
        let response = response.with_context(|| {
            format!(
                "Expanding '{}' needs the response from {}",
                node.display, node.expand_url
            )
        })?;
        nodes.extend(expand_sub_resources(node, response)?);
    }

    for child in &rt.children {
        let child_node =
            TreeNode::from_type(child, Axis::Child, &node.values).with_context(|| {
                format!("Failed to build '{}' under '{}'", child.display, node.display)
            })?;
        nodes.push(child_node);
    }

    tracing::debug!("Expanded '{}' into {} node(s)", node.display, nodes.len());
    Ok(nodes)
}

fn expand_sub_resources<'a>(node: &TreeNode<'a>, response: &Value) -> Result<Vec<TreeNode<'a>>> {
    let items = list_items(response);
    let mut nodes = Vec::with_capacity(items.len());

    for item in items {
        let Some(id) = item.get("id").and_then(Value::as_str) else {
            tracing::warn!("Skipping list item without an id under {}", node.expand_url);
            continue;
        };

        let Some((sub_type, matched)) = match_sub_resource(&node.resource_type.sub_resources, id)
        else {
            tracing::warn!("No sub-resource of '{}' matches {}", node.display, id);
            continue;
        };

        let values = merge_values(&node.values, matched)
            .with_context(|| format!("Inconsistent id {} under {}", id, node.expand_url))?;

        let name = item
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| last_segment(id));

        let mut sub_node = TreeNode::from_type(sub_type, Axis::SubResource, &values)?
            .with_instance_name(name);
        sub_node.id = id.to_string();
        nodes.push(sub_node);
    }

    Ok(nodes)
}

/// First sub-resource type whose read endpoint matches `id`
fn match_sub_resource<'a>(
    candidates: &'a [ResourceType],
    id: &str,
) -> Option<(&'a ResourceType, TemplateValues)> {
    candidates.iter().find_map(|rt| {
        let values = rt.endpoint.as_ref()?.match_url(id)?;
        Some((rt, values))
    })
}

/// Items of an ARM list response (`{"value": [...]}`) or a bare array
fn list_items(response: &Value) -> &[Value] {
    response
        .get("value")
        .and_then(Value::as_array)
        .or_else(|| response.as_array())
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Continuation link of a paged ARM list response
pub fn next_link(response: &Value) -> Option<&str> {
    response
        .get("nextLink")
        .and_then(Value::as_str)
        .filter(|link| !link.is_empty())
}

/// Add `incoming` to `base`, rejecting a placeholder bound to two different values
///
/// Values are compared ignoring ASCII case since ARM does not preserve the
/// casing of names in ids it returns.
pub fn merge_values(base: &TemplateValues, incoming: TemplateValues) -> Result<TemplateValues> {
    let mut merged = base.clone();

    for (name, value) in incoming {
        if let Some(existing) = merged.get(&name) {
            if !existing.eq_ignore_ascii_case(&value) {
                bail!(
                    "Conflicting values for placeholder '{{{}}}': '{}' and '{}'",
                    name,
                    existing,
                    value
                );
            }
        }
        merged.insert(name, value);
    }

    Ok(merged)
}

fn last_segment(id: &str) -> String {
    id.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(id)
        .to_string()
}
