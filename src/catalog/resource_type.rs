//! Resource type descriptors
//!
//! A [`ResourceType`] is one node of the catalog forest: a label, the
//! endpoints for each supported operation and two ordered lists of nested
//! types. `children` are reachable from the parent's values alone;
//! `sub_resources` are discovered from the parent's list response.

use super::endpoint::EndpointInfo;
use anyhow::{bail, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// HTTP verb used for an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
        }
    }
}

impl FromStr for Verb {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Verb::Get),
            "POST" => Ok(Verb::Post),
            "PUT" => Ok(Verb::Put),
            "PATCH" => Ok(Verb::Patch),
            "DELETE" => Ok(Verb::Delete),
            _ => bail!("Unknown HTTP verb: {}", s),
        }
    }
}

impl TryFrom<String> for Verb {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Verb> for String {
    fn from(verb: Verb) -> Self {
        verb.as_str().to_string()
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical operation on a resource, mapped to one of its endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    Delete,
    Patch,
    Put,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Read,
        Operation::Delete,
        Operation::Patch,
        Operation::Put,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::Delete => "delete",
            Operation::Patch => "patch",
            Operation::Put => "put",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceType {
    pub display: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<EndpointInfo>,
    /// Overrides GET for reads, e.g. POST for `.../config/appsettings/list`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verb: Option<Verb>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_endpoint: Option<EndpointInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch_endpoint: Option<EndpointInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put_endpoint: Option<EndpointInfo>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub children: Vec<ResourceType>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub sub_resources: Vec<ResourceType>,
}

impl ResourceType {
    /// Read-only node with no descendants
    pub fn new(display: impl Into<String>, endpoint: EndpointInfo) -> Self {
        Self {
            display: display.into(),
            endpoint: Some(endpoint),
            verb: None,
            delete_endpoint: None,
            patch_endpoint: None,
            put_endpoint: None,
            children: Vec::new(),
            sub_resources: Vec::new(),
        }
    }

    /// Verb used for reads (GET unless overridden)
    pub fn read_verb(&self) -> Verb {
        self.verb.unwrap_or(Verb::Get)
    }

    pub fn endpoint_for(&self, operation: Operation) -> Option<&EndpointInfo> {
        match operation {
            Operation::Read => self.endpoint.as_ref(),
            Operation::Delete => self.delete_endpoint.as_ref(),
            Operation::Patch => self.patch_endpoint.as_ref(),
            Operation::Put => self.put_endpoint.as_ref(),
        }
    }

    /// Operations with an endpoint, in [`Operation::ALL`] order
    pub fn supported_operations(&self) -> Vec<Operation> {
        Operation::ALL
            .into_iter()
            .filter(|op| self.endpoint_for(*op).is_some())
            .collect()
    }

    /// All populated endpoints with the operation they serve
    pub fn endpoints(&self) -> impl Iterator<Item = (Operation, &EndpointInfo)> {
        Operation::ALL
            .into_iter()
            .filter_map(move |op| self.endpoint_for(op).map(|endpoint| (op, endpoint)))
    }

    /// The read endpoint, falling back to the first write endpoint
    pub fn primary_endpoint(&self) -> Option<&EndpointInfo> {
        self.endpoints().next().map(|(_, endpoint)| endpoint)
    }

    pub fn is_read_only(&self) -> bool {
        self.delete_endpoint.is_none()
            && self.patch_endpoint.is_none()
            && self.put_endpoint.is_none()
    }

    /// Label stands for an instance name, e.g. `{serverName}`
    pub fn is_placeholder(&self) -> bool {
        self.display.starts_with('{') && self.display.ends_with('}')
    }

    pub fn has_descendants(&self) -> bool {
        !self.children.is_empty() || !self.sub_resources.is_empty()
    }

    /// Placeholder names used by any of this node's endpoints, deduplicated
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for (_, endpoint) in self.endpoints() {
            for name in endpoint.placeholders() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }
}

/// Absent, `null` and `[]` all load as an empty list
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}
