//! Request planning
//!
//! Turns a node and an operation into the HTTP verb and absolute URL a
//! dispatcher would send. Nothing here performs I/O.

use super::node::TreeNode;
use crate::catalog::{Operation, ResourceType, TemplateValues, Verb};
use anyhow::{Context, Result};
use std::fmt;
use url::Url;

/// Azure Resource Manager endpoint for the public cloud
pub const DEFAULT_MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";

const API_VERSION_PARAM: &str = "api-version";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPlan {
    pub verb: Verb,
    pub url: Url,
}

impl fmt::Display for RequestPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.verb, self.url)
    }
}

/// Plan `operation` against `resource_type` using `values` for its placeholders
pub fn plan(
    resource_type: &ResourceType,
    operation: Operation,
    values: &TemplateValues,
    base: &Url,
    suppress_api_version: bool,
) -> Result<RequestPlan> {
    let Some(endpoint) = resource_type.endpoint_for(operation) else {
        let supported: Vec<_> = resource_type
            .supported_operations()
            .iter()
            .map(Operation::as_str)
            .collect();
        anyhow::bail!(
            "'{}' does not support {} (supported: {})",
            resource_type.display,
            operation,
            supported.join(", ")
        );
    };

    let verb = match operation {
        Operation::Read => resource_type.read_verb(),
        Operation::Delete => Verb::Delete,
        Operation::Patch => Verb::Patch,
        Operation::Put => Verb::Put,
    };

    let path = endpoint.build_url(values)?;
    let mut url = base
        .join(&path)
        .with_context(|| format!("Invalid request path {}", path))?;

    if !suppress_api_version {
        url.query_pairs_mut()
            .append_pair(API_VERSION_PARAM, &endpoint.api_version);
    }

    tracing::debug!("Planned {} {}", verb, url);
    Ok(RequestPlan { verb, url })
}

impl TreeNode<'_> {
    /// Plan `operation` for this node
    pub fn request(
        &self,
        operation: Operation,
        base: &Url,
        suppress_api_version: bool,
    ) -> Result<RequestPlan> {
        plan(
            self.resource_type,
            operation,
            &self.values,
            base,
            suppress_api_version,
        )
    }
}

/// Parse a management endpoint, e.g. from config
pub fn parse_base(endpoint: &str) -> Result<Url> {
    Url::parse(endpoint).with_context(|| format!("Invalid management endpoint '{}'", endpoint))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::EndpointInfo;

    fn base() -> Url {
        parse_base(DEFAULT_MANAGEMENT_ENDPOINT).unwrap()
    }

    fn appsettings() -> ResourceType {
        let site = "/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.Web/sites/{name}";
        let mut rt = ResourceType::new(
            "appsettings",
            EndpointInfo::new(format!("{}/config/appsettings/list", site), "2018-02-01"),
        );
        rt.verb = Some(Verb::Post);
        rt.put_endpoint = Some(EndpointInfo::new(
            format!("{}/config/appsettings", site),
            "2018-02-01",
        ));
        rt
    }

    fn site_values() -> TemplateValues {
        [
            ("subscriptionId", "s1"),
            ("resourceGroupName", "rg"),
            ("name", "shop"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_read_uses_verb_override() {
        let plan = plan(&appsettings(), Operation::Read, &site_values(), &base(), false).unwrap();

        assert_eq!(plan.verb, Verb::Post);
        assert_eq!(
            plan.url.as_str(),
            "https://management.azure.com/subscriptions/s1/resourceGroups/rg/providers/Microsoft.Web/sites/shop/config/appsettings/list?api-version=2018-02-01"
        );
    }

    #[test]
    fn test_put_uses_put_endpoint() {
        let plan = plan(&appsettings(), Operation::Put, &site_values(), &base(), false).unwrap();

        assert_eq!(plan.verb, Verb::Put);
        assert_eq!(plan.url.path(), "/subscriptions/s1/resourceGroups/rg/providers/Microsoft.Web/sites/shop/config/appsettings");
    }

    #[test]
    fn test_unsupported_operation_is_an_error() {
        let err = plan(&appsettings(), Operation::Delete, &site_values(), &base(), false)
            .unwrap_err();
        let message = err.to_string();

        assert!(message.contains("does not support delete"));
        assert!(message.contains("read, put"));
    }

    #[test]
    fn test_suppressed_api_version() {
        let plan = plan(&appsettings(), Operation::Read, &site_values(), &base(), true).unwrap();
        assert!(plan.url.query().is_none());
        assert!(plan.to_string().starts_with("POST https://management.azure.com/"));
    }

    #[test]
    fn test_invalid_base() {
        assert!(parse_base("not a url").is_err());
    }
}
