//! Catalog Registry - Load resource types from JSON
//!
//! The default catalog is compiled into the binary from the files under
//! `src/resources/`. A catalog file can also be loaded from disk (JSON or
//! YAML) to replace it.

use super::endpoint::TemplateValues;
use super::resource_type::{null_as_empty, ResourceType};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, OnceLock};

/// Embedded catalog files, merged in this order
const CATALOG_FILES: &[&str] = &[
    include_str!("../resources/hybrid_health.json"),
    include_str!("../resources/compute.json"),
    include_str!("../resources/monitor.json"),
    include_str!("../resources/sql.json"),
    include_str!("../resources/storage.json"),
    include_str!("../resources/web.json"),
];

/// Root structure of a catalog file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Omit the `api-version` query parameter when planning requests
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub suppress_api_version: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub resource_types: Vec<ResourceType>,
}

/// Which list a node was reached through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Root,
    Child,
    SubResource,
}

/// One step of a depth-first walk
#[derive(Debug, Clone, Copy)]
pub struct Visit<'a> {
    pub depth: usize,
    pub axis: Axis,
    pub parent: Option<&'a ResourceType>,
    pub resource_type: &'a ResourceType,
}

/// Pre-order walk: a node, then its children, then its sub-resources
pub struct Walk<'a> {
    stack: Vec<Visit<'a>>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = Visit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let visit = self.stack.pop()?;
        let rt = visit.resource_type;

        let nested: Vec<Visit<'a>> = rt
            .children
            .iter()
            .map(|child| (Axis::Child, child))
            .chain(rt.sub_resources.iter().map(|sub| (Axis::SubResource, sub)))
            .map(|(axis, resource_type)| Visit {
                depth: visit.depth + 1,
                axis,
                parent: Some(rt),
                resource_type,
            })
            .collect();
        self.stack.extend(nested.into_iter().rev());

        Some(visit)
    }
}

/// Chain of resource types from a root down to the type matching a URL
#[derive(Debug, Clone)]
pub struct CatalogPath<'a> {
    pub steps: Vec<(Axis, &'a ResourceType)>,
    pub values: TemplateValues,
}

impl<'a> CatalogPath<'a> {
    /// The matched (deepest) resource type
    pub fn target(&self) -> Option<&'a ResourceType> {
        self.steps.last().map(|(_, rt)| *rt)
    }
}

impl Catalog {
    /// Parse a catalog from JSON text
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse catalog JSON")
    }

    /// Parse a catalog from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse catalog YAML")
    }

    /// Load a catalog file; `.yaml`/`.yml` are read as YAML, anything else as JSON
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog {}", path.display()))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let catalog = match extension.as_deref() {
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            _ => Self::from_json(&content),
        }
        .with_context(|| format!("Invalid catalog {}", path.display()))?;

        tracing::info!(
            "Loaded catalog {} ({} top-level resource types)",
            path.display(),
            catalog.resource_types.len()
        );

        Ok(catalog)
    }

    /// Append another catalog's resource types after this one's
    pub fn merge(&mut self, other: Catalog) {
        self.suppress_api_version |= other.suppress_api_version;
        self.resource_types.extend(other.resource_types);
    }

    /// Top-level resource types in generator order
    pub fn resource_types(&self) -> &[ResourceType] {
        &self.resource_types
    }

    pub fn walk(&self) -> Walk<'_> {
        let roots = self.resource_types.iter().rev().map(|resource_type| Visit {
            depth: 0,
            axis: Axis::Root,
            parent: None,
            resource_type,
        });

        Walk {
            stack: roots.collect(),
        }
    }

    /// Total number of resource types at every depth
    pub fn len(&self) -> usize {
        self.walk().count()
    }

    pub fn is_empty(&self) -> bool {
        self.resource_types.is_empty()
    }

    /// Find the chain of types leading to the one whose read endpoint matches `url`
    ///
    /// Subtrees whose endpoint is not a prefix of the URL are skipped. The
    /// first full match in catalog order wins.
    pub fn path_for_url(&self, url: &str) -> Option<CatalogPath<'_>> {
        let mut steps = Vec::new();
        let values = search(&self.resource_types, Axis::Root, url, &mut steps)?;
        Some(CatalogPath { steps, values })
    }

    /// The resource type matching `url` and the values captured from it
    pub fn find_by_url(&self, url: &str) -> Option<(&ResourceType, TemplateValues)> {
        let path = self.path_for_url(url)?;
        let target = path.target()?;
        Some((target, path.values))
    }

    /// Follow display labels from the roots, e.g. `["addsservices", "premiumCheck"]`
    ///
    /// Each step looks through children first, then sub-resources.
    pub fn find_by_display_path(&self, labels: &[&str]) -> Option<&ResourceType> {
        let (first, rest) = labels.split_first()?;
        let mut current = self.resource_types.iter().find(|rt| rt.display == *first)?;

        for label in rest {
            current = current
                .children
                .iter()
                .chain(current.sub_resources.iter())
                .find(|rt| rt.display == *label)?;
        }

        Some(current)
    }
}

fn search<'a>(
    types: &'a [ResourceType],
    axis: Axis,
    url: &str,
    steps: &mut Vec<(Axis, &'a ResourceType)>,
) -> Option<TemplateValues> {
    for rt in types {
        if let Some(endpoint) = rt.endpoint.as_ref() {
            if endpoint.match_prefix(url).is_none() {
                continue;
            }
            if let Some(values) = endpoint.match_url(url) {
                steps.push((axis, rt));
                return Some(values);
            }
        }

        steps.push((axis, rt));
        let found = search(&rt.children, Axis::Child, url, steps)
            .or_else(|| search(&rt.sub_resources, Axis::SubResource, url, steps));
        if found.is_some() {
            return found;
        }
        steps.pop();
    }

    None
}

/// Build a fresh catalog from the embedded files
///
/// Deterministic: every call returns a deep-equal catalog.
pub fn embedded() -> Catalog {
    let mut catalog = Catalog::default();

    for content in CATALOG_FILES {
        let partial: Catalog = serde_json::from_str(content)
            .unwrap_or_else(|e| panic!("Failed to parse embedded catalog JSON: {}", e));
        catalog.merge(partial);
    }

    catalog
}

/// Global catalog built from the embedded files
static CATALOG: OnceLock<Catalog> = OnceLock::new();

/// Get the shared embedded catalog (built on first access)
pub fn get_catalog() -> &'static Catalog {
    CATALOG.get_or_init(|| {
        let catalog = embedded();
        tracing::debug!(
            "Embedded catalog ready: {} top-level, {} total resource types",
            catalog.resource_types.len(),
            catalog.len()
        );
        catalog
    })
}

/// Load the catalog from `path`, or the embedded one when no path is given
pub fn load(path: Option<&Path>) -> Result<Arc<Catalog>> {
    match path {
        Some(path) => Catalog::from_path(path).map(Arc::new),
        None => Ok(Arc::new(embedded())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_loads_successfully() {
        let catalog = get_catalog();
        assert!(!catalog.is_empty(), "Catalog should have resource types");
        assert!(catalog.len() > catalog.resource_types().len());
    }

    #[test]
    fn test_embedded_keeps_file_order() {
        let catalog = embedded();
        assert_eq!(catalog.resource_types()[0].display, "addsservices");
        assert_eq!(catalog.resource_types()[1].display, "services");
    }

    #[test]
    fn test_walk_is_pre_order_children_first() {
        let catalog = get_catalog();
        let visits: Vec<_> = catalog.walk().take(3).collect();

        assert_eq!(visits[0].resource_type.display, "addsservices");
        assert_eq!(visits[0].axis, Axis::Root);
        assert_eq!(visits[1].resource_type.display, "premiumCheck");
        assert_eq!(visits[1].axis, Axis::Child);
        assert_eq!(visits[1].depth, 1);
        assert_eq!(visits[2].resource_type.display, "{serviceName}");
        assert_eq!(visits[2].axis, Axis::SubResource);
    }

    #[test]
    fn test_find_by_url_resolves_deep_instance() {
        let catalog = get_catalog();
        let (rt, values) = catalog
            .find_by_url("/subscriptions/sub-1/resourceGroups/rg/providers/Microsoft.Sql/servers/srv/databases/db1")
            .expect("database URL should resolve");

        assert_eq!(rt.display, "{databaseName}");
        assert_eq!(values["serverName"], "srv");
        assert_eq!(values["databaseName"], "db1");
    }

    #[test]
    fn test_path_for_url_reports_axes() {
        let catalog = get_catalog();
        let path = catalog
            .path_for_url("/providers/Microsoft.ADHybridHealthService/addsservices/contoso/alerts")
            .unwrap();

        let labels: Vec<_> = path
            .steps
            .iter()
            .map(|(axis, rt)| (*axis, rt.display.as_str()))
            .collect();
        assert_eq!(
            labels,
            vec![
                (Axis::Root, "addsservices"),
                (Axis::SubResource, "{serviceName}"),
                (Axis::Child, "alerts"),
            ]
        );
        assert_eq!(path.values["serviceName"], "contoso");
    }

    #[test]
    fn test_find_by_url_unknown() {
        assert!(get_catalog().find_by_url("/providers/Microsoft.Nope/widgets").is_none());
    }

    #[test]
    fn test_find_by_display_path() {
        let rt = get_catalog()
            .find_by_display_path(&["addsservices", "{serviceName}", "forestsummary"])
            .unwrap();
        assert_eq!(
            rt.endpoint.as_ref().unwrap().template_url,
            "/providers/Microsoft.ADHybridHealthService/addsservices/{serviceName}/forestsummary"
        );
        assert!(get_catalog().find_by_display_path(&[]).is_none());
    }

    #[test]
    fn test_yaml_catalog_with_null_descendants() {
        let yaml = r#"
suppress_api_version: true
resource_types:
  - display: things
    endpoint:
      template_url: /providers/Microsoft.Test/things
      api_version: "2020-01-01"
    children: ~
"#;
        let catalog = Catalog::from_yaml(yaml).unwrap();
        assert!(catalog.suppress_api_version);
        assert!(catalog.resource_types[0].children.is_empty());
        assert!(catalog.resource_types[0].sub_resources.is_empty());
    }
}
