//! Structural checks over a whole catalog
//!
//! Loading never rejects a catalog for shape problems; these checks report
//! them instead so generated data can be verified as a build step.

use super::api_version::ApiVersion;
use super::registry::{Axis, Catalog};
use super::resource_type::ResourceType;
use anyhow::{bail, Result};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rule {
    /// `{`/`}` pairs enclose a non-empty identifier with no nesting and
    /// fill a whole path segment
    PlaceholderBalance,
    /// At least one of read, delete, patch or put is populated
    NoEndpoint,
    /// A descendant's template strictly extends its parent's
    PathExtension,
    /// Children are built from the parent's values alone
    ChildPlaceholder,
    /// `YYYY-MM-DD` or `YYYY-MM-DD-preview`
    ApiVersionFormat,
}

impl Rule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::PlaceholderBalance => "placeholder-balance",
            Rule::NoEndpoint => "no-endpoint",
            Rule::PathExtension => "path-extension",
            Rule::ChildPlaceholder => "child-placeholder",
            Rule::ApiVersionFormat => "api-version-format",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub rule: Rule,
    /// Display labels from the root down to the offending node
    pub path: Vec<String>,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.rule, self.path.join(" > "), self.message)
    }
}

/// Check every node of the catalog
pub fn validate(catalog: &Catalog) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut path = Vec::new();

    for rt in catalog.resource_types() {
        check_node(rt, None, &mut path, &mut violations);
    }

    tracing::debug!("Validated catalog: {} violation(s)", violations.len());
    violations
}

fn check_node(
    rt: &ResourceType,
    parent: Option<(&ResourceType, Axis)>,
    path: &mut Vec<String>,
    out: &mut Vec<Violation>,
) {
    path.push(rt.display.clone());
    let mut report = |rule: Rule, message: String| {
        out.push(Violation {
            rule,
            path: path.clone(),
            message,
        })
    };

    if rt.primary_endpoint().is_none() {
        report(Rule::NoEndpoint, "no endpoint for any operation".to_string());
    }

    for (operation, endpoint) in rt.endpoints() {
        if let Err(e) = check_template(&endpoint.template_url) {
            report(Rule::PlaceholderBalance, format!("{} endpoint: {}", operation, e));
        }
        if let Err(e) = ApiVersion::parse(&endpoint.api_version) {
            report(Rule::ApiVersionFormat, format!("{} endpoint: {}", operation, e));
        }
    }

    if let Some((parent, axis)) = parent {
        if let (Some(base), Some(own)) = (parent.primary_endpoint(), rt.primary_endpoint()) {
            if !own.extends(base) {
                report(
                    Rule::PathExtension,
                    format!("{} does not extend {}", own.template_url, base.template_url),
                );
            }

            if axis == Axis::Child {
                let inherited = base.placeholders();
                let introduced: Vec<_> = own
                    .placeholders()
                    .into_iter()
                    .filter(|name| !inherited.contains(name))
                    .collect();
                if !introduced.is_empty() {
                    report(
                        Rule::ChildPlaceholder,
                        format!("child introduces placeholder(s) {}", introduced.join(", ")),
                    );
                }
            }
        }
    }

    for child in &rt.children {
        check_node(child, Some((rt, Axis::Child)), path, out);
    }
    for sub in &rt.sub_resources {
        check_node(sub, Some((rt, Axis::SubResource)), path, out);
    }

    path.pop();
}

/// Check brace balance, placeholder names and placeholder placement in one template
pub fn check_template(template: &str) -> Result<()> {
    let mut open: Option<usize> = None;

    for (offset, ch) in template.char_indices() {
        match ch {
            '{' => {
                if open.is_some() {
                    bail!("nested '{{' at offset {}", offset);
                }
                open = Some(offset);
            }
            '}' => {
                let Some(start) = open.take() else {
                    bail!("unmatched '}}' at offset {}", offset);
                };
                let name = &template[start + 1..offset];
                if name.is_empty() {
                    bail!("empty placeholder at offset {}", start);
                }
                if !name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
                {
                    bail!("placeholder '{{{}}}' is not an identifier", name);
                }
                let fills_segment = (start == 0 || template[..start].ends_with('/'))
                    && matches!(template[offset + 1..].chars().next(), None | Some('/'));
                if !fills_segment {
                    bail!("placeholder '{{{}}}' does not fill a whole path segment", name);
                }
            }
            _ => {}
        }
    }

    if let Some(start) = open {
        bail!("unclosed '{{' at offset {}", start);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{get_catalog, EndpointInfo};

    fn node(display: &str, template: &str) -> ResourceType {
        ResourceType::new(display, EndpointInfo::new(template, "2020-01-01"))
    }

    fn rules(catalog: &Catalog) -> Vec<Rule> {
        validate(catalog).into_iter().map(|v| v.rule).collect()
    }

    #[test]
    fn test_embedded_catalog_is_clean() {
        let violations = validate(get_catalog());
        assert!(violations.is_empty(), "unexpected violations: {:?}", violations);
    }

    #[test]
    fn test_check_template() {
        assert!(check_template("/subscriptions/{subscriptionId}/providers/X").is_ok());
        assert!(check_template("/indexes('{indexName}')").is_err());
        assert!(check_template("/a/{b}.json").is_err());
        assert!(check_template("/a/{b").is_err());
        assert!(check_template("/a/b}").is_err());
        assert!(check_template("/a/{{b}}").is_err());
        assert!(check_template("/a/{}").is_err());
        assert!(check_template("/a/{b c}").is_err());
    }

    #[test]
    fn test_reports_placeholder_inside_segment() {
        let rt = node("docs", "/indexes('{indexName}')/docs");
        assert!(rt.placeholders().is_empty());
        let catalog = Catalog {
            suppress_api_version: false,
            resource_types: vec![rt],
        };

        let violations = validate(&catalog);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, Rule::PlaceholderBalance);
        assert!(violations[0].message.contains("{indexName}"));
    }

    #[test]
    fn test_reports_unbalanced_template_and_bad_version() {
        let mut rt = node("broken", "/providers/X/things/{name");
        rt.endpoint.as_mut().unwrap().api_version = "latest".to_string();
        let catalog = Catalog {
            suppress_api_version: false,
            resource_types: vec![rt],
        };

        assert_eq!(
            rules(&catalog),
            vec![Rule::PlaceholderBalance, Rule::ApiVersionFormat]
        );
    }

    #[test]
    fn test_reports_inert_node() {
        let mut rt = node("inert", "/x");
        rt.endpoint = None;
        let catalog = Catalog {
            suppress_api_version: false,
            resource_types: vec![rt],
        };

        assert_eq!(rules(&catalog), vec![Rule::NoEndpoint]);
    }

    #[test]
    fn test_reports_child_not_extending_parent() {
        let mut parent = node("servers", "/providers/X/servers");
        parent.children.push(node("elsewhere", "/providers/Y/servers/usage"));
        let catalog = Catalog {
            suppress_api_version: false,
            resource_types: vec![parent],
        };

        let violations = validate(&catalog);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, Rule::PathExtension);
        assert_eq!(violations[0].path, vec!["servers", "elsewhere"]);
    }

    #[test]
    fn test_child_may_not_add_placeholder_but_sub_resource_may() {
        let mut parent = node("servers", "/providers/X/servers");
        parent.children.push(node("{serverName}", "/providers/X/servers/{serverName}"));
        parent.sub_resources.push(node("{serverName}", "/providers/X/servers/{serverName}"));
        let catalog = Catalog {
            suppress_api_version: false,
            resource_types: vec![parent],
        };

        assert_eq!(rules(&catalog), vec![Rule::ChildPlaceholder]);
    }

    #[test]
    fn test_violation_display() {
        let violation = Violation {
            rule: Rule::NoEndpoint,
            path: vec!["a".to_string(), "b".to_string()],
            message: "no endpoint for any operation".to_string(),
        };
        assert_eq!(violation.to_string(), "[no-endpoint] a > b: no endpoint for any operation");
    }
}
