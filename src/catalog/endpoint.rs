//! URL templates
//!
//! An endpoint pairs a slash-delimited URL template with the API version
//! that must accompany every request built from it. Segments wrapped in
//! braces are placeholders; everything else is literal and kept verbatim.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder values keyed by placeholder name (without braces)
pub type TemplateValues = BTreeMap<String, String>;

/// One path segment of a URL template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

impl<'a> Segment<'a> {
    fn parse(raw: &'a str) -> Self {
        match raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) if !name.is_empty() && !name.contains(['{', '}']) => {
                Segment::Placeholder(name)
            }
            _ => Segment::Literal(raw),
        }
    }

    /// Segments line up when literals agree ignoring ASCII case and
    /// placeholders carry the same name.
    fn lines_up_with(&self, other: &Segment<'_>) -> bool {
        match (self, other) {
            (Segment::Literal(a), Segment::Literal(b)) => a.eq_ignore_ascii_case(b),
            (Segment::Placeholder(a), Segment::Placeholder(b)) => a == b,
            _ => false,
        }
    }
}

/// URL template plus API version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointInfo {
    pub template_url: String,
    pub api_version: String,
}

impl EndpointInfo {
    pub fn new(template_url: impl Into<String>, api_version: impl Into<String>) -> Self {
        Self {
            template_url: template_url.into(),
            api_version: api_version.into(),
        }
    }

    /// Template segments in order
    pub fn segments(&self) -> impl Iterator<Item = Segment<'_>> {
        split_path(&self.template_url).map(Segment::parse)
    }

    /// Placeholder names in template order
    pub fn placeholders(&self) -> Vec<&str> {
        self.segments()
            .filter_map(|segment| match segment {
                Segment::Placeholder(name) => Some(name),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Substitute every placeholder, percent-encoding the values
    pub fn build_url(&self, values: &TemplateValues) -> Result<String> {
        let mut url = String::with_capacity(self.template_url.len());

        for segment in self.segments() {
            url.push('/');
            match segment {
                Segment::Literal(text) => url.push_str(text),
                Segment::Placeholder(name) => {
                    let Some(value) = values.get(name) else {
                        bail!(
                            "Missing value for placeholder '{{{}}}' in {}",
                            name,
                            self.template_url
                        );
                    };
                    url.push_str(&urlencoding::encode(value));
                }
            }
        }

        if url.is_empty() {
            url.push('/');
        }

        Ok(url)
    }

    /// Match a path or absolute URL against the whole template
    pub fn match_url(&self, url: &str) -> Option<TemplateValues> {
        match self.match_leading(url)? {
            (values, 0) => Some(values),
            _ => None,
        }
    }

    /// Match the template against the leading segments of a path or URL
    pub fn match_prefix(&self, url: &str) -> Option<TemplateValues> {
        self.match_leading(url).map(|(values, _)| values)
    }

    /// Returns the captured values and the number of unmatched trailing segments
    fn match_leading(&self, url: &str) -> Option<(TemplateValues, usize)> {
        let path = url_path(url);
        let mut actual = split_path(&path);
        let mut values = TemplateValues::new();

        for segment in self.segments() {
            let part = actual.next()?;
            match segment {
                Segment::Literal(text) => {
                    if !text.eq_ignore_ascii_case(part) {
                        return None;
                    }
                }
                Segment::Placeholder(name) => {
                    let value = urlencoding::decode(part)
                        .map(|v| v.into_owned())
                        .unwrap_or_else(|_| part.to_string());
                    values.insert(name.to_string(), value);
                }
            }
        }

        Some((values, actual.count()))
    }

    /// True when this template strictly extends `parent` segment by segment
    pub fn extends(&self, parent: &EndpointInfo) -> bool {
        let own: Vec<_> = self.segments().collect();
        let base: Vec<_> = parent.segments().collect();

        own.len() > base.len() && base.iter().zip(&own).all(|(p, c)| p.lines_up_with(c))
    }

    /// Resource provider namespace, e.g. `Microsoft.Compute`
    ///
    /// Taken from the segment after the last `providers` literal, with the
    /// casing used by the template.
    pub fn provider_namespace(&self) -> Option<&str> {
        let segments: Vec<_> = self.segments().collect();
        let index = segments.iter().rposition(|segment| {
            matches!(segment, Segment::Literal(text) if text.eq_ignore_ascii_case("providers"))
        })?;

        match segments.get(index + 1)? {
            Segment::Literal(namespace) => Some(*namespace),
            Segment::Placeholder(_) => None,
        }
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// Path portion of an absolute URL or a bare path, without query or fragment
fn url_path(url: &str) -> String {
    if url.contains("://") {
        if let Ok(parsed) = url::Url::parse(url) {
            return parsed.path().to_string();
        }
    }

    url.split(['?', '#']).next().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vm_endpoint() -> EndpointInfo {
        EndpointInfo::new(
            "/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.Compute/virtualMachines/{vmName}",
            "2019-07-01",
        )
    }

    fn values(pairs: &[(&str, &str)]) -> TemplateValues {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_placeholders_in_order() {
        assert_eq!(
            vm_endpoint().placeholders(),
            vec!["subscriptionId", "resourceGroupName", "vmName"]
        );
    }

    #[test]
    fn test_build_url_substitutes_values() {
        let url = vm_endpoint()
            .build_url(&values(&[
                ("subscriptionId", "sub-1"),
                ("resourceGroupName", "rg"),
                ("vmName", "web 01"),
            ]))
            .unwrap();

        assert_eq!(
            url,
            "/subscriptions/sub-1/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines/web%2001"
        );
    }

    #[test]
    fn test_build_url_reports_missing_placeholder() {
        let err = vm_endpoint()
            .build_url(&values(&[("subscriptionId", "sub-1")]))
            .unwrap_err();

        assert!(err.to_string().contains("{resourceGroupName}"));
    }

    #[test]
    fn test_match_url_ignores_case_query_and_host() {
        let matched = vm_endpoint()
            .match_url("https://management.azure.com/subscriptions/sub-1/resourcegroups/RG/providers/microsoft.compute/virtualmachines/vm1?api-version=2019-07-01")
            .unwrap();

        assert_eq!(matched["subscriptionId"], "sub-1");
        assert_eq!(matched["resourceGroupName"], "RG");
        assert_eq!(matched["vmName"], "vm1");
    }

    #[test]
    fn test_match_url_rejects_longer_path() {
        let url = "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines/vm1/extensions";
        assert!(vm_endpoint().match_url(url).is_none());
        assert!(vm_endpoint().match_prefix(url).is_some());
    }

    #[test]
    fn test_extends_requires_strictly_longer_template() {
        let parent = EndpointInfo::new(
            "/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.Compute/virtualMachines",
            "2019-07-01",
        );

        assert!(vm_endpoint().extends(&parent));
        assert!(!parent.extends(&vm_endpoint()));
        assert!(!parent.extends(&parent));
    }

    #[test]
    fn test_provider_namespace_keeps_casing() {
        let endpoint = EndpointInfo::new(
            "/subscriptions/{subscriptionId}/providers/microsoft.insights/logprofiles",
            "2016-03-01",
        );

        assert_eq!(endpoint.provider_namespace(), Some("microsoft.insights"));
        assert_eq!(vm_endpoint().provider_namespace(), Some("Microsoft.Compute"));
    }

    #[test]
    fn test_malformed_braces_stay_literal() {
        let endpoint = EndpointInfo::new("/things/{a}{b}/{}", "2020-01-01");
        assert!(endpoint.placeholders().is_empty());
    }
}
