//! Subcommand bodies for the `azcatalog` binary
//!
//! Every command renders into a `String`; the binary parses arguments, sets
//! up logging, touches the config file and prints.

use crate::catalog::{
    pick_preferred, validate, ApiVersion, Axis, Catalog, Operation, ResourceType, TemplateValues,
};
use crate::config::Config;
use crate::navigator::{self, next_link, Navigator};
use anyhow::{bail, Context, Result};
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;
use std::path::Path;

/// Values known before navigation: CLI > config > environment
pub fn seed_values(
    subscription: Option<String>,
    resource_group: Option<String>,
    config: &Config,
) -> TemplateValues {
    let mut seed = TemplateValues::new();

    if let Some(subscription) = subscription
        .filter(|s| !s.is_empty())
        .or_else(|| config.effective_subscription())
    {
        seed.insert("subscriptionId".to_string(), subscription);
    }
    if let Some(group) = resource_group.filter(|g| !g.is_empty()) {
        seed.insert("resourceGroupName".to_string(), group);
    }

    seed
}

/// Verbs a node supports, read verb first
pub fn verbs_label(rt: &ResourceType) -> String {
    rt.endpoints()
        .map(|(op, _)| match op {
            Operation::Read => rt.read_verb().as_str(),
            Operation::Delete => "DELETE",
            Operation::Patch => "PATCH",
            Operation::Put => "PUT",
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// The forest, indented; with `filter`, matching nodes with their breadcrumb
pub fn render_tree(
    catalog: &Catalog,
    depth: Option<usize>,
    filter: Option<&str>,
) -> Result<String> {
    let filter = filter.map(str::to_lowercase);
    let mut out = String::new();
    let mut path: Vec<&str> = Vec::new();

    for visit in catalog.walk() {
        let rt = visit.resource_type;
        path.truncate(visit.depth);
        path.push(&rt.display);

        if depth.is_some_and(|max| visit.depth > max) {
            continue;
        }

        let (template, api_version) = rt
            .primary_endpoint()
            .map(|e| (e.template_url.as_str(), e.api_version.as_str()))
            .unwrap_or(("-", "-"));

        match &filter {
            Some(needle) => {
                let hit = rt.display.to_lowercase().contains(needle)
                    || template.to_lowercase().contains(needle);
                if hit {
                    writeln!(out, "{}  [{}] {}", path.join(" > "), verbs_label(rt), template)?;
                }
            }
            None => {
                let marker = match visit.axis {
                    Axis::Root => "",
                    Axis::Child => "- ",
                    Axis::SubResource => "* ",
                };
                writeln!(
                    out,
                    "{}{}{}  [{}] {}",
                    "  ".repeat(visit.depth),
                    marker,
                    rt.display,
                    verbs_label(rt),
                    api_version
                )?;
            }
        }
    }

    Ok(out)
}

/// Summary line for a clean catalog; an error listing every violation otherwise
pub fn run_validate(catalog: &Catalog) -> Result<String> {
    let violations = validate(catalog);

    if !violations.is_empty() {
        let listing: Vec<String> = violations.iter().map(ToString::to_string).collect();
        bail!(
            "{}\n{} violation(s) found",
            listing.join("\n"),
            violations.len()
        );
    }

    Ok(format!("Catalog OK: {} resource types\n", catalog.len()))
}

pub fn run_find(catalog: &Catalog, url: &str, as_json: bool) -> Result<String> {
    let path = catalog
        .path_for_url(url)
        .with_context(|| format!("No resource type matches {}", url))?;

    if as_json {
        let steps: Vec<Value> = path
            .steps
            .iter()
            .map(|(axis, rt)| {
                json!({
                    "axis": axis,
                    "display": rt.display,
                    "template_url": rt.endpoint.as_ref().map(|e| &e.template_url),
                    "api_version": rt.endpoint.as_ref().map(|e| &e.api_version),
                    "verbs": verbs_label(rt),
                })
            })
            .collect();
        let output = json!({ "steps": steps, "values": path.values });
        return Ok(serde_json::to_string_pretty(&output)? + "\n");
    }

    let mut out = String::new();
    for (depth, (axis, rt)) in path.steps.iter().enumerate() {
        writeln!(out, "{}{} ({:?})", "  ".repeat(depth), rt.display, axis)?;
    }
    if let Some(target) = path.target() {
        if let Some(endpoint) = target.primary_endpoint() {
            writeln!(out, "template: {}", endpoint.template_url)?;
            writeln!(out, "api-version: {}", endpoint.api_version)?;
        }
        writeln!(out, "verbs: {}", verbs_label(target))?;
    }
    for (name, value) in &path.values {
        writeln!(out, "{{{}}} = {}", name, value)?;
    }

    Ok(out)
}

pub fn read_json(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Expand the node at `url`, or list the top level resolvable from `seed`
pub fn run_expand(
    catalog: &Catalog,
    seed: TemplateValues,
    url: Option<&str>,
    response: Option<&Value>,
    as_json: bool,
    endpoint: &str,
) -> Result<String> {
    let base = navigator::parse_base(endpoint)?;
    let mut navigator = Navigator::new(catalog, seed);

    if let Some(url) = url {
        navigator.navigate_to(url)?;
    }

    let nodes = navigator.expand_current(response)?;
    let request = navigator
        .current()
        .map(|node| node.request(Operation::Read, &base, catalog.suppress_api_version))
        .transpose()?;
    let more = response.and_then(next_link);

    if as_json {
        let request_json = request
            .as_ref()
            .map(|r| json!({ "verb": r.verb, "url": r.url.as_str() }));
        let output = json!({
            "breadcrumb": navigator.breadcrumb(),
            "request": request_json,
            "next_link": more,
            "nodes": nodes,
        });
        return Ok(serde_json::to_string_pretty(&output)? + "\n");
    }

    let mut out = String::new();
    match &request {
        Some(request) => {
            writeln!(out, "{}", navigator.breadcrumb().join(" > "))?;
            writeln!(out, "read: {}", request)?;
        }
        None => writeln!(out, "(top level)")?,
    }
    for node in &nodes {
        writeln!(out, "  {:<40} {}", node.display, node.id)?;
        if let Some(delete_url) = &node.delete_url {
            writeln!(out, "  {:<40} delete: {}", "", delete_url)?;
        }
    }
    if let Some(link) = more {
        writeln!(out, "more results: {}", link)?;
    }

    Ok(out)
}

/// The request `operation` on the node at `url` would send
pub fn run_request(
    catalog: &Catalog,
    seed: TemplateValues,
    url: &str,
    operation: Operation,
    endpoint: &str,
) -> Result<String> {
    let base = navigator::parse_base(endpoint)?;
    let mut navigator = Navigator::new(catalog, seed);
    let node = navigator.navigate_to(url)?;
    let plan = node.request(operation, &base, catalog.suppress_api_version)?;

    Ok(format!("{}\n", plan))
}

/// API versions per provider namespace with the preferred one
pub fn run_versions(catalog: &Catalog, provider: Option<&str>) -> Result<String> {
    let mut by_provider: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

    for visit in catalog.walk() {
        for (_, endpoint) in visit.resource_type.endpoints() {
            let Some(namespace) = endpoint.provider_namespace() else {
                continue;
            };
            if provider.is_some_and(|wanted| !wanted.eq_ignore_ascii_case(namespace)) {
                continue;
            }
            by_provider
                .entry(namespace)
                .or_default()
                .insert(endpoint.api_version.as_str());
        }
    }

    if by_provider.is_empty() {
        bail!(
            "No API versions found{}",
            provider.map(|p| format!(" for {}", p)).unwrap_or_default()
        );
    }

    let mut out = String::new();
    for (namespace, versions) in by_provider {
        let parsed: Vec<ApiVersion> = versions
            .iter()
            .filter_map(|raw| match ApiVersion::parse(raw) {
                Ok(version) => Some(version),
                Err(e) => {
                    tracing::warn!("{}: {}", namespace, e);
                    None
                }
            })
            .collect();
        let preferred = pick_preferred(&parsed)
            .map(ApiVersion::as_str)
            .unwrap_or("-");

        writeln!(out, "{}", namespace)?;
        writeln!(out, "  preferred: {}", preferred)?;
        writeln!(
            out,
            "  all: {}",
            versions.into_iter().collect::<Vec<_>>().join(", ")
        )?;
    }

    Ok(out)
}

/// The config file location and its contents
pub fn render_config(config: &Config) -> Result<String> {
    let mut out = String::new();
    if let Some(path) = Config::config_path() {
        writeln!(out, "# {}", path.display())?;
    }
    writeln!(out, "{}", serde_json::to_string_pretty(config)?)?;
    Ok(out)
}
