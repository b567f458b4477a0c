//! Resource-type catalog
//!
//! This module provides the data-driven description of Azure Resource
//! Manager resource types. Definitions are loaded from JSON files embedded
//! at compile time, so new resource types are added by regenerating data
//! rather than changing code.
//!
//! # Architecture
//!
//! - [`endpoint`] - URL templates: placeholders, building and matching URLs
//! - [`api_version`] - Parsing and ranking `api-version` strings
//! - [`resource_type`] - The catalog node and its verbs/operations
//! - [`registry`] - Embedded catalog, external catalog files, lookups
//! - [`validate`] - Structural checks over a whole catalog
//!
//! # Example
//!
//! ```
//! use azcatalog::catalog::get_catalog;
//!
//! let catalog = get_catalog();
//! let (rt, values) = catalog
//!     .find_by_url("/providers/Microsoft.ADHybridHealthService/addsservices/contoso")
//!     .unwrap();
//! assert_eq!(rt.display, "{serviceName}");
//! assert_eq!(values["serviceName"], "contoso");
//! ```

pub mod api_version;
pub mod endpoint;
pub mod registry;
pub mod resource_type;
pub mod validate;

pub use api_version::{pick_preferred, ApiVersion};
pub use endpoint::{EndpointInfo, Segment, TemplateValues};
pub use registry::{embedded, get_catalog, load, Axis, Catalog, CatalogPath, Visit, Walk};
pub use resource_type::{Operation, ResourceType, Verb};
pub use validate::{check_template, validate, Rule, Violation};
