//! Azure resource-type catalog and tree navigator
//!
//! - [`catalog`] - The embedded forest of ARM resource types and its lookups
//! - [`navigator`] - Walking the catalog, expanding nodes, planning requests
//! - [`config`] - Persisted user configuration
//! - [`commands`] - Subcommand bodies of the `azcatalog` binary

pub mod catalog;
pub mod commands;
pub mod config;
pub mod navigator;
