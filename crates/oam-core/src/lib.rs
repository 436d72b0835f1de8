//! oam-core: Shared asset types, configuration, and error handling for the OAM analysis tools.
//!
//! This crate provides the foundational types used across all OAM components:
//! - Asset kinds (FQDN, IPAddress, Netblock, etc.) as stored by the discovery engine
//! - Asset records and relations with their store identifiers and timestamps
//! - Root-domain scope matching
//! - Configuration management
//! - Common error types

pub mod config;
pub mod error;
pub mod scope;
pub mod types;

pub use error::OamError;
pub use types::{Asset, AssetId, AssetKind, AssetRecord, Relation, RelationId};
