//! OAM Graph — query facade for the discovery asset graph.
//!
//! The analysis engines only ever read the graph through the [`GraphQuery`]
//! trait. This crate defines that trait and ships [`MemoryGraph`], an
//! in-memory reference store loaded from a JSON snapshot, which the
//! command-line tools and the test suites query.

pub mod client;
pub mod mutations;
pub mod queries;
pub mod snapshot;

pub use client::{GraphConfig, MemoryGraph, StoreError};
pub use queries::GraphQuery;
pub use snapshot::Snapshot;
