//! Error types for the oam-analysis crate.

use oam_core::AssetKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Store error: {0}")]
    Store(#[from] oam_graph::StoreError),

    #[error("Unexpected asset type: expected {expected}, found {found}")]
    TypeMismatch {
        expected: AssetKind,
        found: AssetKind,
    },

    #[error("No root domain names were provided")]
    EmptyScope,
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
