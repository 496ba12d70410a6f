//! Error types.
//!
//! Graph mutations never fail: invalid input is ignored and reported through
//! return values. These errors cover structural validation and settings I/O.

use crate::ids::{SegmentId, SnapPointId};
use thiserror::Error;

/// A violation of the attachment graph invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("{point} links to {partner}, which links to {partner_link:?}")]
    AsymmetricLink {
        point: SnapPointId,
        partner: SnapPointId,
        partner_link: Option<SnapPointId>,
    },
    #[error("{point} and {partner} both belong to {segment}")]
    SelfSegmentLink {
        point: SnapPointId,
        partner: SnapPointId,
        segment: SegmentId,
    },
    #[error("{point} links to missing point {partner}")]
    DanglingLink {
        point: SnapPointId,
        partner: SnapPointId,
    },
    #[error("{point} is not claimed by its owner {owner}")]
    UnownedPoint {
        point: SnapPointId,
        owner: SegmentId,
    },
}

/// Settings loading errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid settings: {0}")]
    Parse(#[from] serde_json::Error),
}
