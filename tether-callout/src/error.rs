//! Configuration errors surfaced to callers

use thiserror::Error;

/// Errors raised while building a callout.
///
/// Runtime anomalies (anchor gone, repeated dismiss, stale layout signals)
/// never show up here; the controller absorbs them as no-ops.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalloutError {
    #[error("either text content or a custom content view must be provided")]
    MissingContent,
    #[error("host context has already been torn down")]
    ContextGone,
    #[error("gravity must be one of center, start, end, top or bottom (got '{0}')")]
    InvalidGravity(String),
    #[error("highlight shape must be oval or rectangle (got '{0}')")]
    InvalidHighlightShape(String),
    #[error("arrow direction must be left, top, right or bottom (got '{0}')")]
    InvalidArrowDirection(String),
    #[error("{field} must be a finite, non-negative number (got {value})")]
    InvalidDimension { field: &'static str, value: f32 },
}
