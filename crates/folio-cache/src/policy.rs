//! Cache policy documents and validation.
//!
//! # Design
//! - Every field has a default so an empty document is a valid policy.
//! - Documents are validated after parsing; unknown fields are rejected.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of rows requested per planned fetch.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Structured errors raised while loading a cache policy.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The policy document was not valid JSON or had the wrong shape.
    #[error("failed to parse cache policy")]
    Parse {
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
    /// A field held a value outside its allowed range.
    #[error("invalid value for '{field}': {message}")]
    InvalidField {
        /// Field that failed validation.
        field: &'static str,
        /// Human-readable error description.
        message: String,
    },
}

/// When unreferenced items are dropped from the item map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GcPolicy {
    /// Collect after every ingest so no orphan survives a transition.
    #[default]
    EveryIngest,
    /// Collect only when the order is rebuilt (shrink reset or full replacement).
    OnReset,
}

/// Tunables for an ordered collection cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CachePolicy {
    /// Garbage-collection strategy for the item map.
    pub gc: GcPolicy,
    /// Maximum rows per window produced by fetch planning.
    pub page_size: usize,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            gc: GcPolicy::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl CachePolicy {
    /// Parse and validate a JSON policy document.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Parse`] for malformed JSON or unknown fields and
    /// [`PolicyError::InvalidField`] when a value fails validation.
    pub fn from_json_str(input: &str) -> Result<Self, PolicyError> {
        let policy: Self =
            serde_json::from_str(input).map_err(|source| PolicyError::Parse { source })?;
        policy.validate()?;
        Ok(policy)
    }

    /// Check field ranges.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidField`] when `page_size` is zero.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.page_size == 0 {
            return Err(PolicyError::InvalidField {
                field: "page_size",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn empty_document_uses_defaults() {
        let policy = CachePolicy::from_json_str("{}").unwrap();
        assert_eq!(policy, CachePolicy::default());
        assert_eq!(policy.gc, GcPolicy::EveryIngest);
        assert_eq!(policy.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn document_overrides_fields() {
        let policy =
            CachePolicy::from_json_str(r#"{"gc": "on_reset", "page_size": 25}"#).unwrap();
        assert_eq!(policy.gc, GcPolicy::OnReset);
        assert_eq!(policy.page_size, 25);
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let err = CachePolicy::from_json_str(r#"{"page_size": 0}"#).unwrap_err();
        assert!(matches!(
            err,
            PolicyError::InvalidField {
                field: "page_size",
                ..
            }
        ));
        assert_eq!(
            err.to_string(),
            "invalid value for 'page_size': must be greater than zero"
        );
    }

    #[test]
    fn unknown_fields_fail_to_parse() {
        let err = CachePolicy::from_json_str(r#"{"ttl": 5}"#).unwrap_err();
        assert_eq!(err.to_string(), "failed to parse cache policy");
        assert!(err.source().is_some());
    }
}
