//! Page windows over an ordered collection.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Portion of the ordered collection a fetch result covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Window {
    /// The whole collection was fetched in one page.
    Full,
    /// A contiguous page of `length` rows beginning at offset `start`.
    Partial {
        /// Zero-based offset of the first row.
        start: usize,
        /// Number of rows requested.
        length: usize,
    },
}

impl Window {
    /// Shorthand for [`Window::Partial`].
    #[must_use]
    pub const fn partial(start: usize, length: usize) -> Self {
        Self::Partial { start, length }
    }

    /// Resolve the window against a collection of `len` slots, clamping out-of-range bounds.
    #[must_use]
    pub const fn resolve(self, len: usize) -> Span {
        match self {
            Self::Full => Span {
                start: 0,
                end: len,
                clamped: false,
            },
            Self::Partial { start, length } => {
                let requested_end = start.saturating_add(length);
                let start_clamped = if start < len { start } else { len };
                let end = if requested_end < len {
                    requested_end
                } else {
                    len
                };
                Span {
                    start: start_clamped,
                    end,
                    clamped: end != requested_end,
                }
            }
        }
    }
}

/// Half-open slot range produced by resolving a [`Window`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    /// First slot covered.
    pub start: usize,
    /// One past the last slot covered.
    pub end: usize,
    /// The requested window reached past the end of the collection.
    pub clamped: bool,
}

impl Span {
    /// Number of slots covered.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span covers no slots.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// The span as a slice range.
    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}
