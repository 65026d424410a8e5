#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]
//! Client-side caches for server-side paginated collections.
//!
//! Layout:
//! - `async_state.rs`: `{updating, error, data}` wrapper shared by every cache
//! - `identity.rs`: identifiers and slot values
//! - `window.rs`: page windows and clamping
//! - `policy.rs`: serde-backed cache policy and its validation errors
//! - `ordered.rs`: total-indexed cache with placeholders, GC and invalidation
//! - `append.rs`: newest-first feed cache with dedup
//! - `plan.rs`: fetch planning over placeholders and dirty rows

pub mod append;
pub mod async_state;
pub mod identity;
pub mod ordered;
mod plan;
pub mod policy;
pub mod window;

pub use append::{AppendOnlyCollectionCache, AppendState, ListPage};
pub use async_state::AsyncState;
pub use identity::{Identifier, Slot};
pub use ordered::{OrderedCollectionCache, OrderedState, Page};
pub use policy::{CachePolicy, GcPolicy, PolicyError};
pub use window::{Span, Window};
