//! Newest-first feed cache for history and log style collections.

use std::collections::HashSet;
use std::fmt::{self, Debug, Formatter};
use std::hash::Hash;
use std::rc::Rc;

use tracing::trace;

use crate::async_state::AsyncState;
use crate::identity::IdOf;

/// One fetch result for an append-only feed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListPage<T> {
    /// Rows, newest first.
    pub items: Vec<T>,
}

impl<T> ListPage<T> {
    /// Build a list page.
    #[must_use]
    pub const fn new(items: Vec<T>) -> Self {
        Self { items }
    }
}

/// Deduplicated feed rows, newest first.
pub struct AppendState<T> {
    entries: Vec<Rc<T>>,
}

impl<T> AppendState<T> {
    /// Rows in feed order.
    #[must_use]
    pub fn entries(&self) -> &[Rc<T>] {
        &self.entries
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the feed holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for AppendState<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> Clone for AppendState<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<T: PartialEq> PartialEq for AppendState<T> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<T: Debug> Debug for AppendState<T> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AppendState")
            .field("entries", &self.entries)
            .finish()
    }
}

/// Keeps a flat, deduplicated copy of a feed whose first page is always the newest.
pub struct AppendOnlyCollectionCache<K, T> {
    id_of: IdOf<K, T>,
}

impl<K, T> Clone for AppendOnlyCollectionCache<K, T> {
    fn clone(&self) -> Self {
        Self {
            id_of: Rc::clone(&self.id_of),
        }
    }
}

impl<K, T> Debug for AppendOnlyCollectionCache<K, T> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AppendOnlyCollectionCache")
            .finish_non_exhaustive()
    }
}

impl<K, T> AppendOnlyCollectionCache<K, T>
where
    K: Eq + Hash,
{
    /// Cache keyed by `id_of`.
    pub fn new(id_of: impl Fn(&T) -> K + 'static) -> Self {
        Self {
            id_of: Rc::new(id_of),
        }
    }

    fn key(&self, entry: &T) -> K {
        (self.id_of)(entry)
    }

    /// Empty state for a view that is about to issue its first fetch.
    #[must_use]
    pub fn initial_state<E>(&self) -> AsyncState<AppendState<T>, E> {
        AsyncState::pending(AppendState::default())
    }

    /// Mark a fetch as outstanding.
    #[must_use]
    pub fn begin_fetch<E: Clone>(
        &self,
        state: &AsyncState<AppendState<T>, E>,
    ) -> AsyncState<AppendState<T>, E> {
        state.begin_fetch()
    }

    /// Record a fetch failure; cached rows stay untouched.
    #[must_use]
    pub fn fail_fetch<E: Clone>(
        &self,
        state: &AsyncState<AppendState<T>, E>,
        error: E,
    ) -> AsyncState<AppendState<T>, E> {
        state.fail_fetch(error)
    }

    /// Put `page` in front of the cached rows and keep the first row per identifier.
    #[must_use]
    pub fn ingest_list<E>(
        &self,
        state: &AsyncState<AppendState<T>, E>,
        page: ListPage<T>,
    ) -> AsyncState<AppendState<T>, E> {
        let incoming = page.items.len();
        let mut seen = HashSet::with_capacity(incoming + state.data.entries.len());
        let entries: Vec<Rc<T>> = page
            .items
            .into_iter()
            .map(Rc::new)
            .chain(state.data.entries.iter().cloned())
            .filter(|entry| seen.insert(self.key(entry)))
            .collect();
        trace!(incoming, retained = entries.len(), "merged feed page");
        AsyncState::ready(AppendState { entries })
    }

    /// Remove rows deleted server-side.
    #[must_use]
    pub fn delete_by_ids<E: Clone>(
        &self,
        state: &AsyncState<AppendState<T>, E>,
        ids: &[K],
    ) -> AsyncState<AppendState<T>, E> {
        let doomed: HashSet<&K> = ids.iter().collect();
        let entries = state
            .data
            .entries
            .iter()
            .filter(|entry| !doomed.contains(&self.key(entry)))
            .cloned()
            .collect();
        AsyncState {
            updating: state.updating,
            error: state.error.clone(),
            data: AppendState { entries },
        }
    }
}
