//! Total-indexed cache for a server-side paginated collection.
//!
//! # Design
//! - Rows live in an id-keyed map; `order` maps offsets to ids or placeholders.
//! - Every transition builds a new state; rows are shared between states through `Rc`.
//! - A shrinking total discards all offset knowledge, since the removed offsets are unknown.

use std::collections::{HashMap, HashSet};
use std::fmt::{self, Debug, Formatter};
use std::hash::Hash;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::async_state::AsyncState;
use crate::identity::{IdOf, Slot};
use crate::plan::plan_windows;
use crate::policy::{CachePolicy, GcPolicy};
use crate::window::Window;

/// One fetch result for an ordered collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<T> {
    /// Rows in server sort order.
    pub items: Vec<T>,
    /// Server-reported size of the whole collection.
    pub total: usize,
}

impl<T> Page<T> {
    /// Build a page result.
    #[must_use]
    pub const fn new(items: Vec<T>, total: usize) -> Self {
        Self { items, total }
    }
}

/// Client copy of one ordered collection.
pub struct OrderedState<K, T> {
    items: HashMap<K, Rc<T>>,
    order: Vec<Slot<K>>,
    dirty: HashSet<K>,
    loaded: bool,
}

impl<K, T> OrderedState<K, T>
where
    K: Eq + Hash,
{
    /// Id-keyed row store.
    #[must_use]
    pub const fn items(&self) -> &HashMap<K, Rc<T>> {
        &self.items
    }

    /// Offset-ordered slots.
    #[must_use]
    pub fn order(&self) -> &[Slot<K>] {
        &self.order
    }

    /// Ids invalidated since their last fetch.
    #[must_use]
    pub const fn dirty(&self) -> &HashSet<K> {
        &self.dirty
    }

    /// Number of slots, i.e. the last reported total adjusted by deletions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the collection has no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether any page has been ingested yet.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Number of slots holding a fetched row.
    #[must_use]
    pub fn known_count(&self) -> usize {
        self.order.iter().filter(|slot| !slot.is_placeholder()).count()
    }

    /// Number of slots still waiting for a fetch.
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.order.len() - self.known_count()
    }

    /// Whether every slot holds a fetched row.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.order.iter().all(|slot| !slot.is_placeholder())
    }

    /// Whether `id` was invalidated and not re-fetched yet.
    #[must_use]
    pub fn is_dirty(&self, id: &K) -> bool {
        self.dirty.contains(id)
    }

    /// Row stored under `id`.
    #[must_use]
    pub fn get(&self, id: &K) -> Option<&Rc<T>> {
        self.items.get(id)
    }

    /// Slot at `index`.
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&Slot<K>> {
        self.order.get(index)
    }

    /// Rows of a viewport in order, `None` standing in for placeholders.
    #[must_use]
    pub fn select_window(&self, window: Window) -> Vec<Option<Rc<T>>> {
        let span = window.resolve(self.order.len());
        self.order[span.range()]
            .iter()
            .map(|slot| slot.id().and_then(|id| self.items.get(id)).cloned())
            .collect()
    }

    /// Every fetched row in offset order.
    #[must_use]
    pub fn select_rows(&self) -> Vec<Rc<T>> {
        self.order
            .iter()
            .filter_map(|slot| slot.id().and_then(|id| self.items.get(id)).cloned())
            .collect()
    }
}

impl<K, T> Default for OrderedState<K, T> {
    fn default() -> Self {
        Self {
            items: HashMap::new(),
            order: Vec::new(),
            dirty: HashSet::new(),
            loaded: false,
        }
    }
}

impl<K, T> Clone for OrderedState<K, T>
where
    K: Clone,
{
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            order: self.order.clone(),
            dirty: self.dirty.clone(),
            loaded: self.loaded,
        }
    }
}

impl<K, T> PartialEq for OrderedState<K, T>
where
    K: Eq + Hash,
    T: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.loaded == other.loaded
            && self.order == other.order
            && self.items == other.items
            && self.dirty == other.dirty
    }
}

impl<K, T> Debug for OrderedState<K, T>
where
    K: Debug,
    T: Debug,
{
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("OrderedState")
            .field("order", &self.order)
            .field("items", &self.items)
            .field("dirty", &self.dirty)
            .field("loaded", &self.loaded)
            .finish()
    }
}

/// Reconciles one server-side paginated collection with its partial client copy.
pub struct OrderedCollectionCache<K, T> {
    id_of: IdOf<K, T>,
    policy: CachePolicy,
}

impl<K, T> Clone for OrderedCollectionCache<K, T> {
    fn clone(&self) -> Self {
        Self {
            id_of: Rc::clone(&self.id_of),
            policy: self.policy,
        }
    }
}

impl<K, T> Debug for OrderedCollectionCache<K, T> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("OrderedCollectionCache")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<K, T> OrderedCollectionCache<K, T>
where
    K: Clone + Eq + Hash + Debug,
{
    /// Cache keyed by `id_of`, using the default policy.
    pub fn new(id_of: impl Fn(&T) -> K + 'static) -> Self {
        Self::with_policy(id_of, CachePolicy::default())
    }

    /// Cache keyed by `id_of` with an explicit policy.
    pub fn with_policy(id_of: impl Fn(&T) -> K + 'static, policy: CachePolicy) -> Self {
        Self {
            id_of: Rc::new(id_of),
            policy,
        }
    }

    /// Policy in effect.
    #[must_use]
    pub const fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Identifier of `item` according to this cache's accessor.
    pub fn id_of(&self, item: &T) -> K {
        (self.id_of)(item)
    }

    /// Empty state for a view that is about to issue its first fetch.
    #[must_use]
    pub fn initial_state<E>(&self) -> AsyncState<OrderedState<K, T>, E> {
        AsyncState::pending(OrderedState::default())
    }

    /// Mark a fetch as outstanding.
    #[must_use]
    pub fn begin_fetch<E: Clone>(
        &self,
        state: &AsyncState<OrderedState<K, T>, E>,
    ) -> AsyncState<OrderedState<K, T>, E> {
        state.begin_fetch()
    }

    /// Record a fetch failure; cached rows stay untouched.
    #[must_use]
    pub fn fail_fetch<E: Clone>(
        &self,
        state: &AsyncState<OrderedState<K, T>, E>,
        error: E,
    ) -> AsyncState<OrderedState<K, T>, E> {
        state.fail_fetch(error)
    }

    /// Merge a fetched page into the cache.
    ///
    /// `Window::Partial` overwrites exactly the covered slots (clamped to the
    /// reported total); `Window::Full` replaces the whole order with the page.
    /// A total smaller than the current order discards every cached offset.
    #[must_use]
    pub fn ingest_page<E>(
        &self,
        state: &AsyncState<OrderedState<K, T>, E>,
        page: Page<T>,
        window: Window,
    ) -> AsyncState<OrderedState<K, T>, E> {
        let Page { items, total } = page;
        let fetched: Vec<(K, Rc<T>)> = items
            .into_iter()
            .map(|item| (self.id_of(&item), Rc::new(item)))
            .collect();
        let previous = &state.data;

        let shrunk = total < previous.order.len();
        let (mut items, mut order, mut dirty) = if shrunk {
            debug!(
                previous = previous.order.len(),
                total, "collection shrank; discarding cached offsets"
            );
            (
                HashMap::with_capacity(fetched.len()),
                vec![Slot::Placeholder; total],
                HashSet::new(),
            )
        } else {
            let mut order = previous.order.clone();
            order.resize(total, Slot::Placeholder);
            (previous.items.clone(), order, previous.dirty.clone())
        };

        for (id, item) in &fetched {
            items.insert(id.clone(), Rc::clone(item));
            dirty.remove(id);
        }

        let mut ids = fetched.into_iter().map(|(id, _)| id);
        let replaced = match window {
            Window::Full => {
                order = ids.map(Slot::Known).collect();
                if order.len() != total {
                    debug!(
                        fetched = order.len(),
                        total, "full update length differs from reported total"
                    );
                }
                true
            }
            Window::Partial { start, length } => {
                let span = window.resolve(order.len());
                if span.clamped {
                    debug!(start, length, total, "page window clamped to collection");
                }
                for slot in &mut order[span.range()] {
                    *slot = ids.next().map_or(Slot::Placeholder, Slot::Known);
                }
                let surplus = ids.count();
                if surplus > 0 {
                    warn!(
                        start,
                        length, surplus, "page carried more rows than its window; surplus dropped"
                    );
                }
                false
            }
        };

        let collect = match self.policy.gc {
            GcPolicy::EveryIngest => true,
            GcPolicy::OnReset => shrunk || replaced,
        };
        if collect {
            let referenced: HashSet<&K> = order.iter().filter_map(Slot::id).collect();
            let before = items.len();
            items.retain(|id, _| referenced.contains(id));
            trace!(
                dropped = before - items.len(),
                retained = items.len(),
                "collected unreferenced rows"
            );
        }
        dirty.retain(|id| items.contains_key(id));

        AsyncState::ready(OrderedState {
            items,
            order,
            dirty,
            loaded: true,
        })
    }

    /// Remove rows deleted server-side; their slots disappear rather than becoming placeholders.
    #[must_use]
    pub fn delete_by_ids<E: Clone>(
        &self,
        state: &AsyncState<OrderedState<K, T>, E>,
        ids: &[K],
    ) -> AsyncState<OrderedState<K, T>, E> {
        let doomed: HashSet<&K> = ids.iter().collect();
        let mut data = state.data.clone();
        data.items.retain(|id, _| !doomed.contains(id));
        data.order
            .retain(|slot| slot.id().is_none_or(|id| !doomed.contains(id)));
        data.dirty.retain(|id| !doomed.contains(id));
        AsyncState {
            updating: state.updating,
            error: state.error.clone(),
            data,
        }
    }

    /// Flag cached rows for re-fetching; they stay visible until replaced.
    #[must_use]
    pub fn invalidate<E: Clone>(
        &self,
        state: &AsyncState<OrderedState<K, T>, E>,
        ids: &[K],
    ) -> AsyncState<OrderedState<K, T>, E> {
        let mut data = state.data.clone();
        for id in ids {
            if data.items.contains_key(id) {
                data.dirty.insert(id.clone());
            } else {
                trace!(?id, "ignoring invalidation of uncached row");
            }
        }
        AsyncState {
            updating: state.updating,
            error: state.error.clone(),
            data,
        }
    }

    /// Windows of `viewport` that still need fetching, at most `page_size` rows each.
    #[must_use]
    pub fn plan_fetches(&self, state: &OrderedState<K, T>, viewport: Window) -> Vec<Window> {
        plan_windows(state, viewport, self.policy.page_size)
    }
}
