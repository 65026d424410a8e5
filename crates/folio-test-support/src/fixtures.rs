//! Row fixtures and cache builders.

use folio_cache::{AsyncState, CachePolicy, OrderedCollectionCache, OrderedState, Page};

/// Minimal catalogue row keyed by a numeric id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    /// Stable row identifier.
    pub id: u32,
    /// Display title derived from the id unless overridden.
    pub title: String,
}

/// Ordered cache state over [`Row`] with string errors.
pub type RowState = AsyncState<OrderedState<u32, Row>, String>;

/// Row with a title derived from its id.
#[must_use]
pub fn row(id: u32) -> Row {
    Row {
        id,
        title: format!("row-{id}"),
    }
}

/// Rows for each id, in the given order.
#[must_use]
pub fn rows(ids: &[u32]) -> Vec<Row> {
    ids.iter().copied().map(row).collect()
}

/// Page of rows for each id with the reported total.
#[must_use]
pub fn page(ids: &[u32], total: usize) -> Page<Row> {
    Page::new(rows(ids), total)
}

/// Ordered cache over [`Row`] keyed by `id`.
#[must_use]
pub fn row_cache(policy: CachePolicy) -> OrderedCollectionCache<u32, Row> {
    OrderedCollectionCache::with_policy(|row: &Row| row.id, policy)
}

/// Slot ids of a state, `None` for placeholders.
#[must_use]
pub fn order_ids(state: &OrderedState<u32, Row>) -> Vec<Option<u32>> {
    state
        .order()
        .iter()
        .map(|slot| slot.id().copied())
        .collect()
}

/// Sorted keys of the item map.
#[must_use]
pub fn item_ids(state: &OrderedState<u32, Row>) -> Vec<u32> {
    let mut ids: Vec<u32> = state.items().keys().copied().collect();
    ids.sort_unstable();
    ids
}
