//! Invariant checks for cache states.

use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;

use anyhow::{Result, bail};
use folio_cache::{AppendState, OrderedState};

/// Every fetched slot resolves to a row and every dirty id is cached.
///
/// # Errors
///
/// Returns an error naming the first violation found.
pub fn check_ordered_invariants<K, T>(state: &OrderedState<K, T>) -> Result<()>
where
    K: Eq + Hash + Debug,
{
    for (index, slot) in state.order().iter().enumerate() {
        if let Some(id) = slot.id()
            && state.get(id).is_none()
        {
            bail!("slot {index} references {id:?} which has no cached row");
        }
    }
    for id in state.dirty() {
        if state.get(id).is_none() {
            bail!("dirty id {id:?} has no cached row");
        }
    }
    Ok(())
}

/// Every cached row is referenced by at least one slot.
///
/// # Errors
///
/// Returns an error naming the first orphaned id.
pub fn check_no_orphans<K, T>(state: &OrderedState<K, T>) -> Result<()>
where
    K: Eq + Hash + Debug,
{
    let referenced: HashSet<&K> = state.order().iter().filter_map(|slot| slot.id()).collect();
    for id in state.items().keys() {
        if !referenced.contains(id) {
            bail!("cached row {id:?} is not referenced by any slot");
        }
    }
    Ok(())
}

/// No two feed rows share an identifier.
///
/// # Errors
///
/// Returns an error naming the first duplicated id.
pub fn check_unique_feed<K, T>(state: &AppendState<T>, id_of: impl Fn(&T) -> K) -> Result<()>
where
    K: Eq + Hash + Debug,
{
    let mut seen = HashSet::new();
    for entry in state.entries() {
        let id = id_of(entry);
        if seen.contains(&id) {
            bail!("feed holds {id:?} more than once");
        }
        seen.insert(id);
    }
    Ok(())
}
