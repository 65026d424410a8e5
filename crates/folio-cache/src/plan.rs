//! Fetch planning for ordered collections.
//!
//! A slot needs fetching when it is a placeholder or holds an invalidated row.
//! Consecutive stale slots are grouped and split into page-sized windows.

use std::hash::Hash;

use crate::identity::Slot;
use crate::ordered::OrderedState;
use crate::window::Window;

pub(crate) fn plan_windows<K, T>(
    state: &OrderedState<K, T>,
    viewport: Window,
    page_size: usize,
) -> Vec<Window>
where
    K: Eq + Hash,
{
    let page_size = page_size.max(1);
    let mut windows = Vec::new();

    if !state.is_loaded() {
        match viewport {
            Window::Full => windows.push(Window::Full),
            Window::Partial { start, length } => {
                push_chunks(&mut windows, start, start.saturating_add(length), page_size);
            }
        }
        return windows;
    }

    let span = viewport.resolve(state.len());
    let mut run_start = None;
    for (offset, slot) in state.order()[span.range()].iter().enumerate() {
        let index = span.start + offset;
        let stale = match slot {
            Slot::Placeholder => true,
            Slot::Known(id) => state.is_dirty(id),
        };
        match (stale, run_start) {
            (true, None) => run_start = Some(index),
            (false, Some(start)) => {
                push_chunks(&mut windows, start, index, page_size);
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        push_chunks(&mut windows, start, span.end, page_size);
    }
    windows
}

fn push_chunks(windows: &mut Vec<Window>, start: usize, end: usize, page_size: usize) {
    let mut offset = start;
    while offset < end {
        let length = page_size.min(end - offset);
        windows.push(Window::partial(offset, length));
        offset += length;
    }
}
