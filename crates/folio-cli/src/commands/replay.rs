//! `folio replay`: drive a cache through a recorded script.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use folio_cache::{
    AppendOnlyCollectionCache, AppendState, AsyncState, CachePolicy, Identifier, ListPage,
    OrderedCollectionCache, OrderedState, Page,
};
use tracing::{debug, info};

use crate::cli::{OutputFormat, ReplayArgs};
use crate::error::{CliError, CliResult, describe};
use crate::output::{render_snapshot, render_step};
use crate::script::{FeedEvent, OrderedEvent, Script, ScriptItem, parse_script};

/// Ordered cache state over script rows.
pub(crate) type OrderedRows = AsyncState<OrderedState<Identifier, ScriptItem>, String>;
/// Feed cache state over script rows.
pub(crate) type FeedRows = AsyncState<AppendState<ScriptItem>, String>;

/// Cache state after replaying a script.
#[derive(Debug)]
pub(crate) enum Replayed {
    Ordered(OrderedRows),
    Append(FeedRows),
}

impl Replayed {
    pub(crate) const fn view(&self) -> StateView<'_> {
        match self {
            Self::Ordered(state) => StateView::Ordered(state),
            Self::Append(state) => StateView::Append(state),
        }
    }
}

/// Borrowed cache state, handed to observers between replay steps.
#[derive(Clone, Copy, Debug)]
pub(crate) enum StateView<'a> {
    Ordered(&'a OrderedRows),
    Append(&'a FeedRows),
}

pub(crate) fn ordered_cache(policy: CachePolicy) -> OrderedCollectionCache<Identifier, ScriptItem> {
    OrderedCollectionCache::with_policy(|item: &ScriptItem| item.id.clone(), policy)
}

fn feed_cache() -> AppendOnlyCollectionCache<Identifier, ScriptItem> {
    AppendOnlyCollectionCache::new(|item: &ScriptItem| item.id.clone())
}

pub(crate) fn handle_replay(
    args: &ReplayArgs,
    format: OutputFormat,
    out: &mut dyn Write,
) -> CliResult<()> {
    let script = load_script(&args.script)?;
    let policy = load_policy(args.policy.as_deref())?;

    let replayed = replay(&script, policy, |index, op, state| {
        if args.steps {
            render_step(out, index, op, state, format)?;
        }
        Ok(())
    })?;

    if !(args.steps && format == OutputFormat::Json && !script.is_empty()) {
        render_snapshot(out, &replayed, format)?;
    }
    Ok(())
}

pub(crate) fn load_script(path: &Path) -> CliResult<Script> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read script {}", path.display()))
        .map_err(CliError::failure)?;
    parse_script(&text)
}

pub(crate) fn load_policy(path: Option<&Path>) -> CliResult<CachePolicy> {
    let Some(path) = path else {
        return Ok(CachePolicy::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read policy {}", path.display()))
        .map_err(CliError::failure)?;
    CachePolicy::from_json_str(&text).map_err(|err| {
        CliError::validation(format!("policy {}: {}", path.display(), describe(&err)))
    })
}

/// Apply every script event in order, reporting each intermediate state to `observe`.
pub(crate) fn replay(
    script: &Script,
    policy: CachePolicy,
    mut observe: impl FnMut(usize, &'static str, StateView<'_>) -> CliResult<()>,
) -> CliResult<Replayed> {
    let replayed = match script {
        Script::Ordered(events) => {
            let cache = ordered_cache(policy);
            let mut state = cache.initial_state();
            for (index, event) in events.iter().enumerate() {
                state = apply_ordered(&cache, &state, event);
                debug!(step = index + 1, op = event.op(), "applied replay event");
                observe(index, event.op(), StateView::Ordered(&state))?;
            }
            Replayed::Ordered(state)
        }
        Script::Append(events) => {
            let cache = feed_cache();
            let mut state = cache.initial_state();
            for (index, event) in events.iter().enumerate() {
                state = apply_feed(&cache, &state, event);
                debug!(step = index + 1, op = event.op(), "applied replay event");
                observe(index, event.op(), StateView::Append(&state))?;
            }
            Replayed::Append(state)
        }
    };

    info!(
        kind = script.kind().as_str(),
        events = script.len(),
        "replay finished"
    );
    Ok(replayed)
}

fn apply_ordered(
    cache: &OrderedCollectionCache<Identifier, ScriptItem>,
    state: &OrderedRows,
    event: &OrderedEvent,
) -> OrderedRows {
    match event {
        OrderedEvent::Begin => cache.begin_fetch(state),
        OrderedEvent::Fail { error } => cache.fail_fetch(state, error.clone()),
        OrderedEvent::Page {
            items,
            total,
            window,
        } => cache.ingest_page(state, Page::new(items.clone(), *total), *window),
        OrderedEvent::Delete { ids } => cache.delete_by_ids(state, ids),
        OrderedEvent::Invalidate { ids } => cache.invalidate(state, ids),
    }
}

fn apply_feed(
    cache: &AppendOnlyCollectionCache<Identifier, ScriptItem>,
    state: &FeedRows,
    event: &FeedEvent,
) -> FeedRows {
    match event {
        FeedEvent::Begin => cache.begin_fetch(state),
        FeedEvent::Fail { error } => cache.fail_fetch(state, error.clone()),
        FeedEvent::List { items } => cache.ingest_list(state, ListPage::new(items.clone())),
        FeedEvent::Delete { ids } => cache.delete_by_ids(state, ids),
    }
}
