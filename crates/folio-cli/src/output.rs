//! Output renderers and formatting helpers for CLI commands.

use std::io::Write;

use anyhow::anyhow;
use folio_cache::{Identifier, Slot, Window};
use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::commands::replay::{FeedRows, OrderedRows, Replayed, StateView};
use crate::error::{CliError, CliResult};

/// Serialisable view of a replayed cache.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Snapshot<'a> {
    Ordered {
        updating: bool,
        error: Option<&'a str>,
        total: usize,
        known: usize,
        placeholders: usize,
        dirty: Vec<&'a Identifier>,
        order: Vec<Option<&'a Identifier>>,
        rows: Vec<Option<Value>>,
    },
    Append {
        updating: bool,
        error: Option<&'a str>,
        count: usize,
        rows: Vec<Value>,
    },
}

#[derive(Debug, Serialize)]
struct StepRecord<'a> {
    step: usize,
    op: &'static str,
    state: Snapshot<'a>,
}

fn snapshot(view: StateView<'_>) -> Snapshot<'_> {
    match view {
        StateView::Ordered(state) => ordered_snapshot(state),
        StateView::Append(state) => feed_snapshot(state),
    }
}

fn ordered_snapshot(state: &OrderedRows) -> Snapshot<'_> {
    let data = &state.data;
    let mut dirty: Vec<&Identifier> = data.dirty().iter().collect();
    dirty.sort();
    Snapshot::Ordered {
        updating: state.updating,
        error: state.error.as_deref(),
        total: data.len(),
        known: data.known_count(),
        placeholders: data.placeholder_count(),
        dirty,
        order: data.order().iter().map(Slot::id).collect(),
        rows: data
            .select_window(Window::Full)
            .into_iter()
            .map(|row| row.map(|item| item.body.clone()))
            .collect(),
    }
}

fn feed_snapshot(state: &FeedRows) -> Snapshot<'_> {
    Snapshot::Append {
        updating: state.updating,
        error: state.error.as_deref(),
        count: state.data.len(),
        rows: state
            .data
            .entries()
            .iter()
            .map(|entry| entry.body.clone())
            .collect(),
    }
}

pub(crate) fn render_snapshot(
    out: &mut dyn Write,
    replayed: &Replayed,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let text = serde_json::to_string_pretty(&snapshot(replayed.view()))
                .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
            writeln!(out, "{text}").map_err(|err| CliError::write_failed(&err))
        }
        OutputFormat::Table => {
            write_table(out, replayed.view()).map_err(|err| CliError::write_failed(&err))
        }
    }
}

pub(crate) fn render_step(
    out: &mut dyn Write,
    index: usize,
    op: &'static str,
    view: StateView<'_>,
    format: OutputFormat,
) -> CliResult<()> {
    let step = index + 1;
    match format {
        OutputFormat::Json => {
            let record = StepRecord {
                step,
                op,
                state: snapshot(view),
            };
            let text = serde_json::to_string(&record)
                .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
            writeln!(out, "{text}").map_err(|err| CliError::write_failed(&err))
        }
        OutputFormat::Table => writeln!(
            out,
            "step {step:>3} {op:<10} {}",
            summary_line(view)
        )
        .map_err(|err| CliError::write_failed(&err)),
    }
}

pub(crate) fn render_plan(
    out: &mut dyn Write,
    windows: &[Window],
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let text = serde_json::to_string_pretty(windows)
                .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
            writeln!(out, "{text}").map_err(|err| CliError::write_failed(&err))
        }
        OutputFormat::Table => {
            write_plan_table(out, windows).map_err(|err| CliError::write_failed(&err))
        }
    }
}

fn write_plan_table(out: &mut dyn Write, windows: &[Window]) -> std::io::Result<()> {
    if windows.is_empty() {
        return writeln!(out, "nothing to fetch");
    }
    writeln!(out, "{:<8} {:>8} {:>8}", "KIND", "START", "LENGTH")?;
    for window in windows {
        match window {
            Window::Full => writeln!(out, "{:<8} {:>8} {:>8}", "full", "-", "-")?,
            Window::Partial { start, length } => {
                writeln!(out, "{:<8} {start:>8} {length:>8}", "partial")?;
            }
        }
    }
    Ok(())
}

fn summary_line(view: StateView<'_>) -> String {
    match view {
        StateView::Ordered(state) => format!(
            "updating={} error={} total={} known={} placeholders={} dirty={}",
            state.updating,
            error_label(state.error.as_deref()),
            state.data.len(),
            state.data.known_count(),
            state.data.placeholder_count(),
            state.data.dirty().len()
        ),
        StateView::Append(state) => format!(
            "updating={} error={} count={}",
            state.updating,
            error_label(state.error.as_deref()),
            state.data.len()
        ),
    }
}

fn write_table(out: &mut dyn Write, view: StateView<'_>) -> std::io::Result<()> {
    match view {
        StateView::Ordered(state) => {
            let data = &state.data;
            writeln!(out, "kind: ordered")?;
            writeln!(out, "updating: {}", state.updating)?;
            writeln!(out, "error: {}", error_label(state.error.as_deref()))?;
            writeln!(
                out,
                "total: {} (known {}, placeholders {}, dirty {})",
                data.len(),
                data.known_count(),
                data.placeholder_count(),
                data.dirty().len()
            )?;
            writeln!(out, "{:>6} {:<16} ROW", "INDEX", "ID")?;
            for (index, slot) in data.order().iter().enumerate() {
                match slot {
                    Slot::Known(id) => {
                        let marker = if data.is_dirty(id) { " (stale)" } else { "" };
                        let row = data
                            .get(id)
                            .map_or_else(String::new, |item| item.body.to_string());
                        writeln!(out, "{index:>6} {:<16} {row}{marker}", id.to_string())?;
                    }
                    Slot::Placeholder => writeln!(out, "{index:>6} {:<16}", "<pending>")?,
                }
            }
        }
        StateView::Append(state) => {
            writeln!(out, "kind: append")?;
            writeln!(out, "updating: {}", state.updating)?;
            writeln!(out, "error: {}", error_label(state.error.as_deref()))?;
            writeln!(out, "count: {}", state.data.len())?;
            writeln!(out, "{:<16} ROW", "ID")?;
            for entry in state.data.entries() {
                writeln!(out, "{:<16} {}", entry.id.to_string(), entry.body)?;
            }
        }
    }
    Ok(())
}

fn error_label(error: Option<&str>) -> &str {
    error.unwrap_or("-")
}
