//! Replay script documents.
//!
//! # Design
//! - Scripts are validated up front; a bad item aborts before any event is applied.
//! - Item ids are extracted once here so the cache accessor cannot fail.

use folio_cache::{Identifier, Window};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{CliError, CliResult};

const DEFAULT_ID_FIELD: &str = "id";

/// Collection shape a script drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ScriptKind {
    Ordered,
    Append,
}

impl ScriptKind {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Ordered => "ordered",
            Self::Append => "append",
        }
    }
}

/// Script row with its identifier already extracted.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ScriptItem {
    pub(crate) id: Identifier,
    pub(crate) body: Value,
}

/// Validated event of an ordered script.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum OrderedEvent {
    Begin,
    Page {
        items: Vec<ScriptItem>,
        total: usize,
        window: Window,
    },
    Fail {
        error: String,
    },
    Delete {
        ids: Vec<Identifier>,
    },
    Invalidate {
        ids: Vec<Identifier>,
    },
}

impl OrderedEvent {
    pub(crate) const fn op(&self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::Page { .. } => "page",
            Self::Fail { .. } => "fail",
            Self::Delete { .. } => "delete",
            Self::Invalidate { .. } => "invalidate",
        }
    }
}

/// Validated event of an append script.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum FeedEvent {
    Begin,
    List { items: Vec<ScriptItem> },
    Fail { error: String },
    Delete { ids: Vec<Identifier> },
}

impl FeedEvent {
    pub(crate) const fn op(&self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::List { .. } => "list",
            Self::Fail { .. } => "fail",
            Self::Delete { .. } => "delete",
        }
    }
}

/// Validated replay script; events are typed by the collection shape they drive.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Script {
    Ordered(Vec<OrderedEvent>),
    Append(Vec<FeedEvent>),
}

impl Script {
    pub(crate) const fn kind(&self) -> ScriptKind {
        match self {
            Self::Ordered(_) => ScriptKind::Ordered,
            Self::Append(_) => ScriptKind::Append,
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Self::Ordered(events) => events.len(),
            Self::Append(events) => events.len(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScriptDocument {
    kind: ScriptKind,
    #[serde(default = "default_id_field")]
    id_field: String,
    #[serde(default)]
    events: Vec<RawEvent>,
}

fn default_id_field() -> String {
    DEFAULT_ID_FIELD.to_string()
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum RawEvent {
    Begin,
    Page {
        items: Vec<Value>,
        total: usize,
        #[serde(default)]
        window: Option<WindowSpec>,
    },
    List {
        items: Vec<Value>,
    },
    Fail {
        error: String,
    },
    Delete {
        ids: Vec<Identifier>,
    },
    Invalidate {
        ids: Vec<Identifier>,
    },
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WindowSpec {
    start: usize,
    length: usize,
}

impl RawEvent {
    const fn op(&self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::Page { .. } => "page",
            Self::List { .. } => "list",
            Self::Fail { .. } => "fail",
            Self::Delete { .. } => "delete",
            Self::Invalidate { .. } => "invalidate",
        }
    }
}

/// Parse and validate a script document.
pub(crate) fn parse_script(text: &str) -> CliResult<Script> {
    let document: ScriptDocument = serde_json::from_str(text)
        .map_err(|err| CliError::validation(format!("invalid script: {err}")))?;
    let ScriptDocument {
        kind,
        id_field,
        events,
    } = document;

    let events = events.into_iter().enumerate();
    match kind {
        ScriptKind::Ordered => events
            .map(|(index, raw)| ordered_event(&id_field, index, raw))
            .collect::<CliResult<Vec<_>>>()
            .map(Script::Ordered),
        ScriptKind::Append => events
            .map(|(index, raw)| feed_event(&id_field, index, raw))
            .collect::<CliResult<Vec<_>>>()
            .map(Script::Append),
    }
}

fn ordered_event(id_field: &str, index: usize, raw: RawEvent) -> CliResult<OrderedEvent> {
    let event = match raw {
        RawEvent::Begin => OrderedEvent::Begin,
        RawEvent::Page {
            items,
            total,
            window,
        } => OrderedEvent::Page {
            items: extract_items(id_field, index, items)?,
            total,
            window: window.map_or(Window::Full, |bounds| {
                Window::partial(bounds.start, bounds.length)
            }),
        },
        RawEvent::Fail { error } => OrderedEvent::Fail { error },
        RawEvent::Delete { ids } => OrderedEvent::Delete { ids },
        RawEvent::Invalidate { ids } => OrderedEvent::Invalidate { ids },
        RawEvent::List { .. } => return Err(misplaced(index, &raw, ScriptKind::Ordered)),
    };
    Ok(event)
}

fn feed_event(id_field: &str, index: usize, raw: RawEvent) -> CliResult<FeedEvent> {
    let event = match raw {
        RawEvent::Begin => FeedEvent::Begin,
        RawEvent::List { items } => FeedEvent::List {
            items: extract_items(id_field, index, items)?,
        },
        RawEvent::Fail { error } => FeedEvent::Fail { error },
        RawEvent::Delete { ids } => FeedEvent::Delete { ids },
        RawEvent::Page { .. } | RawEvent::Invalidate { .. } => {
            return Err(misplaced(index, &raw, ScriptKind::Append));
        }
    };
    Ok(event)
}

fn misplaced(index: usize, raw: &RawEvent, kind: ScriptKind) -> CliError {
    CliError::validation(format!(
        "event {index}: `{}` is not valid for {} scripts",
        raw.op(),
        kind.as_str()
    ))
}

fn extract_items(id_field: &str, index: usize, items: Vec<Value>) -> CliResult<Vec<ScriptItem>> {
    items
        .into_iter()
        .enumerate()
        .map(|(position, body)| {
            let id = body
                .get(id_field)
                .and_then(Identifier::from_json)
                .ok_or_else(|| {
                    CliError::validation(format!(
                        "event {index}: item {position} has no usable `{id_field}` field"
                    ))
                })?;
            Ok(ScriptItem { id, body })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: &Value) -> CliResult<Script> {
        parse_script(&value.to_string())
    }

    #[test]
    fn ordered_script_parses_windows() {
        let script = parse(&json!({
            "kind": "ordered",
            "events": [
                { "op": "begin" },
                { "op": "page", "items": [{ "id": 1 }], "total": 3, "window": { "start": 0, "length": 1 } },
                { "op": "page", "items": [{ "id": "x" }], "total": 1 },
                { "op": "invalidate", "ids": [1] }
            ]
        }))
        .unwrap();
        assert_eq!(script.kind(), ScriptKind::Ordered);
        assert_eq!(script.len(), 4);
        let Script::Ordered(events) = &script else {
            panic!("expected ordered script: {script:?}");
        };
        match &events[1] {
            OrderedEvent::Page {
                items,
                total,
                window,
            } => {
                assert_eq!(items[0].id, Identifier::from(1));
                assert_eq!(*total, 3);
                assert_eq!(*window, Window::partial(0, 1));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        match &events[2] {
            OrderedEvent::Page { items, window, .. } => {
                assert_eq!(items[0].id, Identifier::from("x"));
                assert_eq!(*window, Window::Full);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(events[3].op(), "invalidate");
    }

    #[test]
    fn custom_id_field_is_used() {
        let script = parse(&json!({
            "kind": "append",
            "id_field": "event",
            "events": [{ "op": "list", "items": [{ "event": "e1" }] }]
        }))
        .unwrap();
        assert_eq!(
            script,
            Script::Append(vec![FeedEvent::List {
                items: vec![ScriptItem {
                    id: Identifier::from("e1"),
                    body: json!({ "event": "e1" }),
                }]
            }])
        );
    }

    #[test]
    fn missing_ids_are_validation_errors() {
        let err = parse(&json!({
            "kind": "ordered",
            "events": [{ "op": "page", "items": [{ "id": 1 }, { "id": null }], "total": 2 }]
        }))
        .unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert_eq!(
            err.display_message(),
            "event 0: item 1 has no usable `id` field"
        );
    }

    #[test]
    fn events_must_match_script_kind() {
        let err = parse(&json!({
            "kind": "append",
            "events": [{ "op": "invalidate", "ids": [1] }]
        }))
        .unwrap_err();
        assert_eq!(
            err.display_message(),
            "event 0: `invalidate` is not valid for append scripts"
        );

        let err = parse(&json!({
            "kind": "ordered",
            "events": [{ "op": "list", "items": [] }]
        }))
        .unwrap_err();
        assert_eq!(
            err.display_message(),
            "event 0: `list` is not valid for ordered scripts"
        );

        let err = parse(&json!({
            "kind": "append",
            "events": [
                { "op": "begin" },
                { "op": "page", "items": [{ "id": 1 }], "total": 1 }
            ]
        }))
        .unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert_eq!(
            err.display_message(),
            "event 1: `page` is not valid for append scripts"
        );
    }

    #[test]
    fn scripts_without_events_are_empty() {
        let script = parse(&json!({ "kind": "append" })).unwrap();
        assert_eq!(script, Script::Append(Vec::new()));
        assert!(script.is_empty());
        assert_eq!(script.kind().as_str(), "append");
    }

    #[test]
    fn malformed_documents_are_rejected() {
        assert!(parse_script("not json").is_err());
        assert!(parse(&json!({ "kind": "ordered", "extra": true })).is_err());
        assert!(parse(&json!({ "kind": "ordered", "events": [{ "op": "rewind" }] })).is_err());
    }
}
