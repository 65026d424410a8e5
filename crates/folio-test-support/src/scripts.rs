//! Replay documents shared by CLI suites.

use serde_json::{Value, json};

/// Two windowed pages over a five-row collection, leaving the last slot unfetched.
#[must_use]
pub fn windowed_scenario() -> Value {
    json!({
        "kind": "ordered",
        "id_field": "id",
        "events": [
            { "op": "begin" },
            {
                "op": "page",
                "items": [{ "id": 1, "title": "Alien" }, { "id": 2, "title": "Aliens" }],
                "total": 5,
                "window": { "start": 0, "length": 2 }
            },
            { "op": "begin" },
            {
                "op": "page",
                "items": [{ "id": 3, "title": "Alien 3" }, { "id": 4, "title": "Prometheus" }],
                "total": 5,
                "window": { "start": 2, "length": 2 }
            }
        ]
    })
}

/// History feed with an overlapping second page, a failure and a deletion.
#[must_use]
pub fn history_feed() -> Value {
    json!({
        "kind": "append",
        "id_field": "event",
        "events": [
            { "op": "list", "items": [{ "event": "b", "action": 1 }, { "event": "a", "action": 0 }] },
            { "op": "begin" },
            { "op": "fail", "error": "gateway timeout" },
            { "op": "list", "items": [{ "event": "c", "action": 2 }, { "event": "b", "action": 3 }] },
            { "op": "delete", "ids": ["a"] }
        ]
    })
}

/// Ordered script whose second row lacks the configured id field.
#[must_use]
pub fn missing_id_script() -> Value {
    json!({
        "kind": "ordered",
        "id_field": "id",
        "events": [
            { "op": "page", "items": [{ "id": 1 }, { "name": "orphan" }], "total": 2 }
        ]
    })
}
