//! Identifiers and order slots.

use std::fmt::{self, Display, Formatter};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Caller-supplied accessor that extracts a row's identifier.
pub(crate) type IdOf<K, T> = Rc<dyn Fn(&T) -> K>;

/// Row identifier for collections keyed by a number or a string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    /// Numeric identifier (database ids such as episode or movie ids).
    Number(i64),
    /// Textual identifier (paths, hashes, provider keys).
    Text(String),
}

impl Identifier {
    /// Read an identifier from a JSON value; only integers and strings qualify.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number.as_i64().map(Self::Number),
            Value::String(text) => Some(Self::Text(text.clone())),
            _ => None,
        }
    }
}

impl Display for Identifier {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(formatter, "{value}"),
            Self::Text(value) => formatter.write_str(value),
        }
    }
}

impl From<i64> for Identifier {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// One position of an ordered collection.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Slot<K> {
    /// The row at this offset has been fetched.
    Known(K),
    /// The total includes this offset but its row has not been fetched yet.
    Placeholder,
}

impl<K> Slot<K> {
    /// Identifier held by the slot, if fetched.
    #[must_use]
    pub const fn id(&self) -> Option<&K> {
        match self {
            Self::Known(id) => Some(id),
            Self::Placeholder => None,
        }
    }

    /// Whether the slot is still waiting for a fetch.
    #[must_use]
    pub const fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder)
    }
}

impl<K> From<Option<K>> for Slot<K> {
    fn from(value: Option<K>) -> Self {
        value.map_or(Self::Placeholder, Self::Known)
    }
}
