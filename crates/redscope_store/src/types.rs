//! Value shapes and fetched payloads.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

/// Declared shape of the values behind a scan pattern.
///
/// Config files spell these in snake case (`"scalar"`, `"sorted_set"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Scalar,
    List,
    Set,
    SortedSet,
    Hash,
}

impl ValueKind {
    /// Short uppercase tag used in list rows and detail headers.
    pub fn tag(self) -> &'static str {
        match self {
            ValueKind::Scalar => "SCALAR",
            ValueKind::List => "LIST",
            ValueKind::Set => "SET",
            ValueKind::SortedSet => "ZSET",
            ValueKind::Hash => "HASH",
        }
    }

    /// The type name Redis reports for this kind in a `TYPE` reply.
    pub fn redis_type(self) -> &'static str {
        match self {
            ValueKind::Scalar => "string",
            ValueKind::List => "list",
            ValueKind::Set => "set",
            ValueKind::SortedSet => "zset",
            ValueKind::Hash => "hash",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.redis_type())
    }
}

/// Fully fetched value of one key, tagged by shape.
///
/// Replaced wholesale on every fetch; never updated in place. Set members
/// and hash fields are kept sorted so repeated fetches of an unchanged key
/// render identically.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyValue {
    Scalar(String),
    List(Vec<String>),
    Set(Vec<String>),
    SortedSet(Vec<(String, f64)>),
    Hash(BTreeMap<String, String>),
}

impl KeyValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            KeyValue::Scalar(_) => ValueKind::Scalar,
            KeyValue::List(_) => ValueKind::List,
            KeyValue::Set(_) => ValueKind::Set,
            KeyValue::SortedSet(_) => ValueKind::SortedSet,
            KeyValue::Hash(_) => ValueKind::Hash,
        }
    }

    /// Element count as shown in detail headers. A scalar counts as one.
    pub fn len(&self) -> usize {
        match self {
            KeyValue::Scalar(_) => 1,
            KeyValue::List(items) => items.len(),
            KeyValue::Set(members) => members.len(),
            KeyValue::SortedSet(members) => members.len(),
            KeyValue::Hash(fields) => fields.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_roundtrips_through_payload() {
        let cases = [
            (KeyValue::Scalar("x".into()), ValueKind::Scalar),
            (KeyValue::List(vec![]), ValueKind::List),
            (KeyValue::Set(vec![]), ValueKind::Set),
            (KeyValue::SortedSet(vec![]), ValueKind::SortedSet),
            (KeyValue::Hash(BTreeMap::new()), ValueKind::Hash),
        ];
        for (value, kind) in cases {
            assert_eq!(value.kind(), kind);
        }
    }

    #[test]
    fn kind_parses_from_config_strings() {
        #[derive(Deserialize)]
        struct Probe {
            kind: ValueKind,
        }
        let cases = [
            ("scalar", ValueKind::Scalar),
            ("list", ValueKind::List),
            ("set", ValueKind::Set),
            ("sorted_set", ValueKind::SortedSet),
            ("hash", ValueKind::Hash),
        ];
        for (text, expected) in cases {
            let probe: Probe =
                serde_json::from_str(&format!("{{\"kind\": \"{text}\"}}")).unwrap();
            assert_eq!(probe.kind, expected);
        }
    }

    #[test]
    fn scalar_counts_as_one_element() {
        assert_eq!(KeyValue::Scalar("v".into()).len(), 1);
        assert!(KeyValue::List(vec![]).is_empty());
    }
}
