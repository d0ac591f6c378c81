//! Immutable drill-down snapshots.

use redscope_store::ValueKind;

/// Snapshot of one worker's matched keys, taken at drill-down time.
///
/// Rows reflect the instant of selection: a rescan of the underlying worker
/// does not refresh an already-open selection. Discarded on back-navigation.
#[derive(Debug, Clone)]
pub struct SelectionSet {
    keys: Vec<String>,
    kind: ValueKind,
}

impl SelectionSet {
    /// Sort and deduplicate the keys captured from a worker snapshot.
    pub fn new(mut keys: Vec<String>, kind: ValueKind) -> Self {
        keys.sort();
        keys.dedup();
        Self { keys, kind }
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.keys.get(index).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_sorted_and_deduplicated() {
        let set = SelectionSet::new(
            vec![
                "user:2".into(),
                "user:1".into(),
                "user:2".into(),
                "user:10".into(),
            ],
            ValueKind::Hash,
        );
        assert_eq!(set.keys(), ["user:1", "user:10", "user:2"]);
        assert_eq!(set.len(), 3);
        assert_eq!(set.kind(), ValueKind::Hash);
    }

    #[test]
    fn out_of_range_lookup_is_none() {
        let set = SelectionSet::new(vec!["k".into()], ValueKind::Scalar);
        assert_eq!(set.get(0), Some("k"));
        assert_eq!(set.get(1), None);
    }
}
