use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw label string → dense class id.
///
/// Ids follow the sorted order of the distinct labels, so the
/// same set of labels always produces the same mapping. A
/// different subset of rows can produce a different mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelMap {
    ids: BTreeMap<String, usize>,
}

impl LabelMap {
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        // BTreeMap keys iterate in sorted order
        let mut ids: BTreeMap<String, usize> = labels
            .into_iter()
            .map(|l| (l.as_ref().to_string(), 0))
            .collect();
        for (i, id) in ids.values_mut().enumerate() {
            *id = i;
        }
        Self { ids }
    }

    pub fn id(&self, label: &str) -> Option<usize> {
        self.ids.get(label).copied()
    }

    /// Label names indexed by class id.
    pub fn names(&self) -> Vec<&str> {
        self.ids.keys().map(String::as_str).collect()
    }

    pub fn name(&self, id: usize) -> Option<&str> {
        self.ids.keys().nth(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }
}
