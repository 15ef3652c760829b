//! Ordered key -> scenes accumulation shared by every strategy.

use std::collections::HashMap;

use super::DuplicateGroup;
use crate::stash::Scene;

/// Buckets keyed by string, remembering the order in which keys were first
/// seen. Members keep their order of arrival, repeats included.
#[derive(Debug, Default)]
pub(crate) struct Buckets<'a> {
    index: HashMap<String, usize>,
    entries: Vec<(String, Vec<&'a Scene>)>,
}

impl<'a> Buckets<'a> {
    /// Fold `(key, scene)` pairs into buckets.
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, &'a Scene)>,
        K: AsRef<str>,
    {
        pairs.into_iter().fold(Self::default(), |mut buckets, (key, scene)| {
            buckets.push(key.as_ref(), scene);
            buckets
        })
    }

    fn push(&mut self, key: &str, scene: &'a Scene) {
        match self.index.get(key) {
            Some(&slot) => self.entries[slot].1.push(scene),
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), vec![scene]));
            }
        }
    }

    /// All buckets in first-seen key order, singletons included.
    pub fn into_entries(self) -> Vec<(String, Vec<&'a Scene>)> {
        self.entries
    }

    /// Buckets holding at least two entries.
    pub fn into_groups(self) -> Vec<DuplicateGroup<'a>> {
        self.entries
            .into_iter()
            .filter(|(_, scenes)| scenes.len() >= 2)
            .map(|(key, scenes)| DuplicateGroup { key, scenes })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_first_seen_order() {
        let a = Scene::new("a", "");
        let b = Scene::new("b", "");
        let c = Scene::new("c", "");

        let buckets = Buckets::from_pairs([("y", &a), ("x", &b), ("y", &c)]);
        let entries = buckets.into_entries();

        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["y", "x"]);
        let ids: Vec<&str> = entries[0].1.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_groups_drop_singletons_but_count_repeats() {
        let a = Scene::new("a", "");
        let b = Scene::new("b", "");

        let groups = Buckets::from_pairs([("solo", &a), ("twice", &b), ("twice", &b)]).into_groups();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, "twice");
        assert_eq!(groups[0].len(), 2);
    }
}
