use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::CollectionKey;

/// Collection names grouped by database, for the overview page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NavigationIndex(BTreeMap<String, BTreeSet<String>>);

impl NavigationIndex {
    pub fn build<'a>(keys: impl IntoIterator<Item = &'a CollectionKey>) -> Self {
        let mut index: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for key in keys {
            index
                .entry(key.database().to_string())
                .or_default()
                .insert(key.collection().to_string());
        }
        Self(index)
    }

    pub fn databases(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn collections(&self, database: &str) -> Option<&BTreeSet<String>> {
        self.0.get(database)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_collections_by_database() {
        let keys: Vec<CollectionKey> = ["db.coll", "db.other", "db2.x"]
            .iter()
            .map(|k| k.parse().unwrap())
            .collect();
        let index = NavigationIndex::build(&keys);

        let expected: BTreeMap<String, BTreeSet<String>> = [
            ("db".to_string(), ["coll", "other"].iter().map(|s| s.to_string()).collect()),
            ("db2".to_string(), ["x"].iter().map(|s| s.to_string()).collect()),
        ]
        .into_iter()
        .collect();
        assert_eq!(index, NavigationIndex(expected));
        assert_eq!(index.databases().collect::<Vec<_>>(), vec!["db", "db2"]);
    }

    #[test]
    fn empty_registry_gives_empty_index() {
        assert!(NavigationIndex::build(&Vec::<CollectionKey>::new()).is_empty());
    }
}
