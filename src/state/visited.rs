use crate::storage::Record;
use crate::url::LocationId;
use std::collections::HashSet;

/// Locations that already have a stored record
///
/// The set is only ever rebuilt from the record store and then grown by the
/// coordinator after each successful flush, so it always equals the set of
/// stored record locations.
#[derive(Debug, Default)]
pub struct VisitedSet {
    locations: HashSet<LocationId>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives the visited set from previously stored records
    pub fn from_records(records: &[Record]) -> Self {
        Self {
            locations: records.iter().map(|r| r.location.clone()).collect(),
        }
    }

    pub fn contains(&self, location: &LocationId) -> bool {
        self.locations.contains(location)
    }

    /// Marks a location visited; returns false if it already was
    pub fn mark(&mut self, location: LocationId) -> bool {
        self.locations.insert(location)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LocationId> {
        self.locations.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn record(url: &str) -> Record {
        Record {
            location: LocationId::parse(url).unwrap(),
            title: "T".to_string(),
            body: String::new(),
            outgoing: BTreeSet::new(),
            provenance_timestamp: None,
        }
    }

    #[test]
    fn test_from_records() {
        let visited = VisitedSet::from_records(&[
            record("https://a.org/wiki/A"),
            record("https://a.org/wiki/B"),
        ]);

        assert_eq!(visited.len(), 2);
        assert!(visited.contains(&LocationId::parse("https://a.org/wiki/A").unwrap()));
        assert!(!visited.contains(&LocationId::parse("https://a.org/wiki/C").unwrap()));
    }

    #[test]
    fn test_mark_is_check_and_set() {
        let mut visited = VisitedSet::new();
        let a = LocationId::parse("https://a.org/wiki/A").unwrap();

        assert!(visited.mark(a.clone()));
        assert!(!visited.mark(a));
        assert_eq!(visited.len(), 1);
    }
}
