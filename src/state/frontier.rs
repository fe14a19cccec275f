use crate::url::LocationId;
use std::collections::HashSet;

/// Locations discovered but not yet processed
///
/// The frontier is a plain set: adding a location twice is a no-op and
/// [`Frontier::take_one`] hands out an arbitrary member. There is no
/// traversal order to rely on, breadth-first or otherwise.
///
/// `take_one` needs `&mut self`, so only the owner can remove entries and no
/// two callers can receive the same location.
#[derive(Debug, Default)]
pub struct Frontier {
    pending: HashSet<LocationId>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts every location not already pending; returns how many were new
    pub fn add<I>(&mut self, locations: I) -> usize
    where
        I: IntoIterator<Item = LocationId>,
    {
        locations
            .into_iter()
            .filter(|location| self.pending.insert(location.clone()))
            .count()
    }

    /// Inserts a single location; returns false if it was already pending
    pub fn insert(&mut self, location: LocationId) -> bool {
        self.pending.insert(location)
    }

    /// Removes and returns an arbitrary pending location
    pub fn take_one(&mut self) -> Option<LocationId> {
        let next = self.pending.iter().next()?.clone();
        self.pending.remove(&next);
        Some(next)
    }

    pub fn contains(&self, location: &LocationId) -> bool {
        self.pending.contains(location)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn loc(path: &str) -> LocationId {
        LocationId::parse(&format!("https://a.org{}", path)).unwrap()
    }

    #[test]
    fn test_new_frontier_is_empty() {
        let mut frontier = Frontier::new();
        assert!(frontier.is_empty());
        assert_eq!(frontier.take_one(), None);
    }

    #[test]
    fn test_add_ignores_duplicates() {
        let mut frontier = Frontier::new();

        let added = frontier.add([loc("/wiki/A"), loc("/wiki/B"), loc("/wiki/A")]);
        assert_eq!(added, 2);
        assert_eq!(frontier.len(), 2);

        assert!(!frontier.insert(loc("/wiki/B")));
        assert_eq!(frontier.len(), 2);
    }

    #[test]
    fn test_take_one_drains_each_member_once() {
        let mut frontier = Frontier::new();
        frontier.add([loc("/wiki/A"), loc("/wiki/B"), loc("/wiki/C")]);

        let mut taken = HashSet::new();
        while let Some(next) = frontier.take_one() {
            assert!(!frontier.contains(&next));
            assert!(taken.insert(next), "location handed out twice");
        }

        assert_eq!(taken.len(), 3);
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_taken_location_can_be_re_added() {
        let mut frontier = Frontier::new();
        frontier.insert(loc("/wiki/A"));
        let a = frontier.take_one().unwrap();

        assert!(frontier.insert(a));
        assert_eq!(frontier.len(), 1);
    }
}
