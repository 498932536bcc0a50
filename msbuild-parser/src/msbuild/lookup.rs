//! Positional lookup over ranged entries
//!
//! [`PositionalLookup`] answers "which entry is the most specific one at this position"
//! for a set of closed ranges. Entries are arranged into a containment forest once; a query
//! then descends that forest with a binary search per level instead of scanning every entry.
//!
//! At each level the winner is the containing sibling that starts last. Two ranges that
//! touch at a single position both contain it, so a cursor at a boundary resolves to the
//! node that begins there. Among identical ranges the one added last is the more specific.
//!
//! [`PositionalLookup::scan_find`] keeps the linear formulation of the same rule around as
//! a reference. The two agree whenever any two ranges are nested, disjoint or touch at one
//! endpoint, which is what a well-formed syntax tree produces.

use crate::msbuild::text::{Position, Range};

#[derive(Debug, Clone, Default)]
struct Level {
    /// Entry indices sorted by start.
    members: Vec<usize>,
    /// Running maximum of the members' ends.
    reach: Vec<Position>,
}

impl Level {
    fn push(&mut self, member: usize, end: Position) {
        let reach = self.reach.last().map_or(end, |&last| last.max(end));
        self.members.push(member);
        self.reach.push(reach);
    }
}

#[derive(Debug, Clone)]
pub struct PositionalLookup<T> {
    /// One-based ranges, sorted by start ascending then end descending.
    entries: Vec<(Range, T)>,
    roots: Level,
    children: Vec<Level>,
}

impl<T> Default for PositionalLookup<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            roots: Level::default(),
            children: Vec::new(),
        }
    }
}

impl<T> PositionalLookup<T> {
    pub fn new(entries: impl IntoIterator<Item = (Range, T)>) -> Self {
        let mut entries: Vec<(usize, Range, T)> = entries
            .into_iter()
            .enumerate()
            .map(|(index, (range, value))| (index, range.to_one_based(), value))
            .collect();
        entries.sort_by(|(a_index, a, _), (b_index, b, _)| {
            a.start
                .cmp(&b.start)
                .then(b.end.cmp(&a.end))
                .then(a_index.cmp(b_index))
        });
        let entries: Vec<(Range, T)> = entries
            .into_iter()
            .map(|(_, range, value)| (range, value))
            .collect();

        let mut roots = Level::default();
        let mut children = vec![Level::default(); entries.len()];
        let mut open: Vec<usize> = Vec::new();
        for (index, (range, _)) in entries.iter().enumerate() {
            while let Some(&top) = open.last() {
                if entries[top].0.contains_range(range) {
                    break;
                }
                open.pop();
            }
            match open.last() {
                Some(&parent) => children[parent].push(index, range.end),
                None => roots.push(index, range.end),
            }
            open.push(index);
        }

        Self {
            entries,
            roots,
            children,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in start order; ranges are one-based.
    pub fn iter(&self) -> impl Iterator<Item = (&Range, &T)> {
        self.entries.iter().map(|(range, value)| (range, value))
    }

    /// The most specific entry containing `position`.
    pub fn find_entry(&self, position: Position) -> Option<(&Range, &T)> {
        let position = position.to_one_based();
        let mut level = &self.roots;
        let mut found = None;
        while let Some(index) = self.containing(level, position) {
            found = Some(index);
            level = &self.children[index];
        }
        found.map(|index| {
            let (range, value) = &self.entries[index];
            (range, value)
        })
    }

    pub fn find(&self, position: Position) -> Option<&T> {
        self.find_entry(position).map(|(_, value)| value)
    }

    /// The last-starting member of `level` that contains `position`.
    fn containing(&self, level: &Level, position: Position) -> Option<usize> {
        let upto = level
            .members
            .partition_point(|&member| self.entries[member].0.start <= position);
        (0..upto)
            .rev()
            .take_while(|&slot| level.reach[slot] >= position)
            .map(|slot| level.members[slot])
            .find(|&member| self.entries[member].0.contains(position))
    }

    /// Linear reference for [`PositionalLookup::find_entry`].
    pub fn scan_find(&self, position: Position) -> Option<(&Range, &T)> {
        let position = position.to_one_based();
        let mut order: Vec<usize> = (0..self.entries.len()).collect();
        order.sort_by(|&a, &b| self.entries[a].0.cmp(&self.entries[b].0).then(a.cmp(&b)));

        let mut best: Option<usize> = None;
        for index in order {
            let range = &self.entries[index].0;
            if range.start > position {
                continue;
            }
            let best_range = best.map(|best| self.entries[best].0);
            if let Some(best_range) = best_range {
                if range.end > best_range.end && !range.contains(position) {
                    break;
                }
            }
            if range.contains(position)
                && best_range.map_or(true, |best_range| {
                    best_range.contains_range(range) || range.start > best_range.start
                })
            {
                best = Some(index);
            }
        }
        best.map(|index| {
            let (range, value) = &self.entries[index];
            (range, value)
        })
    }
}

impl<T> FromIterator<(Range, T)> for PositionalLookup<T> {
    fn from_iter<I: IntoIterator<Item = (Range, T)>>(iter: I) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn span(start: usize, end: usize) -> Range {
        Range::new(Position::one_based(1, start), Position::one_based(1, end))
    }

    fn at(column: usize) -> Position {
        Position::one_based(1, column)
    }

    #[test]
    fn test_deepest_entry_wins() {
        let lookup = PositionalLookup::new([(span(1, 20), "outer"), (span(3, 8), "inner")]);

        assert_eq!(lookup.find(at(5)), Some(&"inner"));
        assert_eq!(lookup.find(at(10)), Some(&"outer"));
        assert_eq!(lookup.find(at(21)), None);
    }

    #[test]
    fn test_touching_siblings_prefer_the_later_one() {
        let lookup = PositionalLookup::new([
            (span(1, 20), "parent"),
            (span(2, 5), "first"),
            (span(5, 9), "second"),
        ]);

        assert_eq!(lookup.find(at(5)), Some(&"second"));
        assert_eq!(lookup.find(at(4)), Some(&"first"));
    }

    #[test]
    fn test_identical_ranges_prefer_the_last_added() {
        let lookup = PositionalLookup::new([(span(2, 6), 'a'), (span(2, 6), 'b')]);

        assert_eq!(lookup.find(at(4)), Some(&'b'));
        assert_eq!(lookup.scan_find(at(4)).map(|(_, value)| value), Some(&'b'));
    }

    #[test]
    fn test_zero_based_queries_are_normalised() {
        let lookup = PositionalLookup::new([(span(3, 8), ())]);

        assert!(lookup.find(Position::zero_based(0, 2)).is_some());
        assert!(lookup.find(Position::zero_based(0, 1)).is_none());
    }

    #[test]
    fn test_empty_lookup() {
        let lookup: PositionalLookup<()> = PositionalLookup::default();

        assert!(lookup.is_empty());
        assert_eq!(lookup.find(Position::ORIGIN), None);
    }

    /// Ranges where any two are nested, disjoint or touch at one endpoint.
    fn compatible(a: (usize, usize), b: (usize, usize)) -> bool {
        let nested = (a.0 <= b.0 && b.1 <= a.1) || (b.0 <= a.0 && a.1 <= b.1);
        let apart = a.1 <= b.0 || b.1 <= a.0;
        nested || apart
    }

    fn ranges_strategy() -> impl Strategy<Value = Vec<(usize, usize)>> {
        prop::collection::vec((1usize..60, 1usize..20), 0..40).prop_map(|candidates| {
            let mut accepted: Vec<(usize, usize)> = Vec::new();
            for (start, width) in candidates {
                let candidate = (start, start + width);
                if accepted.iter().all(|&other| compatible(candidate, other)) {
                    accepted.push(candidate);
                }
            }
            accepted
        })
    }

    proptest! {
        #[test]
        fn test_forest_agrees_with_scan(ranges in ranges_strategy()) {
            let lookup: PositionalLookup<usize> = ranges
                .iter()
                .enumerate()
                .map(|(index, &(start, end))| (span(start, end), index))
                .collect();

            for column in 1..=80 {
                let fast = lookup.find_entry(at(column)).map(|(range, value)| (*range, *value));
                let slow = lookup.scan_find(at(column)).map(|(range, value)| (*range, *value));
                prop_assert_eq!(fast, slow, "column {}", column);
            }
        }
    }
}
