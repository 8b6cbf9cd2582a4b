// Copyright (C) 2025 The Sail Authors
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use std::hash::Hash;

use super::Timestamp;

/// A single cached entry: the timestamp it was last written at, and its
/// current value. A tombstone is represented by absence from the map, not a
/// sentinel value, so `Codomain` never needs a "deleted" variant.
#[derive(Debug, Clone)]
struct Entry<Codomain> {
    ts: Timestamp,
    value: Codomain,
}

/// The in-process cache backing a `Relation`. Built on `im::HashMap` so that
/// forking a relation for a new transaction (or a branch-of-branch) is O(1)
/// structural sharing rather than a deep copy.
#[derive(Debug, Clone)]
pub struct Index<Domain, Codomain>
where
    Domain: Eq + Hash + Clone,
    Codomain: Clone,
{
    entries: im::HashMap<Domain, Entry<Codomain>>,
}

impl<Domain, Codomain> Index<Domain, Codomain>
where
    Domain: Eq + Hash + Clone,
    Codomain: Clone,
{
    pub fn new() -> Self {
        Self {
            entries: im::HashMap::new(),
        }
    }

    pub fn get(&self, domain: &Domain) -> Option<(Timestamp, &Codomain)> {
        self.entries.get(domain).map(|e| (e.ts, &e.value))
    }

    pub fn insert(&mut self, domain: Domain, ts: Timestamp, value: Codomain) {
        self.entries.insert(domain, Entry { ts, value });
    }

    pub fn remove(&mut self, domain: &Domain) -> Option<Timestamp> {
        self.entries.remove(domain).map(|e| e.ts)
    }

    pub fn contains(&self, domain: &Domain) -> bool {
        self.entries.contains_key(domain)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Domain, Timestamp, &Codomain)> {
        self.entries.iter().map(|(d, e)| (d, e.ts, &e.value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<Domain, Codomain> Default for Index<Domain, Codomain>
where
    Domain: Eq + Hash + Clone,
    Codomain: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
