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

use indexmap::IndexMap;

/// A single buffered mutation against one `Domain` key.
#[derive(Debug, Clone)]
pub enum Op<Codomain> {
    Upsert(Codomain),
    Delete,
}

/// The buffered writes a branch intends to commit into a `Relation`, keyed
/// by domain so a later write to the same key simply overwrites the earlier
/// one (last-writer-within-the-transaction wins) rather than both surviving.
/// Insertion order is preserved for deterministic replay and logging.
#[derive(Debug, Clone)]
pub struct WorkingSet<Domain, Codomain>
where
    Domain: Eq + Hash + Clone,
{
    ops: IndexMap<Domain, Op<Codomain>>,
}

impl<Domain, Codomain> WorkingSet<Domain, Codomain>
where
    Domain: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self { ops: IndexMap::new() }
    }

    pub fn upsert(&mut self, domain: Domain, value: Codomain) {
        self.ops.insert(domain, Op::Upsert(value));
    }

    pub fn delete(&mut self, domain: Domain) {
        self.ops.insert(domain, Op::Delete);
    }

    pub fn touched_domains(&self) -> impl Iterator<Item = &Domain> {
        self.ops.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Domain, &Op<Codomain>)> {
        self.ops.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }
}

impl<Domain, Codomain> Default for WorkingSet<Domain, Codomain>
where
    Domain: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<Domain, Codomain> IntoIterator for WorkingSet<Domain, Codomain>
where
    Domain: Eq + Hash + Clone,
{
    type Item = (Domain, Op<Codomain>);
    type IntoIter = indexmap::map::IntoIter<Domain, Op<Codomain>>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}
