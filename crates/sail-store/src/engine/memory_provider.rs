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

use std::collections::HashMap;
use std::hash::{BuildHasherDefault, Hash};
use std::sync::RwLock;

use ahash::AHasher;

use super::{EngineResult, Provider, Timestamp};

type AHashMap<K, V> = HashMap<K, V, BuildHasherDefault<AHasher>>;

/// A `Provider` that keeps everything in an in-process `HashMap`. There is no
/// durable write-ahead log in scope here (no on-disk persistence is
/// specified); this is the reference backing store every `StatementStore`
/// uses. Hashed with `ahash`, matching the teacher's `tx_management`
/// indexes.
#[derive(Debug, Default)]
pub struct MemoryProvider<Domain, Codomain> {
    entries: RwLock<AHashMap<Domain, (Timestamp, Codomain)>>,
}

impl<Domain, Codomain> MemoryProvider<Domain, Codomain>
where
    Domain: Eq + Hash + Clone,
    Codomain: Clone,
{
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(AHashMap::default()),
        }
    }
}

impl<Domain, Codomain> Provider<Domain, Codomain> for MemoryProvider<Domain, Codomain>
where
    Domain: Eq + Hash + Clone + Send + Sync,
    Codomain: Clone + Send + Sync,
{
    fn get(&self, domain: &Domain) -> EngineResult<Option<(Timestamp, Codomain)>> {
        Ok(self.entries.read().unwrap().get(domain).cloned())
    }

    fn put(&self, ts: Timestamp, domain: Domain, codomain: Codomain) -> EngineResult<()> {
        self.entries.write().unwrap().insert(domain, (ts, codomain));
        Ok(())
    }

    fn del(&self, _ts: Timestamp, domain: &Domain) -> EngineResult<()> {
        self.entries.write().unwrap().remove(domain);
        Ok(())
    }

    fn scan(&self) -> EngineResult<Vec<(Timestamp, Domain, Codomain)>> {
        Ok(self
            .entries
            .read()
            .unwrap()
            .iter()
            .map(|(d, (ts, c))| (*ts, d.clone(), c.clone()))
            .collect())
    }

    fn len(&self) -> EngineResult<usize> {
        Ok(self.entries.read().unwrap().len())
    }
}
