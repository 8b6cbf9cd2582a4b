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
use std::sync::{Arc, RwLock};
use std::time::Duration;

use super::indexes::Index;
use super::relation_tx::{Op, WorkingSet};
use super::{EngineError, EngineResult, Provider, Timestamp};

const SLOW_COMMIT_THRESHOLD: Duration = Duration::from_secs(5);

/// A versioned key-value relation: an in-process `Index` cache in front of a
/// `Provider`. Reads go straight to the index; writes are validated and
/// applied through a `CheckRelation` so that every commit sees a consistent
/// view of "what has changed since I looked".
pub struct Relation<Domain, Codomain, P>
where
    Domain: Eq + Hash + Clone,
    Codomain: Clone,
    P: Provider<Domain, Codomain>,
{
    name: String,
    index: RwLock<Index<Domain, Codomain>>,
    provider: Arc<P>,
}

impl<Domain, Codomain, P> Relation<Domain, Codomain, P>
where
    Domain: Eq + Hash + Clone,
    Codomain: Clone,
    P: Provider<Domain, Codomain>,
{
    pub fn new(name: impl Into<String>, provider: Arc<P>) -> EngineResult<Self> {
        let mut index = Index::new();
        for (ts, domain, codomain) in provider.scan()? {
            index.insert(domain, ts, codomain);
        }
        Ok(Self {
            name: name.into(),
            index: RwLock::new(index),
            provider,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, domain: &Domain) -> Option<Codomain> {
        self.index.read().unwrap().get(domain).map(|(_, v)| v.clone())
    }

    pub fn contains(&self, domain: &Domain) -> bool {
        self.index.read().unwrap().contains(domain)
    }

    pub fn scan_all(&self) -> Vec<(Domain, Codomain)> {
        self.index
            .read()
            .unwrap()
            .iter()
            .map(|(d, _, c)| (d.clone(), c.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.index.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.read().unwrap().is_empty()
    }

    pub fn begin_check(&self) -> CheckRelation<'_, Domain, Codomain, P> {
        CheckRelation { relation: self }
    }
}

/// A one-shot commit handle. Construct it, validate a `WorkingSet` against a
/// transaction's fork timestamp, then apply — both steps under the same
/// write-lock acquisition so nothing can slip in between them.
pub struct CheckRelation<'a, Domain, Codomain, P>
where
    Domain: Eq + Hash + Clone,
    Codomain: Clone,
    P: Provider<Domain, Codomain>,
{
    relation: &'a Relation<Domain, Codomain, P>,
}

impl<Domain, Codomain, P> CheckRelation<'_, Domain, Codomain, P>
where
    Domain: Eq + Hash + Clone,
    Codomain: Clone,
    P: Provider<Domain, Codomain>,
{
    /// Optimistic pre-check, without holding the write lock: conflict if any
    /// touched key has been written at a timestamp newer than `fork_ts`.
    /// Used by `prepare()` to fail fast; `check_and_apply` re-validates under
    /// the write lock so a stale pre-check can never let a conflict through.
    pub fn check(&self, fork_ts: Timestamp, working_set: &WorkingSet<Domain, Codomain>) -> EngineResult<()> {
        let index = self.relation.index.read().unwrap();
        for domain in working_set.touched_domains() {
            if let Some((ts, _)) = index.get(domain) {
                if ts > fork_ts {
                    return Err(EngineError::Conflict);
                }
            }
        }
        Ok(())
    }

    pub fn check_and_apply(
        &self,
        fork_ts: Timestamp,
        commit_ts: Timestamp,
        working_set: WorkingSet<Domain, Codomain>,
    ) -> EngineResult<()> {
        let start = minstant::Instant::now();
        let mut index = self.relation.index.write().unwrap();
        for domain in working_set.touched_domains() {
            if let Some((ts, _)) = index.get(domain) {
                if ts > fork_ts {
                    return Err(EngineError::Conflict);
                }
            }
        }
        for (domain, op) in working_set.into_iter() {
            match op {
                Op::Upsert(value) => {
                    index.insert(domain.clone(), commit_ts, value.clone());
                    self.relation.provider.put(commit_ts, domain, value)?;
                }
                Op::Delete => {
                    index.remove(&domain);
                    self.relation.provider.del(commit_ts, &domain)?;
                }
            }
        }
        drop(index);
        let elapsed = start.elapsed();
        if elapsed > SLOW_COMMIT_THRESHOLD {
            tracing::warn!(
                relation = self.relation.name,
                elapsed_ms = elapsed.as_millis() as u64,
                "relation commit held the write lock unusually long"
            );
        }
        Ok(())
    }
}
