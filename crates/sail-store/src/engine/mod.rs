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

//! A generic versioned key-value cache over a pluggable `Provider`, used by
//! `sail_store::store::StatementStore` for its two statement relations
//! (explicit, inferred) and its namespace relation. Reads are scoped to a
//! fixed `Timestamp` for repeatable-read visibility; writes are buffered
//! per-transaction and validated for write-write conflicts at commit time.
//!
//! This is deliberately domain-agnostic: `Domain`/`Codomain` are generic so
//! the same machinery backs `Relation<Statement, ()>` (a presence-only set)
//! and `Relation<Arc<str>, Iri>` (the namespace table) without duplication.

mod indexes;
mod memory_provider;
mod relation;
mod relation_tx;

pub use indexes::Index;
pub use memory_provider::MemoryProvider;
pub use relation::{CheckRelation, Relation};
pub use relation_tx::{Op, WorkingSet};

use std::fmt;

/// A monotonically increasing logical clock value. The store hands out one
/// per transaction; ordering between timestamps is the sole source of truth
/// for "happened before".
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Timestamp(pub u64);

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ts#{}", self.0)
    }
}

/// The transaction handle threaded through a `Relation` when starting a
/// `RelationTransaction`: fixes the timestamp reads are scoped to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Tx {
    pub ts: Timestamp,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("write-write conflict on this relation")]
    Conflict,
    #[error("provider retrieval failure: {0}")]
    Retrieval(String),
    #[error("provider storage failure: {0}")]
    Storage(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// The backing store behind a `Relation`: durable (or, for this crate's
/// in-memory reference implementation, simply shared) storage that the
/// in-process `Index` is a cache over.
pub trait Provider<Domain, Codomain>: Send + Sync {
    fn get(&self, domain: &Domain) -> EngineResult<Option<(Timestamp, Codomain)>>;

    fn put(&self, ts: Timestamp, domain: Domain, codomain: Codomain) -> EngineResult<()>;

    fn del(&self, ts: Timestamp, domain: &Domain) -> EngineResult<()>;

    fn scan(&self) -> EngineResult<Vec<(Timestamp, Domain, Codomain)>>;

    fn len(&self) -> EngineResult<usize>;
}
