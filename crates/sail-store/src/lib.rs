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

//! The transactional statement storage layer: a layered SailStore /
//! SailSource / SailSink / SailDataset model providing snapshot and
//! serializable isolation over an in-memory RDF triple/quad set via
//! branching change-set overlays.
//!
//! Generalizes the teacher's `tx_management` optimistic-concurrency engine
//! (`Domain`/`Codomain` key-value provider + first-committer-wins relation)
//! from object/attribute storage to an RDF statement set, and its
//! `DbWorldState`/`WorldStateTransaction` transaction lifecycle to the
//! explicit/inferred dual-graph `Connection` façade.

mod branch;
mod change_set;
mod config;
mod connection;
mod dataset;
mod engine;
mod interlock;
mod leak;
mod merge;
mod notify;
mod sink;
mod store;

pub use config::StoreConfig;
pub use connection::{Connection, UpdateContext};
pub use dataset::{SailDataset, VecStatementCursor};
pub use engine::{EngineError, EngineResult, Timestamp, Tx};
pub use interlock::Interlock;
pub use leak::LeakTracker;
pub use notify::{ChangeListener, Notifier};
pub use sink::SailSink;
pub use store::StatementStore;

pub use branch::SailSource;

pub use sail_model::{
    ContextFilter, IsolationLevel, Namespace, SailError, SailResult, Statement, StatementCursor, StatementPattern,
    Statistics, TripleSource,
};
pub use sail_value::{BlankNode, BlankOrigin, Iri, Literal, OriginValueFactory, Resource, Value, ValueFactory};
