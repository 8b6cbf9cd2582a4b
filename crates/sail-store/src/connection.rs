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

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use sail_model::{ContextFilter, IsolationLevel, Namespace, SailError, SailResult, Statement};
use sail_value::{BlankOrigin, Iri, Resource};

use crate::branch::SailSource;
use crate::config::StoreConfig;
use crate::dataset::SailDataset;
use crate::interlock::Interlock;
use crate::leak::LeakTracker;
use crate::notify::{ChangeListener, Notifier};
use crate::sink::SailSink;
use crate::store::StatementStore;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// A named scope for a group of writes (e.g. one SPARQL UPDATE request's
/// worth of operations). Bookkeeping only — every operation issued under an
/// `UpdateContext` still buffers into the connection's ordinary sinks; the
/// id is there for callers that need to correlate log lines or a later
/// partial rollback feature with the request that produced them.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct UpdateContext(pub u64);

/// The client-facing façade: negotiates isolation, forks the explicit and
/// inferred branch trees for one logical transaction, buffers writes, and
/// composes reads across both trees. Grounded on the teacher's
/// `WorldStateTransaction`/`DbWorldState` shape — one object per logical
/// transaction, `begin`/`commit`/`rollback` state machine, monotonic
/// transaction id minted the way `MoorDB::start_transaction` mints `Tx{ts}`.
pub struct Connection {
    id: u64,
    store: Arc<StatementStore>,
    config: StoreConfig,
    level: IsolationLevel,
    explicit: Option<SailSource>,
    inferred: Option<SailSource>,
    explicit_sink: Option<SailSink>,
    inferred_sink: Option<SailSink>,
    pending_ops: usize,
    next_update_context: u64,
    notifier: Notifier,
    leaks: Arc<LeakTracker>,
    interlock: Interlock,
    open_iterations: usize,
}

impl Connection {
    pub fn new(store: Arc<StatementStore>, config: StoreConfig) -> Self {
        let id = NEXT_CONNECTION_ID.fetch_add(1, Ordering::SeqCst);
        let leaks = Arc::new(LeakTracker::new(config.track_resource_sites));
        let level = config.default_isolation_level;
        Self {
            id,
            store,
            config,
            level,
            explicit: None,
            inferred: None,
            explicit_sink: None,
            inferred_sink: None,
            pending_ops: 0,
            next_update_context: 1,
            notifier: Notifier::new(),
            leaks,
            interlock: Interlock::new(),
            open_iterations: 0,
        }
    }

    pub fn subscribe(&self, listener: Arc<dyn ChangeListener>) {
        self.notifier.subscribe(listener);
    }

    pub fn is_active(&self) -> bool {
        self.explicit.is_some()
    }

    pub fn isolation_level(&self) -> IsolationLevel {
        self.level
    }

    fn origin(&self) -> BlankOrigin {
        BlankOrigin(self.id)
    }

    /// Negotiates `requested` against the store's supported levels, forks
    /// both branch trees at the negotiated level, and opens buffered sinks
    /// over them. Below `ReadCommitted`, writes still go through a branch —
    /// a branch of exactly one auto-flushed operation each — so the rest of
    /// the connection's machinery doesn't need a separate direct-write path.
    pub fn begin(&mut self, requested: IsolationLevel) -> SailResult<IsolationLevel> {
        if self.is_active() {
            return Err(SailError::usage("connection already has an active transaction"));
        }
        let negotiated = IsolationLevel::negotiate(requested, &self.config.supported_isolation_levels)
            .ok_or_else(|| SailError::usage("no supported isolation level satisfies the request"))?;
        self.level = negotiated;
        let explicit = self.store.explicit_source().fork();
        let inferred = self.store.inferred_source().fork();
        self.explicit_sink = Some(SailSink::new(explicit.clone(), negotiated));
        self.inferred_sink = Some(SailSink::new(inferred.clone(), negotiated));
        self.explicit = Some(explicit);
        self.inferred = Some(inferred);
        self.pending_ops = 0;
        Ok(negotiated)
    }

    fn require_active(&mut self) -> SailResult<()> {
        if !self.is_active() {
            return Err(SailError::usage("no active transaction; call begin() first"));
        }
        Ok(())
    }

    fn maybe_auto_flush(&mut self) -> SailResult<()> {
        self.pending_ops += 1;
        if self.level == IsolationLevel::None || self.pending_ops >= self.config.auto_flush_block_size {
            self.flush_sinks()?;
            self.pending_ops = 0;
        }
        Ok(())
    }

    fn flush_sinks(&mut self) -> SailResult<()> {
        if let Some(sink) = &mut self.explicit_sink {
            sink.flush()?;
        }
        if let Some(sink) = &mut self.inferred_sink {
            sink.flush()?;
        }
        Ok(())
    }

    pub fn add_statement(&mut self, statement: Statement) -> SailResult<()> {
        self.require_active()?;
        self.explicit_sink.as_mut().expect("active").approve(statement)?;
        self.maybe_auto_flush()
    }

    /// Adds a reasoner-derived statement. Idempotent against both graphs: a
    /// fact already asserted explicitly, or already inferred, is never
    /// duplicated. Returns whether the inferred graph actually changed, so a
    /// reasoner can tell "already knew that" from "learned something new"
    /// without a separate query.
    pub fn add_inferred_statement(&mut self, statement: Statement) -> SailResult<bool> {
        self.require_active()?;
        if self.source_contains(self.explicit.as_ref().expect("active"), &statement)?
            || self.source_contains(self.inferred.as_ref().expect("active"), &statement)?
        {
            return Ok(false);
        }
        self.inferred_sink.as_mut().expect("active").approve(statement.clone())?;
        self.maybe_auto_flush()?;
        self.notifier.notify_inferred_added(&statement);
        Ok(true)
    }

    fn source_contains(&self, source: &SailSource, statement: &Statement) -> SailResult<bool> {
        let dataset = SailDataset::new(source.clone(), self.level, self.origin());
        let pattern = sail_model::StatementPattern::new(
            Some(statement.subject.clone()),
            Some(statement.predicate.clone()),
            Some(statement.object.clone()),
            statement
                .context
                .clone()
                .map(|c| ContextFilter::one_of(vec![Some(c)]))
                .unwrap_or(ContextFilter::DefaultGraphOnly),
        );
        Ok(!dataset
            .statements(
                pattern.subject.as_ref(),
                pattern.predicate.as_ref(),
                pattern.object.as_ref(),
                pattern.contexts,
            )?
            .is_empty())
    }

    /// Removes every statement matching the pattern from both the explicit
    /// and inferred graphs, returning how many were found.
    pub fn remove_statements(
        &mut self,
        subject: Option<&Resource>,
        predicate: Option<&Iri>,
        object: Option<&sail_value::Value>,
        contexts: ContextFilter,
    ) -> SailResult<u64> {
        self.require_active()?;
        let matches = self.statements(subject, predicate, object, contexts, true)?;
        let count = matches.len() as u64;
        for stmt in matches {
            self.explicit_sink.as_mut().expect("active").deprecate(stmt.clone())?;
            self.inferred_sink.as_mut().expect("active").deprecate(stmt)?;
        }
        self.pending_ops += 1;
        if self.pending_ops >= self.config.auto_flush_block_size {
            self.flush_sinks()?;
            self.pending_ops = 0;
        }
        Ok(count)
    }

    pub fn clear(&mut self, contexts: &[Resource]) -> SailResult<()> {
        self.require_active()?;
        self.explicit_sink.as_mut().expect("active").clear(contexts)?;
        self.inferred_sink.as_mut().expect("active").clear(contexts)?;
        self.maybe_auto_flush()
    }

    pub fn set_namespace(&mut self, prefix: impl Into<Arc<str>>, name: Iri) -> SailResult<()> {
        self.require_active()?;
        self.explicit_sink.as_mut().expect("active").set_namespace(prefix.into(), name)?;
        self.maybe_auto_flush()
    }

    pub fn remove_namespace(&mut self, prefix: &str) -> SailResult<()> {
        self.require_active()?;
        self.explicit_sink.as_mut().expect("active").remove_namespace(prefix)?;
        self.maybe_auto_flush()
    }

    pub fn clear_namespaces(&mut self) -> SailResult<()> {
        self.require_active()?;
        self.explicit_sink.as_mut().expect("active").clear_namespaces()?;
        self.maybe_auto_flush()
    }

    pub fn namespaces(&self) -> SailResult<Vec<Namespace>> {
        let explicit = self.explicit.as_ref().ok_or_else(|| SailError::usage("no active transaction"))?;
        SailDataset::new(explicit.clone(), self.level, self.origin()).namespaces()
    }

    pub fn namespace(&self, prefix: &str) -> SailResult<Option<Iri>> {
        let explicit = self.explicit.as_ref().ok_or_else(|| SailError::usage("no active transaction"))?;
        SailDataset::new(explicit.clone(), self.level, self.origin()).namespace(prefix)
    }

    /// Reads statements, unioning the explicit graph with the inferred
    /// graph when `include_inferred` is set (the composition point the
    /// spec calls out: "explicit/inferred dual-branch composition").
    pub fn statements(
        &mut self,
        subject: Option<&Resource>,
        predicate: Option<&Iri>,
        object: Option<&sail_value::Value>,
        contexts: ContextFilter,
        include_inferred: bool,
    ) -> SailResult<Vec<Statement>> {
        self.require_active()?;
        if self.level.requires_observations() {
            let pattern = sail_model::StatementPattern::new(
                subject.cloned(),
                predicate.cloned(),
                object.cloned(),
                contexts.clone(),
            );
            self.explicit_sink.as_mut().expect("active").observe(pattern.clone())?;
            if include_inferred {
                self.inferred_sink.as_mut().expect("active").observe(pattern)?;
            }
        }
        let explicit = self.explicit.as_ref().expect("active");
        let mut dataset = SailDataset::new(explicit.clone(), self.level, self.origin());
        let handle = self.leaks.track("dataset", format!("connection#{} explicit read", self.id));
        let mut results = dataset.statements(subject, predicate, object, contexts.clone())?;
        dataset.close();
        self.leaks.release(handle);

        if include_inferred {
            let inferred = self.inferred.as_ref().expect("active");
            let mut inferred_dataset = SailDataset::new(inferred.clone(), self.level, self.origin());
            let handle = self.leaks.track("dataset", format!("connection#{} inferred read", self.id));
            let inferred_results = inferred_dataset.statements(subject, predicate, object, contexts)?;
            inferred_dataset.close();
            self.leaks.release(handle);
            let seen: std::collections::HashSet<_> = results.iter().cloned().collect();
            for stmt in inferred_results {
                if !seen.contains(&stmt) {
                    results.push(stmt);
                }
            }
        }
        Ok(results)
    }

    pub fn begin_update_context(&mut self) -> UpdateContext {
        let id = self.next_update_context;
        self.next_update_context += 1;
        UpdateContext(id)
    }

    /// Runs conflict detection on both branches and, if it passes, transfers
    /// their accumulated change-sets into the store.
    pub fn commit(&mut self) -> SailResult<()> {
        self.require_active()?;
        self.flush_sinks()?;
        self.teardown();
        Ok(())
    }

    /// Discards every buffered write without making it visible anywhere.
    pub fn rollback(&mut self) -> SailResult<()> {
        self.require_active()?;
        self.teardown();
        Ok(())
    }

    fn teardown(&mut self) {
        if let Some(sink) = &mut self.explicit_sink {
            sink.close();
        }
        if let Some(sink) = &mut self.inferred_sink {
            sink.close();
        }
        self.explicit_sink = None;
        self.inferred_sink = None;
        if let Some(source) = self.explicit.take() {
            source.release();
        }
        if let Some(source) = self.inferred.take() {
            source.release();
        }
        self.pending_ops = 0;
    }

    pub fn close(&mut self) -> SailResult<()> {
        if self.is_active() {
            self.rollback()?;
        }
        self.interlock.release_all();
        Ok(())
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
