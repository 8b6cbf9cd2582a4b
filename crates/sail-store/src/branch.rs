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

//! `SourceRoot` (the store-backed bottom of a source tree) and `SourceBranch`
//! (a forked overlay, itself forkable). There is no teacher counterpart for
//! branching change-set overlays as such; this module is authored fresh, in
//! the idiom the teacher uses elsewhere (`Arc<RwLock<_>>` caches, a
//! per-source commit mutex serializing flush the way `MoorDB` serializes
//! commits through a single processing thread).

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use sail_model::{IsolationLevel, SailError, SailResult, Statement, StatementPattern};
use sail_value::Iri;

use crate::change_set::ChangeSet;
use crate::engine::{self, MemoryProvider, Relation, Timestamp};

/// Decides, for one source node, how much of *that node's own* committed
/// history to expose: `None` means "whatever is committed right now" (read
/// committed/uncommitted — non-repeatable); `Some(n)` freezes the view to
/// the first `n` entries of that node's own prepend list (snapshot-read and
/// stronger).
///
/// A source tree has one node per branch plus the root; each node keeps its
/// own prepend list, so one global watermark taken from the leaf cannot be
/// reused at every ancestor (a freshly forked branch's own prepend list is
/// empty regardless of how much history its parent already holds). `parent`
/// recursively carries the equivalent scope for this node's parent, frozen
/// at the same instant, so every node in the chain is scoped to its own
/// watermark.
#[derive(Debug, Clone)]
pub(crate) struct ReadScope {
    pub(crate) level: IsolationLevel,
    pub(crate) frozen_prepend_upto: Option<usize>,
    parent: Option<Arc<ReadScope>>,
}

impl ReadScope {
    fn new(level: IsolationLevel, own_prepend_len: usize, parent: Option<ReadScope>) -> Self {
        Self {
            level,
            frozen_prepend_upto: if level.is_repeatable_read() {
                Some(own_prepend_len)
            } else {
                None
            },
            parent: parent.map(Arc::new),
        }
    }

    /// The scope to use when resolving this node's parent: the parent's own
    /// frozen scope, built at the same moment as this one.
    fn for_parent(&self) -> ReadScope {
        match &self.parent {
            Some(p) => p.as_ref().clone(),
            None => ReadScope {
                level: self.level,
                frozen_prepend_upto: None,
                parent: None,
            },
        }
    }
}

type StatementRelation = Relation<Statement, (), MemoryProvider<Statement, ()>>;
type NamespaceRelation = Relation<Arc<str>, Iri, MemoryProvider<Arc<str>, Iri>>;

/// The bottom of a source tree: backed directly by the store's versioned
/// relations. `label` is either `"explicit"` or `"inferred"` — purely for
/// tracing.
pub struct SourceRoot {
    pub(crate) label: &'static str,
    pub(crate) statements: StatementRelation,
    /// Namespace bindings live only on the explicit root; see DESIGN.md for
    /// why the inferred root's namespace edits are always a no-op.
    pub(crate) namespaces: Option<NamespaceRelation>,
    pub(crate) clock: Arc<AtomicU64>,
    pub(crate) prepend_list: RwLock<Vec<Arc<ChangeSet>>>,
    pub(crate) commit_mutex: Mutex<()>,
}

impl SourceRoot {
    pub fn new(label: &'static str, clock: Arc<AtomicU64>, with_namespaces: bool) -> SailResult<Arc<Self>> {
        let statements = StatementRelation::new(label, Arc::new(MemoryProvider::new()))
            .map_err(|e| SailError::store_io(e))?;
        let namespaces = if with_namespaces {
            Some(
                NamespaceRelation::new("namespaces", Arc::new(MemoryProvider::new()))
                    .map_err(|e| SailError::store_io(e))?,
            )
        } else {
            None
        };
        Ok(Arc::new(Self {
            label,
            statements,
            namespaces,
            clock,
            prepend_list: RwLock::new(Vec::new()),
            commit_mutex: Mutex::new(()),
        }))
    }

    fn next_ts(&self) -> Timestamp {
        Timestamp(self.clock.fetch_add(1, Ordering::SeqCst))
    }

    fn prepend_len(&self) -> usize {
        self.prepend_list.read().unwrap().len()
    }

    pub(crate) fn resolve_statements(&self, pattern: &StatementPattern, scope: ReadScope) -> Vec<Statement> {
        match scope.frozen_prepend_upto {
            None => self
                .statements
                .scan_all()
                .into_iter()
                .map(|(s, _)| s)
                .filter(|s| pattern.matches(s))
                .collect(),
            Some(upto) => {
                let history = self.prepend_list.read().unwrap();
                replay_statements(&history, upto)
                    .into_iter()
                    .filter(|s| pattern.matches(s))
                    .collect()
            }
        }
    }

    pub(crate) fn resolve_namespace(&self, prefix: &str, scope: ReadScope) -> Option<Iri> {
        let Some(relation) = &self.namespaces else {
            return None;
        };
        match scope.frozen_prepend_upto {
            None => relation.get(&Arc::from(prefix)),
            Some(upto) => {
                let history = self.prepend_list.read().unwrap();
                replay_namespaces(&history, upto).get(prefix).cloned()
            }
        }
    }

    pub(crate) fn resolve_namespaces(&self, scope: ReadScope) -> Vec<(Arc<str>, Iri)> {
        let Some(relation) = &self.namespaces else {
            return Vec::new();
        };
        match scope.frozen_prepend_upto {
            None => relation.scan_all(),
            Some(upto) => {
                let history = self.prepend_list.read().unwrap();
                replay_namespaces(&history, upto).into_iter().collect()
            }
        }
    }

    /// Validates `change_set` against this root's current committed state
    /// without mutating anything — the fast-fail half of `prepare()`.
    pub(crate) fn precheck(&self, fork_ts: Timestamp, change_set: &ChangeSet) -> SailResult<()> {
        let ws = statement_working_set(&self.statements, change_set);
        self.statements
            .begin_check()
            .check(fork_ts, &ws)
            .map_err(conflict_or_io)?;
        if let Some(relation) = &self.namespaces {
            let ws = namespace_working_set(relation, change_set);
            relation.begin_check().check(fork_ts, &ws).map_err(conflict_or_io)?;
        }
        Ok(())
    }

    /// Commits `change_set` into this root's relations and appends it to the
    /// prepend list, atomically under the commit mutex.
    pub(crate) fn apply(&self, fork_ts: Timestamp, change_set: ChangeSet) -> SailResult<()> {
        let _guard = self.commit_mutex.lock().unwrap();
        let commit_ts = self.next_ts();
        let statement_ws = statement_working_set(&self.statements, &change_set);
        self.statements
            .begin_check()
            .check_and_apply(fork_ts, commit_ts, statement_ws)
            .map_err(conflict_or_io)?;
        if let Some(relation) = &self.namespaces {
            let ns_ws = namespace_working_set(relation, &change_set);
            relation
                .begin_check()
                .check_and_apply(fork_ts, commit_ts, ns_ws)
                .map_err(conflict_or_io)?;
        }
        self.prepend_list.write().unwrap().push(Arc::new(change_set));
        Ok(())
    }
}

fn conflict_or_io(err: engine::EngineError) -> SailError {
    match err {
        engine::EngineError::Conflict => SailError::Conflict,
        other => SailError::store_io(other),
    }
}

fn statement_working_set(
    relation: &StatementRelation,
    change_set: &ChangeSet,
) -> engine::WorkingSet<Statement, ()> {
    let mut ws = engine::WorkingSet::new();
    if change_set.statement_cleared() {
        for (stmt, _) in relation.scan_all() {
            ws.delete(stmt);
        }
    } else if !change_set.deprecated_contexts().is_empty() {
        for (stmt, _) in relation.scan_all() {
            if let Some(ctx) = stmt.context.as_ref() {
                if change_set.deprecated_contexts().contains(ctx) {
                    ws.delete(stmt);
                }
            }
        }
    }
    for stmt in change_set.deprecated().iter() {
        ws.delete(stmt.clone());
    }
    for stmt in change_set.approved().iter() {
        ws.upsert(stmt.clone(), ());
    }
    ws
}

fn namespace_working_set(relation: &NamespaceRelation, change_set: &ChangeSet) -> engine::WorkingSet<Arc<str>, Iri> {
    let mut ws = engine::WorkingSet::new();
    if change_set.namespace_cleared() {
        for (prefix, _) in relation.scan_all() {
            ws.delete(prefix);
        }
    }
    for prefix in change_set.removed_prefixes().iter() {
        ws.delete(prefix.clone());
    }
    for (prefix, name) in change_set.added_namespaces().iter() {
        ws.upsert(prefix.clone(), name.clone());
    }
    ws
}

fn replay_statements(history: &[Arc<ChangeSet>], upto: usize) -> im::HashSet<Statement> {
    let mut live: im::HashSet<Statement> = im::HashSet::new();
    for change_set in history.iter().take(upto) {
        if change_set.statement_cleared() {
            live = im::HashSet::new();
        } else if !change_set.deprecated_contexts().is_empty() {
            live = live
                .into_iter()
                .filter(|s| match s.context.as_ref() {
                    Some(ctx) => !change_set.deprecated_contexts().contains(ctx),
                    None => true,
                })
                .collect();
        }
        for stmt in change_set.deprecated().iter() {
            live.remove(stmt);
        }
        for stmt in change_set.approved().iter() {
            live.insert(stmt.clone());
        }
    }
    live
}

fn replay_namespaces(history: &[Arc<ChangeSet>], upto: usize) -> im::HashMap<Arc<str>, Iri> {
    let mut live: im::HashMap<Arc<str>, Iri> = im::HashMap::new();
    for change_set in history.iter().take(upto) {
        if change_set.namespace_cleared() {
            live = im::HashMap::new();
        }
        for prefix in change_set.removed_prefixes().iter() {
            live.remove(prefix);
        }
        for (prefix, name) in change_set.added_namespaces().iter() {
            live.insert(prefix.clone(), name.clone());
        }
    }
    live
}

/// A forked overlay over a parent `SailSource`. May itself be forked,
/// forming a tree; reads recursively merge every ancestor's contribution
/// on the way down per `crate::merge`.
pub struct SourceBranch {
    pub(crate) parent: SailSource,
    pub(crate) own_changes: RwLock<ChangeSet>,
    pub(crate) prepend_list: RwLock<Vec<Arc<ChangeSet>>>,
    /// The read horizon this branch validates against. Advances after every
    /// successful `flush()` so a later auto-flushed block within the same
    /// logical transaction never conflicts with a block it already
    /// committed itself.
    pub(crate) fork_ts: RwLock<Timestamp>,
    pub(crate) fork_watermark: std::sync::atomic::AtomicUsize,
    pub(crate) commit_mutex: Mutex<()>,
    pub(crate) active: AtomicBool,
}

impl SourceBranch {
    fn prepend_len(&self) -> usize {
        self.prepend_list.read().unwrap().len()
    }

    fn fork_ts(&self) -> Timestamp {
        *self.fork_ts.read().unwrap()
    }

    fn fork_watermark(&self) -> usize {
        self.fork_watermark.load(Ordering::SeqCst)
    }

    pub(crate) fn resolve_statements(&self, pattern: &StatementPattern, scope: ReadScope, is_self: bool) -> Vec<Statement> {
        let mut out = self
            .parent
            .resolve_statements_for_ancestor(pattern, scope.for_parent());
        let local_cs = self.own_changes.read().unwrap();
        let own_as_of = replay_own_layer(&self.prepend_list.read().unwrap(), scope.frozen_prepend_upto);
        let merged = crate::merge::MergedStatements::new(pattern.clone(), out.drain(..), &own_as_of);
        out = merged.collect();
        if is_self || scope.level == IsolationLevel::ReadUncommitted {
            let merged = crate::merge::MergedStatements::new(pattern.clone(), out.drain(..), &local_cs);
            out = merged.collect();
        }
        out
    }

    fn resolve_statements_for_ancestor(&self, pattern: &StatementPattern, scope: ReadScope) -> Vec<Statement> {
        self.resolve_statements(pattern, scope, false)
    }
}

fn replay_own_layer(prepend_list: &[Arc<ChangeSet>], frozen_upto: Option<usize>) -> ChangeSet {
    let upto = frozen_upto.unwrap_or(prepend_list.len());
    let mut merged = ChangeSet::new();
    for entry in prepend_list.iter().take(upto) {
        if entry.statement_cleared() {
            merged.clear(&[]);
        }
        for stmt in entry.deprecated().iter() {
            merged.deprecate(stmt.clone());
        }
        for ctx in entry.deprecated_contexts().iter() {
            merged.clear(std::slice::from_ref(ctx));
        }
        for stmt in entry.approved().iter() {
            merged.approve(stmt.clone());
        }
    }
    merged
}

/// The public handle to any node in a source tree: either the store-backed
/// root or a forked branch. Cheap to clone (an `Arc` underneath).
#[derive(Clone)]
pub enum SailSource {
    Root(Arc<SourceRoot>),
    Branch(Arc<SourceBranch>),
}

impl SailSource {
    pub fn fork(&self) -> SailSource {
        let (parent, fork_ts, fork_watermark) = match self {
            SailSource::Root(root) => (self.clone(), root.next_ts(), root.prepend_len()),
            SailSource::Branch(branch) => (self.clone(), branch.fork_ts(), branch.prepend_len()),
        };
        SailSource::Branch(Arc::new(SourceBranch {
            parent,
            own_changes: RwLock::new(ChangeSet::new()),
            prepend_list: RwLock::new(Vec::new()),
            fork_ts: RwLock::new(fork_ts),
            fork_watermark: std::sync::atomic::AtomicUsize::new(fork_watermark),
            commit_mutex: Mutex::new(()),
            active: AtomicBool::new(true),
        }))
    }

    pub fn is_active(&self) -> bool {
        match self {
            SailSource::Root(_) => true,
            SailSource::Branch(branch) => branch.active.load(Ordering::SeqCst),
        }
    }

    pub fn release(&self) {
        if let SailSource::Branch(branch) = self {
            branch.active.store(false, Ordering::SeqCst);
        }
    }

    pub(crate) fn resolve_statements_for_ancestor(&self, pattern: &StatementPattern, scope: ReadScope) -> Vec<Statement> {
        match self {
            SailSource::Root(root) => root.resolve_statements(pattern, scope),
            SailSource::Branch(branch) => branch.resolve_statements(pattern, scope, false),
        }
    }

    pub(crate) fn resolve_statements_self(&self, pattern: &StatementPattern, scope: ReadScope) -> Vec<Statement> {
        match self {
            SailSource::Root(root) => root.resolve_statements(pattern, scope),
            SailSource::Branch(branch) => branch.resolve_statements(pattern, scope, true),
        }
    }

    pub(crate) fn resolve_namespace(&self, prefix: &str, scope: ReadScope) -> Option<Iri> {
        match self {
            SailSource::Root(root) => root.resolve_namespace(prefix, scope),
            SailSource::Branch(branch) => {
                let own = branch.own_changes.read().unwrap();
                if let Some(name) = own.added_namespaces().get(prefix) {
                    return Some(name.clone());
                }
                if own.removed_prefixes().contains(prefix) || own.namespace_cleared() {
                    return None;
                }
                branch.parent.resolve_namespace(prefix, scope.for_parent())
            }
        }
    }

    pub(crate) fn resolve_namespaces(&self, scope: ReadScope) -> Vec<(Arc<str>, Iri)> {
        match self {
            SailSource::Root(root) => root.resolve_namespaces(scope),
            SailSource::Branch(branch) => {
                let mut map: std::collections::HashMap<Arc<str>, Iri> =
                    branch.parent.resolve_namespaces(scope.for_parent()).into_iter().collect();
                let own = branch.own_changes.read().unwrap();
                if own.namespace_cleared() {
                    map.clear();
                }
                for prefix in own.removed_prefixes().iter() {
                    map.remove(prefix);
                }
                for (prefix, name) in own.added_namespaces().iter() {
                    map.insert(prefix.clone(), name.clone());
                }
                map.into_iter().collect()
            }
        }
    }

    /// Builds the read scope for this node and, recursively, for every
    /// ancestor, each frozen at *its own* prepend length at this instant.
    /// Called once when a dataset is opened; the resulting `ReadScope` is
    /// then threaded through the whole resolve chain so no node reuses
    /// another node's watermark.
    pub(crate) fn freeze_scope(&self, level: IsolationLevel) -> ReadScope {
        match self {
            SailSource::Root(root) => ReadScope::new(level, root.prepend_len(), None),
            SailSource::Branch(branch) => {
                let parent_scope = branch.parent.freeze_scope(level);
                ReadScope::new(level, branch.prepend_len(), Some(parent_scope))
            }
        }
    }

    pub(crate) fn mutate_own_changes<R>(&self, f: impl FnOnce(&mut ChangeSet) -> R) -> SailResult<R> {
        match self {
            SailSource::Root(_) => Err(SailError::usage("cannot write directly to a store root; fork a branch first")),
            SailSource::Branch(branch) => {
                if !branch.active.load(Ordering::SeqCst) {
                    return Err(SailError::usage("branch has been released"));
                }
                Ok(f(&mut branch.own_changes.write().unwrap()))
            }
        }
    }

    /// Validates the branch's pending writes: optimistic write-write
    /// pre-check, then (for `Serializable`) a write-skew check against every
    /// sibling change-set committed into the parent since this branch
    /// forked.
    pub fn prepare(&self, level: IsolationLevel) -> SailResult<()> {
        let SailSource::Branch(branch) = self else {
            return Ok(());
        };
        branch.parent.prepare(level)?;
        let own = branch.own_changes.read().unwrap();
        match &branch.parent {
            SailSource::Root(root) => root.precheck(branch.fork_ts(), &own)?,
            SailSource::Branch(_) => {}
        }
        if level.requires_observations() {
            let siblings = branch.parent.committed_since(branch.fork_watermark());
            let observations: Vec<_> = own.observations().cloned().collect();
            for sibling in siblings {
                if sibling.conflicts_with_observations(observations.iter()) {
                    return Err(SailError::Conflict);
                }
            }
        }
        Ok(())
    }

    fn committed_since(&self, watermark: usize) -> Vec<Arc<ChangeSet>> {
        match self {
            SailSource::Root(root) => root.prepend_list.read().unwrap()[watermark..].to_vec(),
            SailSource::Branch(branch) => branch.prepend_list.read().unwrap()[watermark..].to_vec(),
        }
    }

    /// Transfers this branch's change-set into its parent, atomically.
    pub fn flush(&self) -> SailResult<()> {
        let SailSource::Branch(branch) = self else {
            return Ok(());
        };
        let _guard = branch.commit_mutex.lock().unwrap();
        let change_set = {
            let mut own = branch.own_changes.write().unwrap();
            std::mem::take(&mut *own)
        };
        if change_set.is_empty() {
            return Ok(());
        }
        match &branch.parent {
            SailSource::Root(root) => {
                root.apply(branch.fork_ts(), change_set)?;
                // Our own flush is now part of the committed truth: advance
                // this branch's horizon so a later auto-flushed block never
                // conflicts with a block it already committed itself.
                *branch.fork_ts.write().unwrap() = Timestamp(root.clock.load(Ordering::SeqCst));
                branch
                    .fork_watermark
                    .store(root.prepend_len(), Ordering::SeqCst);
            }
            SailSource::Branch(parent_branch) => {
                parent_branch.prepend_list.write().unwrap().push(Arc::new(change_set));
                // Mirror the root arm above: advance this branch's horizon
                // against its parent branch's own history, so a later
                // auto-flushed block never conflicts with what we just
                // pushed into the parent.
                *branch.fork_ts.write().unwrap() = parent_branch.fork_ts();
                branch
                    .fork_watermark
                    .store(parent_branch.prepend_len(), Ordering::SeqCst);
            }
        }
        Ok(())
    }

    pub(crate) fn fork_ts(&self) -> Option<Timestamp> {
        match self {
            SailSource::Root(_) => None,
            SailSource::Branch(branch) => Some(branch.fork_ts()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sail_value::{Literal, Resource, Value};

    fn stmt(s: &str) -> Statement {
        Statement::new(
            Resource::Iri(Iri::new(s)),
            Iri::new("urn:p"),
            Value::Literal(Literal::plain("o")),
            None,
        )
    }

    fn root_source() -> SailSource {
        SailSource::Root(SourceRoot::new("explicit", Arc::new(AtomicU64::new(0)), true).unwrap())
    }

    /// A branch forked from another branch (not from the root) must have its
    /// flush land in the *parent branch's* prepend list, so the parent (and
    /// anything else resolving through it) sees the write immediately —
    /// without waiting for the parent itself to flush to the root.
    #[test]
    fn branch_of_branch_flush_is_visible_through_parent_branch() {
        let root = root_source();
        let mid = root.fork();
        let leaf = mid.fork();

        leaf.mutate_own_changes(|cs| cs.approve(stmt("urn:a"))).unwrap();
        leaf.prepare(IsolationLevel::ReadCommitted).unwrap();
        leaf.flush().unwrap();

        let scope = mid.freeze_scope(IsolationLevel::ReadCommitted);
        let seen = mid.resolve_statements_self(&StatementPattern::any(), scope);
        assert!(seen.iter().any(|s| s == &stmt("urn:a")));

        // Not yet visible at the root: `mid` itself hasn't flushed.
        let root_scope = root.freeze_scope(IsolationLevel::ReadCommitted);
        assert!(root.resolve_statements_self(&StatementPattern::any(), root_scope).is_empty());
    }

    /// Two sibling snapshots opened against a store that already has history
    /// each freeze their own node's prepend length; a later sibling's fork
    /// must not see an earlier sibling's concurrent write, and an existing
    /// reader must keep seeing exactly what was committed before it forked.
    #[test]
    fn read_scope_freezes_each_node_at_its_own_watermark() {
        let root = root_source();
        let setup = root.fork();
        setup.mutate_own_changes(|cs| cs.approve(stmt("urn:pre"))).unwrap();
        setup.prepare(IsolationLevel::ReadCommitted).unwrap();
        setup.flush().unwrap();

        let reader = root.fork();
        let scope = reader.freeze_scope(IsolationLevel::Snapshot);
        let seen = reader.resolve_statements_self(&StatementPattern::any(), scope.clone());
        assert_eq!(seen.len(), 1);

        let writer = root.fork();
        writer.mutate_own_changes(|cs| cs.approve(stmt("urn:post"))).unwrap();
        writer.prepare(IsolationLevel::ReadCommitted).unwrap();
        writer.flush().unwrap();

        // The reader's frozen scope must still show only the pre-existing
        // statement, not the root's post-fork history.
        let still = reader.resolve_statements_self(&StatementPattern::any(), scope);
        assert_eq!(still.len(), 1);
    }
}
