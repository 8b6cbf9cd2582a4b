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

use std::sync::Arc;

use sail_model::{Statement, StatementPattern};
use sail_value::{Iri, Resource};

/// One branch's accumulated pending mutations, plus the read patterns it has
/// observed (for serializable write-skew detection). Built on `im`'s
/// persistent collections so that `ChangeSet::clone` — used whenever a
/// branch is forked or a dataset snapshot is frozen — is O(1) structural
/// sharing rather than a deep copy. This also resolves the one place the
/// source spec leaves "copy" ambiguous: forking a change-set always yields
/// an independent value, cheaply.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    approved: im::HashSet<Statement>,
    deprecated: im::HashSet<Statement>,
    deprecated_contexts: im::HashSet<Resource>,
    statement_cleared: bool,

    added_namespaces: im::HashMap<Arc<str>, Iri>,
    removed_prefixes: im::HashSet<Arc<str>>,
    namespace_cleared: bool,

    /// Statement patterns read under this branch, recorded only when the
    /// negotiated isolation level requires them (`IsolationLevel::requires_observations`).
    /// A plain `im::Vector` rather than a set: patterns aren't canonically
    /// hashable in a way that would usefully dedup them, and the list is
    /// walked once at `prepare()`, never looked up by key.
    observations: im::Vector<StatementPattern>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invariant: approved ∩ deprecated = ∅. Re-approving a deprecated
    /// statement un-deprecates it.
    pub fn approve(&mut self, statement: Statement) {
        self.deprecated.remove(&statement);
        self.approved.insert(statement);
    }

    pub fn deprecate(&mut self, statement: Statement) {
        self.approved.remove(&statement);
        self.deprecated.insert(statement);
    }

    pub fn observe(&mut self, pattern: StatementPattern) {
        self.observations.push_back(pattern);
    }

    /// Marks every statement in `contexts` (or the whole store, if
    /// `contexts` is empty) as cleared. `clear()` with no contexts maps onto
    /// `statement_cleared`, suppressing every inherited statement outright;
    /// `clear()` with specific contexts instead records them as deprecated
    /// contexts, suppressing only statements whose context matches one of
    /// them.
    pub fn clear(&mut self, contexts: &[Resource]) {
        if contexts.is_empty() {
            self.statement_cleared = true;
            self.approved.clear();
        } else {
            for ctx in contexts {
                self.deprecated_contexts.insert(ctx.clone());
            }
            self.approved.retain(|s| !matches!(s.context.as_ref(), Some(c) if contexts.contains(c)));
        }
    }

    pub fn set_namespace(&mut self, prefix: Arc<str>, name: Iri) {
        self.removed_prefixes.remove(&prefix);
        self.added_namespaces.insert(prefix, name);
    }

    pub fn remove_namespace(&mut self, prefix: &str) {
        self.added_namespaces.remove(prefix);
        self.removed_prefixes.insert(Arc::from(prefix));
    }

    pub fn clear_namespaces(&mut self) {
        self.namespace_cleared = true;
        self.added_namespaces.clear();
        self.removed_prefixes.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.approved.is_empty()
            && self.deprecated.is_empty()
            && self.deprecated_contexts.is_empty()
            && !self.statement_cleared
            && self.added_namespaces.is_empty()
            && self.removed_prefixes.is_empty()
            && !self.namespace_cleared
    }

    pub fn approved(&self) -> &im::HashSet<Statement> {
        &self.approved
    }

    pub fn deprecated(&self) -> &im::HashSet<Statement> {
        &self.deprecated
    }

    pub fn deprecated_contexts(&self) -> &im::HashSet<Resource> {
        &self.deprecated_contexts
    }

    pub fn statement_cleared(&self) -> bool {
        self.statement_cleared
    }

    pub fn added_namespaces(&self) -> &im::HashMap<Arc<str>, Iri> {
        &self.added_namespaces
    }

    pub fn removed_prefixes(&self) -> &im::HashSet<Arc<str>> {
        &self.removed_prefixes
    }

    pub fn namespace_cleared(&self) -> bool {
        self.namespace_cleared
    }

    pub fn observations(&self) -> impl Iterator<Item = &StatementPattern> {
        self.observations.iter()
    }

    /// Whether any recorded observation could have read a statement this
    /// change-set approved, deprecated, or cleared — the write-skew check a
    /// serializable branch runs against every sibling that committed since
    /// it forked.
    pub fn conflicts_with_observations<'a>(&self, observations: impl Iterator<Item = &'a StatementPattern>) -> bool {
        for pattern in observations {
            if self.statement_cleared {
                return true;
            }
            if self.approved.iter().any(|s| pattern.matches(s)) {
                return true;
            }
            if self.deprecated.iter().any(|s| pattern.matches(s)) {
                return true;
            }
            if self
                .deprecated_contexts
                .iter()
                .any(|ctx| pattern.contexts.matches(Some(ctx)))
            {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sail_value::{Literal, Value};

    fn stmt(s: &str) -> Statement {
        Statement::new(
            Resource::Iri(Iri::new(s)),
            Iri::new("urn:p"),
            Value::Literal(Literal::plain("o")),
            None,
        )
    }

    #[test]
    fn approve_and_deprecate_are_mutually_exclusive() {
        let mut cs = ChangeSet::new();
        let a = stmt("urn:a");
        cs.approve(a.clone());
        assert!(cs.approved().contains(&a));
        cs.deprecate(a.clone());
        assert!(!cs.approved().contains(&a));
        assert!(cs.deprecated().contains(&a));
        cs.approve(a.clone());
        assert!(cs.approved().contains(&a));
        assert!(!cs.deprecated().contains(&a));
    }

    #[test]
    fn clearing_with_no_contexts_suppresses_everything() {
        let mut cs = ChangeSet::new();
        cs.clear(&[]);
        assert!(cs.statement_cleared());
    }

    #[test]
    fn namespace_set_and_remove_are_mutually_exclusive() {
        let mut cs = ChangeSet::new();
        cs.set_namespace(Arc::from("ex"), Iri::new("urn:ex:"));
        assert!(cs.added_namespaces().contains_key("ex"));
        cs.remove_namespace("ex");
        assert!(!cs.added_namespaces().contains_key("ex"));
        assert!(cs.removed_prefixes().contains("ex"));
    }

    #[test]
    fn fork_is_independent_of_original() {
        let mut cs = ChangeSet::new();
        cs.approve(stmt("urn:a"));
        let forked = cs.clone();
        cs.approve(stmt("urn:b"));
        assert_eq!(forked.approved().len(), 1);
        assert_eq!(cs.approved().len(), 2);
    }
}
