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

use sail_model::{
    ContextFilter, IsolationLevel, SailError, SailResult, Statement, StatementCursor, StatementPattern, Statistics,
    TripleSource,
};
use sail_value::{BlankOrigin, Iri, OriginValueFactory, Resource, Value, ValueFactory};

use crate::branch::{ReadScope, SailSource};

/// A frozen (or, below snapshot-read, live) read view over one source tree.
/// Built once by `SailSource::snapshot`; every subsequent call against the
/// same `SailDataset` is consistent with that one acquisition, per the
/// negotiated isolation level.
pub struct SailDataset {
    source: SailSource,
    level: IsolationLevel,
    scope: ReadScope,
    factory: OriginValueFactory,
    closed: bool,
}

impl SailDataset {
    pub(crate) fn new(source: SailSource, level: IsolationLevel, origin: BlankOrigin) -> Self {
        let scope = source.freeze_scope(level);
        Self {
            source,
            level,
            scope,
            factory: OriginValueFactory(origin),
            closed: false,
        }
    }

    pub fn isolation_level(&self) -> IsolationLevel {
        self.level
    }

    pub fn statements(
        &self,
        subject: Option<&Resource>,
        predicate: Option<&Iri>,
        object: Option<&Value>,
        contexts: ContextFilter,
    ) -> SailResult<Vec<Statement>> {
        if self.closed {
            return Err(SailError::usage("dataset has been closed"));
        }
        let pattern = StatementPattern::new(subject.cloned(), predicate.cloned(), object.cloned(), contexts);
        Ok(self.source.resolve_statements_self(&pattern, self.scope.clone()))
    }

    pub fn namespaces(&self) -> SailResult<Vec<sail_model::Namespace>> {
        if self.closed {
            return Err(SailError::usage("dataset has been closed"));
        }
        Ok(self
            .source
            .resolve_namespaces(self.scope.clone())
            .into_iter()
            .map(|(prefix, name)| sail_model::Namespace::new(prefix, name))
            .collect())
    }

    pub fn namespace(&self, prefix: &str) -> SailResult<Option<Iri>> {
        if self.closed {
            return Err(SailError::usage("dataset has been closed"));
        }
        Ok(self.source.resolve_namespace(prefix, self.scope.clone()))
    }

    pub fn close(&mut self) {
        self.closed = true;
    }
}

impl Drop for SailDataset {
    fn drop(&mut self) {
        self.close();
    }
}

/// A materialized, single-pass cursor. The storage layer does not stream
/// matches incrementally today (everything is resolved eagerly by
/// `SailDataset::statements`); this wraps that `Vec` so the *contract* —
/// single pass, explicit close, failing `next()` afterward — is already in
/// place for a future streaming implementation to slot into.
pub struct VecStatementCursor {
    remaining: std::vec::IntoIter<Statement>,
    closed: bool,
}

impl VecStatementCursor {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self {
            remaining: statements.into_iter(),
            closed: false,
        }
    }
}

impl StatementCursor for VecStatementCursor {
    fn next(&mut self) -> SailResult<Option<Statement>> {
        if self.closed {
            return Err(SailError::usage("cursor has been closed"));
        }
        Ok(self.remaining.next())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

impl TripleSource for SailDataset {
    type Cursor<'a> = VecStatementCursor;

    fn get_statements<'a>(
        &'a self,
        subject: Option<&Resource>,
        predicate: Option<&Iri>,
        object: Option<&Value>,
        contexts: ContextFilter,
    ) -> SailResult<Self::Cursor<'a>> {
        let statements = self.statements(subject, predicate, object, contexts)?;
        Ok(VecStatementCursor::new(statements))
    }

    fn value_factory(&self) -> &dyn ValueFactory {
        // Each dataset mints blanks under its own origin, scoping evaluation
        // results to this one read view, per the blank-node identity rules.
        &self.factory
    }
}

impl Statistics for SailDataset {
    fn statement_count(&self) -> u64 {
        self.source
            .resolve_statements_self(&StatementPattern::any(), self.scope.clone())
            .len() as u64
    }

    fn context_count(&self) -> u64 {
        let statements = self
            .source
            .resolve_statements_self(&StatementPattern::any(), self.scope.clone());
        let contexts: std::collections::HashSet<_> = statements.iter().filter_map(|s| s.context.clone()).collect();
        contexts.len() as u64
    }

    fn predicate_cardinality(&self, predicate: &Iri) -> Option<u64> {
        let pattern = StatementPattern::new(None, Some(predicate.clone()), None, ContextFilter::AnyGraph);
        let count = self.source.resolve_statements_self(&pattern, self.scope.clone()).len();
        if count == 0 {
            None
        } else {
            Some(count as u64)
        }
    }
}
