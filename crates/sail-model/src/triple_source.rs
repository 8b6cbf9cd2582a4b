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

use sail_value::{Resource, ValueFactory};

use crate::error::SailResult;
use crate::pattern::ContextFilter;
use crate::statement::Statement;

/// A single-pass, closeable sequence of statements, owning whatever I/O
/// resources back it. `next()` after `close()` must fail; `close()` must be
/// idempotent. Query evaluation composes many of these; the core provides
/// an "interlocking" adapter (see `sail-store::interlock`) that releases the
/// whole stack in reverse order when the outermost one closes.
pub trait StatementCursor {
    fn next(&mut self) -> SailResult<Option<Statement>>;

    fn close(&mut self);
}

/// The capability surface the core publishes to query evaluation: get
/// matching statements lazily, and mint values consistent with the
/// dataset's blank-node scope.
pub trait TripleSource {
    type Cursor<'a>: StatementCursor + 'a
    where
        Self: 'a;

    fn get_statements<'a>(
        &'a self,
        subject: Option<&Resource>,
        predicate: Option<&sail_value::Iri>,
        object: Option<&sail_value::Value>,
        contexts: ContextFilter,
    ) -> SailResult<Self::Cursor<'a>>;

    fn value_factory(&self) -> &dyn ValueFactory;
}

/// Per-pattern cardinality estimates used by a query optimizer for join
/// ordering. The core does not implement a planner; it only exposes the
/// counters one would need to build one.
pub trait Statistics {
    fn statement_count(&self) -> u64;

    fn context_count(&self) -> u64;

    /// A rough cardinality estimate for statements matching the given
    /// predicate, or `None` if the predicate is unseen.
    fn predicate_cardinality(&self, predicate: &sail_value::Iri) -> Option<u64>;
}
