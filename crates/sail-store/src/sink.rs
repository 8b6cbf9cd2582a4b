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

use sail_model::{IsolationLevel, SailError, SailResult, Statement, StatementPattern};
use sail_value::{Iri, Resource};

use crate::branch::SailSource;

/// A buffered writer bound to one forked branch. Mirrors the teacher's
/// one-shot, consuming commit objects (`CheckRelation`/`RelationTransaction`):
/// every mutating call buffers into the branch's change-set; nothing is
/// visible to anyone else until `flush()` (which calls through to
/// `SailSource::prepare` + `SailSource::flush`).
pub struct SailSink {
    source: SailSource,
    level: IsolationLevel,
    closed: bool,
}

impl SailSink {
    pub(crate) fn new(source: SailSource, level: IsolationLevel) -> Self {
        Self {
            source,
            level,
            closed: false,
        }
    }

    fn guard(&self) -> SailResult<()> {
        if self.closed {
            return Err(SailError::usage("sink has been closed"));
        }
        Ok(())
    }

    pub fn approve(&mut self, statement: Statement) -> SailResult<()> {
        self.guard()?;
        self.source.mutate_own_changes(|cs| cs.approve(statement))?;
        Ok(())
    }

    pub fn deprecate(&mut self, statement: Statement) -> SailResult<()> {
        self.guard()?;
        self.source.mutate_own_changes(|cs| cs.deprecate(statement))?;
        Ok(())
    }

    /// Records a read pattern for write-skew detection. A no-op below
    /// `Serializable`, so callers can record unconditionally without
    /// checking the negotiated level themselves.
    pub fn observe(&mut self, pattern: StatementPattern) -> SailResult<()> {
        self.guard()?;
        if self.level.requires_observations() {
            self.source.mutate_own_changes(|cs| cs.observe(pattern))?;
        }
        Ok(())
    }

    pub fn clear(&mut self, contexts: &[Resource]) -> SailResult<()> {
        self.guard()?;
        self.source.mutate_own_changes(|cs| cs.clear(contexts))?;
        Ok(())
    }

    pub fn set_namespace(&mut self, prefix: Arc<str>, name: Iri) -> SailResult<()> {
        self.guard()?;
        self.source.mutate_own_changes(|cs| cs.set_namespace(prefix, name))?;
        Ok(())
    }

    pub fn remove_namespace(&mut self, prefix: &str) -> SailResult<()> {
        self.guard()?;
        self.source.mutate_own_changes(|cs| cs.remove_namespace(prefix))?;
        Ok(())
    }

    pub fn clear_namespaces(&mut self) -> SailResult<()> {
        self.guard()?;
        self.source.mutate_own_changes(|cs| cs.clear_namespaces())?;
        Ok(())
    }

    /// Runs conflict detection and, if it passes, transfers the buffered
    /// change-set into the parent source. A no-op if nothing is pending.
    pub fn flush(&mut self) -> SailResult<()> {
        self.guard()?;
        self.source.prepare(self.level)?;
        self.source.flush()
    }

    pub fn close(&mut self) {
        self.closed = true;
    }
}

impl Drop for SailSink {
    fn drop(&mut self) {
        self.close();
    }
}
