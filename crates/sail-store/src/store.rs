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

use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use sail_model::SailResult;

use crate::branch::{SailSource, SourceRoot};

/// Holds two independently versioned statement relations — explicit and
/// inferred — plus the namespace table. Each relation is an instantiation
/// of the generic engine in `crate::engine`, generalizing the teacher's
/// `tx_management` machinery (originally `Domain = object id, Codomain =
/// attribute value`) to `Domain = Statement, Codomain = ()` for a
/// presence-only set.
///
/// Namespace bindings live on the explicit side only; see DESIGN.md for why
/// splitting them across both trees would add bookkeeping with no
/// corresponding requirement.
pub struct StatementStore {
    explicit: SailSource,
    inferred: SailSource,
}

impl StatementStore {
    pub fn new() -> SailResult<Arc<Self>> {
        let clock = Arc::new(AtomicU64::new(1));
        let explicit = SourceRoot::new("explicit", clock.clone(), true)?;
        let inferred = SourceRoot::new("inferred", clock, false)?;
        Ok(Arc::new(Self {
            explicit: SailSource::Root(explicit),
            inferred: SailSource::Root(inferred),
        }))
    }

    /// The root source of asserted (directly added) statements.
    pub fn explicit_source(&self) -> SailSource {
        self.explicit.clone()
    }

    /// The root source of derived (reasoner-produced) statements.
    pub fn inferred_source(&self) -> SailSource {
        self.inferred.clone()
    }
}

impl Default for StatementStore {
    fn default() -> Self {
        // Only used by call sites that already handle construction failure
        // via `new()`; kept for ergonomic test setup where it cannot fail
        // (the in-memory provider never returns an error from `scan()`).
        let clock = Arc::new(AtomicU64::new(1));
        Self {
            explicit: SailSource::Root(SourceRoot::new("explicit", clock.clone(), true).expect("in-memory provider")),
            inferred: SailSource::Root(SourceRoot::new("inferred", clock, false).expect("in-memory provider")),
        }
    }
}
