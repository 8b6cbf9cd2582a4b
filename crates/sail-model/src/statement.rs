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

use sail_value::{Iri, Resource, Value};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single RDF statement: subject, predicate, object and an optional
/// context (named graph). `context = None` denotes the unnamed default
/// graph. Statements are value objects — equality is by all four fields.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Statement {
    pub subject: Resource,
    pub predicate: Iri,
    pub object: Value,
    pub context: Option<Resource>,
}

impl Statement {
    pub fn new(subject: Resource, predicate: Iri, object: Value, context: Option<Resource>) -> Self {
        Self {
            subject,
            predicate,
            object,
            context,
        }
    }

    /// The context this statement would be counted under by `approved_contexts`
    /// bookkeeping — `None` for the default graph, which per spec is not
    /// itself tracked as a "context".
    pub fn named_context(&self) -> Option<&Resource> {
        self.context.as_ref()
    }
}

/// A namespace-prefix binding. Prefixes are unique per store.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Namespace {
    pub prefix: Arc<str>,
    pub name: Iri,
}

impl Namespace {
    pub fn new(prefix: impl Into<Arc<str>>, name: Iri) -> Self {
        Self {
            prefix: prefix.into(),
            name,
        }
    }
}
