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

use sail_value::{Iri, Resource, Value};

use crate::statement::Statement;

/// The variadic context filter of the `TripleSource`/`Dataset` surfaces.
///
/// The source spec is deliberately ambiguous about the empty-list case
/// across call sites (`get_statements`'s variadic `contexts...` means "all
/// graphs" when omitted entirely, but a caller that explicitly passes a
/// zero-length list at the `Dataset::statements` level may instead mean
/// "default graph only"). Rather than overload one `Vec::is_empty()` check
/// with two meanings, we make the two cases two different constructors so
/// call sites say what they mean.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub enum ContextFilter {
    /// No constraint at all: matches every context, named or default.
    #[default]
    AnyGraph,
    /// Matches only the unnamed default graph.
    DefaultGraphOnly,
    /// Matches if the statement's context equals any entry in the list, or,
    /// if `None` appears in the list, if the statement is in the default
    /// graph.
    OneOf(Vec<Option<Resource>>),
}

impl ContextFilter {
    pub fn all_graphs() -> Self {
        ContextFilter::AnyGraph
    }

    pub fn default_graph_only() -> Self {
        ContextFilter::DefaultGraphOnly
    }

    pub fn one_of(contexts: Vec<Option<Resource>>) -> Self {
        if contexts.is_empty() {
            ContextFilter::AnyGraph
        } else {
            ContextFilter::OneOf(contexts)
        }
    }

    pub fn matches(&self, context: Option<&Resource>) -> bool {
        match self {
            ContextFilter::AnyGraph => true,
            ContextFilter::DefaultGraphOnly => context.is_none(),
            ContextFilter::OneOf(list) => list.iter().any(|c| match (c, context) {
                (None, None) => true,
                (Some(a), Some(b)) => a == b,
                _ => false,
            }),
        }
    }

    /// Whether this filter is scoped to a fixed, enumerable set of contexts.
    /// `None` when the filter accepts every context.
    pub fn enumerated_contexts(&self) -> Option<&[Option<Resource>]> {
        match self {
            ContextFilter::OneOf(list) => Some(list),
            _ => None,
        }
    }
}

/// A statement pattern: each of `subject`/`predicate`/`object` is either
/// bound (must match by value-equality) or a wildcard (`None`, matches
/// anything). Used both for `get_statements` queries and for the
/// serializable-isolation `observations` recorded by a change-set.
///
/// A bound component is "a constraint on that dimension"; an unbound
/// component is "no constraint on that dimension" — there is no third,
/// nullable state to mis-handle here (see DESIGN.md's resolution of the
/// `smallest(sets)` open question: we never construct an ambiguous
/// "smallest set" in the first place).
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct StatementPattern {
    pub subject: Option<Resource>,
    pub predicate: Option<Iri>,
    pub object: Option<Value>,
    pub contexts: ContextFilter,
}

impl StatementPattern {
    pub fn new(
        subject: Option<Resource>,
        predicate: Option<Iri>,
        object: Option<Value>,
        contexts: ContextFilter,
    ) -> Self {
        Self {
            subject,
            predicate,
            object,
            contexts,
        }
    }

    pub fn any() -> Self {
        Self {
            subject: None,
            predicate: None,
            object: None,
            contexts: ContextFilter::AnyGraph,
        }
    }

    pub fn matches(&self, statement: &Statement) -> bool {
        if let Some(s) = &self.subject {
            if s != &statement.subject {
                return false;
            }
        }
        if let Some(p) = &self.predicate {
            if p != &statement.predicate {
                return false;
            }
        }
        if let Some(o) = &self.object {
            if o != &statement.object {
                return false;
            }
        }
        self.contexts.matches(statement.context.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sail_value::Literal;

    fn stmt(ctx: Option<&str>) -> Statement {
        Statement::new(
            Resource::Iri(Iri::new("urn:s")),
            Iri::new("urn:p"),
            Value::Literal(Literal::plain("o")),
            ctx.map(|c| Resource::Iri(Iri::new(c))),
        )
    }

    #[test]
    fn wildcard_pattern_matches_everything() {
        let p = StatementPattern::any();
        assert!(p.matches(&stmt(None)));
        assert!(p.matches(&stmt(Some("urn:g"))));
    }

    #[test]
    fn default_graph_only_excludes_named_graphs() {
        let p = StatementPattern::new(None, None, None, ContextFilter::DefaultGraphOnly);
        assert!(p.matches(&stmt(None)));
        assert!(!p.matches(&stmt(Some("urn:g"))));
    }

    #[test]
    fn one_of_with_none_matches_default_graph() {
        let filter = ContextFilter::one_of(vec![None, Some(Resource::Iri(Iri::new("urn:g1")))]);
        let p = StatementPattern::new(None, None, None, filter);
        assert!(p.matches(&stmt(None)));
        assert!(p.matches(&stmt(Some("urn:g1"))));
        assert!(!p.matches(&stmt(Some("urn:g2"))));
    }

    #[test]
    fn bound_subject_rejects_mismatch() {
        let p = StatementPattern::new(
            Some(Resource::Iri(Iri::new("urn:other"))),
            None,
            None,
            ContextFilter::AnyGraph,
        );
        assert!(!p.matches(&stmt(None)));
    }
}
