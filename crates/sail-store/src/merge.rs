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

use std::collections::HashSet;

use sail_model::{Statement, StatementPattern};

use crate::change_set::ChangeSet;

/// Overlays one layer's `ChangeSet` on top of whatever its parent already
/// yields, per the five-step merge rule: a cleared branch suppresses the
/// parent outright; otherwise the parent is filtered to drop anything this
/// layer deprecated (by statement or by context), then this layer's own
/// approvals are appended, then the combined sequence is de-duplicated by
/// full statement identity. Lazy and single-pass: nothing is materialized
/// up front beyond the small de-dup set.
pub struct MergedStatements<'a, I>
where
    I: Iterator<Item = Statement>,
{
    pattern: StatementPattern,
    parent: Option<I>,
    change_set: &'a ChangeSet,
    approved: Option<Box<dyn Iterator<Item = Statement> + 'a>>,
    seen: HashSet<Statement>,
}

impl<'a, I> MergedStatements<'a, I>
where
    I: Iterator<Item = Statement>,
{
    pub fn new(pattern: StatementPattern, parent: I, change_set: &'a ChangeSet) -> Self {
        Self {
            parent: if change_set.statement_cleared() { None } else { Some(parent) },
            pattern,
            change_set,
            approved: None,
            seen: HashSet::new(),
        }
    }
}

impl<I> Iterator for MergedStatements<'_, I>
where
    I: Iterator<Item = Statement>,
{
    type Item = Statement;

    fn next(&mut self) -> Option<Statement> {
        if let Some(parent) = &mut self.parent {
            for stmt in parent.by_ref() {
                if self.change_set.deprecated().contains(&stmt) {
                    continue;
                }
                if let Some(ctx) = stmt.context.as_ref() {
                    if self.change_set.deprecated_contexts().contains(ctx) {
                        continue;
                    }
                }
                if !self.pattern.matches(&stmt) {
                    continue;
                }
                if self.seen.insert(stmt.clone()) {
                    return Some(stmt);
                }
            }
            self.parent = None;
        }

        if self.approved.is_none() {
            let approved = self.change_set.approved().clone();
            self.approved = Some(Box::new(approved.into_iter()));
        }
        let approved = self.approved.as_mut().expect("just initialized");
        for stmt in approved.by_ref() {
            if self.pattern.matches(&stmt) && self.seen.insert(stmt.clone()) {
                return Some(stmt);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sail_model::ContextFilter;
    use sail_value::{Iri, Literal, Resource, Value};

    fn stmt(s: &str, ctx: Option<&str>) -> Statement {
        Statement::new(
            Resource::Iri(Iri::new(s)),
            Iri::new("urn:p"),
            Value::Literal(Literal::plain("o")),
            ctx.map(|c| Resource::Iri(Iri::new(c))),
        )
    }

    #[test]
    fn deprecated_statement_is_suppressed_from_parent() {
        let mut cs = ChangeSet::new();
        cs.deprecate(stmt("urn:a", None));
        let parent = vec![stmt("urn:a", None), stmt("urn:b", None)];
        let merged: Vec<_> = MergedStatements::new(StatementPattern::any(), parent.into_iter(), &cs).collect();
        assert_eq!(merged, vec![stmt("urn:b", None)]);
    }

    #[test]
    fn cleared_change_set_suppresses_parent_entirely() {
        let mut cs = ChangeSet::new();
        cs.clear(&[]);
        cs.approve(stmt("urn:a", None));
        let parent = vec![stmt("urn:b", None)];
        let merged: Vec<_> = MergedStatements::new(StatementPattern::any(), parent.into_iter(), &cs).collect();
        assert_eq!(merged, vec![stmt("urn:a", None)]);
    }

    #[test]
    fn deprecated_context_suppresses_all_its_statements() {
        let mut cs = ChangeSet::new();
        cs.clear(&[Resource::Iri(Iri::new("urn:g"))]);
        let parent = vec![stmt("urn:a", Some("urn:g")), stmt("urn:b", None)];
        let merged: Vec<_> = MergedStatements::new(StatementPattern::any(), parent.into_iter(), &cs).collect();
        assert_eq!(merged, vec![stmt("urn:b", None)]);
    }

    #[test]
    fn pattern_filters_both_parent_and_approved() {
        let mut cs = ChangeSet::new();
        cs.approve(stmt("urn:new", None));
        let pattern = StatementPattern::new(
            Some(Resource::Iri(Iri::new("urn:a"))),
            None,
            None,
            ContextFilter::AnyGraph,
        );
        let parent = vec![stmt("urn:a", None), stmt("urn:other", None)];
        let merged: Vec<_> = MergedStatements::new(pattern, parent.into_iter(), &cs).collect();
        assert_eq!(merged, vec![stmt("urn:a", None)]);
    }
}
