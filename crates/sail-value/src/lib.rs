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

//! The primitive value types of the RDF data model: IRIs, blank nodes and
//! literals, and the `Value`/`Resource` wrappers that compose them.

use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An IRI, compared by string equality.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Iri(Arc<str>);

impl Iri {
    pub fn new(s: impl Into<Arc<str>>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Iri {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Iri {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Scopes blank-node identity. Two blank nodes with the same local id but a
/// different origin are never equal — each parse/transaction gets its own
/// scope, per the RDF blank-node identity rules.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BlankOrigin(pub u64);

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BlankNode {
    pub origin: BlankOrigin,
    pub local: Arc<str>,
}

impl BlankNode {
    pub fn new(origin: BlankOrigin, local: impl Into<Arc<str>>) -> Self {
        Self {
            origin,
            local: local.into(),
        }
    }
}

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}-{}", self.origin.0, self.local)
    }
}

/// A subject- or context-position term: either an IRI or a blank node.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Resource {
    Iri(Iri),
    Blank(BlankNode),
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Iri(iri) => write!(f, "{iri}"),
            Resource::Blank(b) => write!(f, "{b}"),
        }
    }
}

impl From<Iri> for Resource {
    fn from(iri: Iri) -> Self {
        Resource::Iri(iri)
    }
}

impl From<BlankNode> for Resource {
    fn from(b: BlankNode) -> Self {
        Resource::Blank(b)
    }
}

/// A literal value: a lexical form plus an optional language tag or datatype
/// IRI. RDF forbids both being present simultaneously; callers that need to
/// enforce that should do so at parse time — this type does not reject it,
/// matching the teacher's practice of keeping value types structurally
/// permissive and pushing validation to the boundary that owns the rule.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Literal {
    pub lexical: Arc<str>,
    pub language: Option<Arc<str>>,
    pub datatype: Option<Iri>,
}

impl Literal {
    pub fn plain(lexical: impl Into<Arc<str>>) -> Self {
        Self {
            lexical: lexical.into(),
            language: None,
            datatype: None,
        }
    }

    pub fn tagged(lexical: impl Into<Arc<str>>, language: impl Into<Arc<str>>) -> Self {
        Self {
            lexical: lexical.into(),
            language: Some(language.into()),
            datatype: None,
        }
    }

    pub fn typed(lexical: impl Into<Arc<str>>, datatype: Iri) -> Self {
        Self {
            lexical: lexical.into(),
            language: None,
            datatype: Some(datatype),
        }
    }
}

/// Any RDF term that can occupy the object position of a statement.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Value {
    Iri(Iri),
    Blank(BlankNode),
    Literal(Literal),
}

impl From<Resource> for Value {
    fn from(r: Resource) -> Self {
        match r {
            Resource::Iri(iri) => Value::Iri(iri),
            Resource::Blank(b) => Value::Blank(b),
        }
    }
}

impl From<Iri> for Value {
    fn from(iri: Iri) -> Self {
        Value::Iri(iri)
    }
}

impl From<Literal> for Value {
    fn from(lit: Literal) -> Self {
        Value::Literal(lit)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Iri(iri) => write!(f, "{iri}"),
            Value::Blank(b) => write!(f, "{b}"),
            Value::Literal(lit) => write!(f, "{}", lit.lexical),
        }
    }
}

/// Constructs `Value`s and `Resource`s. Query evaluators and loaders are
/// expected to go through one `ValueFactory` per dataset so that blank nodes
/// minted during evaluation carry a consistent origin scope.
pub trait ValueFactory {
    fn iri(&self, s: &str) -> Iri {
        Iri::new(s)
    }

    fn blank_node(&self, local: &str) -> BlankNode;

    fn literal(&self, lexical: &str, language: Option<&str>, datatype: Option<Iri>) -> Literal {
        Literal {
            lexical: lexical.into(),
            language: language.map(Into::into),
            datatype,
        }
    }
}

/// A `ValueFactory` that mints blank nodes under a single fixed origin.
#[derive(Debug, Clone, Copy)]
pub struct OriginValueFactory(pub BlankOrigin);

impl ValueFactory for OriginValueFactory {
    fn blank_node(&self, local: &str) -> BlankNode {
        BlankNode::new(self.0, local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iri_equality_is_by_string() {
        assert_eq!(Iri::new("urn:a"), Iri::new("urn:a"));
        assert_ne!(Iri::new("urn:a"), Iri::new("urn:b"));
    }

    #[test]
    fn blank_nodes_from_different_origins_never_equal() {
        let a = BlankNode::new(BlankOrigin(1), "x");
        let b = BlankNode::new(BlankOrigin(2), "x");
        assert_ne!(a, b);
        let c = BlankNode::new(BlankOrigin(1), "x");
        assert_eq!(a, c);
    }

    #[test]
    fn value_factory_scopes_blanks_to_its_origin() {
        let f = OriginValueFactory(BlankOrigin(7));
        let b = f.blank_node("n1");
        assert_eq!(b.origin, BlankOrigin(7));
    }
}
