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

use std::error::Error as StdError;

/// The public error taxonomy of the storage layer. Callers are expected to
/// dispatch on the variant, never on the message text (spec.md §9's note on
/// the source's exception-driven flow).
#[derive(Debug, thiserror::Error)]
pub enum SailError {
    /// A precondition was violated: write without an active transaction,
    /// double-begin, operating on a closed connection, and similar.
    #[error("usage error: {0}")]
    Usage(String),

    /// A serialization/snapshot conflict was detected at `prepare()`. The
    /// caller must roll back; no partial state is made visible.
    #[error("isolation conflict: observed state has changed")]
    Conflict,

    /// The backing statement store failed. The transaction is doomed: every
    /// further operation on it fails with this same root cause until rolled
    /// back.
    #[error("backing store failure: {0}")]
    StoreIo(#[source] Box<dyn StdError + Send + Sync>),

    /// The current iteration or operation was cancelled.
    #[error("operation cancelled")]
    Cancelled,

    /// A per-operation execution-time budget was exceeded.
    #[error("query execution timed out")]
    Timeout,

    /// A malformed query was submitted to the evaluator layer (surfaced
    /// through the core unchanged; the core does not parse queries itself).
    #[error("malformed query: {0}")]
    MalformedQuery(String),

    /// The requested query language is not supported by the evaluator.
    #[error("unsupported query language: {0}")]
    UnsupportedQueryLanguage(String),

    /// An error from value-expression evaluation in the query evaluator,
    /// propagated unchanged.
    #[error("value evaluation error: {0}")]
    Evaluation(#[source] Box<dyn StdError + Send + Sync>),
}

impl SailError {
    pub fn usage(msg: impl Into<String>) -> Self {
        SailError::Usage(msg.into())
    }

    pub fn store_io(err: impl StdError + Send + Sync + 'static) -> Self {
        SailError::StoreIo(Box::new(err))
    }

    pub fn evaluation(err: impl StdError + Send + Sync + 'static) -> Self {
        SailError::Evaluation(Box::new(err))
    }

    /// Whether this error should be treated as terminal for the owning
    /// transaction (no further operations can succeed until rollback).
    pub fn is_terminal_for_transaction(&self) -> bool {
        matches!(self, SailError::Conflict | SailError::StoreIo(_))
    }
}

pub type SailResult<T> = Result<T, SailError>;
