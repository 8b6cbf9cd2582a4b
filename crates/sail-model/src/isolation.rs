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

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The five-and-a-bit isolation levels the core negotiates between, in
/// strictly increasing strength. `Ord` is derived from declaration order so
/// `a >= b` reads as "at least as strong as".
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum IsolationLevel {
    None,
    ReadUncommitted,
    ReadCommitted,
    SnapshotRead,
    Snapshot,
    Serializable,
}

impl IsolationLevel {
    pub const ALL: [IsolationLevel; 6] = [
        IsolationLevel::None,
        IsolationLevel::ReadUncommitted,
        IsolationLevel::ReadCommitted,
        IsolationLevel::SnapshotRead,
        IsolationLevel::Snapshot,
        IsolationLevel::Serializable,
    ];

    /// Whether a branch needs to record read patterns for write-skew
    /// detection at this level.
    pub fn requires_observations(self) -> bool {
        self >= IsolationLevel::Serializable
    }

    /// Whether operations at this level are isolated behind a branch at all,
    /// as opposed to flowing straight through to the underlying source.
    pub fn is_transactional(self) -> bool {
        self >= IsolationLevel::ReadCommitted
    }

    /// Whether reads are repeatable for the lifetime of the transaction.
    pub fn is_repeatable_read(self) -> bool {
        self >= IsolationLevel::SnapshotRead
    }

    /// Negotiate a requested level against a store's supported set: the
    /// weakest supported level that is at least as strong as `requested`.
    /// Returns `None` if no supported level is strong enough.
    pub fn negotiate(requested: IsolationLevel, supported: &[IsolationLevel]) -> Option<IsolationLevel> {
        supported
            .iter()
            .copied()
            .filter(|&lvl| lvl >= requested)
            .min()
    }
}

impl Default for IsolationLevel {
    fn default() -> Self {
        IsolationLevel::ReadCommitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_increasing_strength() {
        assert!(IsolationLevel::None < IsolationLevel::ReadCommitted);
        assert!(IsolationLevel::Snapshot < IsolationLevel::Serializable);
    }

    #[test]
    fn negotiate_picks_weakest_sufficient_level() {
        let supported = [
            IsolationLevel::ReadCommitted,
            IsolationLevel::Snapshot,
            IsolationLevel::Serializable,
        ];
        assert_eq!(
            IsolationLevel::negotiate(IsolationLevel::ReadUncommitted, &supported),
            Some(IsolationLevel::ReadCommitted)
        );
        assert_eq!(
            IsolationLevel::negotiate(IsolationLevel::Snapshot, &supported),
            Some(IsolationLevel::Snapshot)
        );
    }

    #[test]
    fn negotiate_fails_when_nothing_strong_enough() {
        let supported = [IsolationLevel::ReadCommitted];
        assert_eq!(
            IsolationLevel::negotiate(IsolationLevel::Serializable, &supported),
            None
        );
    }
}
