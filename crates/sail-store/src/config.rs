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

use sail_model::IsolationLevel;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Store-wide settings a deployment tunes at startup. Grounded on the
/// teacher's `db::Config` (itself loaded from a TOML/env layer one level up
/// the stack, outside this crate's scope).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StoreConfig {
    /// The isolation level a `Connection::begin` call gets when it doesn't
    /// ask for one explicitly.
    pub default_isolation_level: IsolationLevel,
    /// The levels this store can actually provide, weakest first. Passed to
    /// `IsolationLevel::negotiate` on every `begin`.
    pub supported_isolation_levels: Vec<IsolationLevel>,
    /// Writes auto-flush after this many buffered operations on a
    /// connection, bounding how much a long write transaction can hold
    /// before it becomes visible to conflict detection.
    pub auto_flush_block_size: usize,
    /// Whether to record an allocation site for every open dataset/sink, so
    /// `LeakTracker::sweep` can name what was left open.
    pub track_resource_sites: bool,
    /// How often a background sweep should check for resources left open
    /// past a reasonable lifetime.
    pub leak_collection_interval_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_isolation_level: IsolationLevel::default(),
            supported_isolation_levels: IsolationLevel::ALL.to_vec(),
            auto_flush_block_size: 1_000,
            track_resource_sites: false,
            leak_collection_interval_ms: 30_000,
        }
    }
}
