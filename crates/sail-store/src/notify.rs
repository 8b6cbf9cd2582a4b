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

use std::sync::{Arc, RwLock};

use sail_model::Statement;

/// Notified when a `Connection` accepts a new inferred statement — the only
/// write path the spec calls out as needing external notification (a
/// reasoner re-deriving the same fact repeatedly should be told whether its
/// assertion was new).
pub trait ChangeListener: Send + Sync {
    fn inferred_statement_added(&self, statement: &Statement);
}

#[derive(Default)]
pub struct Notifier {
    listeners: RwLock<Vec<Arc<dyn ChangeListener>>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Arc<dyn ChangeListener>) {
        self.listeners.write().unwrap().push(listener);
    }

    pub fn notify_inferred_added(&self, statement: &Statement) {
        for listener in self.listeners.read().unwrap().iter() {
            listener.inferred_statement_added(statement);
        }
    }
}
