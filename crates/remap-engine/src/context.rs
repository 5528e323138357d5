//! Per-call mapping state.

use std::cell::RefCell;
use std::collections::HashMap;

use remap_model::{TypeName, Value};

/// State scoped to one root mapping call.
///
/// Tracks every target created for a (source identity, target type) pair so
/// that cyclic source graphs terminate and diamond-shaped graphs map each
/// shared source to one shared target. Entries live until the root call
/// returns.
#[derive(Debug, Default)]
pub(crate) struct RootState {
    tracked: RefCell<HashMap<(usize, TypeName), Value>>,
}

impl RootState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracked_target(&self, source_identity: usize, target_type: &TypeName) -> Option<Value> {
        self.tracked
            .borrow()
            .get(&(source_identity, target_type.clone()))
            .cloned()
    }

    pub fn track(&self, source_identity: usize, target_type: TypeName, target: Value) {
        self.tracked
            .borrow_mut()
            .insert((source_identity, target_type), target);
    }
}
