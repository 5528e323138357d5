//! The runtime view handed to user-supplied conditions, factories and
//! callbacks.

use crate::intent::MappingIntent;
use crate::path::QualifiedPath;
use crate::value::Value;

/// A snapshot of the current mapping position.
///
/// Conditions, data-source factories and callbacks receive this view; it
/// never outlives the mapping call that produced it.
#[derive(Debug, Clone, Copy)]
pub struct MappingData<'a> {
    /// The source value at the current position.
    pub source: &'a Value,
    /// The target value, when one exists yet.
    pub target: Option<&'a Value>,
    pub intent: MappingIntent,
    pub target_path: &'a QualifiedPath,
    /// The element index when mapping inside a collection.
    pub element_index: Option<usize>,
}

impl<'a> MappingData<'a> {
    pub fn new(
        source: &'a Value,
        target: Option<&'a Value>,
        intent: MappingIntent,
        target_path: &'a QualifiedPath,
    ) -> Self {
        Self {
            source,
            target,
            intent,
            target_path,
            element_index: None,
        }
    }

    pub fn with_index(mut self, index: Option<usize>) -> Self {
        self.element_index = index;
        self
    }
}
