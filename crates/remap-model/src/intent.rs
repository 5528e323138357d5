//! Mapping intents and the defaults they select.

use serde::{Deserialize, Serialize};

/// How a collection-valued member is reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionStrategy {
    /// Discard existing target content; project the source elements.
    Overwrite,
    /// Update matched elements in place, add new ones, remove the rest.
    Merge,
    /// Add new elements only; never update or remove existing ones.
    Append,
}

/// A named mapping mode. The intent selects default behaviors: the
/// collection strategy and the fallback data source for unmatched members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MappingIntent {
    /// Construct and populate a new target instance.
    CreateNew,
    /// Populate an existing target, replacing its state.
    Overwrite,
    /// Populate an existing target, preserving unmatched state and
    /// reconciling collections by identity.
    Merge,
    /// Add to an existing target; collections only grow.
    Append,
}

impl MappingIntent {
    pub fn collection_strategy(self) -> CollectionStrategy {
        match self {
            Self::CreateNew | Self::Overwrite => CollectionStrategy::Overwrite,
            Self::Merge => CollectionStrategy::Merge,
            Self::Append => CollectionStrategy::Append,
        }
    }

    /// Whether the fallback data source leaves the existing target value in
    /// place (merge-like intents) instead of constructing a default.
    pub fn retains_existing(self) -> bool {
        matches!(self, Self::Merge | Self::Append)
    }
}
