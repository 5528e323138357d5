//! The configured rule kinds: one struct per kind, each composing a
//! [`ConfiguredItem`] rather than inheriting from it.

use std::fmt;
use std::sync::Arc;

use remap_model::{MappingData, TypeName, Value};

use crate::item::ConfiguredItem;

/// A user-supplied factory producing a target member's value.
pub type SourceFactory =
    Arc<dyn Fn(&MappingData<'_>) -> Result<Value, String> + Send + Sync>;

/// A user-supplied callback invoked around a mapping position.
pub type CallbackAction = Arc<dyn Fn(&MappingData<'_>) + Send + Sync>;

/// A user-supplied handler invoked when a data source fails; supplies the
/// fallback value used instead.
pub type ExceptionHandler = Arc<dyn Fn(&MappingData<'_>, &str) -> Value + Send + Sync>;

/// A user-supplied factory constructing the target instance itself.
pub type TargetFactory = Arc<dyn Fn(&MappingData<'_>) -> Value + Send + Sync>;

/// Ignore rule: the matched target member is skipped entirely.
#[derive(Debug, Clone)]
pub struct IgnoredMember {
    pub item: ConfiguredItem,
}

impl IgnoredMember {
    pub fn new(item: ConfiguredItem) -> Self {
        Self { item }
    }
}

/// A custom data source for a target member; the highest-priority candidate
/// in the member's fallback chain.
#[derive(Clone)]
pub struct DataSourceOverride {
    pub item: ConfiguredItem,
    pub factory: SourceFactory,
}

impl DataSourceOverride {
    pub fn new(item: ConfiguredItem, factory: SourceFactory) -> Self {
        Self { item, factory }
    }
}

impl fmt::Debug for DataSourceOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSourceOverride")
            .field("item", &self.item)
            .finish_non_exhaustive()
    }
}

/// Where a mapping callback runs relative to its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackPosition {
    Before,
    After,
}

/// A callback positioned before or after a root mapping or a specific
/// member population.
#[derive(Clone)]
pub struct MappingCallback {
    pub item: ConfiguredItem,
    pub position: CallbackPosition,
    pub action: CallbackAction,
}

impl MappingCallback {
    pub fn new(item: ConfiguredItem, position: CallbackPosition, action: CallbackAction) -> Self {
        Self {
            item,
            position,
            action,
        }
    }
}

impl fmt::Debug for MappingCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingCallback")
            .field("item", &self.item)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

/// An exception callback: intercepts a failing data source for the matched
/// member/intent and supplies a fallback value.
#[derive(Clone)]
pub struct ExceptionCallback {
    pub item: ConfiguredItem,
    pub handler: ExceptionHandler,
}

impl ExceptionCallback {
    pub fn new(item: ConfiguredItem, handler: ExceptionHandler) -> Self {
        Self { item, handler }
    }
}

impl fmt::Debug for ExceptionCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionCallback")
            .field("item", &self.item)
            .finish_non_exhaustive()
    }
}

/// A custom target-instance factory, consulted before default construction.
#[derive(Clone)]
pub struct ObjectFactory {
    pub item: ConfiguredItem,
    pub factory: TargetFactory,
}

impl ObjectFactory {
    pub fn new(item: ConfiguredItem, factory: TargetFactory) -> Self {
        Self { item, factory }
    }
}

impl fmt::Debug for ObjectFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectFactory")
            .field("item", &self.item)
            .finish_non_exhaustive()
    }
}

/// A registered pairing of derived source and target types under a base
/// type pair; drives polymorphic dispatch.
#[derive(Debug, Clone)]
pub struct DerivedTypePair {
    pub item: ConfiguredItem,
    pub derived_source: TypeName,
    pub derived_target: TypeName,
}

impl DerivedTypePair {
    pub fn new(item: ConfiguredItem, derived_source: TypeName, derived_target: TypeName) -> Self {
        Self {
            item,
            derived_source,
            derived_target,
        }
    }
}

/// The part of a derived type's name that distinguishes it from its base:
/// the longest suffix shared with the base name is stripped (`DogDto` under
/// `AnimalDto` -> `dog`, `Dog` under `Animal` -> `dog`). Source and target
/// derived types with equal discriminators pair automatically.
pub fn discriminator(derived: &TypeName, base: &TypeName) -> String {
    let derived = derived.as_str().to_ascii_lowercase();
    let base = base.as_str().to_ascii_lowercase();
    let shared = derived
        .bytes()
        .rev()
        .zip(base.bytes().rev())
        .take_while(|(a, b)| a == b)
        .count();
    let mut cut = derived.len() - shared;
    while !derived.is_char_boundary(cut) {
        cut += 1;
    }
    derived[..cut].to_string()
}
