//! User-declared mapping rules for the remap engine.
//!
//! Rules are stored per kind in a [`ConfigurationSet`], validated against
//! each other when registered, matched against mapping positions through
//! [`RuleContext`], and ordered by specificity.

#![deny(unsafe_code)]

pub mod error;
pub mod item;
pub mod rules;
pub mod scope;
pub mod set;

pub use error::ConfigError;
pub use item::{ConfiguredItem, RuleContext};
pub use rules::{
    CallbackAction, CallbackPosition, DataSourceOverride, DerivedTypePair, ExceptionCallback,
    ExceptionHandler, IgnoredMember, MappingCallback, ObjectFactory, SourceFactory, TargetFactory,
    discriminator,
};
pub use scope::{Condition, RuleScope};
pub use set::{ConfigurationSet, MemberIdentifierSet};
