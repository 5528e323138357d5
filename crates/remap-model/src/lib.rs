//! Type, member and value model for the remap engine.
//!
//! This crate carries everything both the configuration registry and the
//! plan compiler agree on: validated type names, member metadata, qualified
//! paths, the dynamic value representation and the type registry that acts
//! as the member-discovery collaborator.

#![deny(unsafe_code)]

pub mod data;
pub mod error;
pub mod ids;
pub mod intent;
pub mod member;
pub mod path;
pub mod registry;
pub mod value;

pub use data::MappingData;
pub use error::ModelError;
pub use ids::TypeName;
pub use intent::{CollectionStrategy, MappingIntent};
pub use member::{AccessKind, Member, MemberRole, ValueType};
pub use path::QualifiedPath;
pub use registry::{TypeDescriptor, TypeRegistry};
pub use value::{ListRef, ListShape, ObjectRef, Value};
