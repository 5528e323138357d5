//! The mapping engine: plan compilation, the plan cache and execution.
//!
//! The [`Mapper`] is the entry point. It compiles a plan per (source type,
//! target type, intent, position) on first use, caches it for its lifetime
//! and executes it against live value graphs: nested objects recurse,
//! collections reconcile by identity or position, derived source types
//! dispatch to derived targets, and cyclic graphs terminate.

#![deny(unsafe_code)]

mod cache;
mod collections;
mod context;
mod convert;
mod error;
mod mapper;
mod plan;
mod source;

pub use convert::{StandardConverter, ValueConverter};
pub use error::MapError;
pub use mapper::Mapper;
