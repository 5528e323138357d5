//! Qualified member paths from the mapping root.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::member::Member;
use crate::registry::TypeRegistry;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
enum PathKind {
    /// Matches every member; used by rules with no target expression.
    All,
    /// Matches no member; used by root-scoped callbacks.
    None,
    /// An ordered member chain from the mapping root (empty = the root).
    Members(Vec<Member>),
}

/// An ordered sequence of members from the mapping root to the current
/// position, or one of the two sentinels (`all` / `none`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualifiedPath {
    kind: PathKind,
}

impl QualifiedPath {
    pub fn all() -> Self {
        Self { kind: PathKind::All }
    }

    pub fn none() -> Self {
        Self { kind: PathKind::None }
    }

    /// The mapping root itself.
    pub fn root() -> Self {
        Self {
            kind: PathKind::Members(Vec::new()),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self.kind, PathKind::All)
    }

    pub fn is_none(&self) -> bool {
        matches!(self.kind, PathKind::None)
    }

    pub fn is_root(&self) -> bool {
        matches!(&self.kind, PathKind::Members(members) if members.is_empty())
    }

    pub fn members(&self) -> &[Member] {
        match &self.kind {
            PathKind::Members(members) => members,
            _ => &[],
        }
    }

    pub fn leaf(&self) -> Option<&Member> {
        self.members().last()
    }

    /// Extend the path with one more member. Sentinels are unchanged.
    pub fn append(&self, member: Member) -> Self {
        match &self.kind {
            PathKind::Members(members) => {
                let mut members = members.clone();
                members.push(member);
                Self {
                    kind: PathKind::Members(members),
                }
            }
            _ => self.clone(),
        }
    }

    pub fn full_name(&self) -> String {
        match &self.kind {
            PathKind::All => "<all>".to_string(),
            PathKind::None => "<none>".to_string(),
            PathKind::Members(members) => members
                .iter()
                .map(|m| m.name.as_str())
                .collect::<Vec<_>>()
                .join("."),
        }
    }

    /// Whether two paths refer to the same target member.
    ///
    /// Paths match across a type hierarchy: equal leaf name and value type
    /// with compatible declaring types count as a match even when declared on
    /// different levels. The sentinel checks are order-significant.
    pub fn matches(&self, other: &QualifiedPath, types: &TypeRegistry) -> bool {
        if self.is_all() || other.is_all() {
            return true;
        }
        if self == other {
            return true;
        }
        if self.is_none() || other.is_none() {
            return false;
        }
        let (Some(a), Some(b)) = (self.leaf(), other.leaf()) else {
            return false;
        };
        a.name == b.name
            && a.value_type == b.value_type
            && (types.is_assignable(&a.declaring_type, &b.declaring_type)
                || types.is_assignable(&b.declaring_type, &a.declaring_type))
    }

    /// Containment test: does `self` lie on the path from the root to
    /// `other`? Used to decide whether a rule scoped to an ancestor member
    /// still applies to a descendant.
    pub fn is_root_of(&self, other: &QualifiedPath) -> bool {
        if self.is_all() {
            return true;
        }
        if self.is_none() || other.is_none() || other.is_all() {
            return false;
        }
        let own = self.members();
        let others = other.members();
        own.len() <= others.len()
            && own
                .iter()
                .zip(others)
                .all(|(a, b)| a.name.eq_ignore_ascii_case(&b.name))
    }

    /// Read the value at this path from the mapping root instance.
    ///
    /// Missing or incompatible intermediate values yield defaults rather
    /// than errors, so speculative reads stay cheap.
    pub fn access(&self, root: &Value) -> Value {
        let mut current = root.clone();
        for member in self.members() {
            current = member.access_value(&current);
        }
        match self.kind {
            PathKind::Members(_) => current,
            _ => Value::Null,
        }
    }

    /// Write `value` at this path, walking from the root to the leaf's
    /// parent and dispatching the final write on the leaf's access kind.
    pub fn populate(&self, root: &Value, value: Value) -> Result<(), ModelError> {
        let members = self.members();
        let Some((leaf, parents)) = members.split_last() else {
            return Ok(());
        };
        let mut current = root.clone();
        for member in parents {
            current = member.access_value(&current);
            if current.as_object().is_none() {
                return Err(ModelError::PopulateNonObject {
                    member: member.name.clone(),
                });
            }
        }
        leaf.populate(&current, value)
    }
}

impl fmt::Display for QualifiedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}
