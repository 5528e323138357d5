//! The shared core of every configured rule: scope + target path, with
//! context matching, conflict detection and the specificity ordering.

use std::cmp::Ordering;

use remap_model::{MappingData, MappingIntent, QualifiedPath, TypeName, TypeRegistry};

use crate::scope::RuleScope;

/// The compile-time view a rule is matched against: the mapping position's
/// intent, type pair and target path, linked to its enclosing positions.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub intent: MappingIntent,
    pub source_type: &'a TypeName,
    pub target_type: &'a TypeName,
    pub target_path: &'a QualifiedPath,
    pub parent: Option<&'a RuleContext<'a>>,
}

impl<'a> RuleContext<'a> {
    pub fn root(
        intent: MappingIntent,
        source_type: &'a TypeName,
        target_type: &'a TypeName,
        target_path: &'a QualifiedPath,
    ) -> Self {
        Self {
            intent,
            source_type,
            target_type,
            target_path,
            parent: None,
        }
    }

    pub fn child(
        &'a self,
        source_type: &'a TypeName,
        target_type: &'a TypeName,
        target_path: &'a QualifiedPath,
    ) -> Self {
        Self {
            intent: self.intent,
            source_type,
            target_type,
            target_path,
            parent: Some(self),
        }
    }

    /// This context followed by its enclosing contexts, innermost first.
    pub fn ancestors(&self) -> impl Iterator<Item = &RuleContext<'a>> {
        std::iter::successors(Some(self), |ctx| ctx.parent)
    }
}

/// Scope and target path shared by every rule kind.
#[derive(Debug, Clone)]
pub struct ConfiguredItem {
    scope: RuleScope,
    target: QualifiedPath,
}

impl ConfiguredItem {
    pub fn new(scope: RuleScope, target: QualifiedPath) -> Self {
        Self { scope, target }
    }

    /// An item with no target expression: applies to every member.
    pub fn for_all_members(scope: RuleScope) -> Self {
        Self::new(scope, QualifiedPath::all())
    }

    /// An item scoped to the mapping root only.
    pub fn for_root(scope: RuleScope) -> Self {
        Self::new(scope, QualifiedPath::none())
    }

    pub fn scope(&self) -> &RuleScope {
        &self.scope
    }

    pub fn target_path(&self) -> &QualifiedPath {
        &self.target
    }

    pub fn has_condition(&self) -> bool {
        self.scope.has_condition()
    }

    /// Evaluate the scope's condition against the live position; an
    /// unconditioned item always passes.
    pub fn condition_holds(&self, data: &MappingData<'_>) -> bool {
        self.scope
            .condition()
            .is_none_or(|condition| condition.evaluate(data))
    }

    /// Whether this rule applies at a mapping position: matching intent,
    /// matching target path, and a compatible type pair somewhere on the
    /// position's ancestor chain.
    pub fn applies_to(&self, ctx: &RuleContext<'_>, types: &TypeRegistry) -> bool {
        self.scope.intent_applies(ctx.intent)
            && self.target.matches(ctx.target_path, types)
            && ctx.ancestors().any(|ancestor| {
                self.scope
                    .compatible_with(ancestor.source_type, ancestor.target_type, types)
            })
    }

    /// Registration-time conflict test: overlapping target path, overlapping
    /// types, and no distinguishing condition on either side.
    pub fn conflicts_with(&self, other: &ConfiguredItem, types: &TypeRegistry) -> bool {
        if self.has_condition() || other.has_condition() {
            return false;
        }
        self.scope.overlaps(other.scope(), types) && self.target.matches(&other.target, types)
    }

    /// Specificity ordering: smaller orders first (higher priority).
    ///
    /// Conditioned items order before unconditioned ones; exact-type items
    /// before items declared for a base (compatible-but-inexact) type;
    /// reflexive comparisons are equal.
    pub fn specificity(&self, other: &ConfiguredItem, types: &TypeRegistry) -> Ordering {
        if std::ptr::eq(self, other) {
            return Ordering::Equal;
        }
        match (self.has_condition(), other.has_condition()) {
            (false, true) => return Ordering::Greater,
            (true, false) => return Ordering::Less,
            _ => {}
        }
        if self.scope.source_type() == other.scope().source_type() {
            if self.scope.target_type() == other.scope().target_type() {
                return Ordering::Equal;
            }
            return if self.scope.covers_target_of(other.scope(), types) {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }
        if self.scope.covers_source_of(other.scope(), types) {
            Ordering::Greater
        } else {
            Ordering::Less
        }
    }

    /// Diagnostic rendering used by configuration errors.
    pub fn describe(&self) -> String {
        format!(
            "{} -> {}, member '{}'",
            self.scope.source_type(),
            self.scope.target_type(),
            self.target.full_name()
        )
    }
}
