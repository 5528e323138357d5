//! The configuration registry: append-only stores of configured rules,
//! validated against each other at registration time.

use std::collections::HashMap;

use remap_model::{TypeName, TypeRegistry};

use crate::error::ConfigError;
use crate::item::{ConfiguredItem, RuleContext};
use crate::rules::{
    CallbackPosition, DataSourceOverride, DerivedTypePair, ExceptionCallback, IgnoredMember,
    MappingCallback, ObjectFactory, discriminator,
};

/// Explicitly configured identity members, keyed by element type.
#[derive(Debug, Default, Clone)]
pub struct MemberIdentifierSet {
    identifiers: HashMap<TypeName, String>,
}

impl MemberIdentifierSet {
    /// Register the identity member for a type. A second, different
    /// registration for the same type is a configuration error.
    pub fn add(&mut self, type_name: TypeName, member: impl Into<String>) -> Result<(), ConfigError> {
        let member = member.into();
        if let Some(existing) = self.identifiers.get(&type_name) {
            if *existing != member {
                return Err(ConfigError::DuplicateIdentifier {
                    type_name: type_name.as_str().to_string(),
                    existing: existing.clone(),
                });
            }
            return Ok(());
        }
        self.identifiers.insert(type_name, member);
        Ok(())
    }

    pub fn identifier_for(&self, type_name: &TypeName) -> Option<&str> {
        self.identifiers.get(type_name).map(String::as_str)
    }

    fn clear(&mut self) {
        self.identifiers.clear();
    }
}

/// Append-only set of user-declared rules, one store per kind.
///
/// New registrations are validated against existing entries; conflicts are
/// rejected here, never silently resolved at mapping time. Cleared only by
/// explicit [`reset`](Self::reset).
#[derive(Debug, Default)]
pub struct ConfigurationSet {
    ignored_members: Vec<IgnoredMember>,
    data_sources: Vec<DataSourceOverride>,
    callbacks: Vec<MappingCallback>,
    exception_callbacks: Vec<ExceptionCallback>,
    object_factories: Vec<ObjectFactory>,
    derived_pairs: Vec<DerivedTypePair>,
    identifiers: MemberIdentifierSet,
}

impl ConfigurationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an ignore rule. Conflicts: an equivalent ignore already
    /// exists, or the member has a configured data source.
    pub fn add_ignored_member(
        &mut self,
        rule: IgnoredMember,
        types: &TypeRegistry,
    ) -> Result<(), ConfigError> {
        Self::ensure_writable(&rule.item)?;
        if let Some(conflict) = self
            .ignored_members
            .iter()
            .find(|existing| existing.item.conflicts_with(&rule.item, types))
        {
            return Err(ConfigError::MemberAlreadyIgnored {
                path: conflict.item.describe(),
            });
        }
        if let Some(conflict) = self
            .data_sources
            .iter()
            .find(|existing| existing.item.conflicts_with(&rule.item, types))
        {
            return Err(ConfigError::IgnoredMemberHasDataSource {
                path: conflict.item.describe(),
            });
        }
        self.ignored_members.push(rule);
        Ok(())
    }

    /// Register a custom data source. Conflicts: the member is ignored, or
    /// an equivalent unconditioned data source already exists.
    pub fn add_data_source(
        &mut self,
        rule: DataSourceOverride,
        types: &TypeRegistry,
    ) -> Result<(), ConfigError> {
        Self::ensure_writable(&rule.item)?;
        if let Some(conflict) = self
            .ignored_members
            .iter()
            .find(|existing| existing.item.conflicts_with(&rule.item, types))
        {
            return Err(ConfigError::DataSourceForIgnoredMember {
                path: conflict.item.describe(),
            });
        }
        if let Some(conflict) = self
            .data_sources
            .iter()
            .find(|existing| existing.item.conflicts_with(&rule.item, types))
        {
            return Err(ConfigError::DuplicateDataSource {
                path: conflict.item.describe(),
            });
        }
        self.data_sources.push(rule);
        Ok(())
    }

    pub fn add_callback(&mut self, callback: MappingCallback) {
        self.callbacks.push(callback);
    }

    pub fn add_exception_callback(&mut self, callback: ExceptionCallback) {
        self.exception_callbacks.push(callback);
    }

    pub fn add_object_factory(&mut self, factory: ObjectFactory) {
        self.object_factories.push(factory);
    }

    /// Register a derived-type pairing. Rejected when the derived source or
    /// target adds nothing, when the derived source is unrelated to the
    /// declared source, or when the name-convention auto-pairing already
    /// covers the pair.
    pub fn add_derived_pair(
        &mut self,
        pair: DerivedTypePair,
        types: &TypeRegistry,
    ) -> Result<(), ConfigError> {
        let scope = pair.item.scope();
        let source = scope.source_type().clone();
        let target = scope.target_type().clone();

        if pair.derived_source == source && !pair.item.has_condition() {
            return Err(ConfigError::InvalidDerivedSourceType {
                source_type: source.as_str().to_string(),
                target_type: target.as_str().to_string(),
            });
        }
        if pair.derived_target == target {
            return Err(ConfigError::InvalidDerivedTargetType {
                source_type: source.as_str().to_string(),
                target_type: target.as_str().to_string(),
            });
        }
        if !types.is_assignable(&source, &pair.derived_source) {
            return Err(ConfigError::UnrelatedDerivedSourceType {
                derived: pair.derived_source.as_str().to_string(),
                source_type: source.as_str().to_string(),
            });
        }
        let automatic = !pair.item.has_condition()
            && discriminator(&pair.derived_source, &source)
                == discriminator(&pair.derived_target, &target);
        if automatic {
            return Err(ConfigError::RedundantDerivedPair {
                source_type: source.as_str().to_string(),
                target_type: target.as_str().to_string(),
                derived_source: pair.derived_source.as_str().to_string(),
                derived_target: pair.derived_target.as_str().to_string(),
            });
        }
        self.derived_pairs.push(pair);
        Ok(())
    }

    pub fn set_identifier(
        &mut self,
        type_name: TypeName,
        member: impl Into<String>,
    ) -> Result<(), ConfigError> {
        self.identifiers.add(type_name, member)
    }

    pub fn identifier_for(&self, type_name: &TypeName) -> Option<&str> {
        self.identifiers.identifier_for(type_name)
    }

    /// The most specific ignore rule applying at a position, if any.
    pub fn member_ignore(
        &self,
        ctx: &RuleContext<'_>,
        types: &TypeRegistry,
    ) -> Option<&IgnoredMember> {
        Self::best_match(self.ignored_members.iter().map(|r| (&r.item, r)), ctx, types)
    }

    /// All data sources applying at a position, most specific first.
    pub fn data_sources(
        &self,
        ctx: &RuleContext<'_>,
        types: &TypeRegistry,
    ) -> Vec<&DataSourceOverride> {
        Self::matches(self.data_sources.iter().map(|r| (&r.item, r)), ctx, types)
    }

    /// The most specific callback for a position and placement, if any.
    pub fn callback(
        &self,
        position: CallbackPosition,
        ctx: &RuleContext<'_>,
        types: &TypeRegistry,
    ) -> Option<&MappingCallback> {
        Self::best_match(
            self.callbacks
                .iter()
                .filter(|c| c.position == position)
                .map(|c| (&c.item, c)),
            ctx,
            types,
        )
    }

    pub fn exception_callback(
        &self,
        ctx: &RuleContext<'_>,
        types: &TypeRegistry,
    ) -> Option<&ExceptionCallback> {
        Self::best_match(
            self.exception_callbacks.iter().map(|c| (&c.item, c)),
            ctx,
            types,
        )
    }

    pub fn object_factory(
        &self,
        ctx: &RuleContext<'_>,
        types: &TypeRegistry,
    ) -> Option<&ObjectFactory> {
        Self::best_match(
            self.object_factories.iter().map(|f| (&f.item, f)),
            ctx,
            types,
        )
    }

    pub fn derived_pairs(&self) -> &[DerivedTypePair] {
        &self.derived_pairs
    }

    /// Clear every store; the only way rules go away.
    pub fn reset(&mut self) {
        self.ignored_members.clear();
        self.data_sources.clear();
        self.callbacks.clear();
        self.exception_callbacks.clear();
        self.object_factories.clear();
        self.derived_pairs.clear();
        self.identifiers.clear();
    }

    fn ensure_writable(item: &ConfiguredItem) -> Result<(), ConfigError> {
        if let Some(leaf) = item.target_path().leaf()
            && !leaf.writable
        {
            return Err(ConfigError::UnwritableTargetMember {
                path: item.target_path().full_name(),
            });
        }
        Ok(())
    }

    fn matches<'a, R>(
        rules: impl Iterator<Item = (&'a ConfiguredItem, &'a R)>,
        ctx: &RuleContext<'_>,
        types: &TypeRegistry,
    ) -> Vec<&'a R> {
        let mut applicable: Vec<(&ConfiguredItem, &R)> = rules
            .filter(|(item, _)| item.applies_to(ctx, types))
            .collect();
        applicable.sort_by(|(a, _), (b, _)| a.specificity(b, types));
        applicable.into_iter().map(|(_, rule)| rule).collect()
    }

    fn best_match<'a, R>(
        rules: impl Iterator<Item = (&'a ConfiguredItem, &'a R)>,
        ctx: &RuleContext<'_>,
        types: &TypeRegistry,
    ) -> Option<&'a R> {
        Self::matches(rules, ctx, types).into_iter().next()
    }
}
