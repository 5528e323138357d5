//! Data sources and the per-member resolver.
//!
//! For one target member, candidates are collected in priority order:
//! user-configured overrides, then the auto-matched source member, then the
//! intent's fallback. The executor resolves the set to the value of the
//! first candidate whose condition holds and whose result is non-default;
//! the last candidate is the unconditional fallback.

use remap_config::{ConfigurationSet, DataSourceOverride, RuleContext};
use remap_model::{
    CollectionStrategy, MappingIntent, Member, MemberRole, QualifiedPath, TypeName, TypeRegistry,
};

use crate::error::MapError;

/// The intent-selected last candidate of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FallbackKind {
    /// Keep whatever the target member currently holds.
    LeaveExisting,
    /// Write the member type's default.
    TargetDefault,
}

/// One candidate value-producing expression for a target member.
#[derive(Debug, Clone)]
pub(crate) enum SourceKind {
    /// Auto-matched scalar source member, converted when types differ.
    SourceMember { path: QualifiedPath },
    /// User-configured factory; carries its own condition in the rule scope.
    Factory { rule: DataSourceOverride },
    /// Nested complex member, mapped through a child plan.
    ChildObject {
        source: QualifiedPath,
        target_type: TypeName,
    },
    /// Collection member, populated by the reconciliation engine.
    ChildCollection {
        source: QualifiedPath,
        strategy: CollectionStrategy,
    },
    Fallback(FallbackKind),
}

#[derive(Debug, Clone)]
pub(crate) struct DataSource {
    pub kind: SourceKind,
}

/// Ordered candidates for one target member. An empty set never attempts
/// to populate its member.
#[derive(Debug, Clone, Default)]
pub(crate) struct DataSourceSet {
    pub sources: Vec<DataSource>,
}

impl DataSourceSet {
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Build the candidate chain for one target member.
///
/// Returns an empty set when nothing would populate the member: no override,
/// no auto-match, and a fallback that would only re-assign the member's
/// current value (the self-assignment collapse).
pub(crate) fn resolve_member_sources(
    member: &Member,
    ctx: &RuleContext<'_>,
    source_type: &TypeName,
    intent: MappingIntent,
    config: &ConfigurationSet,
    types: &TypeRegistry,
) -> Result<DataSourceSet, MapError> {
    let mut sources = Vec::new();

    for rule in config.data_sources(ctx, types) {
        sources.push(DataSource {
            kind: SourceKind::Factory { rule: rule.clone() },
        });
    }

    if let Some(auto) = auto_match(member, source_type, intent, types)? {
        sources.push(auto);
    }

    if sources.is_empty() {
        // Nothing real to populate from; the fallback alone would be a
        // self-assignment (leave-existing) or rewrite a fresh default.
        return Ok(DataSourceSet::default());
    }

    let fallback = if intent.retains_existing() {
        FallbackKind::LeaveExisting
    } else {
        FallbackKind::TargetDefault
    };
    sources.push(DataSource {
        kind: SourceKind::Fallback(fallback),
    });

    Ok(DataSourceSet { sources })
}

/// Find the source member matching a target member by name, and classify
/// the resulting candidate by the target member's declared type.
fn auto_match(
    member: &Member,
    source_type: &TypeName,
    intent: MappingIntent,
    types: &TypeRegistry,
) -> Result<Option<DataSource>, MapError> {
    let source_members = types.members_of(source_type, MemberRole::Source)?;
    let Some(matched) = source_members
        .iter()
        .find(|m| m.name.eq_ignore_ascii_case(&member.name))
    else {
        return Ok(None);
    };

    let source_path = QualifiedPath::root().append(matched.clone());
    let kind = match &member.value_type {
        t if t.is_scalar() && matched.value_type.is_scalar() => SourceKind::SourceMember {
            path: source_path,
        },
        remap_model::ValueType::Object(target_type)
            if matched.value_type.object_type().is_some() =>
        {
            SourceKind::ChildObject {
                source: source_path,
                target_type: target_type.clone(),
            }
        }
        t if t.is_collection() && matched.value_type.is_collection() => {
            // Plans are cached per intent, so the strategy is fixed here.
            SourceKind::ChildCollection {
                source: source_path,
                strategy: intent.collection_strategy(),
            }
        }
        _ => return Ok(None),
    };

    Ok(Some(DataSource { kind }))
}
