//! Mapping plans and the plan compiler.
//!
//! A plan is compiled once per [`MapperKey`] and shared read-only between
//! threads. Child positions are not compiled inline; each child op records
//! the information needed to look its own plan up at execution time, which
//! keeps compilation non-recursive and lets mutually recursive type pairs
//! terminate.

use remap_config::{
    CallbackPosition, ConfigurationSet, DerivedTypePair, ExceptionCallback, IgnoredMember,
    MappingCallback, ObjectFactory, RuleContext,
};
use remap_model::{MappingIntent, Member, MemberRole, QualifiedPath, TypeName, TypeRegistry};
use tracing::warn;

use crate::error::MapError;
use crate::source::{DataSourceSet, resolve_member_sources};

/// Cache key of a compiled plan: the runtime type pair, the intent and the
/// position within the root mapping.
///
/// The ancestry records every (source, target) pair on the path from the
/// root. When a pair recurs, the child key collapses to the root-shaped key
/// for that pair, so recursive type graphs produce a bounded set of keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct MapperKey {
    pub source_type: TypeName,
    pub target_type: TypeName,
    pub intent: MappingIntent,
    pub target_path: String,
    pub ancestry: Vec<(TypeName, TypeName)>,
}

impl MapperKey {
    pub fn root(source_type: TypeName, target_type: TypeName, intent: MappingIntent) -> Self {
        let ancestry = vec![(source_type.clone(), target_type.clone())];
        Self {
            source_type,
            target_type,
            intent,
            target_path: String::new(),
            ancestry,
        }
    }

    /// The key of a child position under this one.
    pub fn child(&self, source_type: TypeName, target_type: TypeName, path: &QualifiedPath) -> Self {
        let pair = (source_type.clone(), target_type.clone());
        if self.ancestry.contains(&pair) {
            return Self::root(source_type, target_type, self.intent);
        }
        let mut ancestry = self.ancestry.clone();
        ancestry.push(pair);
        Self {
            source_type,
            target_type,
            intent: self.intent,
            target_path: path.full_name(),
            ancestry,
        }
    }

    /// The key of the same position with a derived type pair substituted.
    pub fn for_derived(&self, source_type: TypeName, target_type: TypeName) -> Self {
        let mut ancestry = self.ancestry.clone();
        if let Some(last) = ancestry.last_mut() {
            *last = (source_type.clone(), target_type.clone());
        }
        Self {
            source_type,
            target_type,
            intent: self.intent,
            target_path: self.target_path.clone(),
            ancestry,
        }
    }
}

/// One target-member population step.
#[derive(Debug)]
pub(crate) struct MemberOp {
    pub member: Member,
    /// The member's path relative to the plan's own root; rule matching is
    /// leaf-based, so relative paths suffice.
    pub path: QualifiedPath,
    pub sources: DataSourceSet,
    /// A conditioned ignore rule for this member; evaluated against the
    /// live position before the member is touched. Unconditioned ignores
    /// drop the op at compile time instead.
    pub ignore: Option<IgnoredMember>,
    pub before: Option<MappingCallback>,
    pub after: Option<MappingCallback>,
    pub exception: Option<ExceptionCallback>,
}

/// One derived-pair entry of a plan's dispatch table.
#[derive(Debug)]
pub(crate) struct DispatchPair {
    pub source: TypeName,
    pub target: TypeName,
    /// The configured rule behind the entry; `None` for name-convention
    /// auto-pairings.
    pub rule: Option<DerivedTypePair>,
}

/// A compiled mapping plan: the dispatch table, the target construction
/// rule and the ordered member ops for one (type pair, intent, position).
#[derive(Debug)]
pub(crate) struct MappingPlan {
    pub dispatch: Vec<DispatchPair>,
    pub factory: Option<ObjectFactory>,
    pub before: Option<MappingCallback>,
    pub after: Option<MappingCallback>,
    pub ops: Vec<MemberOp>,
}

/// Compile the plan for one key against the current configuration.
pub(crate) fn compile_plan(
    key: &MapperKey,
    config: &ConfigurationSet,
    types: &TypeRegistry,
) -> Result<MappingPlan, MapError> {
    if !types.contains(&key.source_type) {
        return Err(MapError::UnknownType(key.source_type.as_str().to_string()));
    }
    if !types.contains(&key.target_type) {
        return Err(MapError::UnknownType(key.target_type.as_str().to_string()));
    }

    let root_path = QualifiedPath::root();
    let plan_path = QualifiedPath::none();

    let mut ops = Vec::new();
    let target_members = types.members_of(&key.target_type, MemberRole::Target)?;
    for member in target_members.iter() {
        let member_path = QualifiedPath::root().append(member.clone());
        let op = with_rule_context(
            key,
            &root_path,
            &member_path,
            &mut |ctx| -> Result<Option<MemberOp>, MapError> {
                let ignore = config.member_ignore(ctx, types);
                if let Some(rule) = ignore
                    && !rule.item.has_condition()
                {
                    return Ok(None);
                }
                let sources = resolve_member_sources(
                    member,
                    ctx,
                    &key.source_type,
                    key.intent,
                    config,
                    types,
                )?;
                if sources.is_empty() {
                    return Ok(None);
                }
                Ok(Some(MemberOp {
                    member: member.clone(),
                    path: member_path.clone(),
                    sources,
                    ignore: ignore.cloned(),
                    before: config
                        .callback(CallbackPosition::Before, ctx, types)
                        .cloned(),
                    after: config.callback(CallbackPosition::After, ctx, types).cloned(),
                    exception: config.exception_callback(ctx, types).cloned(),
                }))
            },
        )?;
        if let Some(op) = op {
            ops.push(op);
        }
    }

    // Root callbacks and factories attach to the plan whose own type pair
    // the scope names. Matching through ancestor frames would re-fire them
    // around every nested mapping under that pair.
    let own_ctx = RuleContext::root(key.intent, &key.source_type, &key.target_type, &plan_path);
    let factory = config.object_factory(&own_ctx, types).cloned();
    let before = config
        .callback(CallbackPosition::Before, &own_ctx, types)
        .cloned();
    let after = config.callback(CallbackPosition::After, &own_ctx, types).cloned();

    let dispatch = build_dispatch(key, config, types);

    if ops.is_empty() && dispatch.is_empty() {
        warn!(
            source = %key.source_type,
            target = %key.target_type,
            "mapping plan has no operations; mapping will be a no-op"
        );
    }

    Ok(MappingPlan {
        dispatch,
        factory,
        before,
        after,
        ops,
    })
}

/// Run `f` with the rule-context chain for this key's position.
///
/// Ancestor frames carry their type pairs for scope matching; only the
/// innermost frame carries the member path being matched.
fn with_rule_context<T>(
    key: &MapperKey,
    root_path: &QualifiedPath,
    leaf_path: &QualifiedPath,
    f: &mut dyn FnMut(&RuleContext<'_>) -> T,
) -> T {
    fn descend<T>(
        intent: MappingIntent,
        ancestors: &[(TypeName, TypeName)],
        leaf: &(TypeName, TypeName),
        parent: Option<&RuleContext<'_>>,
        root_path: &QualifiedPath,
        leaf_path: &QualifiedPath,
        f: &mut dyn FnMut(&RuleContext<'_>) -> T,
    ) -> T {
        match ancestors.split_first() {
            Some((pair, rest)) => {
                let ctx = match parent {
                    Some(parent) => parent.child(&pair.0, &pair.1, root_path),
                    None => RuleContext::root(intent, &pair.0, &pair.1, root_path),
                };
                descend(intent, rest, leaf, Some(&ctx), root_path, leaf_path, f)
            }
            None => {
                let ctx = match parent {
                    Some(parent) => parent.child(&leaf.0, &leaf.1, leaf_path),
                    None => RuleContext::root(intent, &leaf.0, &leaf.1, leaf_path),
                };
                f(&ctx)
            }
        }
    }

    // Keys always carry at least their own pair; the fallback keeps the
    // split total.
    let own = (key.source_type.clone(), key.target_type.clone());
    let (leaf, ancestors) = key.ancestry.split_last().unwrap_or((&own, &[]));
    descend(key.intent, ancestors, leaf, None, root_path, leaf_path, f)
}

/// Assemble the dispatch table: configured derived pairs in scope, plus
/// name-convention auto-pairings, most derived source first with configured
/// entries ahead of automatic ones.
fn build_dispatch(
    key: &MapperKey,
    config: &ConfigurationSet,
    types: &TypeRegistry,
) -> Vec<DispatchPair> {
    let mut dispatch: Vec<DispatchPair> = Vec::new();

    for rule in config.derived_pairs() {
        let scope = rule.item.scope();
        if scope.intent_applies(key.intent)
            && scope.compatible_with(&key.source_type, &key.target_type, types)
        {
            dispatch.push(DispatchPair {
                source: rule.derived_source.clone(),
                target: rule.derived_target.clone(),
                rule: Some(rule.clone()),
            });
        }
    }

    // Auto-pairing candidates: derived source types tagged against the
    // key's source, plus the key's own source type tagged against each of
    // its bases. The latter covers plans keyed on an already-derived
    // runtime source under a base-typed target.
    let mut candidates: Vec<(TypeName, String)> = types
        .derived_types_of(&key.source_type)
        .into_iter()
        .map(|derived| {
            let tag = remap_config::discriminator(&derived, &key.source_type);
            (derived, tag)
        })
        .collect();
    let mut current = key.source_type.clone();
    while let Some(descriptor) = types.descriptor(&current) {
        match &descriptor.base {
            Some(base) => {
                let tag = remap_config::discriminator(&key.source_type, base);
                candidates.push((key.source_type.clone(), tag));
                current = base.clone();
            }
            None => break,
        }
    }

    let derived_targets = types.derived_types_of(&key.target_type);
    for (source, tag) in candidates {
        let auto = derived_targets
            .iter()
            .find(|candidate| remap_config::discriminator(candidate, &key.target_type) == tag);
        if let Some(derived_target) = auto {
            let already = dispatch
                .iter()
                .any(|entry| entry.source == source && entry.target == *derived_target);
            if !already {
                dispatch.push(DispatchPair {
                    source,
                    target: derived_target.clone(),
                    rule: None,
                });
            }
        }
    }

    // Stable sort: configured-before-auto ordering within a depth survives.
    dispatch.sort_by_key(|entry| std::cmp::Reverse(types.inheritance_depth(&entry.source)));
    dispatch
}
