//! The mapper: entry points, plan execution and collection reconciliation.

use std::sync::Arc;

use remap_config::ConfigurationSet;
use remap_model::{
    CollectionStrategy, ListRef, ListShape, MappingData, MappingIntent, Member, QualifiedPath,
    TypeName, TypeRegistry, Value, ValueType,
};
use tracing::{debug, trace, warn};

use crate::cache::PlanCache;
use crate::collections::{CollectionData, identity_member_for};
use crate::context::RootState;
use crate::convert::{StandardConverter, ValueConverter, fits_type};
use crate::error::MapError;
use crate::plan::{MapperKey, MappingPlan, MemberOp};
use crate::source::{FallbackKind, SourceKind};

/// A configured, caching object mapper.
///
/// Cheap to share behind an `Arc` once configured: compiled plans and the
/// type registry are read concurrently, while configuration requires
/// exclusive access and invalidates the plan cache.
pub struct Mapper {
    types: Arc<TypeRegistry>,
    config: ConfigurationSet,
    cache: PlanCache,
    converter: Arc<dyn ValueConverter>,
}

impl Mapper {
    pub fn new(types: Arc<TypeRegistry>) -> Self {
        Self::with_converter(types, Arc::new(StandardConverter))
    }

    pub fn with_converter(types: Arc<TypeRegistry>, converter: Arc<dyn ValueConverter>) -> Self {
        Self {
            types,
            config: ConfigurationSet::new(),
            cache: PlanCache::new(),
            converter,
        }
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Mutable access to the rule stores. Compiled plans bake rules in, so
    /// any configuration access drops them; they recompile on next use.
    pub fn config_mut(&mut self) -> &mut ConfigurationSet {
        self.cache.clear();
        &mut self.config
    }

    /// Discard every configured rule and every compiled plan.
    pub fn reset(&mut self) {
        self.config.reset();
        self.cache.clear();
    }

    /// Number of compiled plans currently cached.
    pub fn plan_count(&self) -> usize {
        self.cache.compiled_count()
    }

    /// Construct and populate a new instance of `target_type` from `source`.
    pub fn map_new(&self, source: &Value, target_type: &TypeName) -> Result<Value, MapError> {
        let source_obj = source.as_object().ok_or(MapError::SourceNotObject)?;
        let key = MapperKey::root(
            source_obj.type_name(),
            target_type.clone(),
            MappingIntent::CreateNew,
        );
        debug!(source = %key.source_type, target = %key.target_type, "map new");
        self.map_object(source, None, &key, &RootState::new(), None)
    }

    /// Merge `source` onto an existing target: matched members update,
    /// unmatched target state is preserved.
    pub fn map_onto(&self, source: &Value, target: &Value) -> Result<Value, MapError> {
        self.map_existing(source, target, MappingIntent::Merge, None)
    }

    /// Overwrite an existing target's state from `source`.
    pub fn map_over(&self, source: &Value, target: &Value) -> Result<Value, MapError> {
        self.map_existing(source, target, MappingIntent::Overwrite, None)
    }

    /// Add to an existing target: collections only grow, existing state is
    /// preserved.
    pub fn map_append(&self, source: &Value, target: &Value) -> Result<Value, MapError> {
        self.map_existing(source, target, MappingIntent::Append, None)
    }

    /// Merge one collection element onto an existing target element; the
    /// index is visible to conditions and callbacks.
    pub fn map_element(
        &self,
        source: &Value,
        target: &Value,
        index: usize,
    ) -> Result<Value, MapError> {
        self.map_existing(source, target, MappingIntent::Merge, Some(index))
    }

    fn map_existing(
        &self,
        source: &Value,
        target: &Value,
        intent: MappingIntent,
        element_index: Option<usize>,
    ) -> Result<Value, MapError> {
        let source_obj = source.as_object().ok_or(MapError::SourceNotObject)?;
        let target_obj = target.as_object().ok_or(MapError::TargetNotObject)?;
        let key = MapperKey::root(source_obj.type_name(), target_obj.type_name(), intent);
        debug!(source = %key.source_type, target = %key.target_type, intent = ?intent, "map existing");
        self.map_object(source, Some(target), &key, &RootState::new(), element_index)
    }

    fn map_object(
        &self,
        source: &Value,
        existing: Option<&Value>,
        key: &MapperKey,
        state: &RootState,
        element_index: Option<usize>,
    ) -> Result<Value, MapError> {
        let source_obj = source.as_object().ok_or(MapError::SourceNotObject)?;
        let plan = self.cache.get_or_compile(key, &self.config, &self.types)?;

        let runtime = source_obj.type_name();
        let none_path = QualifiedPath::none();
        for entry in &plan.dispatch {
            if entry.source == key.source_type && entry.target == key.target_type {
                continue;
            }
            if !self.types.is_assignable(&entry.source, &runtime) {
                continue;
            }
            // An existing target that cannot be treated as the derived
            // target type blocks the pairing.
            if let Some(Value::Object(existing_obj)) = existing
                && !self.types.is_assignable(&entry.target, &existing_obj.type_name())
            {
                continue;
            }
            if let Some(rule) = &entry.rule {
                let data = MappingData::new(source, existing, key.intent, &none_path)
                    .with_index(element_index);
                if !rule.item.condition_holds(&data) {
                    continue;
                }
            }
            trace!(source = %entry.source, target = %entry.target, "derived-type dispatch");
            let derived = key.for_derived(entry.source.clone(), entry.target.clone());
            return self.map_object(source, existing, &derived, state, element_index);
        }

        // A source already mapped to this target type in this call yields
        // the same target; this terminates cycles and keeps shared sources
        // shared on the target side.
        if let Some(seen) = state.tracked_target(source_obj.identity(), &key.target_type) {
            return Ok(seen);
        }

        let data =
            MappingData::new(source, existing, key.intent, &none_path).with_index(element_index);
        let target = match existing {
            Some(value @ Value::Object(existing_obj))
                if self
                    .types
                    .is_assignable(&key.target_type, &existing_obj.type_name()) =>
            {
                value.clone()
            }
            _ => self.create_target(&plan, &data, &key.target_type)?,
        };
        state.track(source_obj.identity(), key.target_type.clone(), target.clone());

        if let Some(callback) = &plan.before {
            let data = MappingData::new(source, Some(&target), key.intent, &none_path)
                .with_index(element_index);
            if callback.item.condition_holds(&data) {
                (callback.action)(&data);
            }
        }

        for op in &plan.ops {
            self.populate_member(op, source, &target, key, state, element_index)?;
        }

        if let Some(callback) = &plan.after {
            let data = MappingData::new(source, Some(&target), key.intent, &none_path)
                .with_index(element_index);
            if callback.item.condition_holds(&data) {
                (callback.action)(&data);
            }
        }

        Ok(target)
    }

    fn create_target(
        &self,
        plan: &MappingPlan,
        data: &MappingData<'_>,
        target_type: &TypeName,
    ) -> Result<Value, MapError> {
        if let Some(factory) = &plan.factory
            && factory.item.condition_holds(data)
        {
            let made = (factory.factory)(data);
            if made.as_object().is_some() {
                return Ok(made);
            }
            warn!(target = %target_type, "object factory produced a non-object; constructing default");
        }
        Ok(Value::Object(self.types.new_instance(target_type)?))
    }

    fn populate_member(
        &self,
        op: &MemberOp,
        source: &Value,
        target: &Value,
        key: &MapperKey,
        state: &RootState,
        element_index: Option<usize>,
    ) -> Result<(), MapError> {
        if let Some(ignore) = &op.ignore {
            let data = MappingData::new(source, Some(target), key.intent, &op.path)
                .with_index(element_index);
            if ignore.item.condition_holds(&data) {
                return Ok(());
            }
        }

        if let Some(callback) = &op.before {
            let data = MappingData::new(source, Some(target), key.intent, &op.path)
                .with_index(element_index);
            if callback.item.condition_holds(&data) {
                (callback.action)(&data);
            }
        }

        self.apply_sources(op, source, target, key, state, element_index)?;

        if let Some(callback) = &op.after {
            let data = MappingData::new(source, Some(target), key.intent, &op.path)
                .with_index(element_index);
            if callback.item.condition_holds(&data) {
                (callback.action)(&data);
            }
        }
        Ok(())
    }

    /// Walk the member's candidate chain: the first candidate whose
    /// condition holds and whose value is non-default wins; the final
    /// fallback applies unconditionally.
    fn apply_sources(
        &self,
        op: &MemberOp,
        source: &Value,
        target: &Value,
        key: &MapperKey,
        state: &RootState,
        element_index: Option<usize>,
    ) -> Result<(), MapError> {
        let current = op.member.access_value(target);
        let total = op.sources.sources.len();

        for (index, candidate) in op.sources.sources.iter().enumerate() {
            let last = index + 1 == total;
            let produced = match &candidate.kind {
                SourceKind::SourceMember { path } => {
                    let raw = path.access(source);
                    if raw.is_null() {
                        None
                    } else if fits_type(&raw, &op.member.value_type, &self.types) {
                        Some(raw)
                    } else {
                        self.converter.convert(&raw, &op.member.value_type)
                    }
                }
                SourceKind::Factory { rule } => {
                    let data = MappingData::new(source, Some(target), key.intent, &op.path)
                        .with_index(element_index);
                    if rule.item.condition_holds(&data) {
                        match (rule.factory)(&data) {
                            Ok(value) => Some(value),
                            Err(message) => Some(self.recover_source(op, &data, message)?),
                        }
                    } else {
                        None
                    }
                }
                SourceKind::ChildObject {
                    source: source_path,
                    target_type,
                } => {
                    let raw = source_path.access(source);
                    match &raw {
                        Value::Object(child) => {
                            let child_key =
                                key.child(child.type_name(), target_type.clone(), &op.path);
                            let existing_child = match &current {
                                Value::Object(_) => Some(&current),
                                _ => None,
                            };
                            Some(self.map_object(&raw, existing_child, &child_key, state, None)?)
                        }
                        _ => None,
                    }
                }
                SourceKind::ChildCollection {
                    source: source_path,
                    strategy,
                } => {
                    let raw = source_path.access(source);
                    match raw.as_list() {
                        Some(list) => Some(self.reconcile_collection(
                            list,
                            current.as_list().cloned(),
                            &op.member,
                            *strategy,
                            key,
                            state,
                        )?),
                        None => None,
                    }
                }
                SourceKind::Fallback(FallbackKind::LeaveExisting) => break,
                SourceKind::Fallback(FallbackKind::TargetDefault) => {
                    Some(op.member.default_value())
                }
            };

            let Some(value) = produced else { continue };
            if !last && value.is_default_for(&op.member.value_type) {
                continue;
            }
            trace!(member = %op.path, candidate = index, "member populated");
            op.member.populate(target, value)?;
            break;
        }
        Ok(())
    }

    /// A failing data source is recoverable when an exception callback is
    /// configured for the position; otherwise it aborts the mapping.
    fn recover_source(
        &self,
        op: &MemberOp,
        data: &MappingData<'_>,
        message: String,
    ) -> Result<Value, MapError> {
        if let Some(handler) = &op.exception
            && handler.item.condition_holds(data)
        {
            warn!(member = %op.path, error = %message, "data source failed; using callback fallback");
            return Ok((handler.handler)(data, &message));
        }
        Err(MapError::DataSource {
            path: op.path.full_name(),
            message,
        })
    }

    fn reconcile_collection(
        &self,
        source: &ListRef,
        existing: Option<ListRef>,
        member: &Member,
        strategy: CollectionStrategy,
        key: &MapperKey,
        state: &RootState,
    ) -> Result<Value, MapError> {
        let element_type = member
            .value_type
            .element()
            .cloned()
            .unwrap_or(ValueType::Text);
        let shape = member
            .value_type
            .collection_shape()
            .unwrap_or(ListShape::Growable);
        let source_elements = source.elements();
        let target_elements = existing.as_ref().map(ListRef::elements).unwrap_or_default();

        let merged = match strategy {
            CollectionStrategy::Overwrite => {
                let mut projected = Vec::with_capacity(source_elements.len());
                for (index, element) in source_elements.iter().enumerate() {
                    projected.push(
                        self.project_element(element, None, &element_type, member, index, key, state)?,
                    );
                }
                projected
            }
            CollectionStrategy::Merge => {
                let data = self.partition(&source_elements, &target_elements, &element_type);
                let mut merged = Vec::with_capacity(data.intersection.len() + data.new_source.len());
                for (index, (src, tgt)) in data.intersection.iter().enumerate() {
                    merged.push(
                        self.project_element(src, Some(tgt), &element_type, member, index, key, state)?,
                    );
                }
                let offset = merged.len();
                for (index, src) in data.new_source.iter().enumerate() {
                    merged.push(self.project_element(
                        src,
                        None,
                        &element_type,
                        member,
                        offset + index,
                        key,
                        state,
                    )?);
                }
                // Target-only elements are removed by merge.
                merged
            }
            CollectionStrategy::Append => {
                let mut merged = target_elements.clone();
                match &element_type {
                    ValueType::Object(_) => {
                        let data = self.partition(&source_elements, &target_elements, &element_type);
                        for (index, src) in data.new_source.iter().enumerate() {
                            let projected = self.project_element(
                                src,
                                None,
                                &element_type,
                                member,
                                target_elements.len() + index,
                                key,
                                state,
                            )?;
                            merged.push(projected);
                        }
                    }
                    scalar => {
                        // Scalar elements use their value as identity.
                        for element in &source_elements {
                            let value = if fits_type(element, scalar, &self.types) {
                                element.clone()
                            } else {
                                self.converter
                                    .convert(element, scalar)
                                    .unwrap_or(Value::Null)
                            };
                            if !value.is_null() && !merged.contains(&value) {
                                merged.push(value);
                            }
                        }
                    }
                }
                merged
            }
        };

        Ok(Self::finish_list(existing, merged, shape))
    }

    /// Partition elements for reconciliation: object elements with an
    /// identity member match by identity, everything else positionally.
    fn partition(
        &self,
        source: &[Value],
        target: &[Value],
        element_type: &ValueType,
    ) -> CollectionData {
        if let ValueType::Object(element_object) = element_type
            && let Some(id) = identity_member_for(element_object, &self.config, &self.types)
        {
            return CollectionData::partition(source, target, &id);
        }
        CollectionData::positional(source, target)
    }

    fn project_element(
        &self,
        element: &Value,
        existing: Option<&Value>,
        element_type: &ValueType,
        member: &Member,
        index: usize,
        key: &MapperKey,
        state: &RootState,
    ) -> Result<Value, MapError> {
        match element_type {
            ValueType::Object(target_type) => match element {
                Value::Object(element_obj) => {
                    let path = QualifiedPath::root().append(member.clone());
                    let child_key = key.child(element_obj.type_name(), target_type.clone(), &path);
                    self.map_object(element, existing, &child_key, state, Some(index))
                }
                _ => Ok(Value::Null),
            },
            other => {
                if fits_type(element, other, &self.types) {
                    Ok(element.clone())
                } else {
                    Ok(self.converter.convert(element, other).unwrap_or(Value::Null))
                }
            }
        }
    }

    /// Growable existing lists are updated in place, preserving the target
    /// instance; anything else gets a fresh list of the declared shape.
    fn finish_list(existing: Option<ListRef>, elements: Vec<Value>, shape: ListShape) -> Value {
        match existing {
            Some(list) if list.shape() == ListShape::Growable => {
                list.set_elements(elements);
                Value::List(list)
            }
            _ => Value::List(ListRef::from_elements(elements, shape)),
        }
    }
}

impl std::fmt::Debug for Mapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapper")
            .field("plans", &self.cache.compiled_count())
            .finish_non_exhaustive()
    }
}
