//! Element matching for collection reconciliation.
//!
//! The strategies themselves live on the mapper; this module decides which
//! source and target elements correspond. Object elements match on an
//! identity member (configured, or found by naming convention); everything
//! else matches positionally.

use std::collections::HashMap;

use remap_config::ConfigurationSet;
use remap_model::{Member, MemberRole, TypeName, TypeRegistry, Value};

/// A hashable rendering of an element's identity value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum IdKey {
    Int(i64),
    Text(String),
    Bool(bool),
    /// Bit pattern; identity floats compare exactly.
    Float(u64),
}

impl IdKey {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(Self::Int(*v)),
            Value::Text(v) => Some(Self::Text(v.clone())),
            Value::Bool(v) => Some(Self::Bool(*v)),
            Value::Float(v) => Some(Self::Float(v.to_bits())),
            Value::Null | Value::Object(_) | Value::List(_) => None,
        }
    }
}

/// The identity member of an element type: the configured identifier when
/// one is registered, otherwise the first member matching the `id` /
/// `identifier` / `<typename>id` naming convention.
pub(crate) fn identity_member_for(
    type_name: &TypeName,
    config: &ConfigurationSet,
    types: &TypeRegistry,
) -> Option<Member> {
    let members = types.members_of(type_name, MemberRole::Source).ok()?;
    if let Some(configured) = config.identifier_for(type_name) {
        return members
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(configured))
            .cloned();
    }
    let typed = format!("{}id", type_name.as_str().to_ascii_lowercase());
    members
        .iter()
        .find(|m| {
            let name = m.name.to_ascii_lowercase();
            name == "id" || name == "identifier" || name == typed
        })
        .cloned()
}

/// Source and target elements partitioned for reconciliation.
#[derive(Debug, Default)]
pub(crate) struct CollectionData {
    /// Matched (source, target) element pairs, in source order.
    pub intersection: Vec<(Value, Value)>,
    /// Source elements with no target counterpart, in source order.
    pub new_source: Vec<Value>,
    /// Target elements with no source counterpart, in target order.
    pub target_only: Vec<Value>,
}

impl CollectionData {
    /// Partition by identity member value.
    ///
    /// Duplicate identities pair up first-come-first-served; elements whose
    /// identity is absent count as new.
    pub fn partition(source: &[Value], target: &[Value], id: &Member) -> Self {
        let mut by_id: HashMap<IdKey, Vec<usize>> = HashMap::new();
        for (index, element) in target.iter().enumerate() {
            if let Some(key) = IdKey::from_value(&id.access_value(element)) {
                by_id.entry(key).or_default().push(index);
            }
        }
        // Reverse each bucket so pop() hands indices out in target order.
        for bucket in by_id.values_mut() {
            bucket.reverse();
        }

        let mut matched = vec![false; target.len()];
        let mut data = Self::default();
        for element in source {
            let taken = IdKey::from_value(&id.access_value(element))
                .and_then(|key| by_id.get_mut(&key))
                .and_then(Vec::pop);
            match taken {
                Some(index) => {
                    matched[index] = true;
                    data.intersection.push((element.clone(), target[index].clone()));
                }
                None => data.new_source.push(element.clone()),
            }
        }
        data.target_only = target
            .iter()
            .zip(&matched)
            .filter(|(_, matched)| !**matched)
            .map(|(element, _)| element.clone())
            .collect();
        data
    }

    /// Partition by element position.
    pub fn positional(source: &[Value], target: &[Value]) -> Self {
        let shared = source.len().min(target.len());
        Self {
            intersection: source[..shared]
                .iter()
                .cloned()
                .zip(target[..shared].iter().cloned())
                .collect(),
            new_source: source[shared..].to_vec(),
            target_only: target[shared..].to_vec(),
        }
    }
}
