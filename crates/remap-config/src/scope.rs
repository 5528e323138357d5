//! Rule scopes: the (source type, target type, intent, condition) quadruple
//! every configured rule carries.

use std::fmt;
use std::sync::Arc;

use remap_model::{MappingData, MappingIntent, TypeName, TypeRegistry};

/// A user-supplied boolean predicate evaluated against the live mapping
/// position.
#[derive(Clone)]
pub struct Condition(Arc<dyn Fn(&MappingData<'_>) -> bool + Send + Sync>);

impl Condition {
    pub fn new(predicate: impl Fn(&MappingData<'_>) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(predicate))
    }

    pub fn evaluate(&self, data: &MappingData<'_>) -> bool {
        (self.0)(data)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Condition(..)")
    }
}

/// The configuration scope of a rule: which type pair and intent it was
/// declared for, plus an optional condition.
#[derive(Debug, Clone)]
pub struct RuleScope {
    source_type: TypeName,
    target_type: TypeName,
    intent: Option<MappingIntent>,
    condition: Option<Condition>,
}

impl RuleScope {
    /// A scope for one (source, target) pair, applying to every intent.
    pub fn new(source_type: TypeName, target_type: TypeName) -> Self {
        Self {
            source_type,
            target_type,
            intent: None,
            condition: None,
        }
    }

    /// Restrict the scope to one mapping intent.
    pub fn for_intent(mut self, intent: MappingIntent) -> Self {
        self.intent = Some(intent);
        self
    }

    /// Attach a condition; conditioned rules never conflict and order ahead
    /// of unconditioned ones.
    pub fn when(mut self, predicate: impl Fn(&MappingData<'_>) -> bool + Send + Sync + 'static) -> Self {
        self.condition = Some(Condition::new(predicate));
        self
    }

    pub fn source_type(&self) -> &TypeName {
        &self.source_type
    }

    pub fn target_type(&self) -> &TypeName {
        &self.target_type
    }

    pub fn intent(&self) -> Option<MappingIntent> {
        self.intent
    }

    pub fn has_condition(&self) -> bool {
        self.condition.is_some()
    }

    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    pub fn intent_applies(&self, intent: MappingIntent) -> bool {
        self.intent.is_none_or(|declared| declared == intent)
    }

    /// Whether this scope's declared types can stand in for the actual
    /// types at a mapping position (declared types may be bases of the
    /// actual ones).
    pub fn compatible_with(
        &self,
        source: &TypeName,
        target: &TypeName,
        types: &TypeRegistry,
    ) -> bool {
        types.is_assignable(&self.source_type, source)
            && types.is_assignable(&self.target_type, target)
    }

    /// Whether two scopes can apply to the same mapping position at all.
    pub fn overlaps(&self, other: &RuleScope, types: &TypeRegistry) -> bool {
        let sources_overlap = types.is_assignable(&self.source_type, &other.source_type)
            || types.is_assignable(&other.source_type, &self.source_type);
        let targets_overlap = types.is_assignable(&self.target_type, &other.target_type)
            || types.is_assignable(&other.target_type, &self.target_type);
        let intents_overlap = match (self.intent, other.intent) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        };
        sources_overlap && targets_overlap && intents_overlap
    }

    /// Whether this scope's source type is a base of (covers) the other's.
    pub fn covers_source_of(&self, other: &RuleScope, types: &TypeRegistry) -> bool {
        types.is_assignable(&self.source_type, &other.source_type)
    }

    /// Whether this scope's target type is a base of (covers) the other's.
    pub fn covers_target_of(&self, other: &RuleScope, types: &TypeRegistry) -> bool {
        types.is_assignable(&self.target_type, &other.target_type)
    }
}
