//! Type descriptors and the member-discovery registry.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::ids::TypeName;
use crate::member::{AccessKind, Member, MemberRole, ValueType};
use crate::value::{ObjectRef, Value};

/// Declared shape of one object type: name, optional base type and members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub name: TypeName,
    #[serde(default)]
    pub base: Option<TypeName>,
    #[serde(default)]
    pub members: Vec<Member>,
}

impl TypeDescriptor {
    pub fn new(name: TypeName) -> Self {
        Self {
            name,
            base: None,
            members: Vec::new(),
        }
    }

    pub fn with_base(mut self, base: TypeName) -> Self {
        self.base = Some(base);
        self
    }

    pub fn with_member(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }

    /// Declare a read-write field of this type.
    pub fn with_field(self, name: impl Into<String>, value_type: ValueType) -> Self {
        let member = Member::field(name, self.name.clone(), value_type);
        self.with_member(member)
    }

    /// Declare a read-only get-accessor of this type.
    pub fn with_getter(self, name: impl Into<String>, value_type: ValueType) -> Self {
        let member = Member::field(name, self.name.clone(), value_type)
            .with_access(AccessKind::GetAccessor);
        self.with_member(member)
    }

    /// Declare a write-only set-accessor of this type.
    pub fn with_setter(self, name: impl Into<String>, value_type: ValueType) -> Self {
        let member = Member::field(name, self.name.clone(), value_type)
            .with_access(AccessKind::SetAccessor);
        self.with_member(member)
    }
}

/// The member-discovery collaborator: registered type descriptors plus
/// process-lifetime member caches.
///
/// Supports concurrent readers; registration is expected to finish before
/// the first mapping call touches a type.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: RwLock<HashMap<TypeName, Arc<TypeDescriptor>>>,
    role_members: RwLock<HashMap<(TypeName, MemberRole), Arc<Vec<Member>>>>,
    layouts: RwLock<HashMap<TypeName, Arc<Vec<Member>>>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, descriptor: TypeDescriptor) -> Result<(), ModelError> {
        let mut types = self.types.write().unwrap_or_else(|e| e.into_inner());
        if let Some(base) = &descriptor.base
            && !types.contains_key(base)
        {
            return Err(ModelError::UnknownBaseType {
                base: base.as_str().to_string(),
                derived: descriptor.name.as_str().to_string(),
            });
        }
        if types.contains_key(&descriptor.name) {
            return Err(ModelError::DuplicateType(
                descriptor.name.as_str().to_string(),
            ));
        }
        types.insert(descriptor.name.clone(), Arc::new(descriptor));
        Ok(())
    }

    pub fn descriptor(&self, name: &TypeName) -> Option<Arc<TypeDescriptor>> {
        self.types
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    pub fn contains(&self, name: &TypeName) -> bool {
        self.descriptor(name).is_some()
    }

    /// Enumerate the members of a type for one side of a mapping: readable
    /// members for [`MemberRole::Source`], writable for
    /// [`MemberRole::Target`]. Base members come first, in declaration
    /// order; derived declarations shadow base members by name. The result
    /// is computed once per (type, role) and cached for the process.
    pub fn members_of(
        &self,
        name: &TypeName,
        role: MemberRole,
    ) -> Result<Arc<Vec<Member>>, ModelError> {
        let key = (name.clone(), role);
        if let Some(cached) = self
            .role_members
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
        {
            return Ok(cached.clone());
        }

        let members: Vec<Member> = self
            .layout(name)?
            .iter()
            .filter(|m| match role {
                MemberRole::Source => m.readable,
                MemberRole::Target => m.writable,
            })
            .cloned()
            .collect();
        let members = Arc::new(members);
        self.role_members
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, members.clone());
        Ok(members)
    }

    /// All members of a type, base-first with shadowing applied.
    pub fn layout(&self, name: &TypeName) -> Result<Arc<Vec<Member>>, ModelError> {
        if let Some(cached) = self
            .layouts
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
        {
            return Ok(cached.clone());
        }

        let chain = self.base_chain(name)?;
        let mut members: Vec<Member> = Vec::new();
        for type_name in chain.iter().rev() {
            let descriptor = self
                .descriptor(type_name)
                .ok_or_else(|| ModelError::UnknownType(type_name.as_str().to_string()))?;
            for member in &descriptor.members {
                match members.iter_mut().find(|m| m.name == member.name) {
                    Some(existing) => *existing = member.clone(),
                    None => members.push(member.clone()),
                }
            }
        }
        let members = Arc::new(members);
        self.layouts
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.clone(), members.clone());
        Ok(members)
    }

    /// Whether a value of runtime type `actual` can stand in for `base`.
    pub fn is_assignable(&self, base: &TypeName, actual: &TypeName) -> bool {
        if base == actual {
            return true;
        }
        let mut current = actual.clone();
        while let Some(descriptor) = self.descriptor(&current) {
            match &descriptor.base {
                Some(parent) if parent == base => return true,
                Some(parent) => current = parent.clone(),
                None => return false,
            }
        }
        false
    }

    /// All registered types deriving (directly or transitively) from `base`.
    pub fn derived_types_of(&self, base: &TypeName) -> Vec<TypeName> {
        let types = self.types.read().unwrap_or_else(|e| e.into_inner());
        let mut derived: Vec<TypeName> = types
            .keys()
            .filter(|name| *name != base && self.is_assignable_locked(&types, base, name))
            .cloned()
            .collect();
        derived.sort();
        derived
    }

    fn is_assignable_locked(
        &self,
        types: &HashMap<TypeName, Arc<TypeDescriptor>>,
        base: &TypeName,
        actual: &TypeName,
    ) -> bool {
        let mut current = actual;
        while let Some(descriptor) = types.get(current) {
            match &descriptor.base {
                Some(parent) if parent == base => return true,
                Some(parent) => current = parent,
                None => return false,
            }
        }
        false
    }

    /// Length of a type's base chain; deeper means more derived.
    pub fn inheritance_depth(&self, name: &TypeName) -> usize {
        self.base_chain(name).map_or(0, |chain| chain.len())
    }

    fn base_chain(&self, name: &TypeName) -> Result<Vec<TypeName>, ModelError> {
        let mut chain = vec![name.clone()];
        let mut current = self
            .descriptor(name)
            .ok_or_else(|| ModelError::UnknownType(name.as_str().to_string()))?;
        while let Some(base) = current.base.clone() {
            current = self
                .descriptor(&base)
                .ok_or_else(|| ModelError::UnknownType(base.as_str().to_string()))?;
            chain.push(base);
        }
        Ok(chain)
    }

    /// Construct a fresh instance with every member defaulted.
    pub fn new_instance(&self, name: &TypeName) -> Result<ObjectRef, ModelError> {
        let object = ObjectRef::new(name.clone());
        for member in self.layout(name)?.iter() {
            object.set(&member.name, member.default_value());
        }
        Ok(object)
    }

    /// The default value for a declared type.
    pub fn default_of(value_type: &ValueType) -> Value {
        value_type.default_value()
    }
}
