//! Members and the value types they carry.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::ids::TypeName;
use crate::value::{ListShape, Value};

/// The declared type of a member's value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Bool,
    Int,
    Float,
    Text,
    Object(TypeName),
    /// A growable collection, mutable in place.
    List(Box<ValueType>),
    /// A fixed-size collection; reconciliation always builds a new instance.
    Array(Box<ValueType>),
}

impl ValueType {
    pub fn list(element: ValueType) -> Self {
        Self::List(Box::new(element))
    }

    pub fn array(element: ValueType) -> Self {
        Self::Array(Box::new(element))
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Bool | Self::Int | Self::Float | Self::Text)
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Self::List(_) | Self::Array(_))
    }

    /// Element type of a collection, if this is one.
    pub fn element(&self) -> Option<&ValueType> {
        match self {
            Self::List(element) | Self::Array(element) => Some(element),
            _ => None,
        }
    }

    /// Object type name, if this is an object type.
    pub fn object_type(&self) -> Option<&TypeName> {
        match self {
            Self::Object(name) => Some(name),
            _ => None,
        }
    }

    /// The list shape a collection of this type declares.
    pub fn collection_shape(&self) -> Option<ListShape> {
        match self {
            Self::List(_) => Some(ListShape::Growable),
            Self::Array(_) => Some(ListShape::Fixed),
            _ => None,
        }
    }

    /// The default ("no value") for this type.
    ///
    /// Scalars default like machine scalars; text, objects and collections
    /// default to `Null`.
    pub fn default_value(&self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::Int => Value::Int(0),
            Self::Float => Value::Float(0.0),
            Self::Text | Self::Object(_) | Self::List(_) | Self::Array(_) => Value::Null,
        }
    }
}

/// How a member is physically accessed on its declaring type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessKind {
    Field,
    Property,
    /// Read via an accessor method; never writable directly.
    GetAccessor,
    /// Written via an accessor method invocation.
    SetAccessor,
}

/// Which side of a mapping a member enumeration serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberRole {
    /// Readable members, enumerated on the source side.
    Source,
    /// Writable members, enumerated on the target side.
    Target,
}

/// A single field, property or accessor of a declaring type.
///
/// Members are immutable: they are created once per declaring type by the
/// [`TypeRegistry`](crate::TypeRegistry) and cached for the process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub declaring_type: TypeName,
    pub value_type: ValueType,
    pub access: AccessKind,
    pub readable: bool,
    pub writable: bool,
}

impl Member {
    /// A plain read-write field.
    pub fn field(name: impl Into<String>, declaring_type: TypeName, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            declaring_type,
            value_type,
            access: AccessKind::Field,
            readable: true,
            writable: true,
        }
    }

    pub fn with_access(mut self, access: AccessKind) -> Self {
        self.access = access;
        match access {
            AccessKind::GetAccessor => {
                self.readable = true;
                self.writable = false;
            }
            AccessKind::SetAccessor => {
                self.readable = false;
                self.writable = true;
            }
            AccessKind::Field | AccessKind::Property => {}
        }
        self
    }

    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    /// Read this member from a live value.
    ///
    /// A member read against an incompatible runtime value yields the member
    /// type's default rather than an error, so speculative member tests stay
    /// cheap.
    pub fn access_value(&self, instance: &Value) -> Value {
        match instance {
            Value::Object(object) => object
                .get(&self.name)
                .unwrap_or_else(|| self.value_type.default_value()),
            _ => self.value_type.default_value(),
        }
    }

    /// Write this member on a live value, dispatching on access kind.
    ///
    /// Fields and properties assign directly; a set-accessor is an
    /// invocation-style write and also validates the member is declared
    /// writable.
    pub fn populate(&self, instance: &Value, value: Value) -> Result<(), ModelError> {
        if !self.writable {
            return Err(ModelError::UnwritableMember {
                declaring: self.declaring_type.as_str().to_string(),
                member: self.name.clone(),
            });
        }
        match instance {
            Value::Object(object) => {
                match self.access {
                    AccessKind::Field | AccessKind::Property => object.set(&self.name, value),
                    AccessKind::SetAccessor | AccessKind::GetAccessor => {
                        // Accessor writes invoke the setter, which stores
                        // under the member name in the value model.
                        object.set(&self.name, value);
                    }
                }
                Ok(())
            }
            _ => Err(ModelError::PopulateNonObject {
                member: self.name.clone(),
            }),
        }
    }

    pub fn default_value(&self) -> Value {
        self.value_type.default_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ObjectRef;

    fn person() -> TypeName {
        TypeName::new("Person").unwrap()
    }

    #[test]
    fn access_on_incompatible_value_yields_default() {
        let member = Member::field("age", person(), ValueType::Int);
        assert_eq!(member.access_value(&Value::Text("oops".into())), Value::Int(0));
        assert_eq!(member.access_value(&Value::Null), Value::Int(0));
    }

    #[test]
    fn access_on_object_missing_field_yields_default() {
        let member = Member::field("name", person(), ValueType::Text);
        let object = ObjectRef::new(person());
        assert_eq!(member.access_value(&Value::Object(object)), Value::Null);
    }

    #[test]
    fn populate_rejects_unwritable_member() {
        let member = Member::field("name", person(), ValueType::Text).read_only();
        let object = Value::Object(ObjectRef::new(person()));
        assert!(member.populate(&object, Value::Text("x".into())).is_err());
    }

    #[test]
    fn populate_dispatches_on_access_kind() {
        let object = ObjectRef::new(person());
        let field = Member::field("name", person(), ValueType::Text);
        let setter =
            Member::field("code", person(), ValueType::Int).with_access(AccessKind::SetAccessor);

        field
            .populate(&Value::Object(object.clone()), Value::Text("a".into()))
            .unwrap();
        setter
            .populate(&Value::Object(object.clone()), Value::Int(7))
            .unwrap();

        assert_eq!(object.get("name"), Some(Value::Text("a".into())));
        assert_eq!(object.get("code"), Some(Value::Int(7)));
    }
}
