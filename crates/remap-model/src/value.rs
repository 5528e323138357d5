//! Dynamic values mapped by the engine.
//!
//! Objects and lists are reference values (`Rc<RefCell<..>>`): graphs may be
//! cyclic, element updates happen in place, and pointer identity is the
//! source identity the cycle guard tracks. A single mapping call runs on one
//! thread, so `Rc` is sufficient; only compiled plans and caches cross
//! threads.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::ids::TypeName;
use crate::member::ValueType;

/// Whether a list can be grown and shrunk in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListShape {
    Growable,
    /// Fixed-size container; never mutated in place.
    Fixed,
}

#[derive(Debug)]
struct ObjectData {
    type_name: TypeName,
    fields: BTreeMap<String, Value>,
}

/// A reference to a live object instance.
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<ObjectData>>);

impl ObjectRef {
    pub fn new(type_name: TypeName) -> Self {
        Self(Rc::new(RefCell::new(ObjectData {
            type_name,
            fields: BTreeMap::new(),
        })))
    }

    pub fn type_name(&self) -> TypeName {
        self.0.borrow().type_name.clone()
    }

    pub fn get(&self, field: &str) -> Option<Value> {
        self.0.borrow().fields.get(field).cloned()
    }

    pub fn set(&self, field: impl Into<String>, value: Value) {
        self.0.borrow_mut().fields.insert(field.into(), value);
    }

    pub fn field_names(&self) -> Vec<String> {
        self.0.borrow().fields.keys().cloned().collect()
    }

    /// Pointer identity, stable for the life of the instance.
    pub fn identity(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    /// Builder-style field assignment, for constructing test fixtures and
    /// source graphs.
    pub fn with(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value.into());
        self
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Deliberately shallow: object graphs may be cyclic.
        write!(
            f,
            "ObjectRef({} @ {:p})",
            self.0.borrow().type_name,
            Rc::as_ptr(&self.0)
        )
    }
}

#[derive(Debug)]
struct ListData {
    elements: Vec<Value>,
    shape: ListShape,
}

/// A reference to a live collection instance.
#[derive(Clone)]
pub struct ListRef(Rc<RefCell<ListData>>);

impl ListRef {
    pub fn new(shape: ListShape) -> Self {
        Self::from_elements(Vec::new(), shape)
    }

    pub fn from_elements(elements: Vec<Value>, shape: ListShape) -> Self {
        Self(Rc::new(RefCell::new(ListData { elements, shape })))
    }

    pub fn shape(&self) -> ListShape {
        self.0.borrow().shape
    }

    pub fn len(&self) -> usize {
        self.0.borrow().elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().elements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.borrow().elements.get(index).cloned()
    }

    pub fn elements(&self) -> Vec<Value> {
        self.0.borrow().elements.clone()
    }

    pub fn push(&self, value: Value) {
        self.0.borrow_mut().elements.push(value);
    }

    pub fn set_elements(&self, elements: Vec<Value>) {
        self.0.borrow_mut().elements = elements;
    }

    pub fn identity(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for ListRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ListRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ListRef(len={}, {:?})",
            self.0.borrow().elements.len(),
            self.0.borrow().shape
        )
    }
}

/// A dynamic value: scalar, object reference or list reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Object(ObjectRef),
    List(ListRef),
}

impl Value {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The "no value" test used by fallback chains: `Null` always counts as
    /// default, scalars count when they equal their type's default.
    pub fn is_default_for(&self, value_type: &ValueType) -> bool {
        match self {
            Self::Null => true,
            _ => *self == value_type.default_value(),
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListRef> {
        match self {
            Self::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<ObjectRef> for Value {
    fn from(value: ObjectRef) -> Self {
        Self::Object(value)
    }
}

impl From<ListRef> for Value {
    fn from(value: ListRef) -> Self {
        Self::List(value)
    }
}
