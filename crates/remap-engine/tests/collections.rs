//! Collection reconciliation: overwrite, merge and append strategies over
//! identity-matched and positional elements.

use std::collections::HashMap;
use std::sync::Arc;

use proptest::prelude::*;
use remap_engine::Mapper;
use remap_model::{
    ListRef, ListShape, ObjectRef, TypeDescriptor, TypeName, TypeRegistry, Value, ValueType,
};

fn name(value: &str) -> TypeName {
    TypeName::new(value).unwrap()
}

fn registry() -> Arc<TypeRegistry> {
    let types = TypeRegistry::new();
    types
        .register(
            TypeDescriptor::new(name("Item"))
                .with_field("id", ValueType::Int)
                .with_field("label", ValueType::Text),
        )
        .unwrap();
    types
        .register(
            TypeDescriptor::new(name("ItemDto"))
                .with_field("id", ValueType::Int)
                .with_field("label", ValueType::Text),
        )
        .unwrap();
    types
        .register(
            TypeDescriptor::new(name("Cart"))
                .with_field("items", ValueType::list(ValueType::Object(name("Item")))),
        )
        .unwrap();
    types
        .register(
            TypeDescriptor::new(name("CartDto"))
                .with_field("items", ValueType::list(ValueType::Object(name("ItemDto")))),
        )
        .unwrap();
    types
        .register(
            TypeDescriptor::new(name("Tags")).with_field("values", ValueType::list(ValueType::Int)),
        )
        .unwrap();
    types
        .register(
            TypeDescriptor::new(name("TagsDto"))
                .with_field("values", ValueType::list(ValueType::Int)),
        )
        .unwrap();
    types
        .register(
            TypeDescriptor::new(name("Fixed"))
                .with_field("values", ValueType::list(ValueType::Int)),
        )
        .unwrap();
    types
        .register(
            TypeDescriptor::new(name("FixedDto"))
                .with_field("values", ValueType::array(ValueType::Int)),
        )
        .unwrap();
    Arc::new(types)
}

fn item(type_name: &str, id: i64, label: &str) -> Value {
    Value::Object(
        ObjectRef::new(name(type_name))
            .with("id", id)
            .with("label", label),
    )
}

fn cart(type_name: &str, items_type: &str, items: Vec<(i64, &str)>) -> Value {
    let elements = items
        .into_iter()
        .map(|(id, label)| item(items_type, id, label))
        .collect();
    Value::Object(ObjectRef::new(name(type_name)).with(
        "items",
        Value::List(ListRef::from_elements(elements, ListShape::Growable)),
    ))
}

fn items_of(value: &Value) -> Vec<Value> {
    value
        .as_object()
        .unwrap()
        .get("items")
        .unwrap()
        .as_list()
        .unwrap()
        .elements()
}

fn ids_and_labels(elements: &[Value]) -> Vec<(i64, String)> {
    elements
        .iter()
        .map(|e| {
            let object = e.as_object().unwrap();
            (
                object.get("id").unwrap().as_int().unwrap(),
                object
                    .get("label")
                    .map(|l| l.as_text().unwrap_or_default().to_string())
                    .unwrap_or_default(),
            )
        })
        .collect()
}

#[test]
fn merge_updates_adds_and_removes_by_identity() {
    let types = registry();
    let mapper = Mapper::new(types);
    let source = cart("Cart", "Item", vec![(1, "one new"), (2, "two new"), (3, "three")]);
    let target = cart("CartDto", "ItemDto", vec![(2, "two old"), (1, "one old"), (9, "gone")]);
    let original = items_of(&target);

    mapper.map_onto(&source, &target).unwrap();

    let merged = items_of(&target);
    assert_eq!(
        ids_and_labels(&merged),
        vec![
            (1, "one new".to_string()),
            (2, "two new".to_string()),
            (3, "three".to_string()),
        ]
    );
    // Matched elements keep their target instances, updated in place.
    assert_eq!(merged[0], original[1]);
    assert_eq!(merged[1], original[0]);
}

#[test]
fn merge_preserves_the_target_list_instance() {
    let types = registry();
    let mapper = Mapper::new(types);
    let source = cart("Cart", "Item", vec![(1, "a")]);
    let target = cart("CartDto", "ItemDto", vec![(1, "b")]);
    let list_before = target.as_object().unwrap().get("items").unwrap();

    mapper.map_onto(&source, &target).unwrap();

    let list_after = target.as_object().unwrap().get("items").unwrap();
    assert_eq!(list_before, list_after);
}

#[test]
fn overwrite_projects_the_source_elements_only() {
    let types = registry();
    let mapper = Mapper::new(types);
    let source = cart("Cart", "Item", vec![(5, "five")]);
    let target = cart("CartDto", "ItemDto", vec![(1, "one"), (2, "two")]);

    mapper.map_over(&source, &target).unwrap();
    assert_eq!(ids_and_labels(&items_of(&target)), vec![(5, "five".to_string())]);
}

#[test]
fn append_adds_new_identities_without_touching_existing_elements() {
    let types = registry();
    let mapper = Mapper::new(types);
    let source = cart("Cart", "Item", vec![(1, "one new"), (3, "three")]);
    let target = cart("CartDto", "ItemDto", vec![(1, "one old"), (2, "two")]);

    mapper.map_append(&source, &target).unwrap();
    assert_eq!(
        ids_and_labels(&items_of(&target)),
        vec![
            (1, "one old".to_string()),
            (2, "two".to_string()),
            (3, "three".to_string()),
        ]
    );
}

#[test]
fn scalar_lists_merge_positionally() {
    let types = registry();
    let mapper = Mapper::new(types);
    let source = Value::Object(ObjectRef::new(name("Tags")).with(
        "values",
        Value::List(ListRef::from_elements(
            vec![Value::Int(10), Value::Int(20), Value::Int(30)],
            ListShape::Growable,
        )),
    ));
    let target = Value::Object(ObjectRef::new(name("TagsDto")).with(
        "values",
        Value::List(ListRef::from_elements(
            vec![Value::Int(1)],
            ListShape::Growable,
        )),
    ));

    mapper.map_onto(&source, &target).unwrap();
    let values = target
        .as_object()
        .unwrap()
        .get("values")
        .unwrap()
        .as_list()
        .unwrap()
        .elements();
    assert_eq!(values, vec![Value::Int(10), Value::Int(20), Value::Int(30)]);
}

#[test]
fn scalar_append_uses_values_as_identities() {
    let types = registry();
    let mapper = Mapper::new(types);
    let source = Value::Object(ObjectRef::new(name("Tags")).with(
        "values",
        Value::List(ListRef::from_elements(
            vec![Value::Int(1), Value::Int(2), Value::Int(2)],
            ListShape::Growable,
        )),
    ));
    let target = Value::Object(ObjectRef::new(name("TagsDto")).with(
        "values",
        Value::List(ListRef::from_elements(
            vec![Value::Int(2), Value::Int(9)],
            ListShape::Growable,
        )),
    ));

    mapper.map_append(&source, &target).unwrap();
    let values = target
        .as_object()
        .unwrap()
        .get("values")
        .unwrap()
        .as_list()
        .unwrap()
        .elements();
    assert_eq!(
        values,
        vec![Value::Int(2), Value::Int(9), Value::Int(1)]
    );
}

#[test]
fn fixed_shape_targets_get_a_fresh_instance() {
    let types = registry();
    let mapper = Mapper::new(types);
    let source = Value::Object(ObjectRef::new(name("Fixed")).with(
        "values",
        Value::List(ListRef::from_elements(
            vec![Value::Int(4)],
            ListShape::Growable,
        )),
    ));

    let result = mapper.map_new(&source, &name("FixedDto")).unwrap();
    let list = result.as_object().unwrap().get("values").unwrap();
    let list = list.as_list().unwrap();
    assert_eq!(list.shape(), ListShape::Fixed);
    assert_eq!(list.elements(), vec![Value::Int(4)]);
}

proptest! {
    /// Merging always yields one element per source element, with the same
    /// identity multiset, and never keeps a target-only identity.
    #[test]
    fn merge_projects_exactly_the_source_identities(
        source_ids in prop::collection::vec(0i64..20, 0..8),
        target_ids in prop::collection::vec(0i64..20, 0..8),
    ) {
        let types = registry();
        let mapper = Mapper::new(types);
        let source = cart("Cart", "Item", source_ids.iter().map(|id| (*id, "s")).collect());
        let target = cart("CartDto", "ItemDto", target_ids.iter().map(|id| (*id, "t")).collect());

        mapper.map_onto(&source, &target).unwrap();

        let merged = items_of(&target);
        prop_assert_eq!(merged.len(), source_ids.len());
        let mut expected: HashMap<i64, usize> = HashMap::new();
        for id in &source_ids {
            *expected.entry(*id).or_default() += 1;
        }
        let mut actual: HashMap<i64, usize> = HashMap::new();
        for element in &merged {
            let id = element.as_object().unwrap().get("id").unwrap().as_int().unwrap();
            *actual.entry(id).or_default() += 1;
        }
        prop_assert_eq!(actual, expected);
    }
}
