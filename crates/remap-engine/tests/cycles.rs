//! Cyclic and diamond-shaped source graphs.

use std::sync::Arc;

use remap_engine::Mapper;
use remap_model::{ObjectRef, TypeDescriptor, TypeName, TypeRegistry, Value, ValueType};

fn name(value: &str) -> TypeName {
    TypeName::new(value).unwrap()
}

fn registry() -> Arc<TypeRegistry> {
    let types = TypeRegistry::new();
    for node in ["Node", "NodeDto"] {
        types
            .register(
                TypeDescriptor::new(name(node))
                    .with_field("value", ValueType::Int)
                    .with_field("next", ValueType::Object(name(node))),
            )
            .unwrap();
    }
    types
        .register(TypeDescriptor::new(name("Leaf")).with_field("tag", ValueType::Text))
        .unwrap();
    types
        .register(TypeDescriptor::new(name("LeafDto")).with_field("tag", ValueType::Text))
        .unwrap();
    types
        .register(
            TypeDescriptor::new(name("Fork"))
                .with_field("left", ValueType::Object(name("Leaf")))
                .with_field("right", ValueType::Object(name("Leaf"))),
        )
        .unwrap();
    types
        .register(
            TypeDescriptor::new(name("ForkDto"))
                .with_field("left", ValueType::Object(name("LeafDto")))
                .with_field("right", ValueType::Object(name("LeafDto"))),
        )
        .unwrap();
    Arc::new(types)
}

fn next_of(value: &Value) -> Value {
    value.as_object().unwrap().get("next").unwrap()
}

#[test]
fn self_referencing_source_maps_to_a_self_referencing_target() {
    let types = registry();
    let mapper = Mapper::new(types);
    let node = ObjectRef::new(name("Node")).with("value", 1i64);
    node.set("next", Value::Object(node.clone()));

    let result = mapper.map_new(&Value::Object(node), &name("NodeDto")).unwrap();
    assert_eq!(next_of(&result), result);
}

#[test]
fn two_node_cycle_terminates_and_round_trips() {
    let types = registry();
    let mapper = Mapper::new(types);
    let a = ObjectRef::new(name("Node")).with("value", 1i64);
    let b = ObjectRef::new(name("Node")).with("value", 2i64);
    a.set("next", Value::Object(b.clone()));
    b.set("next", Value::Object(a.clone()));

    let result = mapper.map_new(&Value::Object(a), &name("NodeDto")).unwrap();
    let second = next_of(&result);
    assert_ne!(second, result);
    assert_eq!(next_of(&second), result);
    assert_eq!(
        second.as_object().unwrap().get("value"),
        Some(Value::Int(2))
    );
}

#[test]
fn shared_sources_map_to_one_shared_target() {
    let types = registry();
    let mapper = Mapper::new(types);
    let shared = ObjectRef::new(name("Leaf")).with("tag", "shared");
    let fork = ObjectRef::new(name("Fork"))
        .with("left", Value::Object(shared.clone()))
        .with("right", Value::Object(shared));

    let result = mapper
        .map_new(&Value::Object(fork), &name("ForkDto"))
        .unwrap();
    let left = result.as_object().unwrap().get("left").unwrap();
    let right = result.as_object().unwrap().get("right").unwrap();
    assert_eq!(left, right);
    assert_eq!(
        left.as_object().unwrap().get("tag"),
        Some(Value::text("shared"))
    );
}

#[test]
fn distinct_sources_map_to_distinct_targets() {
    let types = registry();
    let mapper = Mapper::new(types);
    let fork = ObjectRef::new(name("Fork"))
        .with(
            "left",
            Value::Object(ObjectRef::new(name("Leaf")).with("tag", "l")),
        )
        .with(
            "right",
            Value::Object(ObjectRef::new(name("Leaf")).with("tag", "r")),
        );

    let result = mapper
        .map_new(&Value::Object(fork), &name("ForkDto"))
        .unwrap();
    let left = result.as_object().unwrap().get("left").unwrap();
    let right = result.as_object().unwrap().get("right").unwrap();
    assert_ne!(left, right);
}
