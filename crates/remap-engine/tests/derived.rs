//! Derived-type dispatch: name-convention auto-pairing and configured
//! pairings.

use std::sync::Arc;

use remap_config::{ConfiguredItem, DerivedTypePair, RuleScope};
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
        .register(TypeDescriptor::new(name("Animal")).with_field("name", ValueType::Text))
        .unwrap();
    types
        .register(
            TypeDescriptor::new(name("Dog"))
                .with_base(name("Animal"))
                .with_field("breed", ValueType::Text),
        )
        .unwrap();
    types
        .register(TypeDescriptor::new(name("AnimalDto")).with_field("name", ValueType::Text))
        .unwrap();
    types
        .register(
            TypeDescriptor::new(name("DogDto"))
                .with_base(name("AnimalDto"))
                .with_field("breed", ValueType::Text),
        )
        .unwrap();
    types
        .register(
            TypeDescriptor::new(name("Zoo"))
                .with_field("animals", ValueType::list(ValueType::Object(name("Animal")))),
        )
        .unwrap();
    types
        .register(TypeDescriptor::new(name("ZooDto")).with_field(
            "animals",
            ValueType::list(ValueType::Object(name("AnimalDto"))),
        ))
        .unwrap();
    types
        .register(TypeDescriptor::new(name("Shape")).with_field("name", ValueType::Text))
        .unwrap();
    types
        .register(TypeDescriptor::new(name("Circle")).with_base(name("Shape")))
        .unwrap();
    types
        .register(TypeDescriptor::new(name("ShapeDto")).with_field("name", ValueType::Text))
        .unwrap();
    types
        .register(TypeDescriptor::new(name("RoundDto")).with_base(name("ShapeDto")))
        .unwrap();
    Arc::new(types)
}

fn dog() -> Value {
    Value::Object(
        ObjectRef::new(name("Dog"))
            .with("name", "Rex")
            .with("breed", "Beagle"),
    )
}

#[test]
fn derived_source_dispatches_to_the_name_paired_target() {
    let types = registry();
    let mapper = Mapper::new(types);
    let result = mapper.map_new(&dog(), &name("AnimalDto")).unwrap();
    let object = result.as_object().unwrap();
    assert_eq!(object.type_name(), name("DogDto"));
    assert_eq!(object.get("name"), Some(Value::text("Rex")));
    assert_eq!(object.get("breed"), Some(Value::text("Beagle")));
}

#[test]
fn base_source_maps_to_the_base_target() {
    let types = registry();
    let mapper = Mapper::new(types);
    let animal = Value::Object(ObjectRef::new(name("Animal")).with("name", "Misty"));
    let result = mapper.map_new(&animal, &name("AnimalDto")).unwrap();
    assert_eq!(result.as_object().unwrap().type_name(), name("AnimalDto"));
}

#[test]
fn incompatible_existing_target_blocks_dispatch() {
    let types = registry();
    let mapper = Mapper::new(types);
    let existing = Value::Object(ObjectRef::new(name("AnimalDto")));
    mapper.map_onto(&dog(), &existing).unwrap();

    let object = existing.as_object().unwrap();
    assert_eq!(object.type_name(), name("AnimalDto"));
    assert_eq!(object.get("name"), Some(Value::text("Rex")));
    assert_eq!(object.get("breed"), None);
}

#[test]
fn collection_elements_dispatch_individually() {
    let types = registry();
    let mapper = Mapper::new(types);
    let animals = vec![
        Value::Object(ObjectRef::new(name("Animal")).with("name", "Misty")),
        dog(),
    ];
    let zoo = Value::Object(ObjectRef::new(name("Zoo")).with(
        "animals",
        Value::List(ListRef::from_elements(animals, ListShape::Growable)),
    ));

    let result = mapper.map_new(&zoo, &name("ZooDto")).unwrap();
    let mapped = result
        .as_object()
        .unwrap()
        .get("animals")
        .unwrap()
        .as_list()
        .unwrap()
        .elements();
    assert_eq!(mapped[0].as_object().unwrap().type_name(), name("AnimalDto"));
    assert_eq!(mapped[1].as_object().unwrap().type_name(), name("DogDto"));
}

#[test]
fn configured_pairing_overrides_naming() {
    let types = registry();
    let mut mapper = Mapper::new(types.clone());
    mapper
        .config_mut()
        .add_derived_pair(
            DerivedTypePair::new(
                ConfiguredItem::for_all_members(RuleScope::new(name("Shape"), name("ShapeDto"))),
                name("Circle"),
                name("RoundDto"),
            ),
            &types,
        )
        .unwrap();

    let circle = Value::Object(ObjectRef::new(name("Circle")).with("name", "c"));
    let result = mapper.map_new(&circle, &name("ShapeDto")).unwrap();
    assert_eq!(result.as_object().unwrap().type_name(), name("RoundDto"));
}

#[test]
fn conditioned_pairing_applies_only_when_its_condition_holds() {
    let types = registry();
    let mut mapper = Mapper::new(types.clone());
    mapper
        .config_mut()
        .add_derived_pair(
            DerivedTypePair::new(
                ConfiguredItem::for_all_members(
                    RuleScope::new(name("Shape"), name("ShapeDto")).when(|data| {
                        data.source
                            .as_object()
                            .and_then(|o| o.get("name"))
                            .is_some_and(|n| n == Value::text("special"))
                    }),
                ),
                name("Circle"),
                name("RoundDto"),
            ),
            &types,
        )
        .unwrap();

    let plain = Value::Object(ObjectRef::new(name("Circle")).with("name", "plain"));
    let result = mapper.map_new(&plain, &name("ShapeDto")).unwrap();
    assert_eq!(result.as_object().unwrap().type_name(), name("ShapeDto"));

    let special = Value::Object(ObjectRef::new(name("Circle")).with("name", "special"));
    let result = mapper.map_new(&special, &name("ShapeDto")).unwrap();
    assert_eq!(result.as_object().unwrap().type_name(), name("RoundDto"));
}
