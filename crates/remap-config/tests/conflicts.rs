use std::sync::Arc;

use remap_config::{
    ConfigError, ConfigurationSet, ConfiguredItem, DataSourceOverride, DerivedTypePair,
    IgnoredMember, RuleContext, RuleScope,
};
use remap_model::{
    Member, MappingIntent, QualifiedPath, TypeDescriptor, TypeName, TypeRegistry, Value, ValueType,
};

fn name(value: &str) -> TypeName {
    TypeName::new(value).unwrap()
}

fn registry() -> TypeRegistry {
    let types = TypeRegistry::new();
    types
        .register(
            TypeDescriptor::new(name("Order"))
                .with_field("id", ValueType::Int)
                .with_field("note", ValueType::Text),
        )
        .unwrap();
    types
        .register(
            TypeDescriptor::new(name("OrderDto"))
                .with_field("id", ValueType::Int)
                .with_field("note", ValueType::Text)
                .with_getter("summary", ValueType::Text),
        )
        .unwrap();
    types
        .register(TypeDescriptor::new(name("RushOrder")).with_base(name("Order")))
        .unwrap();
    types
        .register(TypeDescriptor::new(name("RushOrderDto")).with_base(name("OrderDto")))
        .unwrap();
    types
}

fn note_path() -> QualifiedPath {
    QualifiedPath::root().append(Member::field("note", name("OrderDto"), ValueType::Text))
}

fn scope() -> RuleScope {
    RuleScope::new(name("Order"), name("OrderDto"))
}

fn source_rule() -> DataSourceOverride {
    DataSourceOverride::new(
        ConfiguredItem::new(scope(), note_path()),
        Arc::new(|_| Ok(Value::text("custom"))),
    )
}

#[test]
fn ignore_then_data_source_is_rejected() {
    let types = registry();
    let mut config = ConfigurationSet::new();
    config
        .add_ignored_member(IgnoredMember::new(ConfiguredItem::new(scope(), note_path())), &types)
        .unwrap();

    let err = config.add_data_source(source_rule(), &types).unwrap_err();
    assert!(matches!(err, ConfigError::DataSourceForIgnoredMember { .. }));
}

#[test]
fn data_source_then_ignore_is_rejected() {
    let types = registry();
    let mut config = ConfigurationSet::new();
    config.add_data_source(source_rule(), &types).unwrap();

    let err = config
        .add_ignored_member(IgnoredMember::new(ConfiguredItem::new(scope(), note_path())), &types)
        .unwrap_err();
    assert!(matches!(err, ConfigError::IgnoredMemberHasDataSource { .. }));
}

#[test]
fn duplicate_unconditioned_data_sources_are_rejected() {
    let types = registry();
    let mut config = ConfigurationSet::new();
    config.add_data_source(source_rule(), &types).unwrap();

    let err = config.add_data_source(source_rule(), &types).unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateDataSource { .. }));
}

#[test]
fn conditioned_duplicate_is_allowed() {
    let types = registry();
    let mut config = ConfigurationSet::new();
    config.add_data_source(source_rule(), &types).unwrap();

    let guarded = DataSourceOverride::new(
        ConfiguredItem::new(scope().when(|_| false), note_path()),
        Arc::new(|_| Ok(Value::text("guarded"))),
    );
    config.add_data_source(guarded, &types).unwrap();

    let source = name("Order");
    let target = name("OrderDto");
    let path = note_path();
    let ctx = RuleContext::root(MappingIntent::CreateNew, &source, &target, &path);
    // Conditioned rule orders ahead of the unconditioned one.
    let ordered = config.data_sources(&ctx, &types);
    assert_eq!(ordered.len(), 2);
    assert!(ordered[0].item.has_condition());
}

#[test]
fn unwritable_target_member_is_rejected() {
    let types = registry();
    let mut config = ConfigurationSet::new();
    let summary = QualifiedPath::root().append(
        Member::field("summary", name("OrderDto"), ValueType::Text)
            .with_access(remap_model::AccessKind::GetAccessor),
    );
    let err = config
        .add_ignored_member(
            IgnoredMember::new(ConfiguredItem::new(scope(), summary)),
            &types,
        )
        .unwrap_err();
    assert!(matches!(err, ConfigError::UnwritableTargetMember { .. }));
}

#[test]
fn redundant_derived_pair_is_rejected() {
    let types = registry();
    let mut config = ConfigurationSet::new();
    let pair = DerivedTypePair::new(
        ConfiguredItem::for_all_members(scope()),
        name("RushOrder"),
        name("RushOrderDto"),
    );
    let err = config.add_derived_pair(pair, &types).unwrap_err();
    assert!(matches!(err, ConfigError::RedundantDerivedPair { .. }));
}

#[test]
fn derived_pair_must_add_information() {
    let types = registry();
    let mut config = ConfigurationSet::new();

    let same_source = DerivedTypePair::new(
        ConfiguredItem::for_all_members(scope()),
        name("Order"),
        name("RushOrderDto"),
    );
    assert!(matches!(
        config.add_derived_pair(same_source, &types),
        Err(ConfigError::InvalidDerivedSourceType { .. })
    ));

    let same_target = DerivedTypePair::new(
        ConfiguredItem::for_all_members(scope()),
        name("RushOrder"),
        name("OrderDto"),
    );
    assert!(matches!(
        config.add_derived_pair(same_target, &types),
        Err(ConfigError::InvalidDerivedTargetType { .. })
    ));

    let unrelated = DerivedTypePair::new(
        ConfiguredItem::for_all_members(scope()),
        name("OrderDto"),
        name("RushOrderDto"),
    );
    assert!(matches!(
        config.add_derived_pair(unrelated, &types),
        Err(ConfigError::UnrelatedDerivedSourceType { .. })
    ));
}

#[test]
fn identifier_registrations_conflict() {
    let mut config = ConfigurationSet::new();
    config.set_identifier(name("Order"), "id").unwrap();
    config.set_identifier(name("Order"), "id").unwrap();
    assert!(matches!(
        config.set_identifier(name("Order"), "code"),
        Err(ConfigError::DuplicateIdentifier { .. })
    ));
    assert_eq!(config.identifier_for(&name("Order")), Some("id"));
}

#[test]
fn reset_clears_every_store() {
    let types = registry();
    let mut config = ConfigurationSet::new();
    config.add_data_source(source_rule(), &types).unwrap();
    config.set_identifier(name("Order"), "id").unwrap();

    config.reset();

    // The previously conflicting registration now succeeds.
    config.add_data_source(source_rule(), &types).unwrap();
    assert_eq!(config.identifier_for(&name("Order")), None);
}
