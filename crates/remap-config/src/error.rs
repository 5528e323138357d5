use thiserror::Error;

/// Configuration errors, raised at registration time and never deferred to
/// mapping time. Each variant names the conflicting path and/or types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("member '{path}' is already ignored")]
    MemberAlreadyIgnored { path: String },
    #[error("ignored member '{path}' has a configured data source")]
    IgnoredMemberHasDataSource { path: String },
    #[error("member '{path}' has been ignored")]
    DataSourceForIgnoredMember { path: String },
    #[error("member '{path}' already has a configured data source")]
    DuplicateDataSource { path: String },
    #[error("target member '{path}' is not writable")]
    UnwritableTargetMember { path: String },
    #[error(
        "a derived source type must be specified when pairing under {source_type} -> {target_type}"
    )]
    InvalidDerivedSourceType {
        source_type: String,
        target_type: String,
    },
    #[error("'{derived}' does not derive from source type '{source_type}'")]
    UnrelatedDerivedSourceType {
        derived: String,
        source_type: String,
    },
    #[error(
        "a derived target type must be specified when pairing under {source_type} -> {target_type}"
    )]
    InvalidDerivedTargetType {
        source_type: String,
        target_type: String,
    },
    #[error(
        "'{derived_source}' is automatically mapped to '{derived_target}' when mapping \
         {source_type} -> {target_type} and does not need to be configured"
    )]
    RedundantDerivedPair {
        source_type: String,
        target_type: String,
        derived_source: String,
        derived_target: String,
    },
    #[error("type '{type_name}' already has identity member '{existing}'")]
    DuplicateIdentifier {
        type_name: String,
        existing: String,
    },
}
