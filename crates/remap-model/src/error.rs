use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid type name: {0:?}")]
    InvalidTypeName(String),
    #[error("unknown type: {0}")]
    UnknownType(String),
    #[error("unknown base type '{base}' declared by '{derived}'")]
    UnknownBaseType { base: String, derived: String },
    #[error("type '{0}' is already registered")]
    DuplicateType(String),
    #[error("member '{declaring}.{member}' is not writable")]
    UnwritableMember { declaring: String, member: String },
    #[error("cannot populate member '{member}' on a non-object value")]
    PopulateNonObject { member: String },
}
