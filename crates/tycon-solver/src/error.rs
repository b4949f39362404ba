use thiserror::Error;

/// Reasons a descriptor is rejected by the environment.
///
/// Rejected descriptors are never interned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvironmentError {
    #[error("unknown declaration `{0}`")]
    UnknownDeclaration(String),

    #[error("declaration `{0}` is already registered")]
    DuplicateDeclaration(String),

    #[error("supertype `{supertype}` of `{name}` is not a class or interface")]
    InvalidSupertype { name: String, supertype: String },

    #[error("duplicate type parameter `{name}` on `{owner}`")]
    DuplicateTypeParameter { owner: String, name: String },

    #[error("`{name}` expects {expected} type argument(s), found {found}")]
    ArgumentCountMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid type argument for `{name}`: {reason}")]
    InvalidTypeArgument { name: String, reason: &'static str },

    #[error("array dimensions must be at least 1")]
    ZeroArrayDimensions,

    #[error("array of {0} dimensions exceeds the supported maximum")]
    TooManyArrayDimensions(u32),

    #[error("invalid array element type: {0}")]
    InvalidArrayElement(&'static str),

    #[error("unknown type variable `{name}` of `{owner}`")]
    UnknownTypeVariable { owner: String, name: String },

    #[error("only wildcards can be captured")]
    CaptureOfNonWildcard,

    #[error("invalid wildcard bound: {0}")]
    InvalidWildcardBound(&'static str),

    #[error("invalid bound for type parameter `{name}`: {reason}")]
    InvalidTypeParameterBound { name: String, reason: &'static str },

    #[error("the top type is not yet known")]
    TopTypeUnknown,
}
