use thiserror::Error;

/// Errors that can be produced while building a factor graph,
/// configuring the engine or running inference
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A mandatory configuration key is missing
    #[error("mandatory property `{0}` not specified")]
    NotSpecified(&'static str),

    /// A configuration value does not name a recognized variant
    #[error("unknown value `{value}` for property `{key}`")]
    UnknownEnum { key: &'static str, value: String },

    /// A configuration value cannot be parsed into its target type
    #[error("malformed property `{key}`: `{value}`")]
    MalformedProperty { key: &'static str, value: String },

    /// A message or belief has zero or non-finite mass
    #[error("quantity not normalizable")]
    NotNormalizable,

    /// A joint belief was requested over a variable set not contained
    /// in any single factor scope
    #[error("belief over {0} is not representable by any factor")]
    BeliefNotRepresentable(String),

    /// The factor graph violates a structural invariant
    #[error("invalid factor graph: {0}")]
    InvalidFactorGraph(String),

    /// Contract violation inside the engine
    #[error("internal error: {0}")]
    Internal(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
