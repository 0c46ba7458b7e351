//! Error types for formation-core

use crate::entity::EntityKind;
use crate::transport::TransportError;

/// Result type for formation-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in formation-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The platform reported a name conflict and the policy forbids reuse
    #[error(
        "{kind} '{name}' already exists ({source}). To use existing resources, set the policy to get-or-create"
    )]
    AlreadyExists {
        kind: EntityKind,
        name: String,
        #[source]
        source: TransportError,
    },

    /// A looked-up resource is not of the kind the template declares
    #[error("Retrieved '{name}' had type '{actual}' rather than the expected type '{expected}'")]
    TypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    /// A name conflict was reported but the lookup found nothing
    #[error("{kind} '{name}' reported a name conflict but was not found under {parent}")]
    NotFound {
        kind: EntityKind,
        name: String,
        parent: String,
    },

    /// A template node has a shape the walker cannot interpret
    #[error("Invalid template node: {reason}")]
    InvalidNode { reason: String },

    /// A template node declares a `type` the walker does not know
    #[error("Unknown resource type '{type_name}'")]
    UnknownType { type_name: String },

    /// Invalid creation policy name
    #[error("Invalid policy: {policy}")]
    InvalidPolicy { policy: String },

    /// Invalid symbolic token (access type, view type, output format)
    #[error("Invalid {what}: {value}")]
    InvalidToken { what: &'static str, value: String },

    /// Failure while processing one template node
    #[error("at {location} ({name}): {source}")]
    AtNode {
        location: String,
        name: String,
        #[source]
        source: Box<Error>,
    },

    /// Error raised by the transport, passed through unchanged
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Document I/O error from formation-fs
    #[error(transparent)]
    Fs(#[from] formation_fs::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn invalid_node(reason: impl Into<String>) -> Self {
        Self::InvalidNode {
            reason: reason.into(),
        }
    }

    /// Attach the template location of the node being processed.
    pub fn at_node(self, location: impl Into<String>, name: impl Into<String>) -> Self {
        Self::AtNode {
            location: location.into(),
            name: name.into(),
            source: Box::new(self),
        }
    }

    /// The underlying error with any node context stripped.
    pub fn root(&self) -> &Error {
        match self {
            Error::AtNode { source, .. } => source.root(),
            other => other,
        }
    }

    /// Template location of the failing node, if known.
    pub fn location(&self) -> Option<&str> {
        match self {
            Error::AtNode { location, .. } => Some(location),
            _ => None,
        }
    }
}
