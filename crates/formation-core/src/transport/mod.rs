//! Transport abstraction
//!
//! The gateway never talks to the platform directly; it goes through the
//! [`Transport`] capability set so any client (a network client, the
//! [`LocalPlatform`], a test double) can be substituted.

mod local;

pub use local::{Call, InvitationRecord, LocalPlatform, Record};

use serde_json::Value;

use crate::acl::AccessType;
use crate::entity::{Entity, EntityHandle};

/// Result type for transport calls
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Errors reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The platform answered with an error status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The request never got an answer
    #[error("Connection error: {message}")]
    Connection { message: String },
}

impl TransportError {
    pub const BAD_REQUEST: u16 = 400;
    pub const FORBIDDEN: u16 = 403;
    pub const NOT_FOUND: u16 = 404;
    pub const CONFLICT: u16 = 409;

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::http(Self::CONFLICT, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::http(Self::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::http(Self::NOT_FOUND, message)
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Http { status, .. } => Some(*status),
            TransportError::Connection { .. } => None,
        }
    }

    /// The name-conflict condition: the (name, parent, kind) slot is taken.
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(Self::CONFLICT)
    }

    pub fn is_bad_request(&self) -> bool {
        self.status() == Some(Self::BAD_REQUEST)
    }
}

/// Capability set the gateway needs from a platform client.
///
/// Every call blocks until the platform answers. Implementations do not
/// retry; errors are surfaced as-is.
pub trait Transport {
    /// Create `entity`. With `create_or_update`, an existing resource in
    /// the same slot is updated instead of reported as a conflict.
    fn store(&mut self, entity: &Entity, create_or_update: bool) -> TransportResult<EntityHandle>;

    /// Fetch an entity by id. `download_file` is false for metadata only.
    fn get(&mut self, id: &str, download_file: bool) -> TransportResult<EntityHandle>;

    /// Id of the entity named `name` directly under `parent` (projects use
    /// `None`), if any.
    fn find_entity_id(&mut self, name: &str, parent: Option<&str>) -> TransportResult<Option<String>>;

    fn get_team(&mut self, name: &str) -> TransportResult<EntityHandle>;

    /// Root wiki page of an owner entity.
    fn get_wiki(&mut self, owner_id: &str) -> TransportResult<EntityHandle>;

    fn get_evaluation_by_name(&mut self, name: &str) -> TransportResult<EntityHandle>;

    /// Overwrite the permissions `principal_id` holds on `entity`.
    fn set_permissions(
        &mut self,
        entity: &EntityHandle,
        principal_id: &str,
        access_type: &[AccessType],
    ) -> TransportResult<()>;

    /// Invite a user, by principal id or by email, to a team.
    fn invite_to_team(
        &mut self,
        team: &EntityHandle,
        user: Option<&str>,
        invitee_email: Option<&str>,
        message: &str,
    ) -> TransportResult<()>;

    fn rest_get(&mut self, path: &str) -> TransportResult<Value>;

    fn rest_post(&mut self, path: &str, body: &Value) -> TransportResult<Value>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn store(&mut self, entity: &Entity, create_or_update: bool) -> TransportResult<EntityHandle> {
        (**self).store(entity, create_or_update)
    }

    fn get(&mut self, id: &str, download_file: bool) -> TransportResult<EntityHandle> {
        (**self).get(id, download_file)
    }

    fn find_entity_id(&mut self, name: &str, parent: Option<&str>) -> TransportResult<Option<String>> {
        (**self).find_entity_id(name, parent)
    }

    fn get_team(&mut self, name: &str) -> TransportResult<EntityHandle> {
        (**self).get_team(name)
    }

    fn get_wiki(&mut self, owner_id: &str) -> TransportResult<EntityHandle> {
        (**self).get_wiki(owner_id)
    }

    fn get_evaluation_by_name(&mut self, name: &str) -> TransportResult<EntityHandle> {
        (**self).get_evaluation_by_name(name)
    }

    fn set_permissions(
        &mut self,
        entity: &EntityHandle,
        principal_id: &str,
        access_type: &[AccessType],
    ) -> TransportResult<()> {
        (**self).set_permissions(entity, principal_id, access_type)
    }

    fn invite_to_team(
        &mut self,
        team: &EntityHandle,
        user: Option<&str>,
        invitee_email: Option<&str>,
        message: &str,
    ) -> TransportResult<()> {
        (**self).invite_to_team(team, user, invitee_email, message)
    }

    fn rest_get(&mut self, path: &str) -> TransportResult<Value> {
        (**self).rest_get(path)
    }

    fn rest_post(&mut self, path: &str, body: &Value) -> TransportResult<Value> {
        (**self).rest_post(path, body)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn store(&mut self, entity: &Entity, create_or_update: bool) -> TransportResult<EntityHandle> {
        (**self).store(entity, create_or_update)
    }

    fn get(&mut self, id: &str, download_file: bool) -> TransportResult<EntityHandle> {
        (**self).get(id, download_file)
    }

    fn find_entity_id(&mut self, name: &str, parent: Option<&str>) -> TransportResult<Option<String>> {
        (**self).find_entity_id(name, parent)
    }

    fn get_team(&mut self, name: &str) -> TransportResult<EntityHandle> {
        (**self).get_team(name)
    }

    fn get_wiki(&mut self, owner_id: &str) -> TransportResult<EntityHandle> {
        (**self).get_wiki(owner_id)
    }

    fn get_evaluation_by_name(&mut self, name: &str) -> TransportResult<EntityHandle> {
        (**self).get_evaluation_by_name(name)
    }

    fn set_permissions(
        &mut self,
        entity: &EntityHandle,
        principal_id: &str,
        access_type: &[AccessType],
    ) -> TransportResult<()> {
        (**self).set_permissions(entity, principal_id, access_type)
    }

    fn invite_to_team(
        &mut self,
        team: &EntityHandle,
        user: Option<&str>,
        invitee_email: Option<&str>,
        message: &str,
    ) -> TransportResult<()> {
        (**self).invite_to_team(team, user, invitee_email, message)
    }

    fn rest_get(&mut self, path: &str) -> TransportResult<Value> {
        (**self).rest_get(path)
    }

    fn rest_post(&mut self, path: &str, body: &Value) -> TransportResult<Value> {
        (**self).rest_post(path, body)
    }
}
