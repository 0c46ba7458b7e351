//! Access control entries and team invitations

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::Error;

/// Permission token granted to a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessType {
    Read,
    Download,
    Update,
    Create,
    Delete,
    ChangePermissions,
    ChangeSettings,
    Moderate,
    SendMessage,
    Participate,
    Submit,
    ReadPrivateSubmission,
    UpdateSubmission,
    DeleteSubmission,
    TeamMembershipUpdate,
}

impl AccessType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessType::Read => "READ",
            AccessType::Download => "DOWNLOAD",
            AccessType::Update => "UPDATE",
            AccessType::Create => "CREATE",
            AccessType::Delete => "DELETE",
            AccessType::ChangePermissions => "CHANGE_PERMISSIONS",
            AccessType::ChangeSettings => "CHANGE_SETTINGS",
            AccessType::Moderate => "MODERATE",
            AccessType::SendMessage => "SEND_MESSAGE",
            AccessType::Participate => "PARTICIPATE",
            AccessType::Submit => "SUBMIT",
            AccessType::ReadPrivateSubmission => "READ_PRIVATE_SUBMISSION",
            AccessType::UpdateSubmission => "UPDATE_SUBMISSION",
            AccessType::DeleteSubmission => "DELETE_SUBMISSION",
            AccessType::TeamMembershipUpdate => "TEAM_MEMBERSHIP_UPDATE",
        }
    }
}

impl FromStr for AccessType {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace('-', "_");
        serde_json::from_value(serde_json::Value::String(normalized)).map_err(|_| {
            Error::InvalidToken {
                what: "access type",
                value: s.to_string(),
            }
        })
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A principal and the permissions it should hold on a resource.
///
/// `access_type` is an ordered set: duplicates are dropped, first
/// occurrence wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclEntry {
    #[serde(deserialize_with = "string_or_number")]
    pub principal_id: String,
    #[serde(deserialize_with = "ordered_access_set")]
    pub access_type: Vec<AccessType>,
}

impl AclEntry {
    pub fn new(principal_id: impl Into<String>, access_type: impl IntoIterator<Item = AccessType>) -> Self {
        Self {
            principal_id: principal_id.into(),
            access_type: dedup_ordered(access_type),
        }
    }
}

/// One invitation block of a team: a message sent to every member listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub members: Vec<Invitee>,
}

/// Who receives a team invitation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawInvitee", into = "RawInvitee")]
pub enum Invitee {
    Principal(String),
    Email(String),
}

impl Invitee {
    pub fn principal_id(&self) -> Option<&str> {
        match self {
            Invitee::Principal(id) => Some(id),
            Invitee::Email(_) => None,
        }
    }

    pub fn email(&self) -> Option<&str> {
        match self {
            Invitee::Email(email) => Some(email),
            Invitee::Principal(_) => None,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RawInvitee {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    principal_id: Option<IdRepr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
}

impl TryFrom<RawInvitee> for Invitee {
    type Error = String;

    fn try_from(raw: RawInvitee) -> std::result::Result<Self, Self::Error> {
        match (raw.principal_id, raw.email) {
            (Some(id), None) => Ok(Invitee::Principal(id.into())),
            (None, Some(email)) => Ok(Invitee::Email(email)),
            (Some(_), Some(_)) => {
                Err("invitation member must set only one of principal_id or email".to_string())
            }
            (None, None) => Err("invitation member needs a principal_id or an email".to_string()),
        }
    }
}

impl From<Invitee> for RawInvitee {
    fn from(invitee: Invitee) -> Self {
        match invitee {
            Invitee::Principal(id) => RawInvitee {
                principal_id: Some(IdRepr::Text(id)),
                email: None,
            },
            Invitee::Email(email) => RawInvitee {
                principal_id: None,
                email: Some(email),
            },
        }
    }
}

/// Identifier written either as a number or a string in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum IdRepr {
    Number(u64),
    Text(String),
}

impl From<IdRepr> for String {
    fn from(id: IdRepr) -> Self {
        match id {
            IdRepr::Number(n) => n.to_string(),
            IdRepr::Text(s) => s,
        }
    }
}

pub(crate) fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    IdRepr::deserialize(deserializer).map(String::from)
}

pub(crate) fn optional_string_or_number<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<IdRepr>::deserialize(deserializer)?.map(String::from))
}

fn ordered_access_set<'de, D>(deserializer: D) -> std::result::Result<Vec<AccessType>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<AccessType>::deserialize(deserializer).map(dedup_ordered)
}

fn dedup_ordered(items: impl IntoIterator<Item = AccessType>) -> Vec<AccessType> {
    let mut seen = Vec::new();
    for item in items {
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    seen
}
