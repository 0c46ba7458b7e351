//! In-process platform
//!
//! `LocalPlatform` implements [`Transport`] against an in-memory model of
//! the platform's uniqueness rules:
//!
//! - entity names are unique per parent (projects: globally)
//! - team and evaluation names are globally unique
//! - an owner has at most one root wiki page
//! - a project has at most one challenge
//!
//! Its state serializes to a document, so a CLI run can persist it between
//! invocations. Every transport call is appended to an in-memory call log.

use std::collections::BTreeMap;
use std::path::Path;

use formation_fs::DocumentStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Transport, TransportError, TransportResult};
use crate::Result;
use crate::acl::AccessType;
use crate::entity::{Challenge, Entity, EntityHandle, EntityKind};

/// One transport call as observed by the platform.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Store {
        kind: EntityKind,
        name: String,
        parent_id: Option<String>,
        create_or_update: bool,
    },
    Get {
        id: String,
    },
    FindEntityId {
        name: String,
        parent: Option<String>,
    },
    GetTeam {
        name: String,
    },
    GetWiki {
        owner_id: String,
    },
    GetEvaluation {
        name: String,
    },
    SetPermissions {
        entity_id: String,
        principal_id: String,
        access_type: Vec<AccessType>,
    },
    InviteToTeam {
        team_id: String,
        user: Option<String>,
        email: Option<String>,
        message: String,
    },
    RestGet {
        path: String,
    },
    RestPost {
        path: String,
        body: Value,
    },
}

impl Call {
    /// Whether the call asked the platform to create or update a resource.
    pub fn is_store(&self) -> bool {
        matches!(self, Call::Store { .. })
    }
}

/// A stored resource and the ACL granted on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub entity: Entity,
    #[serde(default)]
    pub acl: BTreeMap<String, Vec<AccessType>>,
}

impl Record {
    pub fn handle(&self) -> EntityHandle {
        EntityHandle::new(
            self.id.clone(),
            self.entity.name(),
            self.entity.parent_id().map(str::to_owned),
            self.entity.kind(),
        )
    }

    fn occupies_slot(&self, name: &str, parent: Option<&str>) -> bool {
        self.entity.kind().is_entity()
            && self.entity.name() == name
            && self.entity.parent_id() == parent
    }
}

/// A team invitation that was sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationRecord {
    pub team_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub message: String,
}

/// In-memory platform state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalPlatform {
    /// State format version
    version: String,
    /// Last allocated numeric id
    next_id: u64,
    #[serde(default)]
    records: Vec<Record>,
    #[serde(default)]
    challenges: Vec<Challenge>,
    #[serde(default)]
    invitations: Vec<InvitationRecord>,
    #[serde(skip)]
    calls: Vec<Call>,
}

impl Default for LocalPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalPlatform {
    /// Create an empty platform. The first id handed out is `syn1`.
    pub fn new() -> Self {
        Self {
            version: "1".to_string(),
            next_id: 0,
            records: Vec::new(),
            challenges: Vec::new(),
            invitations: Vec::new(),
            calls: Vec::new(),
        }
    }

    /// Load platform state from a JSON, YAML or TOML document.
    pub fn load(path: &Path) -> Result<Self> {
        let platform: LocalPlatform = DocumentStore::new().load(path)?;
        tracing::debug!(
            path = %path.display(),
            resources = platform.records.len(),
            "loaded platform state"
        );
        Ok(platform)
    }

    /// Load platform state, or start empty if the file does not exist yet.
    pub fn open(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::new())
        }
    }

    /// Save platform state atomically. The call log is not persisted.
    pub fn save(&self, path: &Path) -> Result<()> {
        DocumentStore::new().save(path, self)?;
        Ok(())
    }

    /// Calls received so far, oldest first.
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Drain the call log.
    pub fn take_calls(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn challenges(&self) -> &[Challenge] {
        &self.challenges
    }

    pub fn invitations(&self) -> &[InvitationRecord] {
        &self.invitations
    }

    /// Permissions granted on a resource, keyed by principal.
    pub fn acl_of(&self, id: &str) -> Option<&BTreeMap<String, Vec<AccessType>>> {
        self.record(id).map(|r| &r.acl)
    }

    /// Insert a resource directly, bypassing the call log. Useful to seed
    /// pre-existing state.
    pub fn seed(&mut self, entity: Entity) -> EntityHandle {
        let id = self.allocate_id(entity.kind());
        let record = Record {
            id,
            entity,
            acl: BTreeMap::new(),
        };
        let handle = record.handle();
        self.records.push(record);
        handle
    }

    fn allocate_id(&mut self, kind: EntityKind) -> String {
        self.next_id += 1;
        if kind.is_entity() {
            format!("syn{}", self.next_id)
        } else {
            self.next_id.to_string()
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    fn find_conflict(&self, entity: &Entity) -> Option<usize> {
        let kind = entity.kind();
        self.records.iter().position(|r| match entity {
            _ if kind.is_entity() => r.occupies_slot(entity.name(), entity.parent_id()),
            Entity::Team(team) => matches!(&r.entity, Entity::Team(t) if t.name == team.name),
            Entity::Evaluation(queue) => {
                matches!(&r.entity, Entity::Evaluation(e) if e.name == queue.name)
            }
            Entity::Wiki(wiki) => {
                wiki.parent_wiki_id.is_none()
                    && matches!(&r.entity, Entity::Wiki(w) if w.owner_id == wiki.owner_id && w.parent_wiki_id.is_none())
            }
            _ => false,
        })
    }

    fn conflict_error(entity: &Entity) -> TransportError {
        match entity.parent_id() {
            Some(parent) if entity.kind().is_entity() => TransportError::conflict(format!(
                "An entity with the name: {} already exists with a parentId: {}",
                entity.name(),
                parent
            )),
            _ => TransportError::conflict(format!(
                "{} '{}' already exists",
                entity.kind(),
                entity.name()
            )),
        }
    }

    fn check_parent(&self, entity: &Entity) -> TransportResult<()> {
        let Some(parent) = entity.parent_id() else {
            return Ok(());
        };
        let record = self
            .record(parent)
            .ok_or_else(|| TransportError::not_found(format!("Parent {} does not exist", parent)))?;

        let parent_kind = record.entity.kind();
        let acceptable = match entity.kind() {
            EntityKind::Wiki => parent_kind.is_entity() || parent_kind == EntityKind::Evaluation,
            EntityKind::Evaluation => parent_kind == EntityKind::Project,
            _ => parent_kind.is_container(),
        };
        if acceptable {
            Ok(())
        } else {
            Err(TransportError::bad_request(format!(
                "{} {} cannot hold a {}",
                parent_kind,
                parent,
                entity.kind()
            )))
        }
    }

    fn handle_by<F>(&self, what: &str, predicate: F) -> TransportResult<EntityHandle>
    where
        F: Fn(&Record) -> bool,
    {
        self.records
            .iter()
            .find(|r| predicate(r))
            .map(Record::handle)
            .ok_or_else(|| TransportError::not_found(format!("{} not found", what)))
    }

    fn create_challenge(&mut self, body: &Value) -> TransportResult<Value> {
        let field = |key: &str| -> TransportResult<String> {
            match body.get(key) {
                Some(Value::String(s)) => Ok(s.clone()),
                Some(Value::Number(n)) => Ok(n.to_string()),
                _ => Err(TransportError::bad_request(format!("{} is required", key))),
            }
        };
        let project_id = field("projectId")?;
        let participant_team_id = field("participantTeamId")?;

        match self.record(&project_id) {
            Some(r) if r.entity.kind() == EntityKind::Project => {}
            _ => {
                return Err(TransportError::not_found(format!(
                    "Project {} does not exist",
                    project_id
                )));
            }
        }
        if !matches!(self.record(&participant_team_id), Some(r) if r.entity.kind() == EntityKind::Team)
        {
            return Err(TransportError::not_found(format!(
                "Team {} does not exist",
                participant_team_id
            )));
        }
        if self.challenges.iter().any(|c| c.project_id == project_id) {
            return Err(TransportError::bad_request(format!(
                "A challenge is already associated with {}",
                project_id
            )));
        }

        let challenge = Challenge {
            id: self.allocate_id(EntityKind::Challenge),
            project_id,
            participant_team_id,
            etag: Some(format!("etag-{}", self.next_id)),
        };
        let value = serde_json::to_value(&challenge)
            .map_err(|e| TransportError::bad_request(e.to_string()))?;
        self.challenges.push(challenge);
        Ok(value)
    }
}

impl Transport for LocalPlatform {
    fn store(&mut self, entity: &Entity, create_or_update: bool) -> TransportResult<EntityHandle> {
        self.calls.push(Call::Store {
            kind: entity.kind(),
            name: entity.name().to_string(),
            parent_id: entity.parent_id().map(str::to_owned),
            create_or_update,
        });

        self.check_parent(entity)?;
        if let Entity::View(view) = entity {
            if view.view_type_mask() == 0 {
                return Err(TransportError::bad_request(
                    "A view must include at least one entity type",
                ));
            }
        }

        if let Some(index) = self.find_conflict(entity) {
            let existing = &mut self.records[index];
            // Only entities of the same kind can be updated in place
            if create_or_update
                && entity.kind().is_entity()
                && existing.entity.kind() == entity.kind()
            {
                existing.entity = entity.clone();
                return Ok(existing.handle());
            }
            return Err(Self::conflict_error(entity));
        }

        let id = self.allocate_id(entity.kind());
        let record = Record {
            id,
            entity: entity.clone(),
            acl: BTreeMap::new(),
        };
        let handle = record.handle();
        self.records.push(record);
        Ok(handle)
    }

    fn get(&mut self, id: &str, _download_file: bool) -> TransportResult<EntityHandle> {
        self.calls.push(Call::Get { id: id.to_string() });
        self.handle_by(&format!("Entity {}", id), |r| r.id == id)
    }

    fn find_entity_id(&mut self, name: &str, parent: Option<&str>) -> TransportResult<Option<String>> {
        self.calls.push(Call::FindEntityId {
            name: name.to_string(),
            parent: parent.map(str::to_owned),
        });
        Ok(self
            .records
            .iter()
            .find(|r| r.occupies_slot(name, parent))
            .map(|r| r.id.clone()))
    }

    fn get_team(&mut self, name: &str) -> TransportResult<EntityHandle> {
        self.calls.push(Call::GetTeam {
            name: name.to_string(),
        });
        self.handle_by(&format!("Team {}", name), |r| {
            matches!(&r.entity, Entity::Team(t) if t.name == name)
        })
    }

    fn get_wiki(&mut self, owner_id: &str) -> TransportResult<EntityHandle> {
        self.calls.push(Call::GetWiki {
            owner_id: owner_id.to_string(),
        });
        self.handle_by(&format!("Wiki of {}", owner_id), |r| {
            matches!(&r.entity, Entity::Wiki(w) if w.owner_id == owner_id && w.parent_wiki_id.is_none())
        })
    }

    fn get_evaluation_by_name(&mut self, name: &str) -> TransportResult<EntityHandle> {
        self.calls.push(Call::GetEvaluation {
            name: name.to_string(),
        });
        self.handle_by(&format!("Evaluation {}", name), |r| {
            matches!(&r.entity, Entity::Evaluation(e) if e.name == name)
        })
    }

    fn set_permissions(
        &mut self,
        entity: &EntityHandle,
        principal_id: &str,
        access_type: &[AccessType],
    ) -> TransportResult<()> {
        self.calls.push(Call::SetPermissions {
            entity_id: entity.id.clone(),
            principal_id: principal_id.to_string(),
            access_type: access_type.to_vec(),
        });

        let index = self
            .position(&entity.id)
            .ok_or_else(|| TransportError::not_found(format!("Entity {} not found", entity.id)))?;
        let acl = &mut self.records[index].acl;
        if access_type.is_empty() {
            acl.remove(principal_id);
        } else {
            acl.insert(principal_id.to_string(), access_type.to_vec());
        }
        Ok(())
    }

    fn invite_to_team(
        &mut self,
        team: &EntityHandle,
        user: Option<&str>,
        invitee_email: Option<&str>,
        message: &str,
    ) -> TransportResult<()> {
        self.calls.push(Call::InviteToTeam {
            team_id: team.id.clone(),
            user: user.map(str::to_owned),
            email: invitee_email.map(str::to_owned),
            message: message.to_string(),
        });

        if !matches!(self.record(&team.id), Some(r) if r.entity.kind() == EntityKind::Team) {
            return Err(TransportError::not_found(format!("Team {} not found", team.id)));
        }
        if user.is_some() == invitee_email.is_some() {
            return Err(TransportError::bad_request(
                "Exactly one of user or invitee email is required",
            ));
        }

        self.invitations.push(InvitationRecord {
            team_id: team.id.clone(),
            user: user.map(str::to_owned),
            email: invitee_email.map(str::to_owned),
            message: message.to_string(),
        });
        Ok(())
    }

    fn rest_get(&mut self, path: &str) -> TransportResult<Value> {
        self.calls.push(Call::RestGet {
            path: path.to_string(),
        });

        let project_id = path
            .strip_prefix("/entity/")
            .and_then(|rest| rest.strip_suffix("/challenge"));
        match project_id {
            Some(project_id) => {
                let challenge = self
                    .challenges
                    .iter()
                    .find(|c| c.project_id == project_id)
                    .ok_or_else(|| {
                        TransportError::not_found(format!("No challenge for {}", project_id))
                    })?;
                serde_json::to_value(challenge)
                    .map_err(|e| TransportError::bad_request(e.to_string()))
            }
            None => Err(TransportError::not_found(format!("No resource at {}", path))),
        }
    }

    fn rest_post(&mut self, path: &str, body: &Value) -> TransportResult<Value> {
        self.calls.push(Call::RestPost {
            path: path.to_string(),
            body: body.clone(),
        });

        match path {
            "/challenge" => self.create_challenge(body),
            _ => Err(TransportError::not_found(format!("No resource at {}", path))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Folder, Project, Team};
    use serde_json::json;

    fn project(name: &str) -> Entity {
        Entity::Project(Project { name: name.into() })
    }

    fn folder(name: &str, parent: &str) -> Entity {
        Entity::Folder(Folder {
            name: name.into(),
            parent_id: parent.into(),
        })
    }

    #[test]
    fn ids_are_sequential() {
        let mut platform = LocalPlatform::new();
        let p = platform.store(&project("P"), false).unwrap();
        let f = platform.store(&folder("F", &p.id), false).unwrap();

        assert_eq!(p.id, "syn1");
        assert_eq!(f.id, "syn2");
        assert_eq!(f.parent_id.as_deref(), Some("syn1"));
    }

    #[test]
    fn duplicate_name_under_same_parent_conflicts() {
        let mut platform = LocalPlatform::new();
        let p = platform.store(&project("P"), false).unwrap();
        platform.store(&folder("F", &p.id), false).unwrap();

        let err = platform.store(&folder("F", &p.id), false).unwrap_err();
        assert!(err.is_conflict());
        assert!(err.to_string().contains("parentId: syn1"));
    }

    #[test]
    fn same_name_under_different_parents_is_allowed() {
        let mut platform = LocalPlatform::new();
        let a = platform.store(&project("A"), false).unwrap();
        let b = platform.store(&project("B"), false).unwrap();

        platform.store(&folder("data", &a.id), false).unwrap();
        platform.store(&folder("data", &b.id), false).unwrap();

        assert_eq!(platform.records().len(), 4);
    }

    #[test]
    fn create_or_update_updates_same_kind_only() {
        let mut platform = LocalPlatform::new();
        let first = platform.store(&project("P"), false).unwrap();
        let again = platform.store(&project("P"), true).unwrap();
        assert_eq!(first.id, again.id);

        let p = first.id;
        platform.store(&folder("x", &p), false).unwrap();
        let view = Entity::View(crate::entity::EntityView {
            name: "x".into(),
            parent_id: p.clone(),
            scopes: vec![p.clone()],
            include_entity_types: vec![],
            add_default_view_columns: true,
        });
        assert!(platform.store(&view, true).unwrap_err().is_conflict());
    }

    #[test]
    fn teams_are_globally_unique_and_never_updated() {
        let mut platform = LocalPlatform::new();
        let team = Entity::Team(Team {
            name: "T".into(),
            description: String::new(),
            can_public_join: false,
        });
        let handle = platform.store(&team, false).unwrap();
        assert_eq!(handle.id, "1");

        assert!(platform.store(&team, true).unwrap_err().is_conflict());
        assert_eq!(platform.get_team("T").unwrap().id, "1");
    }

    #[test]
    fn missing_parent_is_not_found() {
        let mut platform = LocalPlatform::new();
        let err = platform.store(&folder("F", "syn404"), false).unwrap_err();
        assert_eq!(err.status(), Some(TransportError::NOT_FOUND));
    }

    #[test]
    fn empty_access_type_revokes() {
        let mut platform = LocalPlatform::new();
        let p = platform.store(&project("P"), false).unwrap();

        platform.set_permissions(&p, "1", &[AccessType::Read]).unwrap();
        platform.set_permissions(&p, "1", &[]).unwrap();

        assert!(platform.acl_of(&p.id).unwrap().is_empty());
    }

    #[test]
    fn second_challenge_for_project_is_bad_request() {
        let mut platform = LocalPlatform::new();
        let p = platform.store(&project("P"), false).unwrap();
        let t = platform
            .store(
                &Entity::Team(Team {
                    name: "T".into(),
                    description: String::new(),
                    can_public_join: true,
                }),
                false,
            )
            .unwrap();
        let body = json!({"projectId": p.id, "participantTeamId": t.id});

        platform.rest_post("/challenge", &body).unwrap();
        let err = platform.rest_post("/challenge", &body).unwrap_err();

        assert!(err.is_bad_request());
        let fetched = platform.rest_get("/entity/syn1/challenge").unwrap();
        assert_eq!(fetched["projectId"], "syn1");
    }

    #[test]
    fn call_log_records_in_order() {
        let mut platform = LocalPlatform::new();
        let p = platform.store(&project("P"), false).unwrap();
        platform.find_entity_id("P", None).unwrap();
        platform.get(&p.id, false).unwrap();

        let calls = platform.take_calls();
        assert_eq!(calls.len(), 3);
        assert!(calls[0].is_store());
        assert_eq!(
            calls[1],
            Call::FindEntityId {
                name: "P".into(),
                parent: None
            }
        );
        assert!(platform.calls().is_empty());
    }
}
