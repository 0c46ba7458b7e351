//! Resource gateway
//!
//! One create-or-get operation per resource kind. Every operation issues a
//! single create call; what happens when the platform reports that the slot
//! is already taken is decided by the gateway's [`CreationPolicy`].

use serde_json::json;

use crate::acl::{AclEntry, Invitation};
use crate::entity::{
    Challenge, Entity, EntityHandle, EntityKind, EntityView, Evaluation, FileEntity, Folder,
    Project, TableSchema, Team, Wiki,
};
use crate::policy::CreationPolicy;
use crate::transport::Transport;
use crate::{Error, Result};

/// Creates or fetches platform resources through a [`Transport`].
///
/// The policy is fixed at construction.
pub struct ResourceGateway<T> {
    transport: T,
    policy: CreationPolicy,
}

impl<T: Transport> ResourceGateway<T> {
    pub fn new(transport: T, policy: CreationPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> CreationPolicy {
        self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Gets an existing project by name or creates a new one.
    pub fn create_or_get_project(&mut self, name: &str) -> Result<EntityHandle> {
        self.create_or_get(Entity::Project(Project {
            name: name.to_string(),
        }))
    }

    /// Gets an existing folder by name and parent or creates a new one.
    pub fn create_or_get_folder(&mut self, name: &str, parent_id: &str) -> Result<EntityHandle> {
        self.create_or_get(Entity::Folder(Folder {
            name: name.to_string(),
            parent_id: parent_id.to_string(),
        }))
    }

    /// Gets an existing file by name and parent or creates a new one.
    pub fn create_or_get_file(&mut self, file: FileEntity) -> Result<EntityHandle> {
        self.create_or_get(Entity::File(file))
    }

    /// Gets an existing team by name or creates a new one.
    pub fn create_or_get_team(&mut self, team: Team) -> Result<EntityHandle> {
        self.create_or_get(Entity::Team(team))
    }

    /// Gets an existing entity view by name and parent or creates a new one.
    pub fn create_or_get_view(&mut self, view: EntityView) -> Result<EntityHandle> {
        self.create_or_get(Entity::View(view))
    }

    /// Gets an existing table schema by name and parent or creates a new one.
    pub fn create_or_get_schema(&mut self, schema: TableSchema) -> Result<EntityHandle> {
        self.create_or_get(Entity::Table(schema))
    }

    /// Gets the owner's root wiki page or creates it.
    ///
    /// Sub-pages (with `parent_wiki_id`) are always created; titles are not
    /// unique below the root, so they cannot be looked up.
    pub fn create_or_get_wiki(&mut self, wiki: Wiki) -> Result<EntityHandle> {
        self.create_or_get(Entity::Wiki(wiki))
    }

    /// Gets an existing evaluation queue by name or creates a new one.
    pub fn create_or_get_queue(&mut self, queue: Evaluation) -> Result<EntityHandle> {
        self.create_or_get(Entity::Evaluation(queue))
    }

    /// Create `entity`, resolving a name conflict under the gateway policy.
    pub fn create_or_get(&mut self, entity: Entity) -> Result<EntityHandle> {
        self.resolve(entity, self.policy)
    }

    /// Resolve an entity the caller already knows exists, under
    /// get-or-create whatever the configured policy.
    ///
    /// Used for template nodes annotated with an id by an earlier run.
    pub fn reconcile_existing(&mut self, entity: Entity) -> Result<EntityHandle> {
        self.resolve(entity, CreationPolicy::GetOrCreate)
    }

    fn resolve(&mut self, entity: Entity, policy: CreationPolicy) -> Result<EntityHandle> {
        let kind = entity.kind();
        tracing::debug!(%kind, name = entity.name(), parent = ?entity.parent_id(), %policy, "storing");

        let (handle, outcome) = match self.transport.store(&entity, policy.updates_in_place()) {
            Ok(handle) => (handle, "Created"),
            Err(err) if err.is_conflict() => {
                if !policy.allows_lookup() {
                    return Err(Error::AlreadyExists {
                        kind,
                        name: entity.name().to_string(),
                        source: err,
                    });
                }
                if policy.updates_in_place() {
                    tracing::warn!(%kind, name = entity.name(), "cannot update in place, fetching existing");
                }
                (self.lookup(&entity)?, "Fetched existing")
            }
            Err(err) => return Err(err.into()),
        };

        tracing::info!("{} {} {} ({})", outcome, kind, handle.name, handle.id);
        Ok(handle)
    }

    fn lookup(&mut self, entity: &Entity) -> Result<EntityHandle> {
        match entity {
            Entity::Project(_)
            | Entity::Folder(_)
            | Entity::File(_)
            | Entity::View(_)
            | Entity::Table(_) => {
                self.find_entity_by_name(entity.name(), entity.parent_id(), entity.kind())
            }
            Entity::Team(team) => Ok(self.transport.get_team(&team.name)?),
            Entity::Wiki(wiki) => Ok(self.transport.get_wiki(&wiki.owner_id)?),
            Entity::Evaluation(queue) => Ok(self.transport.get_evaluation_by_name(&queue.name)?),
        }
    }

    /// Find an entity by name directly under `parent_id` and check its type.
    ///
    /// This does not search nested containers.
    fn find_entity_by_name(
        &mut self,
        name: &str,
        parent_id: Option<&str>,
        expected: EntityKind,
    ) -> Result<EntityHandle> {
        let id = self
            .transport
            .find_entity_id(name, parent_id)?
            .ok_or_else(|| Error::NotFound {
                kind: expected,
                name: name.to_string(),
                parent: parent_id.unwrap_or("the root").to_string(),
            })?;

        let handle = self.transport.get(&id, false)?;
        if handle.concrete_type != expected.concrete_type() {
            return Err(Error::TypeMismatch {
                name: name.to_string(),
                expected: expected.concrete_type().to_string(),
                actual: handle.concrete_type,
            });
        }
        Ok(handle)
    }

    /// Apply ACL entries to a resolved entity, one call per entry, in order.
    ///
    /// Entries applied before a failing call stay applied.
    pub fn set_acl(&mut self, entity: &EntityHandle, acl: &[AclEntry]) -> Result<()> {
        for entry in acl {
            tracing::debug!(
                entity = %entity.id,
                principal = %entry.principal_id,
                access = ?entry.access_type,
                "setting permissions"
            );
            self.transport
                .set_permissions(entity, &entry.principal_id, &entry.access_type)?;
        }
        Ok(())
    }

    /// Send one invitation per member of every invitation block.
    ///
    /// Returns the number of invitations sent.
    pub fn invite_members(&mut self, team: &EntityHandle, invitations: &[Invitation]) -> Result<usize> {
        let mut sent = 0;
        for invitation in invitations {
            for member in &invitation.members {
                self.transport.invite_to_team(
                    team,
                    member.principal_id(),
                    member.email(),
                    &invitation.message,
                )?;
                sent += 1;
            }
        }
        if sent > 0 {
            tracing::info!("Invited {} member(s) to Team {} ({})", sent, team.name, team.id);
        }
        Ok(sent)
    }

    /// Gets the challenge of a project or creates one.
    ///
    /// The platform answers 400 when the project already has a challenge;
    /// that is treated as the conflict for this kind.
    pub fn create_or_get_challenge(
        &mut self,
        project_id: &str,
        participant_team_id: &str,
    ) -> Result<Challenge> {
        self.resolve_challenge(project_id, participant_team_id, self.policy)
    }

    /// Challenge counterpart of [`ResourceGateway::reconcile_existing`].
    pub fn reconcile_existing_challenge(
        &mut self,
        project_id: &str,
        participant_team_id: &str,
    ) -> Result<Challenge> {
        self.resolve_challenge(project_id, participant_team_id, CreationPolicy::GetOrCreate)
    }

    fn resolve_challenge(
        &mut self,
        project_id: &str,
        participant_team_id: &str,
        policy: CreationPolicy,
    ) -> Result<Challenge> {
        let body = json!({
            "participantTeamId": participant_team_id,
            "projectId": project_id,
        });

        let (value, outcome) = match self.transport.rest_post("/challenge", &body) {
            Ok(value) => (value, "Created"),
            Err(err) if err.is_bad_request() => {
                if !policy.allows_lookup() {
                    return Err(Error::AlreadyExists {
                        kind: EntityKind::Challenge,
                        name: project_id.to_string(),
                        source: err,
                    });
                }
                let existing = self
                    .transport
                    .rest_get(&format!("/entity/{}/challenge", project_id))?;
                (existing, "Fetched existing")
            }
            Err(err) => return Err(err.into()),
        };

        let challenge: Challenge = serde_json::from_value(value)?;
        tracing::info!("{} Challenge ({})", outcome, challenge.id);
        Ok(challenge)
    }
}
