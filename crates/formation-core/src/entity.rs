//! Resource model
//!
//! [`Entity`] is the desired state of one resource as sent to the platform;
//! [`EntityHandle`] is what the platform hands back once the resource exists.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Kind of a platform resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Project,
    Folder,
    File,
    EntityView,
    Table,
    Team,
    Wiki,
    Evaluation,
    Challenge,
}

impl EntityKind {
    const ALL: [EntityKind; 9] = [
        EntityKind::Project,
        EntityKind::Folder,
        EntityKind::File,
        EntityKind::EntityView,
        EntityKind::Table,
        EntityKind::Team,
        EntityKind::Wiki,
        EntityKind::Evaluation,
        EntityKind::Challenge,
    ];

    /// Fully qualified type name the platform reports for this kind.
    pub fn concrete_type(&self) -> &'static str {
        match self {
            EntityKind::Project => "org.sagebionetworks.repo.model.Project",
            EntityKind::Folder => "org.sagebionetworks.repo.model.Folder",
            EntityKind::File => "org.sagebionetworks.repo.model.FileEntity",
            EntityKind::EntityView => "org.sagebionetworks.repo.model.table.EntityView",
            EntityKind::Table => "org.sagebionetworks.repo.model.table.TableEntity",
            EntityKind::Team => "org.sagebionetworks.repo.model.Team",
            EntityKind::Wiki => "org.sagebionetworks.repo.model.wiki.WikiPage",
            EntityKind::Evaluation => "org.sagebionetworks.evaluation.model.Evaluation",
            EntityKind::Challenge => "org.sagebionetworks.repo.model.Challenge",
        }
    }

    pub fn from_concrete_type(concrete_type: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.concrete_type() == concrete_type)
    }

    /// Whether the kind lives in the entity hierarchy and is addressed by
    /// (name, parent).
    pub fn is_entity(&self) -> bool {
        matches!(
            self,
            EntityKind::Project
                | EntityKind::Folder
                | EntityKind::File
                | EntityKind::EntityView
                | EntityKind::Table
        )
    }

    /// Whether the kind can hold child entities.
    pub fn is_container(&self) -> bool {
        matches!(self, EntityKind::Project | EntityKind::Folder)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Project => "Project",
            EntityKind::Folder => "Folder",
            EntityKind::File => "File",
            EntityKind::EntityView => "View",
            EntityKind::Table => "Schema",
            EntityKind::Team => "Team",
            EntityKind::Wiki => "Wiki",
            EntityKind::Evaluation => "Queue",
            EntityKind::Challenge => "Challenge",
        };
        f.write_str(label)
    }
}

/// Entity types an entity view can include in its scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityViewType {
    File,
    Project,
    Table,
    Folder,
    View,
    Docker,
}

impl EntityViewType {
    /// Bit the platform uses for this type in a view type mask.
    pub fn mask(&self) -> u32 {
        match self {
            EntityViewType::File => 0x01,
            EntityViewType::Project => 0x02,
            EntityViewType::Table => 0x04,
            EntityViewType::Folder => 0x08,
            EntityViewType::View => 0x10,
            EntityViewType::Docker => 0x20,
        }
    }

    /// Combined mask for a set of types.
    pub fn combined_mask(types: &[EntityViewType]) -> u32 {
        types.iter().fold(0, |mask, t| mask | t.mask())
    }
}

impl FromStr for EntityViewType {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" => Ok(EntityViewType::File),
            "project" => Ok(EntityViewType::Project),
            "table" => Ok(EntityViewType::Table),
            "folder" => Ok(EntityViewType::Folder),
            "view" | "entityview" => Ok(EntityViewType::View),
            "docker" | "dockerrepo" => Ok(EntityViewType::Docker),
            _ => Err(Error::InvalidToken {
                what: "entity view type",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for EntityViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            EntityViewType::File => "file",
            EntityViewType::Project => "project",
            EntityViewType::Table => "table",
            EntityViewType::Folder => "folder",
            EntityViewType::View => "view",
            EntityViewType::Docker => "docker",
        };
        f.write_str(tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub name: String,
    pub parent_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntity {
    pub name: String,
    pub parent_id: String,
    /// Local path or URL of the file content
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub can_public_join: bool,
}

/// A view over the entities found in a set of containers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityView {
    pub name: String,
    pub parent_id: String,
    /// Container ids whose contents the view lists
    pub scopes: Vec<String>,
    pub include_entity_types: Vec<EntityViewType>,
    #[serde(default = "default_true")]
    pub add_default_view_columns: bool,
}

impl EntityView {
    pub fn view_type_mask(&self) -> u32 {
        EntityViewType::combined_mask(&self.include_entity_types)
    }
}

/// Column of a table schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub parent_id: String,
    #[serde(default)]
    pub columns: Vec<Column>,
}

/// A wiki page attached to an owner entity.
///
/// Pages without `parent_wiki_id` are root pages; an owner has at most one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wiki {
    pub owner_id: String,
    pub title: String,
    #[serde(default)]
    pub markdown: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_wiki_id: Option<String>,
}

/// An evaluation queue collecting submissions for a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub content_source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_instructions: Option<String>,
}

/// Desired state of a single resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Entity {
    Project(Project),
    Folder(Folder),
    File(FileEntity),
    View(EntityView),
    Table(TableSchema),
    Team(Team),
    Wiki(Wiki),
    Evaluation(Evaluation),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Project(_) => EntityKind::Project,
            Entity::Folder(_) => EntityKind::Folder,
            Entity::File(_) => EntityKind::File,
            Entity::View(_) => EntityKind::EntityView,
            Entity::Table(_) => EntityKind::Table,
            Entity::Team(_) => EntityKind::Team,
            Entity::Wiki(_) => EntityKind::Wiki,
            Entity::Evaluation(_) => EntityKind::Evaluation,
        }
    }

    /// Display name; the title for wiki pages.
    pub fn name(&self) -> &str {
        match self {
            Entity::Project(p) => &p.name,
            Entity::Folder(f) => &f.name,
            Entity::File(f) => &f.name,
            Entity::View(v) => &v.name,
            Entity::Table(t) => &t.name,
            Entity::Team(t) => &t.name,
            Entity::Wiki(w) => &w.title,
            Entity::Evaluation(e) => &e.name,
        }
    }

    /// The id this resource hangs off: entity parent, wiki owner or
    /// evaluation content source. Projects and teams have none.
    pub fn parent_id(&self) -> Option<&str> {
        match self {
            Entity::Project(_) | Entity::Team(_) => None,
            Entity::Folder(f) => Some(&f.parent_id),
            Entity::File(f) => Some(&f.parent_id),
            Entity::View(v) => Some(&v.parent_id),
            Entity::Table(t) => Some(&t.parent_id),
            Entity::Wiki(w) => Some(&w.owner_id),
            Entity::Evaluation(e) => Some(&e.content_source),
        }
    }
}

/// A resource that exists on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityHandle {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub concrete_type: String,
}

impl EntityHandle {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        parent_id: Option<String>,
        kind: EntityKind,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id,
            concrete_type: kind.concrete_type().to_string(),
        }
    }

    /// The kind, if the concrete type is one this crate models.
    pub fn kind(&self) -> Option<EntityKind> {
        EntityKind::from_concrete_type(&self.concrete_type)
    }
}

/// A challenge linking a project to its participant team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub id: String,
    pub project_id: String,
    pub participant_team_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

impl Challenge {
    pub fn handle(&self, name: impl Into<String>) -> EntityHandle {
        EntityHandle::new(
            self.id.clone(),
            name,
            Some(self.project_id.clone()),
            EntityKind::Challenge,
        )
    }
}

fn default_true() -> bool {
    true
}
