//! Template node classification
//!
//! Every value of a template is classified into a closed [`TemplateNode`]
//! before anything is sent to the platform.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::acl::{AclEntry, Invitation, optional_string_or_number};
use crate::entity::{Column, EntityKind, EntityViewType};
use crate::{Error, Result};

/// Keys the walker owns on every mapping node.
pub const TYPE_KEY: &str = "type";
pub const NAME_KEY: &str = "name";
pub const ID_KEY: &str = "id";
pub const CHILDREN_KEY: &str = "children";
pub const ACL_KEY: &str = "acl";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProjectNode {
    pub name: String,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub acl: Vec<AclEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FolderNode {
    pub name: String,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub acl: Vec<AclEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TeamNode {
    pub name: String,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub can_public_join: bool,
    #[serde(default)]
    pub invitations: Vec<Invitation>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ViewNode {
    pub name: String,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub acl: Vec<AclEntry>,
    /// Containers listed by the view; the parent when empty
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default = "default_view_types", deserialize_with = "view_type_tags")]
    pub include_entity_types: Vec<EntityViewType>,
    #[serde(default = "default_true")]
    pub add_default_view_columns: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SchemaNode {
    pub name: String,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub acl: Vec<AclEntry>,
    #[serde(default)]
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WikiNode {
    pub name: String,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub id: Option<String>,
    /// Page title; the node name when absent
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub markdown: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EvaluationNode {
    pub name: String,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub submission_instructions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChallengeNode {
    pub name: String,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub participant_team_id: Option<String>,
    /// Name of a Team node resolved earlier in the same template
    #[serde(default)]
    pub participant_team: Option<String>,
}

/// A classified template value.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateNode {
    Project(ProjectNode),
    Folder(FolderNode),
    Team(TeamNode),
    View(ViewNode),
    Schema(SchemaNode),
    Wiki(WikiNode),
    Evaluation(EvaluationNode),
    Challenge(ChallengeNode),
    /// A sequence of sibling nodes sharing the current parent
    PlainList(usize),
}

impl TemplateNode {
    /// Classify a template value.
    ///
    /// - a sequence is a [`TemplateNode::PlainList`]
    /// - a string is a plain folder name
    /// - a mapping is dispatched on its `type` key; no `type` means Folder
    ///
    /// Anything else, a mapping without a `name`, an unknown `type`, and
    /// `children` or `acl` on a kind that cannot carry them are errors.
    pub fn classify(value: &Value) -> Result<Self> {
        match value {
            Value::Array(items) => Ok(TemplateNode::PlainList(items.len())),
            Value::String(name) => Ok(TemplateNode::Folder(FolderNode {
                name: name.clone(),
                id: None,
                acl: Vec::new(),
            })),
            Value::Object(map) => Self::classify_mapping(map),
            other => Err(Error::invalid_node(format!(
                "expected a mapping, a sequence or a folder name, found {}",
                describe(other)
            ))),
        }
    }

    fn classify_mapping(map: &Map<String, Value>) -> Result<Self> {
        match map.get(NAME_KEY) {
            Some(Value::String(_)) => {}
            Some(other) => {
                return Err(Error::invalid_node(format!(
                    "'name' must be a string, found {}",
                    describe(other)
                )));
            }
            None => return Err(Error::invalid_node("mapping node has no 'name'")),
        }

        let type_name = match map.get(TYPE_KEY) {
            None | Some(Value::Null) => None,
            Some(Value::String(t)) => Some(t.as_str()),
            Some(other) => {
                return Err(Error::invalid_node(format!(
                    "'type' must be a string, found {}",
                    describe(other)
                )));
            }
        };

        let node = match type_name.map(str::to_lowercase).as_deref() {
            Some("project") => TemplateNode::Project(fields(map)?),
            None | Some("folder") => TemplateNode::Folder(fields(map)?),
            Some("team") => TemplateNode::Team(fields(map)?),
            Some("view") | Some("entityview") | Some("entityviewschema") => {
                TemplateNode::View(fields(map)?)
            }
            Some("schema") | Some("table") => TemplateNode::Schema(fields(map)?),
            Some("wiki") => TemplateNode::Wiki(fields(map)?),
            Some("evaluation") | Some("queue") => TemplateNode::Evaluation(fields(map)?),
            Some("challenge") => TemplateNode::Challenge(fields(map)?),
            Some(_) => {
                return Err(Error::UnknownType {
                    type_name: type_name.unwrap_or_default().to_string(),
                });
            }
        };

        node.check_structure(map)?;
        Ok(node)
    }

    fn check_structure(&self, map: &Map<String, Value>) -> Result<()> {
        let Some(kind) = self.kind() else {
            return Ok(());
        };
        let has = |key: &str| !matches!(map.get(key), None | Some(Value::Null));

        if has(CHILDREN_KEY) && !kind.is_container() {
            return Err(Error::invalid_node(format!(
                "{} nodes cannot have children",
                kind
            )));
        }
        if has(ACL_KEY) && !kind.is_entity() {
            return Err(Error::invalid_node(format!("{} nodes cannot carry an acl", kind)));
        }
        Ok(())
    }

    /// Resource kind the node resolves to; `None` for a plain list.
    pub fn kind(&self) -> Option<EntityKind> {
        match self {
            TemplateNode::Project(_) => Some(EntityKind::Project),
            TemplateNode::Folder(_) => Some(EntityKind::Folder),
            TemplateNode::Team(_) => Some(EntityKind::Team),
            TemplateNode::View(_) => Some(EntityKind::EntityView),
            TemplateNode::Schema(_) => Some(EntityKind::Table),
            TemplateNode::Wiki(_) => Some(EntityKind::Wiki),
            TemplateNode::Evaluation(_) => Some(EntityKind::Evaluation),
            TemplateNode::Challenge(_) => Some(EntityKind::Challenge),
            TemplateNode::PlainList(_) => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            TemplateNode::Project(n) => Some(&n.name),
            TemplateNode::Folder(n) => Some(&n.name),
            TemplateNode::Team(n) => Some(&n.name),
            TemplateNode::View(n) => Some(&n.name),
            TemplateNode::Schema(n) => Some(&n.name),
            TemplateNode::Wiki(n) => Some(&n.name),
            TemplateNode::Evaluation(n) => Some(&n.name),
            TemplateNode::Challenge(n) => Some(&n.name),
            TemplateNode::PlainList(_) => None,
        }
    }

    /// Id recorded on the node by a previous run.
    pub fn existing_id(&self) -> Option<&str> {
        let id = match self {
            TemplateNode::Project(n) => &n.id,
            TemplateNode::Folder(n) => &n.id,
            TemplateNode::Team(n) => &n.id,
            TemplateNode::View(n) => &n.id,
            TemplateNode::Schema(n) => &n.id,
            TemplateNode::Wiki(n) => &n.id,
            TemplateNode::Evaluation(n) => &n.id,
            TemplateNode::Challenge(n) => &n.id,
            TemplateNode::PlainList(_) => return None,
        };
        id.as_deref()
    }

    /// ACL entries to apply once the node is resolved.
    pub fn acl(&self) -> &[AclEntry] {
        match self {
            TemplateNode::Project(n) => &n.acl,
            TemplateNode::Folder(n) => &n.acl,
            TemplateNode::View(n) => &n.acl,
            TemplateNode::Schema(n) => &n.acl,
            _ => &[],
        }
    }

    /// Whether the node can only be resolved under a parent id.
    pub fn requires_parent(&self) -> bool {
        !matches!(
            self,
            TemplateNode::Project(_) | TemplateNode::Team(_) | TemplateNode::PlainList(_)
        )
    }
}

/// Rewrite shorthand nodes in place into explicit Folder mappings.
///
/// A string becomes `{name, type: Folder}`; a mapping without `type` gets
/// `type: Folder`. Other values are left untouched.
pub fn normalize(value: &mut Value) {
    match value {
        Value::String(name) => {
            let mut map = Map::new();
            map.insert(NAME_KEY.to_string(), Value::String(std::mem::take(name)));
            map.insert(TYPE_KEY.to_string(), Value::String("Folder".to_string()));
            *value = Value::Object(map);
        }
        Value::Object(map) => {
            if matches!(map.get(TYPE_KEY), None | Some(Value::Null)) {
                map.insert(TYPE_KEY.to_string(), Value::String("Folder".to_string()));
            }
        }
        _ => {}
    }
}

/// Deserialize the kind-specific fields of a mapping, leaving `children`
/// out so large subtrees are not copied.
///
/// A key set to null (`acl:` in YAML) counts as absent.
fn fields<T: DeserializeOwned>(map: &Map<String, Value>) -> Result<T> {
    let shallow: Map<String, Value> = map
        .iter()
        .filter(|(key, value)| key.as_str() != CHILDREN_KEY && !value.is_null())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    serde_json::from_value(Value::Object(shallow)).map_err(|e| Error::invalid_node(e.to_string()))
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

fn default_view_types() -> Vec<EntityViewType> {
    vec![EntityViewType::File]
}

fn default_true() -> bool {
    true
}

fn view_type_tags<'de, D>(deserializer: D) -> std::result::Result<Vec<EntityViewType>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let tags = Vec::<String>::deserialize(deserializer)?;
    tags.iter()
        .map(|tag| tag.parse::<EntityViewType>())
        .collect::<Result<Vec<_>>>()
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::acl::{AccessType, Invitee};
    use serde_json::json;

    #[test]
    fn string_is_a_plain_folder() {
        let node = TemplateNode::classify(&json!("raw")).unwrap();
        assert_eq!(node.kind(), Some(EntityKind::Folder));
        assert_eq!(node.name(), Some("raw"));
    }

    #[test]
    fn mapping_without_type_is_a_folder() {
        let node = TemplateNode::classify(&json!({"name": "data", "children": ["a"]})).unwrap();
        assert_eq!(node.kind(), Some(EntityKind::Folder));
    }

    #[test]
    fn type_is_case_insensitive() {
        let node = TemplateNode::classify(&json!({"name": "P", "type": "PROJECT"})).unwrap();
        assert_eq!(node.kind(), Some(EntityKind::Project));
    }

    #[test]
    fn sequence_is_a_plain_list() {
        let node = TemplateNode::classify(&json!(["a", {"name": "b"}])).unwrap();
        assert_eq!(node, TemplateNode::PlainList(2));
        assert_eq!(node.kind(), None);
    }

    #[test]
    fn unknown_type_is_a_dispatch_error() {
        let err = TemplateNode::classify(&json!({"name": "x", "type": "Dataset"})).unwrap_err();
        assert!(matches!(err, Error::UnknownType { ref type_name } if type_name == "Dataset"));
    }

    #[test]
    fn scalars_are_rejected() {
        for value in [json!(3), json!(true), json!(null)] {
            let err = TemplateNode::classify(&value).unwrap_err();
            assert!(matches!(err, Error::InvalidNode { .. }), "{value}");
        }
    }

    #[test]
    fn mapping_without_name_is_rejected() {
        let err = TemplateNode::classify(&json!({"type": "Project"})).unwrap_err();
        assert!(err.to_string().contains("no 'name'"));
    }

    #[test]
    fn team_cannot_have_children_or_acl() {
        let children = json!({"name": "T", "type": "Team", "children": ["x"]});
        assert!(TemplateNode::classify(&children).is_err());

        let acl = json!({"name": "T", "type": "Team", "acl": [{"principal_id": 1, "access_type": ["READ"]}]});
        assert!(TemplateNode::classify(&acl).is_err());
    }

    #[test]
    fn null_keys_count_as_absent() {
        let node = TemplateNode::classify(&json!({
            "name": "V",
            "type": "View",
            "acl": null,
            "scopes": null,
            "include_entity_types": null
        }))
        .unwrap();
        let TemplateNode::View(view) = node else {
            panic!("expected a view, got {node:?}");
        };
        assert!(view.acl.is_empty());
        assert!(view.scopes.is_empty());
        assert_eq!(view.include_entity_types, vec![EntityViewType::File]);
    }

    #[test]
    fn view_cannot_have_children_but_can_carry_acl() {
        let with_acl = json!({
            "name": "V",
            "type": "EntityView",
            "acl": [{"principal_id": 1, "access_type": ["READ"]}]
        });
        let node = TemplateNode::classify(&with_acl).unwrap();
        assert_eq!(node.acl().len(), 1);

        let with_children = json!({"name": "V", "type": "View", "children": []});
        assert!(TemplateNode::classify(&with_children).is_err());
    }

    #[test]
    fn view_tags_are_translated() {
        let node = TemplateNode::classify(&json!({
            "name": "V",
            "type": "View",
            "include_entity_types": ["file", "Folder", "docker"]
        }))
        .unwrap();

        let TemplateNode::View(view) = node else {
            panic!("expected a view");
        };
        assert_eq!(
            view.include_entity_types,
            vec![EntityViewType::File, EntityViewType::Folder, EntityViewType::Docker]
        );
        assert!(view.add_default_view_columns);
    }

    #[test]
    fn view_with_unknown_tag_is_rejected() {
        let err = TemplateNode::classify(&json!({
            "name": "V",
            "type": "View",
            "include_entity_types": ["spreadsheet"]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("spreadsheet"));
    }

    #[test]
    fn team_fields_and_invitations_are_parsed() {
        let node = TemplateNode::classify(&json!({
            "name": "T",
            "type": "Team",
            "description": "Participants",
            "can_public_join": true,
            "invitations": [{
                "message": "Welcome",
                "members": [{"principal_id": 3324230}, {"email": "x@y.org"}]
            }]
        }))
        .unwrap();

        let TemplateNode::Team(team) = node else {
            panic!("expected a team");
        };
        assert!(team.can_public_join);
        assert_eq!(
            team.invitations[0].members,
            vec![Invitee::Principal("3324230".into()), Invitee::Email("x@y.org".into())]
        );
    }

    #[test]
    fn existing_id_and_acl_are_read() {
        let node = TemplateNode::classify(&json!({
            "name": "F",
            "type": "Folder",
            "id": "syn9",
            "acl": [{"principal_id": "273949", "access_type": ["READ"]}]
        }))
        .unwrap();

        assert_eq!(node.existing_id(), Some("syn9"));
        assert_eq!(node.acl()[0].access_type, vec![AccessType::Read]);
    }

    #[test]
    fn normalize_rewrites_shorthand_in_place() {
        let mut value = json!("raw");
        normalize(&mut value);
        assert_eq!(value, json!({"name": "raw", "type": "Folder"}));

        let mut value = json!({"name": "data"});
        normalize(&mut value);
        assert_eq!(value, json!({"name": "data", "type": "Folder"}));

        let mut value = json!({"name": "P", "type": "Project"});
        normalize(&mut value);
        assert_eq!(value, json!({"name": "P", "type": "Project"}));
    }
}
