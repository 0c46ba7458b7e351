//! Template walker
//!
//! Walks a template in pre-order, resolving each node through a
//! [`ResourceGateway`] and writing the resolved id back into the node.
//! Parents are always resolved before their children, so every child is
//! created with its parent's real id.

use std::collections::HashMap;

use serde_json::Value;

use crate::entity::{
    Entity, EntityHandle, EntityView, Evaluation, Folder, Project, TableSchema, Team, Wiki,
};
use crate::gateway::ResourceGateway;
use crate::template::node::{self, TemplateNode};
use crate::template::{NodeId, ResourceTree, child_pointer, display_location, node_label};
use crate::transport::Transport;
use crate::{Error, Result};

/// A template location still to be visited.
struct WorkItem {
    /// JSON pointer into the template
    pointer: String,
    parent_id: Option<String>,
    parent_node: Option<NodeId>,
}

/// A node once resolved.
struct Resolved {
    name: String,
    handle: EntityHandle,
    has_children: bool,
}

/// Resolves templates against the platform.
pub struct TemplateWalker<T> {
    gateway: ResourceGateway<T>,
}

impl<T: Transport> TemplateWalker<T> {
    pub fn new(gateway: ResourceGateway<T>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &ResourceGateway<T> {
        &self.gateway
    }

    pub fn gateway_mut(&mut self) -> &mut ResourceGateway<T> {
        &mut self.gateway
    }

    pub fn into_gateway(self) -> ResourceGateway<T> {
        self.gateway
    }

    /// Resolve every node and annotate it with its id.
    pub fn annotate(&mut self, template: &mut Value) -> Result<()> {
        self.build(template).map(|_| ())
    }

    /// Resolve every node, annotate it with its id and return the tree of
    /// resolved resources.
    pub fn build(&mut self, template: &mut Value) -> Result<ResourceTree> {
        self.build_under(template, None)
    }

    /// Like [`TemplateWalker::build`], with top-level nodes placed under an
    /// existing container.
    ///
    /// Processing stops at the first failing node. Nodes resolved before it
    /// keep their `id`; nothing after it is attempted.
    pub fn build_under(
        &mut self,
        template: &mut Value,
        parent_id: Option<&str>,
    ) -> Result<ResourceTree> {
        let mut tree = ResourceTree::new();
        let mut teams: HashMap<String, String> = HashMap::new();
        let mut stack = vec![WorkItem {
            pointer: String::new(),
            parent_id: parent_id.map(str::to_string),
            parent_node: None,
        }];

        while let Some(item) = stack.pop() {
            let value = template.pointer_mut(&item.pointer).ok_or_else(|| {
                Error::invalid_node("template changed while it was walked")
                    .at_node(display_location(&item.pointer), "<missing>")
            })?;

            if let Some(len) = value.as_array().map(Vec::len) {
                for index in (0..len).rev() {
                    stack.push(WorkItem {
                        pointer: child_pointer(&item.pointer, index),
                        parent_id: item.parent_id.clone(),
                        parent_node: item.parent_node,
                    });
                }
                continue;
            }

            node::normalize(value);
            let label = node_label(value);
            tracing::debug!(location = display_location(&item.pointer), name = %label, "visiting node");

            let resolved = self
                .resolve_node(value, item.parent_id.as_deref(), &mut teams)
                .map_err(|e| e.at_node(display_location(&item.pointer), label))?;

            let id = resolved.handle.id.clone();
            let node_id = tree.insert(item.parent_node, resolved.name, resolved.handle);
            if resolved.has_children {
                stack.push(WorkItem {
                    pointer: child_pointer(&item.pointer, node::CHILDREN_KEY),
                    parent_id: Some(id),
                    parent_node: Some(node_id),
                });
            }
        }

        tracing::info!("Resolved {} resource(s)", tree.len());
        Ok(tree)
    }

    fn resolve_node(
        &mut self,
        value: &mut Value,
        parent_id: Option<&str>,
        teams: &mut HashMap<String, String>,
    ) -> Result<Resolved> {
        let node = TemplateNode::classify(value)?;
        let kind = node.kind();

        let parent = match (node.requires_parent(), parent_id) {
            (true, None) => {
                let kind = kind.map(|k| k.to_string()).unwrap_or_default();
                return Err(Error::invalid_node(format!(
                    "{} nodes need a parent container",
                    kind
                )));
            }
            (_, parent) => parent.unwrap_or_default().to_string(),
        };
        let existing = node.existing_id().map(str::to_string);

        let handle = match &node {
            TemplateNode::Challenge(challenge) => {
                let team_id = match (&challenge.participant_team_id, &challenge.participant_team) {
                    (Some(id), _) => id.clone(),
                    (None, Some(team)) => teams.get(team).cloned().ok_or_else(|| {
                        Error::invalid_node(format!(
                            "participant team '{}' is not defined earlier in the template",
                            team
                        ))
                    })?,
                    (None, None) => {
                        return Err(Error::invalid_node(
                            "Challenge nodes need participant_team_id or participant_team",
                        ));
                    }
                };
                let resolved = if existing.is_some() {
                    self.gateway.reconcile_existing_challenge(&parent, &team_id)?
                } else {
                    self.gateway.create_or_get_challenge(&parent, &team_id)?
                };
                resolved.handle(challenge.name.clone())
            }
            other => {
                let entity = desired_state(other, &parent)?;
                if existing.is_some() {
                    self.gateway.reconcile_existing(entity)?
                } else {
                    self.gateway.create_or_get(entity)?
                }
            }
        };

        if let Some(previous) = existing.as_deref() {
            if previous != handle.id {
                tracing::warn!(
                    previous,
                    resolved = %handle.id,
                    "recorded id differs from the resolved resource; overwriting"
                );
            }
        }

        if let Value::Object(map) = value {
            map.insert(node::ID_KEY.to_string(), Value::String(handle.id.clone()));
        }

        if let TemplateNode::Team(team) = &node {
            teams.insert(team.name.clone(), handle.id.clone());
            self.gateway.invite_members(&handle, &team.invitations)?;
        }

        self.gateway.set_acl(&handle, node.acl())?;

        let has_children = value
            .get(node::CHILDREN_KEY)
            .is_some_and(|children| !children.is_null());

        Ok(Resolved {
            name: node.name().unwrap_or_default().to_string(),
            handle,
            has_children,
        })
    }
}

/// Desired platform state of a classified node placed under `parent`.
fn desired_state(node: &TemplateNode, parent: &str) -> Result<Entity> {
    let entity = match node {
        TemplateNode::Project(n) => Entity::Project(Project {
            name: n.name.clone(),
        }),
        TemplateNode::Folder(n) => Entity::Folder(Folder {
            name: n.name.clone(),
            parent_id: parent.to_string(),
        }),
        TemplateNode::Team(n) => Entity::Team(Team {
            name: n.name.clone(),
            description: n.description.clone(),
            can_public_join: n.can_public_join,
        }),
        TemplateNode::View(n) => Entity::View(EntityView {
            name: n.name.clone(),
            parent_id: parent.to_string(),
            scopes: if n.scopes.is_empty() {
                vec![parent.to_string()]
            } else {
                n.scopes.clone()
            },
            include_entity_types: n.include_entity_types.clone(),
            add_default_view_columns: n.add_default_view_columns,
        }),
        TemplateNode::Schema(n) => Entity::Table(TableSchema {
            name: n.name.clone(),
            parent_id: parent.to_string(),
            columns: n.columns.clone(),
        }),
        TemplateNode::Wiki(n) => Entity::Wiki(Wiki {
            owner_id: parent.to_string(),
            title: n.title.clone().unwrap_or_else(|| n.name.clone()),
            markdown: n.markdown.clone(),
            parent_wiki_id: None,
        }),
        TemplateNode::Evaluation(n) => Entity::Evaluation(Evaluation {
            name: n.name.clone(),
            description: n.description.clone(),
            content_source: parent.to_string(),
            submission_instructions: n.submission_instructions.clone(),
        }),
        TemplateNode::Challenge(_) | TemplateNode::PlainList(_) => {
            return Err(Error::invalid_node("node does not describe a stored entity"));
        }
    };
    Ok(entity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::CreationPolicy;
    use crate::transport::{Call, LocalPlatform};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn walker(policy: CreationPolicy) -> TemplateWalker<LocalPlatform> {
        TemplateWalker::new(ResourceGateway::new(LocalPlatform::new(), policy))
    }

    #[test]
    fn shorthand_folders_are_normalized_and_annotated() {
        let mut template = json!({"name": "P", "type": "Project", "children": ["raw"]});

        walker(CreationPolicy::CreateOnly).annotate(&mut template).unwrap();

        assert_eq!(
            template["children"][0],
            json!({"name": "raw", "type": "Folder", "id": "syn2"})
        );
    }

    #[test]
    fn view_scopes_default_to_parent() {
        let mut template = json!({
            "name": "P",
            "type": "Project",
            "children": [{"name": "V", "type": "View"}]
        });
        let mut walker = walker(CreationPolicy::CreateOnly);
        walker.annotate(&mut template).unwrap();

        let platform = walker.gateway().transport();
        let Entity::View(view) = &platform.record("syn2").unwrap().entity else {
            panic!("expected a view");
        };
        assert_eq!(view.scopes, vec!["syn1".to_string()]);
    }

    #[test]
    fn wiki_title_defaults_to_name() {
        let mut template = json!({
            "name": "P",
            "type": "Project",
            "children": [{"name": "Home", "type": "Wiki", "markdown": "# Hi"}]
        });
        let mut walker = walker(CreationPolicy::CreateOnly);
        walker.annotate(&mut template).unwrap();

        let id = template["children"][0]["id"].as_str().unwrap();
        let Entity::Wiki(wiki) = &walker.gateway().transport().record(id).unwrap().entity else {
            panic!("expected a wiki");
        };
        assert_eq!(wiki.title, "Home");
        assert_eq!(wiki.owner_id, "syn1");
    }

    #[test]
    fn challenge_resolves_team_by_name() {
        let mut template = json!([
            {"name": "Participants", "type": "Team"},
            {
                "name": "P",
                "type": "Project",
                "children": [{"name": "C", "type": "Challenge", "participant_team": "Participants"}]
            }
        ]);
        let mut walker = walker(CreationPolicy::CreateOnly);
        walker.annotate(&mut template).unwrap();

        let challenges = walker.gateway().transport().challenges();
        assert_eq!(challenges.len(), 1);
        assert_eq!(challenges[0].participant_team_id, template[0]["id"].as_str().unwrap());
        assert_eq!(template[1]["children"][0]["id"], json!(challenges[0].id.clone()));
    }

    #[test]
    fn challenge_with_unknown_team_fails() {
        let mut template = json!({
            "name": "P",
            "type": "Project",
            "children": [{"name": "C", "type": "Challenge", "participant_team": "Nobody"}]
        });

        let err = walker(CreationPolicy::CreateOnly).annotate(&mut template).unwrap_err();

        assert_eq!(err.location(), Some("/children/0"));
        assert!(err.to_string().contains("Nobody"));
    }

    #[test]
    fn recorded_id_is_reconciled_not_created() {
        let mut platform = LocalPlatform::new();
        let existing = platform.seed(Entity::Project(Project { name: "P".into() }));
        let mut walker = TemplateWalker::new(ResourceGateway::new(platform, CreationPolicy::CreateOnly));

        let mut template = json!({"name": "P", "type": "Project", "id": existing.id.clone()});
        walker.annotate(&mut template).unwrap();

        assert_eq!(template["id"], json!(existing.id));
        let calls = walker.gateway().transport().calls();
        assert!(matches!(calls[0], Call::Store { create_or_update: false, .. }));
        assert!(calls.iter().any(|c| matches!(c, Call::FindEntityId { .. })));
    }

    #[test]
    fn top_level_folder_without_parent_fails_before_any_call() {
        let mut template = json!(["raw"]);
        let mut walker = walker(CreationPolicy::CreateOnly);

        let err = walker.annotate(&mut template).unwrap_err();

        assert_eq!(err.location(), Some("/0"));
        assert!(walker.gateway().transport().calls().is_empty());
    }

    #[test]
    fn build_under_places_top_level_nodes() {
        let mut platform = LocalPlatform::new();
        let project = platform.seed(Entity::Project(Project { name: "P".into() }));
        let mut walker = TemplateWalker::new(ResourceGateway::new(platform, CreationPolicy::CreateOnly));

        let mut template = json!(["a", "b"]);
        let tree = walker.build_under(&mut template, Some(&project.id)).unwrap();

        assert_eq!(tree.len(), 2);
        assert!(tree.iter().all(|n| n.handle.parent_id.as_deref() == Some(project.id.as_str())));
    }
}
