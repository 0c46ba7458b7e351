//! Core reconciliation layer for Formation
//!
//! This crate turns a declarative template into resources on a
//! data-sharing platform, implementing:
//!
//! - **Resource gateway**: create-or-get per resource kind, with an explicit
//!   [`CreationPolicy`] deciding what happens on a name conflict
//! - **Template walker**: classifies every template node, threads parent ids
//!   down the tree, applies ACLs and annotates nodes with resolved ids
//! - **Transport seam**: the [`Transport`] trait the gateway talks through,
//!   with [`LocalPlatform`] as an in-process, persistable implementation
//! - **Settings**: hierarchical resolution of `formation.toml` files
//!
//! # Architecture
//!
//! ```text
//!                formation-cli
//!                      |
//!               formation-core
//!      walker -> gateway -> Transport
//!                      |
//!               formation-fs
//! ```
//!
//! # Example
//!
//! ```
//! use formation_core::{CreationPolicy, LocalPlatform, ResourceGateway, TemplateWalker};
//! use serde_json::json;
//!
//! let mut template = json!({
//!     "type": "Project",
//!     "name": "P",
//!     "children": [{"type": "Folder", "name": "F1"}, "F2"]
//! });
//!
//! let gateway = ResourceGateway::new(LocalPlatform::new(), CreationPolicy::CreateOnly);
//! let mut walker = TemplateWalker::new(gateway);
//! let tree = walker.build(&mut template).unwrap();
//!
//! assert_eq!(template["id"], "syn1");
//! assert_eq!(template["children"][1]["id"], "syn3");
//! assert_eq!(tree.len(), 3);
//! ```

pub mod acl;
pub mod config;
pub mod entity;
pub mod error;
pub mod gateway;
pub mod policy;
pub mod template;
pub mod transport;
pub mod walker;

pub use acl::{AccessType, AclEntry, Invitation, Invitee};
pub use config::{OutputFormat, ResolvedSettings, Settings, SettingsResolver};
pub use entity::{
    Challenge, Column, Entity, EntityHandle, EntityKind, EntityView, EntityViewType, Evaluation,
    FileEntity, Folder, Project, TableSchema, Team, Wiki,
};
pub use error::{Error, Result};
pub use gateway::ResourceGateway;
pub use policy::CreationPolicy;
pub use template::{NodeId, ResourceNode, ResourceTree, TemplateNode, TemplateSummary, validate};
pub use transport::{Call, LocalPlatform, Transport, TransportError, TransportResult};
pub use walker::TemplateWalker;
