//! Template fixtures.
//!
//! Each fixture is YAML text as a user would write it.

use serde_json::Value;

/// A project with two folders, one written in shorthand.
pub const PROJECT_WITH_FOLDERS: &str = r#"
name: P
type: Project
children:
  - name: F1
    type: Folder
  - F2
"#;

/// A team with one invitation block of two members.
pub const TEAM_WITH_INVITATIONS: &str = r#"
name: Participants
type: Team
description: Challenge participants
can_public_join: false
invitations:
  - message: Welcome to the challenge
    members:
      - principal_id: 3324230
      - email: participant@example.org
"#;

/// A full challenge site: teams, a project with nested folders, ACLs,
/// a view, a schema, a wiki, a queue and the challenge itself.
pub const CHALLENGE_SITE: &str = r##"
- name: Participants
  type: Team
  can_public_join: true
- name: Organizers
  type: Team
  invitations:
    - message: Join the organizers
      members:
        - principal_id: 1111
- name: Example Challenge
  type: Project
  acl:
    - principal_id: 273948
      access_type: [READ]
  children:
    - name: Data
      acl:
        - principal_id: 3324230
          access_type: [READ, DOWNLOAD]
      children:
        - raw
        - processed
    - name: Submissions
      type: EntityView
      include_entity_types: [file, folder]
    - name: Leaderboard
      type: Schema
      columns:
        - name: score
          column_type: DOUBLE
        - name: team
          column_type: STRING
          maximum_size: 100
    - name: Home
      type: Wiki
      markdown: "# Example Challenge"
    - name: Final Round
      type: Queue
      description: Final round submissions
    - name: Example Challenge
      type: Challenge
      participant_team: Participants
"##;

/// Parse a YAML fixture into the template document model.
pub fn parse(yaml: &str) -> Value {
    serde_yaml::from_str(yaml).unwrap_or_else(|e| panic!("fixture is not valid YAML: {e}"))
}
