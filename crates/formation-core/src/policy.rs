//! Creation policy
//!
//! Decides what the gateway does when the platform reports that a resource
//! already occupies the requested slot.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// How the gateway reacts to a name conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CreationPolicy {
    /// Fail on conflict so a template is never silently pointed at an
    /// unintended existing resource.
    #[default]
    CreateOnly,

    /// Reuse the existing resource after verifying its type.
    GetOrCreate,

    /// Ask the platform to update the existing resource in place; kinds the
    /// platform cannot update fall back to lookup.
    CreateOrUpdate,
}

impl CreationPolicy {
    /// Whether a conflict may be resolved by looking up the existing resource.
    pub fn allows_lookup(&self) -> bool {
        !matches!(self, CreationPolicy::CreateOnly)
    }

    /// Value passed as `create_or_update` on the store call.
    pub fn updates_in_place(&self) -> bool {
        matches!(self, CreationPolicy::CreateOrUpdate)
    }
}

impl FromStr for CreationPolicy {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "create-only" | "only-create" | "create" => Ok(CreationPolicy::CreateOnly),
            "get-or-create" | "only-get" | "get" => Ok(CreationPolicy::GetOrCreate),
            "create-or-update" | "upsert" | "update" => Ok(CreationPolicy::CreateOrUpdate),
            _ => Err(Error::InvalidPolicy {
                policy: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for CreationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreationPolicy::CreateOnly => write!(f, "create-only"),
            CreationPolicy::GetOrCreate => write!(f, "get-or-create"),
            CreationPolicy::CreateOrUpdate => write!(f, "create-or-update"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("create-only", CreationPolicy::CreateOnly)]
    #[case("only_create", CreationPolicy::CreateOnly)]
    #[case("GET-OR-CREATE", CreationPolicy::GetOrCreate)]
    #[case("only_get", CreationPolicy::GetOrCreate)]
    #[case("create_or_update", CreationPolicy::CreateOrUpdate)]
    #[case("upsert", CreationPolicy::CreateOrUpdate)]
    fn parses_policy_aliases(#[case] input: &str, #[case] expected: CreationPolicy) {
        assert_eq!(input.parse::<CreationPolicy>().unwrap(), expected);
    }

    #[test]
    fn rejects_unknown_policy() {
        assert!("sometimes".parse::<CreationPolicy>().is_err());
        assert!("".parse::<CreationPolicy>().is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for policy in [
            CreationPolicy::CreateOnly,
            CreationPolicy::GetOrCreate,
            CreationPolicy::CreateOrUpdate,
        ] {
            assert_eq!(policy.to_string().parse::<CreationPolicy>().unwrap(), policy);
        }
    }

    #[test]
    fn default_is_create_only() {
        assert_eq!(CreationPolicy::default(), CreationPolicy::CreateOnly);
        assert!(!CreationPolicy::default().allows_lookup());
    }
}
