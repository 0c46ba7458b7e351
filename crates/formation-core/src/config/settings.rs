//! A single settings file

use std::fmt;
use std::str::FromStr;

use formation_fs::Format;
use serde::{Deserialize, Serialize};

use crate::policy::CreationPolicy;
use crate::{Error, Result};

/// Format the annotated template is written in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl OutputFormat {
    pub fn document_format(&self) -> Format {
        match self {
            OutputFormat::Yaml => Format::Yaml,
            OutputFormat::Json => Format::Json,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "json" => Ok(OutputFormat::Json),
            _ => Err(Error::InvalidToken {
                what: "output format",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Yaml => write!(f, "yaml"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// `[gateway]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<CreationPolicy>,
}

/// `[output]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
    /// Print the tree of resolved resources after applying
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree: Option<bool>,
}

/// Settings from one source. Unset keys leave earlier sources in effect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub gateway: GatewaySection,
    #[serde(default)]
    pub output: OutputSection,
}

impl Settings {
    /// Parse settings from TOML content
    ///
    /// ```
    /// use formation_core::{CreationPolicy, Settings};
    ///
    /// let settings = Settings::parse("[gateway]\npolicy = \"get-or-create\"\n").unwrap();
    /// assert_eq!(settings.gateway.policy, Some(CreationPolicy::GetOrCreate));
    /// ```
    pub fn parse(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        Ok(settings)
    }

    /// Overlay `other` onto these settings; keys set in `other` win.
    pub fn merge(&mut self, other: &Settings) {
        if other.gateway.policy.is_some() {
            self.gateway.policy = other.gateway.policy;
        }
        if other.output.format.is_some() {
            self.output.format = other.output.format;
        }
        if other.output.tree.is_some() {
            self.output.tree = other.output.tree;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parse_empty_is_default() {
        assert_eq!(Settings::parse("").unwrap(), Settings::default());
    }

    #[test]
    fn parse_all_keys() {
        let settings = Settings::parse(
            r#"
[gateway]
policy = "create-or-update"

[output]
format = "json"
tree = true
"#,
        )
        .unwrap();

        assert_eq!(settings.gateway.policy, Some(CreationPolicy::CreateOrUpdate));
        assert_eq!(settings.output.format, Some(OutputFormat::Json));
        assert_eq!(settings.output.tree, Some(true));
    }

    #[test]
    fn parse_rejects_unknown_keys() {
        assert!(Settings::parse("[gateway]\nretries = 3\n").is_err());
    }

    #[test]
    fn parse_rejects_unknown_policy() {
        assert!(Settings::parse("[gateway]\npolicy = \"sometimes\"\n").is_err());
    }

    #[test]
    fn merge_keeps_unset_keys() {
        let mut base = Settings::parse("[output]\nformat = \"json\"\ntree = true\n").unwrap();
        let overlay = Settings::parse("[output]\ntree = false\n").unwrap();

        base.merge(&overlay);

        assert_eq!(base.output.format, Some(OutputFormat::Json));
        assert_eq!(base.output.tree, Some(false));
    }

    #[rstest]
    #[case("yaml", OutputFormat::Yaml)]
    #[case("YML", OutputFormat::Yaml)]
    #[case("json", OutputFormat::Json)]
    fn output_format_from_str(#[case] input: &str, #[case] expected: OutputFormat) {
        assert_eq!(input.parse::<OutputFormat>().unwrap(), expected);
    }

    #[test]
    fn output_format_rejects_toml() {
        let err = "toml".parse::<OutputFormat>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid output format: toml");
    }
}
