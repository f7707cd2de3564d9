//! Tool and skill validation.
//!
//! Pure in-memory checks. Every entry is inspected and every failure
//! reported; nothing short-circuits.

use std::collections::HashSet;

use crate::domain::models::{
    Config, Diagnostic, LabelSelector, Skill, SkillError, Tool, ToolError, ToolType,
};

/// Validates tool and skill entries.
#[derive(Debug, Clone)]
pub struct ToolSkillValidator {
    built_in_tools: Vec<String>,
}

impl ToolSkillValidator {
    /// Validator accepting `built_in_tools` as built-in names.
    pub fn new(built_in_tools: Vec<String>) -> Self {
        Self { built_in_tools }
    }

    /// Validator using the configured built-in tools.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.tools.built_in.clone())
    }

    /// Check every tool entry.
    pub fn validate_tools(&self, tools: &[Tool]) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for (index, tool) in tools.iter().enumerate() {
            let path = format!("spec.tools[{index}]");
            match tool.kind() {
                None => diagnostics.push(Diagnostic::tool(
                    path,
                    ToolError::UnknownType {
                        index,
                        tool_type: tool.tool_type.clone(),
                    },
                )),
                Some(ToolType::Custom) => {
                    if tool.declared_name().is_none() {
                        diagnostics.push(missing_name(path, index, ToolType::Custom));
                    }
                }
                Some(ToolType::BuiltIn) => match tool.declared_name() {
                    None => diagnostics.push(missing_name(path, index, ToolType::BuiltIn)),
                    Some(name) if !self.built_in_tools.iter().any(|b| b == name) => {
                        diagnostics.push(Diagnostic::tool(
                            path,
                            ToolError::UnsupportedBuiltIn {
                                index,
                                name: name.to_string(),
                            },
                        ));
                    }
                    Some(_) => {}
                },
                Some(ToolType::Mcp) => {
                    if tool.label_selector.as_ref().is_none_or(LabelSelector::is_empty) {
                        diagnostics.push(Diagnostic::tool(
                            format!("{path}.labelSelector"),
                            ToolError::EmptySelector { index },
                        ));
                    }
                }
            }
        }

        diagnostics
    }

    /// Returns the skills to store (tags deduplicated, rejected entries
    /// dropped) and the diagnostics.
    pub fn validate_skills(&self, skills: &[Skill]) -> (Vec<Skill>, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let mut accepted = Vec::with_capacity(skills.len());
        let mut ids = HashSet::new();

        for (index, skill) in skills.iter().enumerate() {
            let mut valid = true;
            for (field, value) in [("id", &skill.id), ("name", &skill.name)] {
                if value.trim().is_empty() {
                    diagnostics.push(Diagnostic::skill(
                        format!("spec.skills[{index}].{field}"),
                        SkillError::Empty {
                            index,
                            field: field.to_string(),
                        },
                    ));
                    valid = false;
                }
            }

            if !skill.id.trim().is_empty() && !ids.insert(skill.id.as_str()) {
                diagnostics.push(Diagnostic::skill(
                    format!("spec.skills[{index}].id"),
                    SkillError::DuplicateId {
                        id: skill.id.clone(),
                    },
                ));
                valid = false;
            }

            if valid {
                accepted.push(skill.normalized());
            }
        }

        (accepted, diagnostics)
    }
}

impl Default for ToolSkillValidator {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

fn missing_name(path: String, index: usize, tool_type: ToolType) -> Diagnostic {
    Diagnostic::tool(
        path,
        ToolError::MissingName {
            index,
            tool_type: tool_type.as_str().to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::LabelSelector;
    use std::collections::BTreeMap;

    fn codes(diagnostics: &[Diagnostic]) -> Vec<&str> {
        diagnostics.iter().map(|d| d.code).collect()
    }

    #[test]
    fn test_custom_tool_requires_name() {
        let validator = ToolSkillValidator::default();
        let diagnostics = validator.validate_tools(&[Tool::new("custom", None)]);
        assert_eq!(codes(&diagnostics), vec!["ToolError.MissingName"]);
        assert_eq!(diagnostics[0].field_path, "spec.tools[0]");
        assert!(diagnostics[0].is_fatal());
    }

    #[test]
    fn test_built_in_allow_list() {
        let validator = ToolSkillValidator::default();
        let diagnostics = validator.validate_tools(&[
            Tool::new("built-in", Some("noop")),
            Tool::new("built-in", Some("rm-rf")),
            Tool::new("built-in", None),
        ]);
        assert_eq!(
            codes(&diagnostics),
            vec!["ToolError.UnsupportedBuiltIn", "ToolError.MissingName"]
        );
    }

    #[test]
    fn test_mcp_selector_must_not_be_empty() {
        let validator = ToolSkillValidator::default();
        let mut empty = Tool::new("mcp", None);
        empty.label_selector = Some(LabelSelector::default());
        let mut valid = Tool::new("mcp", None);
        valid.label_selector = Some(LabelSelector {
            match_labels: Some(BTreeMap::from([("team".to_string(), "dev".to_string())])),
            match_expressions: None,
        });

        let diagnostics = validator.validate_tools(&[Tool::new("mcp", None), empty, valid]);
        assert_eq!(
            codes(&diagnostics),
            vec!["ToolError.EmptySelector", "ToolError.EmptySelector"]
        );
    }

    #[test]
    fn test_all_tool_failures_collected() {
        let validator = ToolSkillValidator::default();
        let diagnostics = validator.validate_tools(&[
            Tool::new("plugin", Some("x")),
            Tool::new("custom", None),
            Tool::new("custom", Some("ok")),
        ]);
        assert_eq!(
            codes(&diagnostics),
            vec!["ToolError.UnknownType", "ToolError.MissingName"]
        );
    }

    #[test]
    fn test_duplicate_skill_id() {
        let validator = ToolSkillValidator::default();
        let (skills, diagnostics) = validator.validate_skills(&[
            Skill::new("s1", "Search"),
            Skill::new("s1", "Search2"),
        ]);
        assert_eq!(codes(&diagnostics), vec!["SkillError.DuplicateId"]);
        assert_eq!(diagnostics[0].field_path, "spec.skills[1].id");
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].name, "Search");
    }

    #[test]
    fn test_empty_skill_fields_and_tag_dedupe() {
        let validator = ToolSkillValidator::default();
        let (skills, diagnostics) = validator.validate_skills(&[
            Skill::new("", ""),
            Skill::new("s2", "Docs").with_tags(["a", "a", "b"]),
        ]);
        assert_eq!(codes(&diagnostics), vec!["SkillError.Empty", "SkillError.Empty"]);
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].tags.as_deref().unwrap(), ["a", "b"]);
    }
}
