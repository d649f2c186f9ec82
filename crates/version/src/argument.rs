// Borealis Launcher
// Copyright 2024-2026 Borealis Contributors. All rights reserved.
// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::checks::{RuleHost, check_allowed};

/// One entry of `arguments.game` / `arguments.jvm`.
///
/// Plain strings pass through; object entries only expand when their rules
/// allow the current host and feature set. Placeholders stay intact here;
/// substitution is a separate pass at assembly time.
#[derive(Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ArgToken {
    Literal(String),
    Conditional {
        rules: Vec<Value>,
        value: ArgValue,
    },
}

#[derive(Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ArgValue {
    Single(String),
    Multiple(Vec<String>),
}

#[derive(Clone, Deserialize, Serialize)]
pub struct Arguments {
    pub game: Option<Vec<ArgToken>>,
    pub jvm: Option<Vec<ArgToken>>,
}

#[derive(Clone, Serialize, Default)]
pub struct ResolvedArguments {
    pub game: Vec<String>,
    pub jvm: Vec<String>,
}

impl ArgToken {
    fn resolve(&self, host: &RuleHost, enabled_features: &[String]) -> Vec<String> {
        match self {
            Self::Literal(literal) => vec![literal.clone()],
            Self::Conditional { rules, value } => {
                if !check_allowed(rules, host, enabled_features) {
                    return vec![];
                }
                match value {
                    ArgValue::Single(single) => vec![single.clone()],
                    ArgValue::Multiple(multiple) => multiple.clone(),
                }
            }
        }
    }
}

impl Arguments {
    pub(crate) fn to_resolved(
        &self,
        host: &RuleHost,
        enabled_features: &[String],
    ) -> ResolvedArguments {
        let resolve_list = |tokens: &Option<Vec<ArgToken>>| {
            tokens
                .iter()
                .flatten()
                .flat_map(|token| token.resolve(host, enabled_features))
                .collect()
        };
        ResolvedArguments {
            game: resolve_list(&self.game),
            jvm: resolve_list(&self.jvm),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::OsFamily;
    use serde_json::json;

    fn host() -> RuleHost {
        RuleHost {
            os_family: OsFamily::Linux,
            os_version: "6.8.0".to_string(),
            arch: "x86_64".to_string(),
        }
    }

    #[test]
    fn literal_and_conditional_tokens_parse() {
        let raw = json!({
            "game": [
                "--username",
                "${auth_player_name}",
                {
                    "rules": [{"action": "allow", "features": {"is_demo_user": true}}],
                    "value": "--demo"
                },
                {
                    "rules": [{"action": "allow", "features": {"has_custom_resolution": true}}],
                    "value": ["--width", "${resolution_width}", "--height", "${resolution_height}"]
                }
            ],
            "jvm": [
                {
                    "rules": [{"action": "allow", "os": {"name": "osx"}}],
                    "value": ["-XstartOnFirstThread"]
                },
                "-cp",
                "${classpath}"
            ]
        });
        let arguments: Arguments = serde_json::from_value(raw).unwrap();

        let resolved = arguments.to_resolved(&host(), &[]);
        assert_eq!(resolved.game, vec!["--username", "${auth_player_name}"]);
        assert_eq!(resolved.jvm, vec!["-cp", "${classpath}"]);

        let resolved = arguments.to_resolved(&host(), &["has_custom_resolution".to_string()]);
        assert_eq!(
            resolved.game,
            vec![
                "--username",
                "${auth_player_name}",
                "--width",
                "${resolution_width}",
                "--height",
                "${resolution_height}"
            ]
        );
    }

    #[test]
    fn placeholders_survive_resolution() {
        let arguments: Arguments =
            serde_json::from_value(json!({"game": ["${version_name}"], "jvm": null})).unwrap();
        let resolved = arguments.to_resolved(&host(), &[]);
        assert_eq!(resolved.game, vec!["${version_name}"]);
    }
}
