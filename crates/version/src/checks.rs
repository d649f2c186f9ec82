// Borealis Launcher
// Copyright 2024-2026 Borealis Contributors. All rights reserved.
// SPDX-License-Identifier: GPL-3.0-only

//! The `rules[]` filter algebra used by version descriptors.

use platform::{OsFamily, PLATFORM_INFO, PlatformInfo};
use regex::Regex;
use serde_json::Value;

/// Host facts a rule set is evaluated against.
#[derive(Debug, Clone)]
pub struct RuleHost {
    pub os_family: OsFamily,
    pub os_version: String,
    pub arch: String,
}

impl RuleHost {
    pub fn current() -> Self {
        Self::from_platform(&PLATFORM_INFO)
    }

    pub fn from_platform(platform: &PlatformInfo) -> Self {
        Self {
            os_family: platform.os_family,
            os_version: platform.os_version.to_string(),
            arch: platform.arch.clone(),
        }
    }

    fn arch_matches(&self, arch: &str) -> bool {
        if arch.eq_ignore_ascii_case(&self.arch) {
            return true;
        }
        matches!(
            (arch, self.arch.as_str()),
            ("x86", "i386" | "i686") | ("amd64", "x86_64") | ("aarch64", "arm64")
        )
    }
}

/// Evaluate a rule set against a host and feature set.
///
/// An empty rule list allows; a non-empty list starts disallowed and the last
/// matching rule wins.
pub fn check_allowed(rules: &[Value], host: &RuleHost, enabled_features: &[String]) -> bool {
    if rules.is_empty() {
        return true;
    }
    let mut allow = false;
    for rule in rules {
        let action = match rule["action"].as_str() {
            Some(action) => action == "allow",
            None => continue,
        };
        if check_os(rule, host) && check_features(rule, enabled_features) {
            allow = action;
        }
    }
    allow
}

fn check_os(rule: &Value, host: &RuleHost) -> bool {
    let Some(os) = rule["os"].as_object() else {
        return true;
    };
    let name_check_passed = match os.get("name").and_then(Value::as_str) {
        Some(name) => host.os_family.matches_rule_name(name),
        None => true,
    };
    let version_check_passed = match os.get("version").and_then(Value::as_str) {
        // An unparseable version pattern never matches anything.
        Some(version) => Regex::new(version)
            .map(|regex| regex.is_match(&host.os_version))
            .unwrap_or(false),
        None => true,
    };
    let arch_check_passed = match os.get("arch").and_then(Value::as_str) {
        Some(arch) => host.arch_matches(arch),
        None => true,
    };
    name_check_passed && version_check_passed && arch_check_passed
}

fn check_features(rule: &Value, enabled_features: &[String]) -> bool {
    let Some(features) = rule["features"].as_object() else {
        return true;
    };
    features.iter().all(|(name, wanted)| {
        let enabled = enabled_features.iter().any(|feature| feature == name);
        enabled == wanted.as_bool().unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn linux_host() -> RuleHost {
        RuleHost {
            os_family: OsFamily::Linux,
            os_version: "6.8.0".to_string(),
            arch: "x86_64".to_string(),
        }
    }

    fn macos_host() -> RuleHost {
        RuleHost {
            os_family: OsFamily::Macos,
            os_version: "10.15.7".to_string(),
            arch: "arm64".to_string(),
        }
    }

    #[test]
    fn empty_rules_allow() {
        assert!(check_allowed(&[], &linux_host(), &[]));
    }

    #[test]
    fn plain_allow() {
        let rules = vec![json!({"action": "allow"})];
        assert!(check_allowed(&rules, &linux_host(), &[]));
    }

    #[test]
    fn allow_all_except_osx() {
        // The classic lwjgl pattern.
        let rules = vec![
            json!({"action": "allow"}),
            json!({"action": "disallow", "os": {"name": "osx"}}),
        ];
        assert!(check_allowed(&rules, &linux_host(), &[]));
        assert!(!check_allowed(&rules, &macos_host(), &[]));
    }

    #[test]
    fn allow_only_matching_os_denies_others() {
        let rules = vec![json!({"action": "allow", "os": {"name": "windows"}})];
        assert!(!check_allowed(&rules, &linux_host(), &[]));
    }

    #[test]
    fn last_matching_rule_wins() {
        let rules = vec![
            json!({"action": "disallow"}),
            json!({"action": "allow", "os": {"name": "linux"}}),
        ];
        assert!(check_allowed(&rules, &linux_host(), &[]));
    }

    #[test]
    fn os_version_is_a_regex() {
        let rules = vec![json!({"action": "allow", "os": {"name": "osx", "version": "^10\\."}})];
        assert!(check_allowed(&rules, &macos_host(), &[]));
        let mut newer = macos_host();
        newer.os_version = "14.2".to_string();
        assert!(!check_allowed(&rules, &newer, &[]));
    }

    #[test]
    fn arch_filter() {
        let rules = vec![json!({"action": "allow", "os": {"arch": "x86"}})];
        assert!(!check_allowed(&rules, &linux_host(), &[]));
    }

    #[test]
    fn feature_gated_rule_requires_enabled_feature() {
        let rules = vec![json!({
            "action": "allow",
            "features": {"has_custom_resolution": true}
        })];
        assert!(!check_allowed(&rules, &linux_host(), &[]));
        assert!(check_allowed(
            &rules,
            &linux_host(),
            &["has_custom_resolution".to_string()]
        ));
    }

    #[test]
    fn surviving_rules_reevaluate_to_allow() {
        // Re-running evaluation on the same host is stable.
        let rules = vec![
            json!({"action": "allow"}),
            json!({"action": "disallow", "os": {"name": "windows"}}),
        ];
        let host = linux_host();
        let first = check_allowed(&rules, &host, &[]);
        assert!(first);
        assert_eq!(first, check_allowed(&rules, &host, &[]));
    }
}
