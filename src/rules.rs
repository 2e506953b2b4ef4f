//! Declarative conformance rule tables.
use crate::conformance::{Predicate, PredicateKind};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const MODERNIZATION_RULE_SET: &str = "modernization";
pub const MODERNIZATION_TARGET: &str = "./jansson-cpp/src/load.cpp";

/// One row of a rule table as it appears in config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    pub name: String,
    pub kind: PredicateKind,
    pub pattern: String,
}

impl RuleConfig {
    fn new(name: &str, kind: PredicateKind, pattern: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            pattern: pattern.to_string(),
        }
    }
}

/// A compiled rule table bound to the file it checks.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub name: String,
    pub target: PathBuf,
    pub predicates: Vec<Predicate>,
}

/// Compile rule rows into predicates, preserving order.
pub fn compile_rules(rules: &[RuleConfig]) -> Result<Vec<Predicate>> {
    rules
        .iter()
        .map(|rule| {
            if rule.name.trim().is_empty() {
                return Err(anyhow!("rule name must be non-empty"));
            }
            Predicate::new(rule.name.clone(), rule.kind, &rule.pattern)
                .with_context(|| format!("compile pattern for rule {:?}", rule.name))
        })
        .collect()
}

/// Checks applied to modernized jansson sources.
pub fn modernization_rules() -> Vec<RuleConfig> {
    use PredicateKind::{MustMatch, MustNotMatch};
    vec![
        RuleConfig::new(
            "C++ headers",
            MustMatch,
            r"#include <(iostream|memory|string|vector|functional)>",
        ),
        RuleConfig::new(
            "Classes instead of structs",
            MustMatch,
            r"class (Stream|Lexer|CallbackData)",
        ),
        RuleConfig::new("std::string usage", MustMatch, r"std::string"),
        RuleConfig::new("std::function usage", MustMatch, r"std::function"),
        RuleConfig::new("constexpr usage", MustMatch, r"constexpr"),
        RuleConfig::new("auto usage", MustMatch, r"\bauto\b"),
        RuleConfig::new("std::vector usage", MustMatch, r"std::vector"),
        RuleConfig::new("Namespace usage", MustMatch, r"namespace jansson"),
        RuleConfig::new("No malloc/free", MustNotMatch, r"\b(malloc|free)\b"),
        RuleConfig::new("No C-style strings", MustNotMatch, r"char\s*\*.*\["),
    ]
}
