//! Pipeline and rule-set configuration.
//!
//! Config is plain JSON. When no file is found the built-in defaults are used,
//! which reproduce the jansson modernization build, coverage, and demo runs.
use crate::pipeline::{Pipeline, Step};
use crate::rules::{compile_rules, modernization_rules, RuleConfig, RuleSet};
use crate::rules::{MODERNIZATION_RULE_SET, MODERNIZATION_TARGET};
use crate::runner::CommandSpec;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_SCHEMA_VERSION: u32 = 1;
pub const LOCAL_CONFIG_FILE: &str = "modverify.json";
const USER_CONFIG_REL: &str = "modverify/config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifyConfig {
    pub schema_version: u32,
    #[serde(default)]
    pub pipelines: BTreeMap<String, PipelineConfig>,
    #[serde(default)]
    pub rule_sets: BTreeMap<String, RuleSetConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub steps: Vec<StepConfig>,
}

/// A pipeline step. Exactly one of `shell` or `argv` must be set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argv: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSetConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub target: String,
    pub rules: Vec<RuleConfig>,
}

/// Where the active config came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    BuiltIn,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::BuiltIn => f.write_str("<built-in>"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: VerifyConfig,
    pub source: ConfigSource,
}

impl StepConfig {
    fn shell(name: &str, line: &str, cwd: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            shell: Some(line.to_string()),
            argv: None,
            cwd: cwd.map(str::to_string),
        }
    }

    fn argv(name: &str, argv: &[&str], cwd: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            shell: None,
            argv: Some(argv.iter().map(|arg| arg.to_string()).collect()),
            cwd: cwd.map(str::to_string),
        }
    }

    pub fn to_command(&self) -> Result<CommandSpec> {
        let command = match (&self.shell, &self.argv) {
            (Some(line), None) => {
                if line.trim().is_empty() {
                    return Err(anyhow!("step {:?} has an empty shell command", self.name));
                }
                CommandSpec::shell(line.clone())
            }
            (None, Some(argv)) => {
                if argv.is_empty() {
                    return Err(anyhow!("step {:?} has an empty argv", self.name));
                }
                CommandSpec::argv(argv.iter().cloned())
            }
            (Some(_), Some(_)) => {
                return Err(anyhow!(
                    "step {:?} sets both shell and argv; pick one",
                    self.name
                ))
            }
            (None, None) => {
                return Err(anyhow!("step {:?} needs a shell or argv command", self.name))
            }
        };
        Ok(match &self.cwd {
            Some(cwd) => command.in_dir(cwd),
            None => command,
        })
    }
}

impl PipelineConfig {
    pub fn build(&self, name: &str) -> Result<Pipeline> {
        let steps = self
            .steps
            .iter()
            .map(|step| {
                if step.name.trim().is_empty() {
                    return Err(anyhow!("step names must be non-empty"));
                }
                Ok(Step::new(step.name.clone(), step.to_command()?))
            })
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("pipeline {name}"))?;
        Ok(Pipeline::new(name, steps))
    }
}

impl RuleSetConfig {
    pub fn build(&self, name: &str) -> Result<RuleSet> {
        if self.target.trim().is_empty() {
            return Err(anyhow!("rule set {name} target must be non-empty"));
        }
        let predicates = compile_rules(&self.rules).with_context(|| format!("rule set {name}"))?;
        Ok(RuleSet {
            name: name.to_string(),
            target: PathBuf::from(&self.target),
            predicates,
        })
    }
}

impl VerifyConfig {
    pub fn pipeline(&self, name: &str) -> Result<Pipeline> {
        let pipeline = self.pipelines.get(name).ok_or_else(|| {
            anyhow!(
                "unknown pipeline {name:?} (available: {})",
                join_names(self.pipelines.keys())
            )
        })?;
        pipeline.build(name)
    }

    pub fn rule_set(&self, name: &str) -> Result<RuleSet> {
        let rule_set = self.rule_sets.get(name).ok_or_else(|| {
            anyhow!(
                "unknown rule set {name:?} (available: {})",
                join_names(self.rule_sets.keys())
            )
        })?;
        rule_set.build(name)
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a String>) -> String {
    let names: Vec<&str> = names.map(String::as_str).collect();
    if names.is_empty() {
        return "none".to_string();
    }
    names.join(", ")
}

/// Build the config used when no config file is present.
pub fn default_config() -> VerifyConfig {
    let mut pipelines = BTreeMap::new();
    pipelines.insert(
        "coverage".to_string(),
        PipelineConfig {
            description: Some("Build the test suite, run it, and render an lcov report".into()),
            steps: vec![
                StepConfig::argv("prepare", &["mkdir", "-p", "tests/build"], None),
                StepConfig::shell("configure", "cmake ..", Some("tests/build")),
                StepConfig::shell("compile", "make", Some("tests/build")),
                StepConfig::shell("test", "./jansson_tests", Some("tests/build")),
                StepConfig::shell(
                    "capture",
                    "lcov --ignore-errors mismatch --directory . --capture --output-file coverage.info",
                    Some("tests/build"),
                ),
                StepConfig::shell(
                    "report",
                    "genhtml coverage.info --output-directory coverage_html",
                    Some("tests/build"),
                ),
            ],
        },
    );
    pipelines.insert(
        "build".to_string(),
        PipelineConfig {
            description: Some("Configure and build the library from a clean build directory".into()),
            steps: vec![
                StepConfig::argv("clean", &["rm", "-rf", "build"], None),
                StepConfig::argv("prepare", &["mkdir", "build"], None),
                StepConfig::shell("configure", "cmake ..", Some("build")),
                StepConfig::shell("compile", "make", Some("build")),
            ],
        },
    );
    pipelines.insert(
        "demo".to_string(),
        PipelineConfig {
            description: Some("Compile the JSON demo against the sources and run it".into()),
            steps: vec![
                StepConfig::shell(
                    "compile",
                    "g++ -std=c++20 -I./src demo/json_demo.cpp -o json_demo",
                    None,
                ),
                StepConfig::shell("run", "./json_demo", None),
            ],
        },
    );

    let mut rule_sets = BTreeMap::new();
    rule_sets.insert(
        MODERNIZATION_RULE_SET.to_string(),
        RuleSetConfig {
            description: Some("C++ modernization of the JSON loader".into()),
            target: MODERNIZATION_TARGET.to_string(),
            rules: modernization_rules(),
        },
    );

    VerifyConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        pipelines,
        rule_sets,
    }
}

/// Render the default config as pretty JSON.
pub fn config_stub() -> Result<String> {
    serde_json::to_string_pretty(&default_config()).context("serialize default config")
}

/// Check schema version and that every pipeline and rule set builds.
pub fn validate_config(config: &VerifyConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {} (expected {CONFIG_SCHEMA_VERSION})",
            config.schema_version
        ));
    }
    for (name, pipeline) in &config.pipelines {
        if pipeline.steps.is_empty() {
            return Err(anyhow!("pipeline {name} has no steps"));
        }
        pipeline.build(name)?;
    }
    for (name, rule_set) in &config.rule_sets {
        rule_set.build(name)?;
    }
    Ok(())
}

pub fn load_config(path: &Path) -> Result<VerifyConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: VerifyConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config JSON {}", path.display()))?;
    validate_config(&config).with_context(|| format!("validate config {}", path.display()))?;
    Ok(config)
}

pub fn write_config(path: &Path, config: &VerifyConfig) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create config dir {}", parent.display()))?;
    }
    let mut text = serde_json::to_string_pretty(config).context("serialize config")?;
    text.push('\n');
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Pick the config to use: an explicit path, then `./modverify.json`, then
/// the user config dir, then the built-in default.
pub fn resolve_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        return Ok(LoadedConfig {
            config: load_config(path)?,
            source: ConfigSource::File(path.to_path_buf()),
        });
    }
    let mut candidates = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join(USER_CONFIG_REL));
    }
    for candidate in candidates {
        if candidate.is_file() {
            tracing::debug!(path = %candidate.display(), "using config file");
            return Ok(LoadedConfig {
                config: load_config(&candidate)?,
                source: ConfigSource::File(candidate),
            });
        }
    }
    tracing::debug!("no config file found; using built-in defaults");
    Ok(LoadedConfig {
        config: default_config(),
        source: ConfigSource::BuiltIn,
    })
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
