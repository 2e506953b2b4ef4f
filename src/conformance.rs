//! Static pattern checks against a single source file.
//!
//! Predicates are compiled when they are defined, so evaluating them against
//! text cannot fail; the only error is a target file that cannot be loaded.
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateKind {
    MustMatch,
    MustNotMatch,
}

#[derive(Debug, Clone)]
pub struct Predicate {
    name: String,
    kind: PredicateKind,
    pattern: Regex,
}

impl Predicate {
    pub fn new(
        name: impl Into<String>,
        kind: PredicateKind,
        pattern: &str,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            kind,
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn must_match(name: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Self::new(name, PredicateKind::MustMatch, pattern)
    }

    pub fn must_not_match(name: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Self::new(name, PredicateKind::MustNotMatch, pattern)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PredicateKind {
        self.kind
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn holds_for(&self, contents: &str) -> bool {
        let found = self.pattern.is_match(contents);
        match self.kind {
            PredicateKind::MustMatch => found,
            PredicateKind::MustNotMatch => !found,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub kind: PredicateKind,
    pub pattern: String,
    pub passed: bool,
}

#[derive(Debug, Error)]
pub enum ConformanceError {
    #[error("{} not found", path.display())]
    MissingTargetFile { path: PathBuf },
    #[error("read {}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Evaluate every predicate, in order, against the full contents.
pub fn evaluate(contents: &str, predicates: &[Predicate]) -> Vec<CheckResult> {
    predicates
        .iter()
        .map(|predicate| CheckResult {
            name: predicate.name().to_string(),
            kind: predicate.kind(),
            pattern: predicate.pattern().to_string(),
            passed: predicate.holds_for(contents),
        })
        .collect()
}

/// Read `path` once and evaluate `predicates` against it.
pub fn check_file(
    path: &Path,
    predicates: &[Predicate],
) -> Result<Vec<CheckResult>, ConformanceError> {
    if !path.exists() {
        return Err(ConformanceError::MissingTargetFile {
            path: path.to_path_buf(),
        });
    }
    let contents = fs::read_to_string(path).map_err(|source| ConformanceError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let results = evaluate(&contents, predicates);
    tracing::info!(
        target_file = %path.display(),
        passed = results.iter().filter(|result| result.passed).count(),
        total = results.len(),
        "conformance checks evaluated"
    );
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "class Foo { std::string name; };";

    fn basic_predicates() -> Vec<Predicate> {
        vec![
            Predicate::must_match("std::string usage", "std::string").expect("valid"),
            Predicate::must_not_match("No malloc", "malloc").expect("valid"),
        ]
    }

    #[test]
    fn both_basic_predicates_pass() {
        let results = evaluate(SAMPLE, &basic_predicates());
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|result| result.passed));
    }

    #[test]
    fn missing_required_pattern_fails_only_that_check() {
        let mut predicates = basic_predicates();
        predicates.push(Predicate::must_match("std::function usage", "std::function").expect("valid"));
        let results = evaluate(SAMPLE, &predicates);
        let passed: Vec<bool> = results.iter().map(|result| result.passed).collect();
        assert_eq!(passed, vec![true, true, false]);
        assert_eq!(results[2].name, "std::function usage");
    }

    #[test]
    fn must_not_match_negates_must_match() {
        for contents in ["uses malloc here", "clean code", ""] {
            let present = Predicate::must_match("p", "malloc").expect("valid");
            let absent = Predicate::must_not_match("p", "malloc").expect("valid");
            assert_eq!(present.holds_for(contents), !absent.holds_for(contents));
            assert_eq!(present.holds_for(contents), contents.contains("malloc"));
        }
    }

    #[test]
    fn evaluation_is_idempotent() {
        let predicates = basic_predicates();
        assert_eq!(evaluate(SAMPLE, &predicates), evaluate(SAMPLE, &predicates));
    }

    #[test]
    fn results_follow_predicate_order() {
        let predicates = vec![
            Predicate::must_match("z", "Foo").expect("valid"),
            Predicate::must_match("a", "class").expect("valid"),
        ];
        let names: Vec<_> = evaluate(SAMPLE, &predicates)
            .into_iter()
            .map(|result| result.name)
            .collect();
        assert_eq!(names, vec!["z", "a"]);
    }

    #[test]
    fn invalid_pattern_is_rejected_at_definition() {
        assert!(Predicate::must_match("broken", "(unclosed").is_err());
    }

    #[test]
    fn check_file_reads_target() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("load.cpp");
        std::fs::write(&path, SAMPLE).expect("write");
        let results = check_file(&path, &basic_predicates()).expect("check");
        assert!(results.iter().all(|result| result.passed));
    }

    #[test]
    fn check_file_reports_missing_target() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.cpp");
        let err = check_file(&path, &basic_predicates()).expect_err("missing file");
        assert!(matches!(err, ConformanceError::MissingTargetFile { .. }));
        assert_eq!(err.to_string(), format!("{} not found", path.display()));
    }
}
