//! # Config Module Unit Tests / Config 模块单元测试
//!
//! This module contains unit tests for the `config.rs` module, testing
//! `VersionMatrix` validation and `MatrixConfig` parsing and defaults.
//!
//! 此模块包含 `config.rs` 模块的单元测试，
//! 测试 `VersionMatrix` 校验以及 `MatrixConfig` 的解析和默认值。

use std::path::Path;
use version_matrix::core::config::{ConfigError, MatrixConfig, VersionMatrix};
use version_matrix::core::trigger::EventKind;

fn parse(content: &str) -> Result<MatrixConfig, ConfigError> {
    MatrixConfig::from_toml(content, Path::new("VersionMatrix.toml"))
}

#[cfg(test)]
mod version_matrix_tests {
    use super::*;

    #[test]
    fn test_valid_matrix() {
        assert!(VersionMatrix::new(["3.7", "3.8"]).validate().is_ok());
    }

    #[test]
    fn test_empty_matrix_is_rejected() {
        let matrix = VersionMatrix::new(Vec::<String>::new());
        assert!(matches!(matrix.validate(), Err(ConfigError::EmptyMatrix)));
    }

    #[test]
    fn test_blank_version_is_rejected() {
        let matrix = VersionMatrix::new(["3.9", "  "]);
        assert!(matches!(matrix.validate(), Err(ConfigError::BlankVersion(1))));
    }

    #[test]
    fn test_allow_failure_must_name_a_matrix_version() {
        let matrix = VersionMatrix::new(["3.9"]).with_allow_failure(["2.7"]);
        match matrix.validate() {
            Err(ConfigError::UnknownAllowFailure(v)) => assert_eq!(v, "2.7"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_allows_failure() {
        let matrix = VersionMatrix::new(["3.9", "3.13"]).with_allow_failure(["3.13"]);
        assert!(matrix.allows_failure("3.13"));
        assert!(!matrix.allows_failure("3.9"));
    }

    #[test]
    fn test_allow_failure_ignores_surrounding_whitespace() {
        let matrix = VersionMatrix::new(["3.9", "3.13 "]).with_allow_failure([" 3.13"]);
        assert!(matrix.validate().is_ok());
        assert!(matrix.allows_failure("3.13"));
        assert!(!matrix.allows_failure("3.9"));
    }
}

#[cfg(test)]
mod matrix_config_tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse(
            r#"
[matrix]
versions = ["3.7", "3.8", "3.9", "3.10"]
"#,
        )
        .unwrap();

        assert_eq!(config.language, "en");
        assert_eq!(config.timeout_secs, None);
        assert_eq!(config.matrix.versions.len(), 4);
        assert_eq!(
            config.trigger.events,
            vec![EventKind::Push, EventKind::PullRequest]
        );
        assert_eq!(config.trigger.branches, vec!["main".to_string()]);
        assert!(config.source.repository.is_none());
        assert_eq!(config.steps.manifest, "requirements.txt");
        assert!(config.steps.install.contains("{manifest}"));
        assert!(config.steps.upgrade_installer.contains("--upgrade pip"));
    }

    #[test]
    fn test_full_config() {
        let config = parse(
            r#"
language = "zh-CN"
timeout_secs = 600

[trigger]
events = ["pull_request"]
branches = ["main", "release/*"]

[matrix]
versions = ["3.11", "3.12"]
allow_failure = ["3.12"]

[source]
repository = "https://example.com/project.git"

[steps]
test = "{python} -m pytest"
"#,
        )
        .unwrap();

        assert_eq!(config.language, "zh-CN");
        assert_eq!(config.timeout_secs, Some(600));
        assert_eq!(config.trigger.events, vec![EventKind::PullRequest]);
        assert!(config.matrix.allows_failure("3.12"));
        assert_eq!(
            config.source.repository.as_deref(),
            Some("https://example.com/project.git")
        );
        assert_eq!(config.steps.test, "{python} -m pytest");
        // Steps left out keep their defaults.
        assert_eq!(config.steps.manifest, "requirements.txt");
    }

    #[test]
    fn test_empty_versions_fail_to_load() {
        let result = parse("[matrix]\nversions = []\n");
        assert!(matches!(result, Err(ConfigError::EmptyMatrix)));
    }

    #[test]
    fn test_invalid_toml_reports_path() {
        let err = parse("[matrix\nversions = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("VersionMatrix.toml"));
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        let result = parse(
            r#"
[trigger]
events = ["release"]

[matrix]
versions = ["3.9"]
"#,
        );
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_missing_file() {
        let err = MatrixConfig::load(Path::new("does/not/exist.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_serialization_round_trip_keeps_matrix() {
        let config =
            MatrixConfig::with_matrix(VersionMatrix::new(["3.8", "3.9"]).with_allow_failure(["3.9"]));
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed.matrix, config.matrix);
        assert_eq!(parsed.steps.test, config.steps.test);
    }
}
