//! # Models Module Unit Tests / Models 模块单元测试
//!
//! This module contains unit tests for the `models.rs` module: step names,
//! the error taxonomy, job statuses and run-level aggregation.
//!
//! 此模块包含 `models.rs` 模块的单元测试：步骤名称、错误分类、
//! 作业状态以及运行级别的汇总。

use std::time::Duration;
use version_matrix::core::models::{JobOutcome, JobReport, RunReport, Step, StepError};
use version_matrix::core::state::JobState;
use version_matrix::core::trigger::{EventKind, TriggerEvent};

fn job(index: usize, version: &str, outcome: JobOutcome, allow_failure: bool) -> JobReport {
    let last = if outcome.is_success() {
        JobState::Succeeded
    } else {
        JobState::Failed
    };
    JobReport {
        index,
        version: version.to_string(),
        outcome,
        states: vec![JobState::Pending, last],
        log: String::new(),
        duration: Duration::from_millis(1500),
        allow_failure,
    }
}

fn failed(step: Step, error: StepError) -> JobOutcome {
    JobOutcome::Failed { step, error }
}

fn run(jobs: Vec<JobReport>) -> RunReport {
    RunReport {
        event: TriggerEvent::new(EventKind::PullRequest, "main"),
        jobs,
        started_at: chrono::Local::now(),
        duration: Duration::from_secs(3),
    }
}

#[cfg(test)]
mod step_tests {
    use super::*;

    #[test]
    fn test_steps_in_order() {
        assert_eq!(
            Step::ALL,
            [
                Step::Checkout,
                Step::Provision,
                Step::InstallDependencies,
                Step::Test
            ]
        );
    }

    #[test]
    fn test_step_display() {
        assert_eq!(Step::Checkout.to_string(), "checkout");
        assert_eq!(Step::InstallDependencies.to_string(), "install-dependencies");
    }

    #[test]
    fn test_step_display_name_is_localized() {
        assert_eq!(Step::Test.display_name("en"), "run tests");
        assert_eq!(Step::Test.display_name("zh-CN"), "运行测试");
    }
}

#[cfg(test)]
mod step_error_tests {
    use super::*;

    #[test]
    fn test_kinds() {
        let cases = [
            (
                StepError::SourceFetch {
                    reference: "main".into(),
                    diagnostic: String::new(),
                },
                "SourceFetchError",
            ),
            (
                StepError::Provision {
                    version: "2.6".into(),
                    diagnostic: String::new(),
                },
                "ProvisionError",
            ),
            (
                StepError::DependencyInstall {
                    diagnostic: String::new(),
                    errors: vec![],
                },
                "DependencyInstallError",
            ),
            (
                StepError::TestExecution {
                    exit_code: Some(1),
                    diagnostic: None,
                },
                "TestExecutionFailure",
            ),
            (StepError::Timeout { millis: 5000 }, "Timeout"),
            (StepError::Cancelled, "Cancelled"),
        ];
        for (error, kind) in cases {
            assert_eq!(error.kind(), kind);
            assert!(error.to_string().starts_with(kind), "{error}");
        }
    }

    #[test]
    fn test_exit_code_in_message() {
        let err = StepError::TestExecution {
            exit_code: Some(1),
            diagnostic: None,
        };
        assert!(err.to_string().contains("status 1"));

        let err = StepError::TestExecution {
            exit_code: None,
            diagnostic: None,
        };
        assert!(err.to_string().contains("signal"));
    }

    #[test]
    fn test_runner_that_never_started_keeps_its_diagnostic() {
        let err = StepError::TestExecution {
            exit_code: None,
            diagnostic: Some("failed to run 'pytest': No such file or directory".to_string()),
        };
        let message = err.to_string();
        assert!(message.contains("did not start"), "{message}");
        assert!(message.contains("No such file or directory"), "{message}");
        assert!(!message.contains("signal"), "{message}");
    }

    #[test]
    fn test_timeout_message_keeps_sub_second_precision() {
        assert_eq!(
            StepError::Timeout { millis: 200 }.to_string(),
            "Timeout: job exceeded 200ms"
        );
        assert_eq!(
            StepError::Timeout { millis: 600_000 }.to_string(),
            "Timeout: job exceeded 600s"
        );
    }

    #[test]
    fn test_serialized_with_kind_tag() {
        let err = StepError::Provision {
            version: "3.7".into(),
            diagnostic: "not found".into(),
        };
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["kind"], "Provision");
        assert_eq!(value["version"], "3.7");
    }
}

#[cfg(test)]
mod report_tests {
    use super::*;

    #[test]
    fn test_status_strings_and_classes() {
        let ok = job(0, "3.7", JobOutcome::Succeeded, false);
        assert_eq!(ok.get_status_str("en"), "Succeeded");
        assert_eq!(ok.get_status_class(), "status-succeeded");

        let broken = job(
            1,
            "3.8",
            failed(Step::Test, StepError::TestExecution {
                exit_code: Some(1),
                diagnostic: None,
            }),
            false,
        );
        assert_eq!(broken.get_status_str("en"), "Failed");
        assert_eq!(broken.get_status_class(), "status-failed");

        let slow = job(2, "3.9", failed(Step::Test, StepError::Timeout { millis: 1000 }), false);
        assert_eq!(slow.get_status_class(), "status-timeout");

        let allowed = job(
            3,
            "3.13",
            failed(Step::Provision, StepError::Cancelled),
            true,
        );
        assert_eq!(allowed.get_status_class(), "status-allowed-failure");
        assert!(allowed.is_allowed_failure());
        assert!(!allowed.is_unexpected_failure());
    }

    #[test]
    fn test_run_success_ignores_allowed_failures() {
        let report = run(vec![
            job(0, "3.7", JobOutcome::Succeeded, false),
            job(
                1,
                "3.13",
                failed(Step::Test, StepError::TestExecution {
                    exit_code: Some(1),
                    diagnostic: None,
                }),
                true,
            ),
        ]);
        assert!(report.is_success());
        assert_eq!(report.succeeded_count(), 1);
        assert_eq!(report.failed_count(), 1);
        assert!(report.unexpected_failures().is_empty());
    }

    #[test]
    fn test_run_fails_on_unexpected_failure() {
        let report = run(vec![
            job(0, "3.7", JobOutcome::Succeeded, false),
            job(
                1,
                "3.8",
                failed(
                    Step::InstallDependencies,
                    StepError::DependencyInstall {
                        diagnostic: "resolution failed".into(),
                        errors: vec![],
                    },
                ),
                false,
            ),
        ]);
        assert!(!report.is_success());
        let failures = report.unexpected_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].version, "3.8");
        assert_eq!(report.job("3.8").unwrap().outcome.failed_step(), Some(Step::InstallDependencies));
        assert!(report.job("3.6").is_none());
    }
}
