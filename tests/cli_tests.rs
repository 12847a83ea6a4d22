//! # CLI Integration Tests / CLI 集成测试
//!
//! Runs the `version-matrix` binary end to end against throwaway projects
//! whose steps are plain shell commands, so neither git nor an interpreter
//! needs to be installed.
//!
//! 针对临时项目端到端运行 `version-matrix` 可执行文件。
//! 这些项目的步骤都是普通的 shell 命令，因此无需安装 git 或解释器。

mod common;

use assert_cmd::prelude::*;
use common::{setup_project, shell_config};
use predicates::prelude::*;
use std::path::Path;
use std::process::Command;
use version_matrix::core::config::MatrixConfig;

const VERSIONS: [&str; 4] = ["3.7", "3.8", "3.9", "3.10"];

/// A `run` invocation inside `dir` for a push to `main`, isolated from any
/// CI environment the tests themselves run in.
fn run_in(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("version-matrix").unwrap();
    cmd.current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("GITHUB_EVENT_NAME")
        .env_remove("GITHUB_REF_NAME")
        .env_remove("GITHUB_BASE_REF")
        .env_remove("GITHUB_HEAD_REF")
        .arg("run")
        .arg("--event")
        .arg("push")
        .arg("--branch")
        .arg("main");
    cmd
}

/// All four versions pass, so the run exits with status 0.
///
/// 四个版本全部通过，运行以状态 0 退出。
#[cfg(unix)]
#[test]
fn test_successful_run() {
    let project = setup_project(&shell_config(&VERSIONS, "true"));

    run_in(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("ALL MATRIX JOBS PASSED SUCCESSFULLY"))
        .stdout(predicate::str::contains("4 job(s): 4 succeeded, 0 failed"));
}

/// Only 3.10 fails its tests; the other versions still run and pass.
///
/// 只有 3.10 的测试失败；其他版本仍然运行并通过。
#[cfg(unix)]
#[test]
fn test_single_version_test_failure() {
    let project = setup_project(&shell_config(&VERSIONS, "test {version} != 3.10"));

    run_in(project.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("UNEXPECTED FAILURE DETECTED"))
        .stdout(predicate::str::contains("[3.10] Failed at run tests"))
        .stdout(predicate::str::contains("TestExecutionFailure"))
        .stdout(predicate::str::contains("4 job(s): 3 succeeded, 1 failed"))
        .stderr(predicate::str::contains("1 matrix job(s) failed"));
}

#[cfg(unix)]
#[test]
fn test_allowed_failure_keeps_run_green() {
    let config = shell_config(&VERSIONS, "test {version} != 3.10")
        .replace("versions = [", "allow_failure = [\"3.10\"]\nversions = [");
    let project = setup_project(&config);

    run_in(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Failed (allowed)"));
}

/// An empty matrix is a configuration error; nothing runs.
///
/// 空矩阵属于配置错误，不会运行任何作业。
#[test]
fn test_empty_matrix_fails() {
    let project = setup_project("[matrix]\nversions = []\n");

    run_in(project.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("Starting job").not())
        .stderr(predicate::str::contains("the version matrix is empty"));
}

#[test]
fn test_missing_config_fails() {
    let project = tempfile::tempdir().unwrap();

    run_in(project.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not read configuration file"));
}

#[test]
fn test_event_on_other_branch_does_nothing() {
    let project = setup_project(&shell_config(&VERSIONS, "false"));

    let mut cmd = Command::cargo_bin("version-matrix").unwrap();
    cmd.current_dir(project.path())
        .env("NO_COLOR", "1")
        .args(["run", "--event", "pull_request", "--branch", "feature/x"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("does not trigger this matrix"))
        .stdout(predicate::str::contains("Starting job").not());
}

#[test]
fn test_dry_run_lists_jobs() {
    let project = setup_project(&shell_config(&VERSIONS, "false"));

    run_in(project.path())
        .arg("--dry-run")
        .arg("--ref")
        .arg("v1.2.0")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"))
        .stdout(predicate::str::contains("3.10 @ v1.2.0"))
        .stdout(predicate::str::contains("Starting job").not());
}

#[test]
fn test_dry_run_marks_allowed_failures() {
    let config = shell_config(&VERSIONS, "false")
        .replace("versions = [", "allow_failure = [\"3.10\"]\nversions = [");
    let project = setup_project(&config);

    run_in(project.path())
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("3.10 @ main (allow failure)"))
        .stdout(predicate::str::contains("3.9 @ main (allow failure)").not());

    run_in(project.path())
        .args(["--dry-run", "--lang", "zh-CN"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3.10 @ main（允许失败）"));
}

#[test]
fn test_split_runner_gets_its_share() {
    let project = setup_project(&shell_config(&VERSIONS, "false"));

    run_in(project.path())
        .args(["--dry-run", "--total-runners", "2", "--runner-index", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Running as runner 1 of 2, 2 job(s) assigned."))
        .stdout(predicate::str::contains("3.8 @ main"))
        .stdout(predicate::str::contains("3.7 @ main").not());
}

#[test]
fn test_runner_index_requires_total() {
    let project = setup_project(&shell_config(&VERSIONS, "true"));

    run_in(project.path())
        .args(["--runner-index", "0"])
        .assert()
        .failure();
}

#[cfg(unix)]
#[test]
fn test_chinese_output() {
    let project = setup_project(&shell_config(&["3.12"], "true"));

    run_in(project.path())
        .args(["--lang", "zh-CN"])
        .assert()
        .success()
        .stdout(predicate::str::contains("所有矩阵作业均已成功通过"));
}

#[cfg(unix)]
#[test]
fn test_reports_are_written() {
    let project = setup_project(&shell_config(&["3.8", "3.9"], "test {version} = 3.8"));

    run_in(project.path())
        .args(["--html", "report.html", "--json", "report.json"])
        .assert()
        .failure();

    let html = std::fs::read_to_string(project.path().join("report.html")).unwrap();
    assert!(html.contains("status-failed"));

    let json = std::fs::read_to_string(project.path().join("report.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["success"], false);
    assert_eq!(value["jobs"][1]["version"], "3.9");
    assert_eq!(value["jobs"][1]["outcome"]["step"], "test");
}

#[test]
fn test_init_non_interactive() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("VersionMatrix.toml");

    let mut cmd = Command::cargo_bin("version-matrix").unwrap();
    cmd.args(["init", "--non-interactive", "--lang", "en", "--path"])
        .arg(&path);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Created"));

    let config = MatrixConfig::load(&path).unwrap();
    assert_eq!(config.matrix.versions, vec!["3.7", "3.8", "3.9", "3.10"]);
    assert_eq!(config.steps.manifest, "requirements.txt");

    // A second non-interactive init never overwrites.
    let mut again = Command::cargo_bin("version-matrix").unwrap();
    again
        .args(["init", "--non-interactive", "--lang", "en", "--path"])
        .arg(&path);
    again
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_help_lists_subcommands() {
    let mut cmd = Command::cargo_bin("version-matrix").unwrap();
    cmd.args(["--lang", "en", "--help"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("init"));
}
