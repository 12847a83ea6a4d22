// Shared test helpers for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::{TempDir, tempdir};

use version_matrix::core::collaborator::Collaborators;
use version_matrix::core::execution::RunOptions;
use version_matrix::core::models::{Interpreter, JobContext, Step, StepError};

/// In-memory collaborators with per-version failure injection.
///
/// Every call is recorded so tests can check which steps ran for which
/// version. The checkout step drops a marker file in the workspace that the
/// test step reads back, which catches workspaces shared between jobs.
#[derive(Default)]
pub struct FakeCollaborators {
    failures: HashMap<(String, Step), StepError>,
    delays: HashMap<String, Duration>,
    panics: Vec<String>,
    calls: Mutex<Vec<(String, Step)>>,
    workspaces: Mutex<Vec<PathBuf>>,
    running: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeCollaborators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `step` fail with `error` for `version` only.
    pub fn fail_at(mut self, version: &str, step: Step, error: StepError) -> Self {
        self.failures.insert((version.to_string(), step), error);
        self
    }

    /// Makes the test step of `version` take `delay`.
    pub fn slow_tests(mut self, version: &str, delay: Duration) -> Self {
        self.delays.insert(version.to_string(), delay);
        self
    }

    /// Makes the provision step of `version` panic.
    pub fn panic_at(mut self, version: &str) -> Self {
        self.panics.push(version.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(String, Step)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn steps_for(&self, version: &str) -> Vec<Step> {
        self.calls()
            .into_iter()
            .filter(|(v, _)| v == version)
            .map(|(_, step)| step)
            .collect()
    }

    pub fn workspaces(&self) -> Vec<PathBuf> {
        self.workspaces.lock().unwrap().clone()
    }

    /// Highest number of test steps observed running at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn record(&self, job: &JobContext, step: Step, log: &mut String) -> Result<(), StepError> {
        self.calls
            .lock()
            .unwrap()
            .push((job.version.clone(), step));
        log.push_str(&format!("{step} for {}\n", job.version));
        match self.failures.get(&(job.version.clone(), step)) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Collaborators for FakeCollaborators {
    async fn checkout(&self, job: &JobContext, log: &mut String) -> Result<(), StepError> {
        self.workspaces
            .lock()
            .unwrap()
            .push(job.workspace.clone());
        self.record(job, Step::Checkout, log)?;
        fs::write(job.workspace.join("VERSION"), &job.version).map_err(|e| {
            StepError::SourceFetch {
                reference: job.event.checkout_ref().to_string(),
                diagnostic: e.to_string(),
            }
        })
    }

    async fn provision(&self, job: &JobContext, log: &mut String) -> Result<Interpreter, StepError> {
        self.record(job, Step::Provision, log)?;
        if self.panics.contains(&job.version) {
            panic!("provisioner crashed for {}", job.version);
        }
        Ok(Interpreter {
            version: job.version.clone(),
            program: job.workspace.join("python"),
            reported_version: Some(format!("Python {}", job.version)),
        })
    }

    async fn install_dependencies(
        &self,
        job: &JobContext,
        interpreter: &Interpreter,
        log: &mut String,
    ) -> Result<(), StepError> {
        assert_eq!(interpreter.version, job.version);
        self.record(job, Step::InstallDependencies, log)
    }

    async fn run_tests(
        &self,
        job: &JobContext,
        _interpreter: &Interpreter,
        log: &mut String,
    ) -> Result<(), StepError> {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(&job.version) {
            tokio::time::sleep(*delay).await;
        }
        self.running.fetch_sub(1, Ordering::SeqCst);

        let marker = fs::read_to_string(job.workspace.join("VERSION")).unwrap_or_default();
        if marker != job.version {
            return Err(StepError::Internal {
                diagnostic: format!("workspace of {} holds {marker}", job.version),
            });
        }
        self.record(job, Step::Test, log)
    }
}

/// Run options for tests: workspaces under `root`, `jobs` in parallel.
pub fn test_options(root: &Path, jobs: usize) -> RunOptions {
    RunOptions {
        jobs,
        workspace_root: Some(root.to_path_buf()),
        ..RunOptions::default()
    }
}

pub fn dependency_error(package: &str) -> StepError {
    StepError::DependencyInstall {
        diagnostic: format!("No matching distribution found for {package}"),
        errors: vec![format!("ERROR: No matching distribution found for {package}")],
    }
}

/// Number of entries left under `dir`.
pub fn entries_in(dir: &Path) -> usize {
    fs::read_dir(dir).map(|it| it.count()).unwrap_or(0)
}

/// Creates a project directory holding `content` as `VersionMatrix.toml`.
pub fn setup_project(content: &str) -> TempDir {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    fs::write(temp_dir.path().join("VersionMatrix.toml"), content)
        .expect("Failed to write VersionMatrix.toml");
    temp_dir
}

/// A configuration whose steps are plain shell commands, so the CLI can run
/// without git or an interpreter installed.
///
/// `test` is the test command; every other step succeeds.
pub fn shell_config(versions: &[&str], test: &str) -> String {
    let versions = versions
        .iter()
        .map(|v| format!("\"{v}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"language = "en"

[trigger]
events = ["push", "pull_request"]
branches = ["main"]

[matrix]
versions = [{versions}]

[steps]
checkout = "true"
provision = ""
interpreter = "/bin/echo"
upgrade_installer = ""
install = "true"
manifest = ""
test = '{test}'
"#
    )
}
