//! # Data Models Module / 数据模型模块
//!
//! This module defines the core data structures used throughout the version matrix:
//! the steps of a job, the errors a step can fail with, the per-job report and
//! the aggregate run report.
//!
//! 此模块定义了整个版本矩阵中使用的核心数据结构：
//! 作业的步骤、步骤可能失败的错误、单个作业的报告以及整体运行报告。

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::core::state::JobState;
use crate::core::trigger::TriggerEvent;
use crate::infra::t;

/// The four steps every job runs, in order.
/// 每个作业按顺序运行的四个步骤。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Fetch the repository state into the job's workspace.
    /// 将仓库状态拉取到作业的工作区。
    Checkout,
    /// Install or select the interpreter for the job's version.
    /// 为作业的版本安装或选择解释器。
    Provision,
    /// Upgrade the installer and install the dependency manifest.
    /// 升级安装器并安装依赖清单。
    InstallDependencies,
    /// Invoke the test runner.
    /// 调用测试运行器。
    Test,
}

impl Step {
    /// All steps in execution order.
    pub const ALL: [Step; 4] = [
        Step::Checkout,
        Step::Provision,
        Step::InstallDependencies,
        Step::Test,
    ];

    /// Gets the localized display name of the step.
    /// 获取步骤的本地化显示名称。
    pub fn display_name(&self, locale: &str) -> String {
        match self {
            Step::Checkout => t!("step.checkout", locale = locale).to_string(),
            Step::Provision => t!("step.provision", locale = locale).to_string(),
            Step::InstallDependencies => t!("step.install", locale = locale).to_string(),
            Step::Test => t!("step.test", locale = locale).to_string(),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Checkout => "checkout",
            Step::Provision => "provision",
            Step::InstallDependencies => "install-dependencies",
            Step::Test => "test",
        };
        f.write_str(name)
    }
}

/// Enumerates the reasons a job can fail.
/// Every variant is local to the job that produced it.
///
/// 枚举作业可能失败的原因。
/// 每个变体都只影响产生它的作业。
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind")]
pub enum StepError {
    /// The checkout collaborator could not resolve or fetch the reference.
    /// 检出协作者无法解析或拉取该引用。
    #[error("SourceFetchError: could not fetch '{reference}': {diagnostic}")]
    SourceFetch { reference: String, diagnostic: String },

    /// The requested interpreter version is unsupported or unavailable.
    /// 请求的解释器版本不受支持或不可用。
    #[error("ProvisionError: interpreter {version} is unavailable: {diagnostic}")]
    Provision { version: String, diagnostic: String },

    /// Requirements could not be resolved or installed.
    /// 无法解析或安装依赖。
    #[error("DependencyInstallError: {diagnostic}")]
    DependencyInstall {
        diagnostic: String,
        errors: Vec<String>,
    },

    /// The test runner exited with a non-zero status, or never started.
    /// 测试运行器以非零状态退出，或根本没有启动。
    #[error("TestExecutionFailure: {}", test_failure_detail(.exit_code, .diagnostic))]
    TestExecution {
        exit_code: Option<i32>,
        /// Why the runner could not be started; `None` once it actually ran.
        #[serde(skip_serializing_if = "Option::is_none")]
        diagnostic: Option<String>,
    },

    /// The exclusive workspace for the job could not be created.
    /// 无法为作业创建独占工作区。
    #[error("WorkspaceError: {diagnostic}")]
    Workspace { diagnostic: String },

    /// The job ran past its configured timeout.
    /// 作业超出了配置的超时时间。
    #[error("Timeout: job exceeded {}", timeout_label(*.millis))]
    Timeout { millis: u64 },

    /// The run was interrupted before the job finished.
    /// 运行在作业完成前被中断。
    #[error("Cancelled: run was interrupted")]
    Cancelled,

    /// The job task itself crashed.
    /// 作业任务本身崩溃。
    #[error("Internal: {diagnostic}")]
    Internal { diagnostic: String },
}

fn test_failure_detail(code: &Option<i32>, diagnostic: &Option<String>) -> String {
    match (code, diagnostic) {
        (Some(code), _) => format!("test runner exited with status {code}"),
        (None, Some(diagnostic)) => format!("test runner did not start: {diagnostic}"),
        (None, None) => "test runner exited with no status (terminated by signal)".to_string(),
    }
}

fn timeout_label(millis: u64) -> String {
    if millis % 1000 == 0 {
        format!("{}s", millis / 1000)
    } else {
        format!("{millis}ms")
    }
}

impl StepError {
    /// The taxonomy name of the error, as shown in reports.
    /// 错误的分类名称，用于报告显示。
    pub fn kind(&self) -> &'static str {
        match self {
            StepError::SourceFetch { .. } => "SourceFetchError",
            StepError::Provision { .. } => "ProvisionError",
            StepError::DependencyInstall { .. } => "DependencyInstallError",
            StepError::TestExecution { .. } => "TestExecutionFailure",
            StepError::Workspace { .. } => "WorkspaceError",
            StepError::Timeout { .. } => "Timeout",
            StepError::Cancelled => "Cancelled",
            StepError::Internal { .. } => "Internal",
        }
    }
}

/// An interpreter that the provisioning step activated for one job.
/// 由配置步骤为某个作业激活的解释器。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interpreter {
    /// The matrix version this interpreter was provisioned for.
    pub version: String,
    /// The program used to invoke it (a path inside the workspace or a name on `PATH`).
    pub program: PathBuf,
    /// What the interpreter reported about itself, if anything.
    pub reported_version: Option<String>,
}

/// Everything a collaborator needs to know about the job it is serving.
/// 协作者需要了解的关于其所服务作业的全部信息。
#[derive(Debug, Clone)]
pub struct JobContext {
    /// The interpreter version identifier assigned to this job.
    pub version: String,
    /// The event that triggered the run.
    pub event: TriggerEvent,
    /// The exclusive workspace directory of this job.
    pub workspace: PathBuf,
}

/// The terminal outcome of a job.
/// 作业的最终结果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    /// Every step completed and the test runner exited with status zero.
    Succeeded,
    /// A step failed; later steps did not run.
    Failed { step: Step, error: StepError },
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Succeeded)
    }

    /// The step that failed, if any.
    pub fn failed_step(&self) -> Option<Step> {
        match self {
            JobOutcome::Failed { step, .. } => Some(*step),
            JobOutcome::Succeeded => None,
        }
    }

    /// The error that failed the job, if any.
    pub fn error(&self) -> Option<&StepError> {
        match self {
            JobOutcome::Failed { error, .. } => Some(error),
            JobOutcome::Succeeded => None,
        }
    }
}

/// Represents the final result of one job instance.
/// 表示单个作业实例的最终结果。
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    /// Position of the version in the declared matrix.
    /// 版本在声明的矩阵中的位置。
    pub index: usize,
    /// The interpreter version identifier.
    pub version: String,
    /// Succeeded or failed, with the failing step.
    pub outcome: JobOutcome,
    /// Every state the job passed through, starting at `Pending`.
    /// 作业经历的每个状态，从 `Pending` 开始。
    pub states: Vec<JobState>,
    /// Combined output of all steps that ran.
    /// 所有已运行步骤的合并输出。
    pub log: String,
    /// Wall-clock time of the job.
    #[serde(serialize_with = "serialize_secs")]
    pub duration: Duration,
    /// Whether this version is allowed to fail without failing the run.
    pub allow_failure: bool,
}

fn serialize_secs<S: serde::Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(duration.as_secs_f64())
}

impl JobReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// A failure that counts against the run.
    /// 计入整体运行结果的失败。
    pub fn is_unexpected_failure(&self) -> bool {
        !self.outcome.is_success() && !self.allow_failure
    }

    /// A failure of a version listed in `allow_failure`.
    pub fn is_allowed_failure(&self) -> bool {
        !self.outcome.is_success() && self.allow_failure
    }

    /// Gets the status of the job as a localized string for display.
    /// 以本地化字符串形式获取作业状态以供显示。
    pub fn get_status_str(&self, locale: &str) -> String {
        match &self.outcome {
            JobOutcome::Succeeded => t!("report.status_succeeded", locale = locale).to_string(),
            JobOutcome::Failed { error, .. } => {
                if self.allow_failure {
                    t!("report.status_allowed_failure", locale = locale).to_string()
                } else if matches!(error, StepError::Timeout { .. }) {
                    t!("report.status_timeout", locale = locale).to_string()
                } else {
                    t!("report.status_failed", locale = locale).to_string()
                }
            }
        }
    }

    /// Gets the CSS class used for the status cell of the HTML report.
    pub fn get_status_class(&self) -> &'static str {
        match &self.outcome {
            JobOutcome::Succeeded => "status-succeeded",
            JobOutcome::Failed { .. } if self.allow_failure => "status-allowed-failure",
            JobOutcome::Failed {
                error: StepError::Timeout { .. },
                ..
            } => "status-timeout",
            JobOutcome::Failed { .. } => "status-failed",
        }
    }
}

/// The aggregate result of one run over the matrix.
/// 对矩阵的一次运行的汇总结果。
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// The event the run was triggered by.
    pub event: TriggerEvent,
    /// One report per distinct version, in declared order.
    /// 每个不同版本一个报告，按声明顺序排列。
    pub jobs: Vec<JobReport>,
    /// When the run started.
    pub started_at: chrono::DateTime<chrono::Local>,
    /// Wall-clock time of the whole run.
    #[serde(serialize_with = "serialize_secs")]
    pub duration: Duration,
}

impl RunReport {
    /// Overall success iff no job failed unexpectedly.
    /// 当且仅当没有作业意外失败时，整体才算成功。
    pub fn is_success(&self) -> bool {
        !self.jobs.iter().any(JobReport::is_unexpected_failure)
    }

    pub fn succeeded_count(&self) -> usize {
        self.jobs.iter().filter(|j| j.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.jobs.iter().filter(|j| !j.is_success()).count()
    }

    pub fn unexpected_failures(&self) -> Vec<&JobReport> {
        self.jobs
            .iter()
            .filter(|j| j.is_unexpected_failure())
            .collect()
    }

    /// Looks up the report of a version.
    pub fn job(&self, version: &str) -> Option<&JobReport> {
        self.jobs.iter().find(|j| j.version == version)
    }
}
