//! # Collaborator Seam / 协作者接口
//!
//! The orchestrator does not check out code, install interpreters or run tests
//! itself. It drives an implementation of [`Collaborators`], one call per step.
//! `infra::shell::ShellCollaborators` is the production implementation.
//!
//! 编排器本身不检出代码、不安装解释器也不运行测试。
//! 它按步骤调用 [`Collaborators`] 的实现。
//! `infra::shell::ShellCollaborators` 是生产环境中的实现。

use async_trait::async_trait;

use crate::core::models::{Interpreter, JobContext, StepError};

/// The external services a job depends on.
///
/// Each method appends whatever output it produced to `log` and returns the
/// step's error, carrying the collaborator's diagnostic, on failure.
/// Calls for different versions may run concurrently, so implementations must
/// not share mutable state between jobs.
///
/// 作业所依赖的外部服务。
///
/// 每个方法将其产生的输出追加到 `log`，失败时返回携带协作者诊断信息的步骤错误。
/// 不同版本的调用可能并发执行，实现不得在作业之间共享可变状态。
#[async_trait]
pub trait Collaborators: Send + Sync + 'static {
    /// Fetches `job.event`'s reference into `job.workspace`.
    /// Fails with [`StepError::SourceFetch`].
    async fn checkout(&self, job: &JobContext, log: &mut String) -> Result<(), StepError>;

    /// Installs or selects the interpreter for `job.version`.
    /// Fails with [`StepError::Provision`].
    async fn provision(&self, job: &JobContext, log: &mut String)
    -> Result<Interpreter, StepError>;

    /// Upgrades the installer and installs the dependency manifest.
    /// Fails with [`StepError::DependencyInstall`].
    async fn install_dependencies(
        &self,
        job: &JobContext,
        interpreter: &Interpreter,
        log: &mut String,
    ) -> Result<(), StepError>;

    /// Runs the test runner with no arguments.
    /// A non-zero exit fails with [`StepError::TestExecution`].
    async fn run_tests(
        &self,
        job: &JobContext,
        interpreter: &Interpreter,
        log: &mut String,
    ) -> Result<(), StepError>;
}
