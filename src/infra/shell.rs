//! # Shell Collaborators Module / Shell 协作者模块
//!
//! The production [`Collaborators`]: every step is a command template from the
//! `[steps]` table, expanded per job and run inside the job's workspace.
//!
//! 生产环境中的 [`Collaborators`]：每个步骤都是 `[steps]` 表中的命令模板，
//! 按作业展开并在作业的工作区中运行。

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::core::collaborator::Collaborators;
use crate::core::config::StepsConfig;
use crate::core::models::{Interpreter, JobContext, StepError};
use crate::infra::command::{self, CommandOutput, DIAGNOSTIC_TAIL_LINES};
use crate::infra::template;

/// Runs the steps of a job as shell commands.
/// 以 shell 命令的方式运行作业的各个步骤。
#[derive(Debug, Clone)]
pub struct ShellCollaborators {
    steps: StepsConfig,
    repository: String,
}

impl ShellCollaborators {
    /// # Arguments
    /// * `steps` - Command templates of the four steps
    /// * `repository` - Path or URL handed to the checkout command as `{repository}`
    pub fn new(steps: StepsConfig, repository: impl Into<String>) -> Self {
        Self {
            steps,
            repository: repository.into(),
        }
    }

    fn job_vars(&self, job: &JobContext) -> Vec<(&'static str, String)> {
        vec![
            ("version", job.version.clone()),
            ("workspace", job.workspace.display().to_string()),
            ("ref", job.event.checkout_ref().to_string()),
            ("branch", job.event.branch.clone()),
            ("repository", self.repository.clone()),
        ]
    }

    fn interpreter_vars(
        &self,
        job: &JobContext,
        interpreter: &Interpreter,
    ) -> Vec<(&'static str, String)> {
        let mut vars = self.job_vars(job);
        vars.push(("python", interpreter.program.display().to_string()));
        vars.push(("manifest", self.manifest_path(job).display().to_string()));
        vars
    }

    fn manifest_path(&self, job: &JobContext) -> PathBuf {
        job.workspace.join(&self.steps.manifest)
    }

    /// Expands `template` and runs it in `cwd`, appending the command line and
    /// its output to `log`. Spawn and template failures come back as a
    /// diagnostic string; a non-zero exit is left for the caller to judge.
    ///
    /// 展开 `template` 并在 `cwd` 中运行，将命令行及其输出追加到 `log`。
    /// 启动失败和模板错误以诊断字符串返回；非零退出码由调用者判断。
    async fn exec(
        &self,
        template: &str,
        vars: &[(&'static str, String)],
        cwd: &Path,
        log: &mut String,
    ) -> Result<CommandOutput, String> {
        let pairs: Vec<(&str, &str)> = vars.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let argv = template::expand(template, &pairs).map_err(|e| e.to_string())?;

        let line = shlex::try_join(argv.iter().map(String::as_str))
            .unwrap_or_else(|_| argv.join(" "));
        log.push_str(&format!("$ {line}\n"));

        let cmd = command::build_command(&argv, cwd).map_err(|e| e.to_string())?;
        match command::spawn_and_capture(cmd).await {
            Ok(output) => {
                log.push_str(&output.output);
                Ok(output)
            }
            Err(e) => {
                let diagnostic = format!("failed to run '{}': {e}", argv[0]);
                log.push_str(&diagnostic);
                log.push('\n');
                Err(diagnostic)
            }
        }
    }
}

/// Lines an installer flagged as errors, e.g. pip's `ERROR: ...` lines.
/// 安装器标记为错误的行，例如 pip 的 `ERROR: ...` 行。
pub fn installer_errors(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| {
            let lower = line.to_ascii_lowercase();
            lower.starts_with("error:") || lower.starts_with("error ")
        })
        .map(str::to_string)
        .collect()
}

fn is_blank(template: &str) -> bool {
    template.trim().is_empty()
}

#[async_trait]
impl Collaborators for ShellCollaborators {
    async fn checkout(&self, job: &JobContext, log: &mut String) -> Result<(), StepError> {
        let reference = job.event.checkout_ref().to_string();
        let vars = self.job_vars(job);
        let fail = |diagnostic: String| StepError::SourceFetch {
            reference: reference.clone(),
            diagnostic,
        };

        let output = self
            .exec(&self.steps.checkout, &vars, &job.workspace, log)
            .await
            .map_err(fail)?;
        if !output.success() {
            return Err(fail(output.tail(DIAGNOSTIC_TAIL_LINES)));
        }
        Ok(())
    }

    async fn provision(
        &self,
        job: &JobContext,
        log: &mut String,
    ) -> Result<Interpreter, StepError> {
        let vars = self.job_vars(job);
        let fail = |diagnostic: String| StepError::Provision {
            version: job.version.clone(),
            diagnostic,
        };

        if !is_blank(&self.steps.provision) {
            let output = self
                .exec(&self.steps.provision, &vars, &job.workspace, log)
                .await
                .map_err(fail)?;
            if !output.success() {
                return Err(fail(output.tail(DIAGNOSTIC_TAIL_LINES)));
            }
        }

        let pairs: Vec<(&str, &str)> = vars.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let program = template::substitute(&self.steps.interpreter, &pairs)
            .map_err(|e| fail(e.to_string()))?;

        // The interpreter must actually start before the job moves on.
        let version_check = vec![program.clone(), "--version".to_string()];
        let cmd = command::build_command(&version_check, &job.workspace).map_err(|e| fail(e.to_string()))?;
        let output = command::spawn_and_capture(cmd)
            .await
            .map_err(|e| fail(format!("failed to start interpreter '{program}': {e}")))?;
        log.push_str(&output.output);
        if !output.success() {
            return Err(fail(output.tail(DIAGNOSTIC_TAIL_LINES)));
        }

        Ok(Interpreter {
            version: job.version.clone(),
            program: PathBuf::from(program),
            reported_version: output
                .output
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .map(str::to_string),
        })
    }

    async fn install_dependencies(
        &self,
        job: &JobContext,
        interpreter: &Interpreter,
        log: &mut String,
    ) -> Result<(), StepError> {
        let vars = self.interpreter_vars(job, interpreter);
        let failed = |diagnostic: String, errors: Vec<String>| StepError::DependencyInstall {
            diagnostic,
            errors,
        };

        if !is_blank(&self.steps.upgrade_installer) {
            let output = self
                .exec(&self.steps.upgrade_installer, &vars, &job.workspace, log)
                .await
                .map_err(|d| failed(d, Vec::new()))?;
            if !output.success() {
                return Err(failed(
                    output.tail(DIAGNOSTIC_TAIL_LINES),
                    installer_errors(&output.output),
                ));
            }
        }

        if is_blank(&self.steps.manifest) {
            return Ok(());
        }
        let manifest = self.manifest_path(job);
        if !manifest.is_file() {
            return Err(failed(
                format!("dependency manifest {} not found", self.steps.manifest),
                Vec::new(),
            ));
        }

        let output = self
            .exec(&self.steps.install, &vars, &job.workspace, log)
            .await
            .map_err(|d| failed(d, Vec::new()))?;
        if !output.success() {
            return Err(failed(
                output.tail(DIAGNOSTIC_TAIL_LINES),
                installer_errors(&output.output),
            ));
        }
        Ok(())
    }

    async fn run_tests(
        &self,
        job: &JobContext,
        interpreter: &Interpreter,
        log: &mut String,
    ) -> Result<(), StepError> {
        let vars = self.interpreter_vars(job, interpreter);
        let output = self
            .exec(&self.steps.test, &vars, &job.workspace, log)
            .await
            .map_err(|d| StepError::TestExecution {
                exit_code: None,
                diagnostic: Some(d),
            })?;
        if !output.success() {
            return Err(StepError::TestExecution {
                exit_code: output.status.code(),
                diagnostic: None,
            });
        }
        Ok(())
    }
}
