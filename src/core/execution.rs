//! # Matrix Execution Engine Module / 矩阵执行引擎模块
//!
//! This module fans a run out over the version matrix. Every version becomes an
//! independent job that walks checkout, provision, install and test in strict
//! sequence inside its own workspace. A join barrier collects every outcome;
//! one job failing never stops the others.
//!
//! 此模块将一次运行扇出到整个版本矩阵。每个版本成为一个独立作业，
//! 在自己的工作区内严格按顺序执行检出、配置、安装和测试。
//! 汇合屏障收集所有结果；一个作业的失败不会停止其他作业。

use colored::*;
use futures::{StreamExt, stream};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        collaborator::Collaborators,
        config::{ConfigError, VersionMatrix},
        models::{JobContext, JobOutcome, JobReport, RunReport, Step, StepError},
        planner::{self, ExecutionPlan, PlannedJob},
        state::{JobInstance, JobState},
        trigger::TriggerEvent,
    },
    infra::{fs, t},
};

/// Knobs of a run that are not part of the matrix itself.
/// 不属于矩阵本身的运行参数。
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Maximum number of jobs running at once.
    /// 同时运行的最大作业数。
    pub jobs: usize,
    /// Upper bound for the whole step sequence of one job.
    /// 单个作业整个步骤序列的时间上限。
    pub timeout: Option<Duration>,
    /// Copy the workspace of failed jobs here before it is reclaimed.
    /// 在回收之前，将失败作业的工作区复制到此处。
    pub preserve_failed: Option<PathBuf>,
    /// Parent directory for job workspaces. Defaults to the system temp dir.
    /// 作业工作区的父目录，默认为系统临时目录。
    pub workspace_root: Option<PathBuf>,
    /// Locale of progress messages.
    pub locale: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            jobs: num_cpus::get() / 2 + 1,
            timeout: None,
            preserve_failed: None,
            workspace_root: None,
            locale: "en".to_string(),
        }
    }
}

/// Runs every version of a matrix through the four steps.
/// 让矩阵中的每个版本依次经过四个步骤。
pub struct Orchestrator<C> {
    collaborators: Arc<C>,
    options: Arc<RunOptions>,
}

impl<C: Collaborators> Orchestrator<C> {
    pub fn new(collaborators: C, options: RunOptions) -> Self {
        Self::with_shared(Arc::new(collaborators), options)
    }

    pub fn with_shared(collaborators: Arc<C>, options: RunOptions) -> Self {
        Self {
            collaborators,
            options: Arc::new(options),
        }
    }

    /// Runs the whole matrix for `event`.
    ///
    /// An invalid matrix fails here with a [`ConfigError`] before any job or
    /// workspace exists. Otherwise the report holds exactly one entry per
    /// distinct version.
    ///
    /// 为 `event` 运行整个矩阵。
    /// 无效的矩阵会在创建任何作业或工作区之前以 [`ConfigError`] 失败。
    /// 否则报告中每个不同版本恰好对应一个条目。
    pub async fn run(
        &self,
        event: &TriggerEvent,
        matrix: &VersionMatrix,
        stop: CancellationToken,
    ) -> Result<RunReport, ConfigError> {
        let plan = planner::plan_execution(matrix, None, None)?;
        Ok(self.run_plan(event, &plan, stop).await)
    }

    /// Runs the jobs of an already computed plan.
    /// 运行已计算好的计划中的作业。
    pub async fn run_plan(
        &self,
        event: &TriggerEvent,
        plan: &ExecutionPlan,
        stop: CancellationToken,
    ) -> RunReport {
        let started_at = chrono::Local::now();
        let start = Instant::now();

        let tasks = plan.jobs.iter().cloned().map(|job| {
            let collaborators = Arc::clone(&self.collaborators);
            let options = Arc::clone(&self.options);
            let event = event.clone();
            let stop = stop.clone();
            let fallback = job.clone();

            let handle = tokio::spawn(run_job(collaborators, job, event, options, stop));
            async move {
                match handle.await {
                    Ok(report) => report,
                    Err(e) => crashed_job_report(fallback, e.to_string()),
                }
            }
        });

        let mut jobs: Vec<JobReport> = stream::iter(tasks)
            .buffer_unordered(self.options.jobs.max(1))
            .collect()
            .await;
        jobs.sort_by_key(|report| report.index);

        RunReport {
            event: event.clone(),
            jobs,
            started_at,
            duration: start.elapsed(),
        }
    }
}

fn crashed_job_report(job: PlannedJob, diagnostic: String) -> JobReport {
    JobReport {
        index: job.index,
        version: job.version,
        outcome: JobOutcome::Failed {
            step: Step::Checkout,
            error: StepError::Internal { diagnostic },
        },
        states: vec![JobState::Pending, JobState::Failed],
        log: String::new(),
        duration: Duration::ZERO,
        allow_failure: job.allow_failure,
    }
}

/// Limits applied to every step of one job.
struct StepGuard {
    deadline: Option<tokio::time::Instant>,
    timeout_millis: u64,
    stop: CancellationToken,
}

impl StepGuard {
    /// Awaits `step`, failing with `Cancelled` or `Timeout` if either fires first.
    async fn run<T>(
        &self,
        step: impl Future<Output = Result<T, StepError>>,
    ) -> Result<T, StepError> {
        let bounded = async {
            match self.deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, step)
                    .await
                    .unwrap_or(Err(StepError::Timeout {
                        millis: self.timeout_millis,
                    })),
                None => step.await,
            }
        };

        tokio::select! {
            biased;
            _ = self.stop.cancelled() => Err(StepError::Cancelled),
            res = bounded => res,
        }
    }
}

/// Executes one job from `Pending` to a terminal state.
/// 将一个作业从 `Pending` 执行到终止状态。
async fn run_job<C: Collaborators>(
    collaborators: Arc<C>,
    job: PlannedJob,
    event: TriggerEvent,
    options: Arc<RunOptions>,
    stop: CancellationToken,
) -> JobReport {
    let start = Instant::now();
    let locale = options.locale.as_str();
    let mut instance = JobInstance::new(job.version.clone());
    let mut log = String::new();
    let guard = StepGuard {
        deadline: options
            .timeout
            .map(|timeout| tokio::time::Instant::now() + timeout),
        timeout_millis: options
            .timeout
            .map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or_default(),
        stop,
    };

    println!(
        "{}",
        t!("run.job_started", locale = locale, version = &job.version).blue()
    );

    // The workspace guard lives until the outcome is known so a failed
    // workspace can still be preserved.
    let mut workspace = None;
    let result = run_steps(
        collaborators.as_ref(),
        &job,
        &event,
        &options,
        &guard,
        &mut instance,
        &mut workspace,
        &mut log,
    )
    .await;

    let outcome = match result {
        Ok(()) => {
            if let Err(e) = instance.succeed() {
                fail_instance(&mut instance);
                JobOutcome::Failed {
                    step: Step::Test,
                    error: StepError::Internal {
                        diagnostic: e.to_string(),
                    },
                }
            } else {
                JobOutcome::Succeeded
            }
        }
        Err((step, error)) => {
            fail_instance(&mut instance);
            JobOutcome::Failed { step, error }
        }
    };

    let duration = start.elapsed();
    match &outcome {
        JobOutcome::Succeeded => {
            tracing::info!(version = %job.version, ?duration, "job succeeded");
            println!(
                "{}",
                t!(
                    "run.job_succeeded",
                    locale = locale,
                    version = &job.version,
                    duration = format!("{:.2?}", duration)
                )
                .green()
            );
        }
        JobOutcome::Failed { step, error } => {
            tracing::info!(version = %job.version, %step, kind = error.kind(), "job failed");
            let line = t!(
                "run.job_failed",
                locale = locale,
                version = &job.version,
                step = step.display_name(locale),
                error = error.to_string()
            );
            if job.allow_failure {
                println!("{}", line.yellow());
            } else {
                println!("{}", line.red());
            }

            if let (Some(dir), Some(ws)) = (&options.preserve_failed, &workspace) {
                match fs::preserve_workspace(ws.path(), dir, &job.version) {
                    Ok(path) => println!(
                        "{}",
                        t!(
                            "run.workspace_preserved",
                            locale = locale,
                            version = &job.version,
                            path = path.display()
                        )
                        .yellow()
                    ),
                    Err(e) => tracing::warn!(version = %job.version, error = %e, "could not preserve workspace"),
                }
            }
        }
    }

    // Dropping the guard reclaims the workspace.
    drop(workspace);

    JobReport {
        index: job.index,
        version: job.version,
        outcome,
        states: instance.into_history(),
        log,
        duration,
        allow_failure: job.allow_failure,
    }
}

fn fail_instance(instance: &mut JobInstance) {
    if let Err(e) = instance.fail() {
        tracing::warn!(error = %e, "job already terminal");
    }
}

/// Walks the four steps in order. The first error stops the job and is
/// returned with the step that produced it.
///
/// 按顺序执行四个步骤。第一个错误会停止作业，并连同产生它的步骤一起返回。
#[allow(clippy::too_many_arguments)]
async fn run_steps<C: Collaborators>(
    collaborators: &C,
    job: &PlannedJob,
    event: &TriggerEvent,
    options: &RunOptions,
    guard: &StepGuard,
    instance: &mut JobInstance,
    workspace: &mut Option<tempfile::TempDir>,
    log: &mut String,
) -> Result<(), (Step, StepError)> {
    let enter = |instance: &mut JobInstance, step: Step| {
        instance.enter(step).map_err(|e| {
            (
                step,
                StepError::Internal {
                    diagnostic: e.to_string(),
                },
            )
        })
    };
    let at = |step: Step| move |error: StepError| (step, error);

    enter(instance, Step::Checkout)?;
    let dir = fs::create_workspace(options.workspace_root.as_deref(), &job.version).map_err(|e| {
        (
            Step::Checkout,
            StepError::Workspace {
                diagnostic: format!("{e:#}"),
            },
        )
    })?;
    let ctx = JobContext {
        version: job.version.clone(),
        event: event.clone(),
        workspace: dir.path().to_path_buf(),
    };
    *workspace = Some(dir);

    guard
        .run(collaborators.checkout(&ctx, log))
        .await
        .map_err(at(Step::Checkout))?;

    enter(instance, Step::Provision)?;
    let interpreter = guard
        .run(collaborators.provision(&ctx, log))
        .await
        .map_err(at(Step::Provision))?;

    enter(instance, Step::InstallDependencies)?;
    guard
        .run(collaborators.install_dependencies(&ctx, &interpreter, log))
        .await
        .map_err(at(Step::InstallDependencies))?;

    enter(instance, Step::Test)?;
    guard
        .run(collaborators.run_tests(&ctx, &interpreter, log))
        .await
        .map_err(at(Step::Test))?;

    Ok(())
}
