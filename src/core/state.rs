//! # Job State Machine / 作业状态机
//!
//! A job moves `Pending -> CheckingOut -> Provisioning -> InstallingDeps -> Testing`
//! and ends in `Succeeded` or `Failed`. Any non-terminal state may jump to `Failed`.
//!
//! 作业按 `Pending -> CheckingOut -> Provisioning -> InstallingDeps -> Testing`
//! 推进，并以 `Succeeded` 或 `Failed` 结束。任何非终止状态都可以直接转为 `Failed`。

use serde::Serialize;
use thiserror::Error;

use crate::core::models::Step;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    CheckingOut,
    Provisioning,
    InstallingDeps,
    Testing,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }

    /// The state a job is in while it runs `step`.
    pub fn for_step(step: Step) -> JobState {
        match step {
            Step::Checkout => JobState::CheckingOut,
            Step::Provision => JobState::Provisioning,
            Step::InstallDependencies => JobState::InstallingDeps,
            Step::Test => JobState::Testing,
        }
    }

    /// The successor on the happy path.
    fn next(self) -> Option<JobState> {
        match self {
            JobState::Pending => Some(JobState::CheckingOut),
            JobState::CheckingOut => Some(JobState::Provisioning),
            JobState::Provisioning => Some(JobState::InstallingDeps),
            JobState::InstallingDeps => Some(JobState::Testing),
            JobState::Testing => Some(JobState::Succeeded),
            JobState::Succeeded | JobState::Failed => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal job transition {from:?} -> {to:?}")]
pub struct TransitionError {
    pub from: JobState,
    pub to: JobState,
}

/// Tracks the state of one job and every state it has been in.
/// 跟踪单个作业的状态及其经历过的所有状态。
#[derive(Debug, Clone)]
pub struct JobInstance {
    version: String,
    history: Vec<JobState>,
}

impl JobInstance {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            history: vec![JobState::Pending],
        }
    }

    pub fn state(&self) -> JobState {
        // history always starts with Pending
        self.history.last().copied().unwrap_or(JobState::Pending)
    }

    pub fn history(&self) -> &[JobState] {
        &self.history
    }

    /// Enters the working state of `step`. Steps must be entered in order.
    /// 进入 `step` 的工作状态。步骤必须按顺序进入。
    pub fn enter(&mut self, step: Step) -> Result<(), TransitionError> {
        self.transition(JobState::for_step(step))
    }

    /// Moves from `Testing` to `Succeeded`.
    pub fn succeed(&mut self) -> Result<(), TransitionError> {
        self.transition(JobState::Succeeded)
    }

    /// Moves from any non-terminal state to `Failed`.
    pub fn fail(&mut self) -> Result<(), TransitionError> {
        self.transition(JobState::Failed)
    }

    fn transition(&mut self, to: JobState) -> Result<(), TransitionError> {
        let from = self.state();
        let legal = match to {
            JobState::Failed => !from.is_terminal(),
            _ => from.next() == Some(to),
        };
        if !legal {
            return Err(TransitionError { from, to });
        }
        tracing::debug!(version = %self.version, ?from, ?to, "job transition");
        self.history.push(to);
        Ok(())
    }

    pub fn into_history(self) -> Vec<JobState> {
        self.history
    }
}
