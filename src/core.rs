//! # Core Module / 核心模块
//!
//! This module contains the core functionality of Version Matrix:
//! configuration, trigger events, the job state machine, the collaborator
//! seam, planning and the orchestrator.
//!
//! 此模块包含 Version Matrix 的核心功能：
//! 配置、触发事件、作业状态机、协作者接口、执行计划以及编排器。

pub mod collaborator;
pub mod config;
pub mod execution;
pub mod models;
pub mod planner;
pub mod state;
pub mod trigger;

// Re-exports
pub use collaborator::Collaborators;
pub use config::{ConfigError, MatrixConfig, VersionMatrix};
pub use execution::{Orchestrator, RunOptions};
pub use models::{JobOutcome, JobReport, RunReport, Step, StepError};
pub use trigger::{EventKind, TriggerEvent};
