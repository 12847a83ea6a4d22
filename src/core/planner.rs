//! # Execution Planner Module / 执行计划模块
//!
//! Turns a version matrix into the list of jobs this runner executes:
//! duplicates collapse, allowed failures are counted and, when running as one
//! of several CI runners, the matrix is sharded.
//!
//! 将版本矩阵转换为此运行器要执行的作业列表：
//! 合并重复项、统计允许失败的版本，并在作为多个 CI 运行器之一时对矩阵分片。

use crate::core::config::{ConfigError, VersionMatrix};

/// A version scheduled to run, with its position in the declared matrix.
/// 计划运行的版本及其在声明矩阵中的位置。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedJob {
    pub index: usize,
    pub version: String,
    pub allow_failure: bool,
}

/// Represents a complete execution plan for a version matrix.
/// 表示版本矩阵的完整执行计划。
#[derive(Debug)]
pub struct ExecutionPlan {
    /// Jobs for this runner, in declared order.
    /// 此运行器的作业，按声明顺序排列。
    pub jobs: Vec<PlannedJob>,
    /// How many duplicate identifiers were collapsed.
    /// 被合并的重复标识符数量。
    pub duplicate_count: usize,
    /// How many planned versions may fail without failing the run.
    /// 允许失败而不影响整体运行的计划版本数量。
    pub allowed_failure_count: usize,
    /// Whether the matrix is split across multiple runners.
    /// 矩阵是否分布在多个运行器上。
    pub is_distributed: bool,
}

/// Creates the execution plan for `matrix`.
///
/// # Arguments
/// * `matrix` - The version matrix; validated here.
/// * `total_runners` - Optional total number of runners for distributed execution
/// * `runner_index` - Optional index of this runner (0-based)
pub fn plan_execution(
    matrix: &VersionMatrix,
    total_runners: Option<usize>,
    runner_index: Option<usize>,
) -> Result<ExecutionPlan, ConfigError> {
    matrix.validate()?;

    let mut distinct: Vec<PlannedJob> = Vec::with_capacity(matrix.versions.len());
    for version in &matrix.versions {
        let version = version.trim();
        if distinct.iter().any(|job| job.version == version) {
            continue;
        }
        distinct.push(PlannedJob {
            index: distinct.len(),
            version: version.to_string(),
            allow_failure: matrix.allows_failure(version),
        });
    }
    let duplicate_count = matrix.versions.len() - distinct.len();

    let (jobs, is_distributed) = match (total_runners, runner_index) {
        (Some(total), Some(index)) => {
            if total == 0 || index >= total {
                return Err(ConfigError::InvalidRunnerIndex { index, total });
            }
            let shard = distinct
                .into_iter()
                .filter(|job| job.index % total == index)
                .collect();
            (shard, true)
        }
        (None, None) => (distinct, false),
        _ => return Err(ConfigError::IncompleteSharding),
    };

    let allowed_failure_count = jobs.iter().filter(|job| job.allow_failure).count();

    Ok(ExecutionPlan {
        jobs,
        duplicate_count,
        allowed_failure_count,
        is_distributed,
    })
}
