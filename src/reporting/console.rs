//! # Console Reporting Module / 控制台报告模块
//!
//! This module prints the run summary and the details of unexpected failures
//! to the console, with color and internationalization support.
//!
//! 此模块在控制台打印运行摘要和意外失败的详细信息，支持颜色和国际化。

use colored::*;

use crate::core::models::{JobOutcome, JobReport, RunReport, StepError};
use crate::infra::command::tail_lines;
use crate::infra::t;

/// How many trailing log lines are shown per failed job.
const FAILURE_LOG_LINES: usize = 60;

/// Prints a formatted summary of job results to the console.
///
/// 在控制台打印格式化的作业结果摘要。
///
/// # Output Format / 输出格式
/// ```text
/// --- Matrix Summary ---
///   - Status           | Version    | Step                   |   Duration
///   - Succeeded        | 3.8        |                        |     12.31s
///   - Failed           | 3.7        | Install dependencies   |      4.05s
/// ```
pub fn print_summary(report: &RunReport, locale: &str) {
    println!("\n{}", t!("report.summary_banner", locale = locale).bold());
    println!(
        "{}",
        t!("report.summary_event", locale = locale, event = report.event.to_string()).dimmed()
    );

    for job in &report.jobs {
        let status_str = job.get_status_str(locale);
        let status_colored = match &job.outcome {
            JobOutcome::Succeeded => status_str.green(),
            JobOutcome::Failed { .. } if job.allow_failure => status_str.yellow(),
            JobOutcome::Failed { .. } => status_str.red(),
        };
        let step = job
            .outcome
            .failed_step()
            .map(|s| s.display_name(locale))
            .unwrap_or_default();

        println!(
            "  - {:<18} | {:<10} | {:<22} | {:>10}",
            status_colored,
            job.version,
            step,
            format!("{:.2?}", job.duration)
        );
    }

    println!(
        "{}",
        t!(
            "report.summary_counts",
            locale = locale,
            total = report.jobs.len(),
            succeeded = report.succeeded_count(),
            failed = report.failed_count()
        )
    );
}

/// Prints, for every unexpected failure, the failing step, the error and the
/// tail of the job log.
///
/// 为每个意外失败打印失败的步骤、错误以及作业日志的末尾部分。
pub fn print_unexpected_failure_details(failures: &[&JobReport], locale: &str) {
    if failures.is_empty() {
        return;
    }

    println!("\n{}", t!("report.unexpected_failure_banner", locale = locale).red().bold());
    println!("{}", "-".repeat(80));

    for (i, job) in failures.iter().enumerate() {
        let JobOutcome::Failed { step, error } = &job.outcome else {
            continue;
        };
        println!(
            "[{}/{}] {} '{}' ({})",
            i + 1,
            failures.len(),
            t!("report.failure_header", locale = locale).red(),
            job.version.cyan(),
            step.display_name(locale)
        );
        println!("{} {}", error.kind().red().bold(), error);

        if let StepError::DependencyInstall { errors, .. } = error {
            for line in errors {
                println!("    {}", line.yellow());
            }
        }

        let log = tail_lines(&job.log, FAILURE_LOG_LINES);
        if !log.is_empty() {
            println!("\n--- {} ---\n", t!("report.job_log", locale = locale).yellow());
            println!("{log}");
        }
        println!("\n{}", "-".repeat(80));
    }
}
