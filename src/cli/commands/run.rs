//! # Run Command Module / 运行命令模块
//!
//! This module implements the `run` command: it loads the configuration,
//! resolves the trigger event, plans the jobs and drives the orchestrator
//! with shell collaborators, then reports.
//!
//! 此模块实现 `run` 命令：加载配置、解析触发事件、规划作业，
//! 使用 shell 协作者驱动编排器，然后生成报告。

use anyhow::{Context, Result};
use colored::*;
use std::{env, fs, path::Path, path::PathBuf, time::Duration};
use tokio::signal;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        config::MatrixConfig,
        execution::{Orchestrator, RunOptions},
        planner::{self, ExecutionPlan},
        trigger::{self, EventKind, TriggerEvent},
    },
    infra::{shell::ShellCollaborators, t},
    reporting::{
        console::{print_summary, print_unexpected_failure_details},
        html::generate_html_report,
        json::generate_json_report,
    },
};

/// Arguments of the `run` command.
/// `run` 命令的参数。
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub config: PathBuf,
    pub project_dir: PathBuf,
    pub jobs: Option<usize>,
    pub event: Option<EventKind>,
    pub branch: Option<String>,
    pub reference: Option<String>,
    pub total_runners: Option<usize>,
    pub runner_index: Option<usize>,
    pub html: Option<PathBuf>,
    pub json: Option<PathBuf>,
    pub preserve_failed: Option<PathBuf>,
    pub dry_run: bool,
    /// Language given on the command line; wins over the config file.
    pub lang: Option<String>,
}

/// Executes the run command with the provided arguments.
///
/// # Returns
/// `Ok` when the event did not trigger a run or every job succeeded (allowed
/// failures excepted); an error otherwise.
pub async fn execute(args: RunArgs) -> Result<()> {
    let (config, config_path) = setup_and_parse_config(&args.config)?;
    let locale = crate::resolve_locale(args.lang.as_deref().or(Some(config.language.as_str())));
    rust_i18n::set_locale(&locale);
    let locale = locale.as_str();

    let project_root = fs::canonicalize(&args.project_dir).with_context(|| {
        t!(
            "run.project_dir_not_found",
            locale = locale,
            path = args.project_dir.display()
        )
        .to_string()
    })?;
    let repository = resolve_repository(config.source.repository.as_deref(), &project_root);

    println!(
        "{}",
        t!("run.loading_config", locale = locale, path = config_path.display())
    );

    let event = trigger::resolve_event(
        args.event,
        args.branch.clone(),
        args.reference.clone(),
        &config.trigger,
        |key| env::var(key).ok(),
    );
    println!(
        "{}",
        t!("run.event_detected", locale = locale, event = event.to_string()).cyan()
    );

    if !config.trigger.matches(&event) {
        println!(
            "{}",
            t!("run.event_not_triggered", locale = locale, event = event.to_string()).yellow()
        );
        return Ok(());
    }

    let plan = planner::plan_execution(&config.matrix, args.total_runners, args.runner_index)?;
    print_plan_overview(&plan, &args, locale);

    if args.dry_run {
        print_dry_run(&plan, &event, &repository, locale);
        return Ok(());
    }

    if plan.jobs.is_empty() {
        println!("{}", t!("run.no_jobs_to_run", locale = locale).green());
        return Ok(());
    }

    let stop = setup_signal_handler(locale);
    let options = RunOptions {
        jobs: args.jobs.unwrap_or(num_cpus::get() / 2 + 1),
        timeout: config.timeout_secs.map(Duration::from_secs),
        preserve_failed: args
            .preserve_failed
            .as_ref()
            .map(|dir| absolutize(dir, &project_root)),
        workspace_root: None,
        locale: locale.to_string(),
    };
    let orchestrator = Orchestrator::new(
        ShellCollaborators::new(config.steps.clone(), repository),
        options,
    );
    let report = orchestrator.run_plan(&event, &plan, stop).await;

    print_summary(&report, locale);

    if let Some(path) = &args.html {
        println!(
            "\n{}",
            t!("run.generating_html", locale = locale, path = path.display())
        );
        if let Err(e) = generate_html_report(&report, path, locale) {
            eprintln!("{} {e:#}", t!("run.report_failed", locale = locale).red());
        }
    }
    if let Some(path) = &args.json {
        println!(
            "\n{}",
            t!("run.generating_json", locale = locale, path = path.display())
        );
        if let Err(e) = generate_json_report(&report, path) {
            eprintln!("{} {e:#}", t!("run.report_failed", locale = locale).red());
        }
    }

    if report.is_success() {
        println!("\n{}", t!("run.all_jobs_passed", locale = locale).green().bold());
        Ok(())
    } else {
        print_unexpected_failure_details(&report.unexpected_failures(), locale);
        anyhow::bail!(
            t!(
                "run.matrix_failed",
                locale = locale,
                count = report.unexpected_failures().len()
            )
            .to_string()
        );
    }
}

fn setup_and_parse_config(config_path_arg: &PathBuf) -> Result<(MatrixConfig, PathBuf)> {
    // For config parsing, we don't have the locale yet. Use English as a default.
    let locale = "en";
    let config_path = fs::canonicalize(config_path_arg).with_context(|| {
        t!(
            "run.config_read_failed",
            locale = locale,
            path = config_path_arg.display()
        )
        .to_string()
    })?;
    let config = MatrixConfig::load(&config_path)?;
    Ok((config, config_path))
}

/// A local repository path is resolved against the project root;
/// URLs are passed through.
fn resolve_repository(configured: Option<&str>, project_root: &Path) -> String {
    let Some(repository) = configured else {
        return project_root.display().to_string();
    };
    if repository.contains("://") || repository.starts_with("git@") {
        return repository.to_string();
    }
    let path = absolutize(Path::new(repository), project_root);
    fs::canonicalize(&path)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn print_plan_overview(plan: &ExecutionPlan, args: &RunArgs, locale: &str) {
    if plan.duplicate_count > 0 {
        println!(
            "{}",
            t!("run.duplicates_collapsed", locale = locale, count = plan.duplicate_count).yellow()
        );
    }
    if plan.allowed_failure_count > 0 {
        println!(
            "{}",
            t!(
                "run.allowed_failures_found",
                locale = locale,
                count = plan.allowed_failure_count
            )
            .yellow()
        );
    }

    if let (Some(total), Some(index)) = (args.total_runners, args.runner_index) {
        println!(
            "{}",
            t!(
                "run.running_as_split_runner",
                locale = locale,
                index = index,
                total = total,
                count = plan.jobs.len()
            )
            .bold()
        );
    } else {
        println!(
            "{}",
            t!("run.running_as_single_runner", locale = locale, count = plan.jobs.len()).bold()
        );
    }
}

fn print_dry_run(plan: &ExecutionPlan, event: &TriggerEvent, repository: &str, locale: &str) {
    println!(
        "\n{}",
        t!("run.dry_run_banner", locale = locale, repository = repository).bold()
    );
    for job in &plan.jobs {
        let marker = if job.allow_failure {
            t!("run.dry_run_allow_failure", locale = locale).to_string()
        } else {
            String::new()
        };
        println!(
            "  - {} @ {}{}",
            job.version.cyan(),
            event.checkout_ref(),
            marker.as_str().yellow()
        );
    }
}

fn setup_signal_handler(locale: &str) -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();
    let locale = locale.to_string();

    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                println!("\n{}", t!("run.shutdown_signal", locale = &locale).yellow());
                token_clone.cancel();
            }
            Err(e) => tracing::warn!("failed to listen for Ctrl-C: {e}"),
        }
    });

    token
}
