//! # HTML Reporting Module / HTML 报告模块
//!
//! This module renders a run report as a standalone HTML page with summary
//! counts, one row per version and collapsible job logs for failures.
//!
//! 此模块将运行报告渲染为独立的 HTML 页面，包含汇总计数、每个版本一行，
//! 以及失败作业可折叠的日志。

use anyhow::{Context, Result};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fs;
use std::path::Path;

use crate::core::models::{JobReport, RunReport};
use crate::infra::t;

/// Embedded CSS styles for HTML reports / HTML 报告的嵌入式 CSS 样式
const HTML_STYLE: &str = include_str!("assets/report.css");

/// Embedded JavaScript for HTML report interactivity / HTML 报告交互性的嵌入式 JavaScript
const HTML_SCRIPT: &str = include_str!("assets/report.js");

/// Renders the report to an HTML string.
/// 将报告渲染为 HTML 字符串。
pub fn render_html_report(report: &RunReport, locale: &str) -> String {
    let markup = html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (t!("html_report.title", locale = locale)) }
                style { (PreEscaped(HTML_STYLE)) }
            }
            body {
                h1 { (t!("html_report.main_header", locale = locale)) }
                p class="meta" {
                    (report.event.to_string())
                    " · "
                    (report.started_at.format("%Y-%m-%d %H:%M:%S %z").to_string())
                    " · "
                    (format!("{:.2}s", report.duration.as_secs_f64()))
                }
                (summary(report, locale))
                table {
                    thead {
                        tr {
                            th { (t!("html_report.table.version", locale = locale)) }
                            th { (t!("html_report.table.status", locale = locale)) }
                            th { (t!("html_report.table.step", locale = locale)) }
                            th { (t!("html_report.table.error", locale = locale)) }
                            th class="duration-cell" { (t!("html_report.table.duration", locale = locale)) }
                        }
                    }
                    tbody {
                        @for job in &report.jobs {
                            (job_rows(job, locale))
                        }
                    }
                }
                script { (PreEscaped(HTML_SCRIPT)) }
            }
        }
    };
    markup.into_string()
}

fn summary(report: &RunReport, locale: &str) -> Markup {
    html! {
        div class="summary-container" {
            div class="summary-item" {
                span class="count" { (report.jobs.len()) }
                span class="label" { (t!("html_report.summary.total", locale = locale)) }
            }
            div class="summary-item" {
                span class="count succeeded-text" { (report.succeeded_count()) }
                span class="label" { (t!("html_report.summary.succeeded", locale = locale)) }
            }
            div class="summary-item" {
                span class="count failed-text" { (report.failed_count()) }
                span class="label" { (t!("html_report.summary.failed", locale = locale)) }
            }
        }
    }
}

fn job_rows(job: &JobReport, locale: &str) -> Markup {
    let output_id = format!("output-{}", job.index);
    let step = job
        .outcome
        .failed_step()
        .map(|s| s.display_name(locale))
        .unwrap_or_default();
    let error = job.outcome.error().map(|e| e.to_string()).unwrap_or_default();

    html! {
        tr {
            td { (job.version) }
            td {
                div class={ "status-cell " (job.get_status_class()) } { (job.get_status_str(locale)) }
                @if !job.is_success() {
                    div class="output-toggle" onclick={ "toggleOutput('" (output_id) "')" } {
                        (t!("html_report.toggle_output", locale = locale))
                    }
                }
            }
            td { (step) }
            td { (error) }
            td class="duration-cell" { (format!("{:.2}s", job.duration.as_secs_f64())) }
        }
        @if !job.is_success() {
            tr id=(output_id) style="display:none;" {
                td colspan="5" {
                    pre class="output-content" { (job.log) }
                }
            }
        }
    }
}

/// Writes the HTML report to `output_path`.
///
/// # Errors
/// Fails if the file cannot be written.
///
/// 将 HTML 报告写入 `output_path`。
pub fn generate_html_report(report: &RunReport, output_path: &Path, locale: &str) -> Result<()> {
    fs::write(output_path, render_html_report(report, locale))
        .with_context(|| format!("Failed to write HTML report: {}", output_path.display()))
}
