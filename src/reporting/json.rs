//! # JSON Reporting Module / JSON 报告模块
//!
//! Serializes the run report for other tools to consume.
//!
//! 将运行报告序列化以供其他工具使用。

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::core::models::RunReport;

/// Renders the report as pretty-printed JSON.
pub fn render_json_report(report: &RunReport) -> Result<String> {
    let mut value = serde_json::to_value(report).context("Failed to serialize run report")?;
    if let Some(map) = value.as_object_mut() {
        map.insert("success".to_string(), serde_json::Value::Bool(report.is_success()));
    }
    serde_json::to_string_pretty(&value).context("Failed to serialize run report")
}

/// Writes the JSON report to `output_path`.
/// 将 JSON 报告写入 `output_path`。
pub fn generate_json_report(report: &RunReport, output_path: &Path) -> Result<()> {
    let json = render_json_report(report)?;
    fs::write(output_path, json)
        .with_context(|| format!("Failed to write JSON report: {}", output_path.display()))
}
