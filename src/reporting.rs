//! # Reporting Module / 报告模块
//!
//! This module handles the generation and display of run reports in multiple formats:
//! a colorful console summary, a styled HTML page and a JSON document.
//!
//! 此模块处理多种格式的运行报告生成和显示：
//! 彩色的控制台摘要、样式化的 HTML 页面以及 JSON 文档。

pub mod console;
pub mod html;
pub mod json;

// Re-export common reporting functions
pub use console::{print_summary, print_unexpected_failure_details};
pub use html::generate_html_report;
pub use json::generate_json_report;
