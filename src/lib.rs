//! # Version Matrix Library / Version Matrix 库
//!
//! This library provides the core functionality for the Version Matrix tool,
//! which checks out a repository once per interpreter version, provisions that
//! version, installs the declared dependencies and runs the test suite.
//!
//! 此库为 Version Matrix 工具提供核心功能：
//! 针对每个解释器版本检出仓库、配置该版本、安装声明的依赖并运行测试套件。
//!
//! ## Modules / 模块
//!
//! - `core` - Configuration, trigger events, job state machine and the orchestrator
//! - `infra` - Command execution, templates, workspaces and shell collaborators
//! - `reporting` - Console, HTML and JSON reports
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 配置、触发事件、作业状态机和编排器
//! - `infra` - 命令执行、模板、工作区和 shell 协作者
//! - `reporting` - 控制台、HTML 和 JSON 报告
//! - `cli` - 命令行接口和命令

pub mod cli;
pub mod core;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use core::config;
pub use core::execution;
pub use core::models;

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");

/// Picks the locale to use: an explicit choice when it is available,
/// otherwise the system locale, matching the full tag (e.g. "zh-CN") before
/// the bare language (e.g. "en"), and finally "en".
///
/// 选择要使用的语言区域：优先使用可用的显式选择，否则使用系统区域，
/// 先匹配完整标签（如 "zh-CN"），再匹配语言部分（如 "en"），最后回退到 "en"。
pub fn resolve_locale(requested: Option<&str>) -> String {
    let available = rust_i18n::available_locales!();
    let pick = |candidate: &str| -> Option<String> {
        if available.iter().any(|l| *l == candidate) {
            return Some(candidate.to_string());
        }
        candidate
            .split(['-', '_'])
            .next()
            .filter(|lang| available.iter().any(|l| l == lang))
            .map(str::to_string)
    };

    requested
        .and_then(pick)
        .or_else(|| sys_locale::get_locale().and_then(|l| pick(&l)))
        .unwrap_or_else(|| "en".to_string())
}
