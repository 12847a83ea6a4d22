//! # Infrastructure Module / 基础设施模块
//!
//! This module provides infrastructure services for Version Matrix:
//! command execution, command templates, workspaces, the shell-backed
//! collaborators and logging.
//!
//! 此模块为 Version Matrix 提供基础设施服务：
//! 命令执行、命令模板、工作区、基于 shell 的协作者以及日志。

pub mod command;
pub mod fs;
pub mod logging;
pub mod shell;
pub mod template;

// Re-export i18n functions for easier access
pub use rust_i18n::t;
