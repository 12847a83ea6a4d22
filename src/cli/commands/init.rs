//! # Init Command Module / 初始化命令模块
//!
//! Writes a starter `VersionMatrix.toml`, either through an interactive
//! wizard or, with `--non-interactive`, with the defaults.
//!
//! 通过交互式向导，或在 `--non-interactive` 模式下使用默认值，
//! 生成初始的 `VersionMatrix.toml`。

use anyhow::{Context, Result};
use colored::*;
use dialoguer::{Confirm, Input, MultiSelect, theme::ColorfulTheme};
use std::fs;
use std::path::Path;

use crate::core::config::{MatrixConfig, VersionMatrix};
use crate::infra::t;

/// Interpreter versions offered by the wizard.
/// 向导提供的解释器版本。
const CANDIDATE_VERSIONS: [&str; 7] = ["3.7", "3.8", "3.9", "3.10", "3.11", "3.12", "3.13"];

/// Versions selected when the user accepts the defaults.
const DEFAULT_VERSIONS: [&str; 4] = ["3.7", "3.8", "3.9", "3.10"];

/// Runs the interactive wizard to generate the configuration file.
///
/// # Process Flow / 处理流程
/// 1. Confirm overwrite if the file already exists / 如果文件已存在则确认覆盖
/// 2. Select interpreter versions / 选择解释器版本
/// 3. Enter the trigger branch and test command / 输入触发分支和测试命令
/// 4. Write the file / 写入文件
pub fn run_init_wizard(config_path: &Path, language: &str, non_interactive: bool) -> Result<()> {
    let default_config = generate_default_config(language);

    if non_interactive {
        if config_path.exists() {
            anyhow::bail!(
                t!(
                    "init.already_exists",
                    locale = language,
                    path = config_path.display()
                )
                .to_string()
            );
        }
        return write_config(config_path, &default_config, language);
    }

    let theme = ColorfulTheme::default();
    println!("{}", t!("init.welcome", locale = language).bold());

    if config_path.exists() {
        let overwrite = Confirm::with_theme(&theme)
            .with_prompt(t!("init.overwrite_prompt", locale = language, path = config_path.display()))
            .default(false)
            .interact()
            .context(t!("init.user_confirmation_failed", locale = language).to_string())?;
        if !overwrite {
            println!("{}", t!("init.aborted", locale = language));
            return Ok(());
        }
    }

    let defaults: Vec<bool> = CANDIDATE_VERSIONS
        .iter()
        .map(|v| DEFAULT_VERSIONS.contains(v))
        .collect();
    let selections = MultiSelect::with_theme(&theme)
        .with_prompt(t!("init.version_prompt", locale = language))
        .items(&CANDIDATE_VERSIONS)
        .defaults(&defaults)
        .interact()
        .context(t!("init.user_confirmation_failed", locale = language).to_string())?;

    let versions: Vec<&str> = if selections.is_empty() {
        println!("{}", t!("init.no_versions_selected", locale = language).yellow());
        DEFAULT_VERSIONS.to_vec()
    } else {
        selections.into_iter().map(|i| CANDIDATE_VERSIONS[i]).collect()
    };

    let branch: String = Input::with_theme(&theme)
        .with_prompt(t!("init.branch_prompt", locale = language))
        .default("main".to_string())
        .interact_text()
        .context(t!("init.user_confirmation_failed", locale = language).to_string())?;

    let test: String = Input::with_theme(&theme)
        .with_prompt(t!("init.test_command_prompt", locale = language))
        .default(default_config.steps.test.clone())
        .interact_text()
        .context(t!("init.user_confirmation_failed", locale = language).to_string())?;

    let mut config = default_config;
    config.matrix = VersionMatrix::new(versions);
    config.trigger.branches = vec![branch];
    config.steps.test = test;

    write_config(config_path, &config, language)
}

/// The configuration written by `init --non-interactive`.
/// `init --non-interactive` 写入的配置。
pub fn generate_default_config(language: &str) -> MatrixConfig {
    let mut config = MatrixConfig::with_matrix(VersionMatrix::new(DEFAULT_VERSIONS));
    config.language = language.to_string();
    config
}

fn write_config(path: &Path, config: &MatrixConfig, language: &str) -> Result<()> {
    let toml_string = toml::to_string_pretty(config)
        .context(t!("init.serialize_failed", locale = language).to_string())?;

    fs::write(path, toml_string).with_context(|| {
        t!("init.write_failed", locale = language, path = path.display()).to_string()
    })?;

    println!(
        "\n{} {}",
        "✔".green(),
        t!("init.success_created", locale = language, path = path.display()).bold()
    );
    println!("{}", t!("init.usage_hint", locale = language));

    Ok(())
}
