//! # Configuration Module / 配置模块
//!
//! Defines the `VersionMatrix.toml` file model: trigger filter, version matrix,
//! source repository and step command templates.
//!
//! 定义 `VersionMatrix.toml` 文件模型：触发过滤器、版本矩阵、源仓库以及步骤命令模板。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::trigger::TriggerFilter;

/// The default name for the configuration file.
/// 配置文件的默认名称。
pub const CONFIG_FILE_NAME: &str = "VersionMatrix.toml";

/// Errors raised while loading or validating configuration.
/// Any of these aborts the run before a job is created.
///
/// 加载或校验配置时产生的错误。
/// 任何一个都会在创建作业之前中止运行。
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("the version matrix is empty; at least one interpreter version is required")]
    EmptyMatrix,
    #[error("the version matrix contains a blank version identifier at position {0}")]
    BlankVersion(usize),
    #[error("allow_failure lists '{0}', which is not in the version matrix")]
    UnknownAllowFailure(String),
    #[error("both --total-runners and --runner-index must be provided")]
    IncompleteSharding,
    #[error("runner index {index} must be less than total runners {total}")]
    InvalidRunnerIndex { index: usize, total: usize },
}

/// The set of interpreter versions to test against.
/// 需要测试的解释器版本集合。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VersionMatrix {
    /// Interpreter version identifiers. Must be non-empty.
    /// 解释器版本标识符，不能为空。
    pub versions: Vec<String>,
    /// Versions whose failure does not fail the run.
    /// 失败不会导致整体运行失败的版本。
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow_failure: Vec<String>,
}

impl VersionMatrix {
    pub fn new<I, S>(versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            versions: versions.into_iter().map(Into::into).collect(),
            allow_failure: Vec::new(),
        }
    }

    pub fn with_allow_failure<I, S>(mut self, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow_failure = versions.into_iter().map(Into::into).collect();
        self
    }

    /// Checks the matrix invariants: non-empty, no blank identifiers and
    /// `allow_failure` only naming versions of the matrix.
    ///
    /// 检查矩阵不变量：非空、没有空白标识符，且 `allow_failure`
    /// 只能列出矩阵中的版本。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.versions.is_empty() {
            return Err(ConfigError::EmptyMatrix);
        }
        if let Some(pos) = self.versions.iter().position(|v| v.trim().is_empty()) {
            return Err(ConfigError::BlankVersion(pos));
        }
        if let Some(unknown) = self
            .allow_failure
            .iter()
            .find(|v| !self.versions.iter().any(|known| known.trim() == v.trim()))
        {
            return Err(ConfigError::UnknownAllowFailure(unknown.clone()));
        }
        Ok(())
    }

    /// Whether `version` is listed in `allow_failure`, ignoring surrounding whitespace.
    pub fn allows_failure(&self, version: &str) -> bool {
        self.allow_failure.iter().any(|v| v.trim() == version.trim())
    }
}

/// Where the checkout step fetches the repository from.
/// 检出步骤从何处获取仓库。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    /// A path or URL. Defaults to the project directory.
    /// 路径或 URL，默认为项目目录。
    #[serde(default)]
    pub repository: Option<String>,
}

/// Command templates for the four steps.
/// Every field is optional in the file and falls back to the Python defaults.
///
/// 四个步骤的命令模板。
/// 文件中的每个字段都是可选的，缺省时使用 Python 默认值。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepsConfig {
    pub checkout: String,
    pub provision: String,
    /// The interpreter program once provisioned. Available as `{python}`.
    /// 配置完成后的解释器程序，可通过 `{python}` 引用。
    pub interpreter: String,
    /// Empty disables the installer upgrade.
    pub upgrade_installer: String,
    pub install: String,
    /// Relative to the workspace. Empty disables manifest installation.
    /// 相对于工作区的路径。为空时跳过清单安装。
    pub manifest: String,
    pub test: String,
}

impl Default for StepsConfig {
    fn default() -> Self {
        Self {
            checkout: "git clone --quiet --depth 1 --branch {ref} {repository} {workspace}"
                .to_string(),
            provision: "python{version} -m venv {workspace}/.venv".to_string(),
            interpreter: default_interpreter().to_string(),
            upgrade_installer: "{python} -m pip install --upgrade pip".to_string(),
            install: "{python} -m pip install -r {manifest}".to_string(),
            manifest: "requirements.txt".to_string(),
            test: "{python} run_tests.py".to_string(),
        }
    }
}

#[cfg(windows)]
fn default_interpreter() -> &'static str {
    "{workspace}/.venv/Scripts/python.exe"
}

#[cfg(not(windows))]
fn default_interpreter() -> &'static str {
    "{workspace}/.venv/bin/python"
}

/// Represents the entire configuration, loaded from a TOML file.
/// 代表从 TOML 文件加载的完整配置。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixConfig {
    /// The language for output messages (e.g., "en", "zh-CN").
    /// 输出消息的语言（例如 "en", "zh-CN"）。
    #[serde(default = "default_language")]
    pub language: String,

    /// Optional timeout for each job, in seconds.
    /// 每个作业的可选超时时间（秒）。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub trigger: TriggerFilter,

    pub matrix: VersionMatrix,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub steps: StepsConfig,
}

fn default_language() -> String {
    "en".to_string()
}

impl MatrixConfig {
    /// A configuration with defaults around the given matrix.
    pub fn with_matrix(matrix: VersionMatrix) -> Self {
        Self {
            language: default_language(),
            timeout_secs: None,
            trigger: TriggerFilter::default(),
            matrix,
            source: SourceConfig::default(),
            steps: StepsConfig::default(),
        }
    }

    /// Parses configuration from TOML text and validates it.
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: MatrixConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.matrix.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    /// 读取、解析并校验配置文件。
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content, path)
    }
}
