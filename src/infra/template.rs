//! # Command Template Module / 命令模板模块
//!
//! Step commands are written as templates such as
//! `{python} -m pip install -r {manifest}`. Expansion expands environment
//! variables and `~`, substitutes `{placeholder}`s with shell-quoted values and
//! splits the result into an argv vector, so every argument stays delimited.
//!
//! 步骤命令以模板形式编写，例如 `{python} -m pip install -r {manifest}`。
//! 展开时先展开环境变量和 `~`，再用经过 shell 转义的值替换 `{placeholder}`，
//! 最后拆分为 argv 向量，保证每个参数都被正确分隔。

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("failed to expand '{template}': {message}")]
    Expand { template: String, message: String },
    #[error("value for {{{name}}} cannot be quoted")]
    Quote { name: String },
    #[error("failed to parse command: {0}")]
    Parse(String),
    #[error("command template is empty")]
    Empty,
}

/// Expands `template` into an argv vector.
///
/// # Arguments
/// * `template` - The command template
/// * `vars` - `(name, value)` pairs substituted for `{name}`
pub fn expand(template: &str, vars: &[(&str, &str)]) -> Result<Vec<String>, TemplateError> {
    let expanded = shellexpand::full(template).map_err(|e| TemplateError::Expand {
        template: template.to_string(),
        message: e.to_string(),
    })?;

    let mut command = expanded.into_owned();
    for (name, value) in vars {
        let placeholder = format!("{{{name}}}");
        if !command.contains(&placeholder) {
            continue;
        }
        let quoted = shlex::try_quote(value).map_err(|_| TemplateError::Quote {
            name: name.to_string(),
        })?;
        command = command.replace(&placeholder, &quoted);
    }

    let argv = shlex::split(&command).ok_or_else(|| TemplateError::Parse(command.clone()))?;
    if argv.is_empty() {
        return Err(TemplateError::Empty);
    }
    Ok(argv)
}

/// Substitutes placeholders without quoting or splitting; used for paths.
/// 仅替换占位符而不转义或拆分；用于路径。
pub fn substitute(template: &str, vars: &[(&str, &str)]) -> Result<String, TemplateError> {
    let expanded = shellexpand::full(template).map_err(|e| TemplateError::Expand {
        template: template.to_string(),
        message: e.to_string(),
    })?;
    let mut value = expanded.into_owned();
    for (name, replacement) in vars {
        value = value.replace(&format!("{{{name}}}"), replacement);
    }
    Ok(value)
}
