//! # File System Operations Module / 文件系统操作模块
//!
//! Creates the exclusive temporary workspace of each job and preserves the
//! workspace of failed jobs for inspection.
//!
//! 为每个作业创建独占的临时工作区，并保留失败作业的工作区以供检查。

use anyhow::{Context, Result};
use fs_extra::dir::{CopyOptions, copy};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Replaces every character that is not alphanumeric with `_`.
/// `3.10` becomes `3_10`.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// Creates a unique, empty workspace for the job of `version`.
/// The directory is removed when the returned `TempDir` is dropped.
///
/// # Arguments
/// * `root` - Parent directory; the system temp dir when `None`
/// * `version` - The job's version, used in the directory name
///
/// 为 `version` 的作业创建一个唯一的空工作区。
/// 返回的 `TempDir` 被丢弃时目录会被删除。
pub fn create_workspace(root: Option<&Path>, version: &str) -> Result<TempDir> {
    let prefix = format!("version-matrix-{}-", sanitize_name(version));
    let mut builder = tempfile::Builder::new();
    builder.prefix(&prefix);

    match root {
        Some(root) => {
            fs::create_dir_all(root).with_context(|| {
                format!("Failed to create workspace root: {}", root.display())
            })?;
            builder.tempdir_in(root)
        }
        None => builder.tempdir(),
    }
    .with_context(|| format!("Failed to create workspace for version {version}"))
}

/// Copies a failed job's workspace to `<dest_root>/<sanitized version>`,
/// replacing an older copy.
///
/// # Returns
/// The path of the preserved copy.
///
/// 将失败作业的工作区复制到 `<dest_root>/<清理后的版本名>`，替换旧副本。
pub fn preserve_workspace(workspace: &Path, dest_root: &Path, version: &str) -> Result<PathBuf> {
    let dest = dest_root.join(sanitize_name(version));
    if dest.exists() {
        fs::remove_dir_all(&dest).with_context(|| {
            format!("Failed to clean up old preserved workspace: {}", dest.display())
        })?;
    }
    fs::create_dir_all(&dest)
        .with_context(|| format!("Failed to create directory: {}", dest.display()))?;

    let mut options = CopyOptions::new();
    options.overwrite = true;
    options.content_only = true;
    copy(workspace, &dest, &options).with_context(|| {
        format!(
            "Failed to copy workspace {} to {}",
            workspace.display(),
            dest.display()
        )
    })?;
    Ok(dest)
}
