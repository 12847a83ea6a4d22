//! # Trigger Module / 触发模块
//!
//! Models the events that start a run (a push to, or a pull request targeting,
//! a branch) and the filter that decides whether an event triggers the matrix.
//!
//! 对启动运行的事件（推送到某个分支，或以某个分支为目标的拉取请求）
//! 以及决定事件是否触发矩阵的过滤器进行建模。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of event that started a run.
/// 启动运行的事件类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Push,
    PullRequest,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Push => f.write_str("push"),
            EventKind::PullRequest => f.write_str("pull_request"),
        }
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "push" => Ok(EventKind::Push),
            "pull_request" | "pull-request" => Ok(EventKind::PullRequest),
            other => Err(format!(
                "unknown event '{other}', expected 'push' or 'pull_request'"
            )),
        }
    }
}

/// A trigger event: an event kind plus the branch it targets.
/// 触发事件：事件类型及其目标分支。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerEvent {
    pub kind: EventKind,
    /// The branch pushed to, or the base branch of the pull request.
    /// 推送到的分支，或拉取请求的目标分支。
    pub branch: String,
    /// The reference to check out. Defaults to `branch`.
    /// 要检出的引用，默认为 `branch`。
    pub reference: Option<String>,
}

impl TriggerEvent {
    pub fn new(kind: EventKind, branch: impl Into<String>) -> Self {
        Self {
            kind,
            branch: branch.into(),
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// The reference the checkout step should fetch.
    pub fn checkout_ref(&self) -> &str {
        self.reference.as_deref().unwrap_or(&self.branch)
    }
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.kind, self.branch)?;
        if let Some(reference) = &self.reference {
            write!(f, " ({reference})")?;
        }
        Ok(())
    }
}

/// Which events trigger the matrix. Mirrors the `[trigger]` table of the config.
/// 哪些事件会触发矩阵。对应配置文件中的 `[trigger]` 表。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerFilter {
    #[serde(default = "default_events")]
    pub events: Vec<EventKind>,
    /// Branch names; a trailing `*` matches any suffix.
    /// 分支名称；末尾的 `*` 匹配任意后缀。
    #[serde(default = "default_branches")]
    pub branches: Vec<String>,
}

fn default_events() -> Vec<EventKind> {
    vec![EventKind::Push, EventKind::PullRequest]
}

fn default_branches() -> Vec<String> {
    vec!["main".to_string()]
}

impl Default for TriggerFilter {
    fn default() -> Self {
        Self {
            events: default_events(),
            branches: default_branches(),
        }
    }
}

impl TriggerFilter {
    pub fn matches(&self, event: &TriggerEvent) -> bool {
        self.events.contains(&event.kind)
            && self
                .branches
                .iter()
                .any(|pattern| branch_matches(pattern, &event.branch))
    }

    /// The branch assumed when neither the CLI nor the environment names one.
    pub fn default_branch(&self) -> &str {
        self.branches
            .iter()
            .find(|b| !b.contains('*'))
            .map(String::as_str)
            .unwrap_or("main")
    }
}

fn branch_matches(pattern: &str, branch: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => branch.starts_with(prefix),
        None => pattern == branch,
    }
}

/// Resolves the trigger event from explicit values, falling back to the
/// GitHub Actions environment variables looked up through `env`, and finally
/// to a push on the filter's default branch.
///
/// 从显式参数解析触发事件，依次回退到通过 `env` 查找的 GitHub Actions
/// 环境变量，最后回退为对过滤器默认分支的推送。
pub fn resolve_event(
    kind: Option<EventKind>,
    branch: Option<String>,
    reference: Option<String>,
    filter: &TriggerFilter,
    env: impl Fn(&str) -> Option<String>,
) -> TriggerEvent {
    let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    let kind = kind
        .or_else(|| non_empty("GITHUB_EVENT_NAME").and_then(|e| e.parse().ok()))
        .unwrap_or(EventKind::Push);

    let branch = branch
        .or_else(|| match kind {
            EventKind::PullRequest => non_empty("GITHUB_BASE_REF"),
            EventKind::Push => non_empty("GITHUB_REF_NAME"),
        })
        .unwrap_or_else(|| filter.default_branch().to_string());

    let reference = reference.or_else(|| match kind {
        EventKind::PullRequest => non_empty("GITHUB_HEAD_REF"),
        EventKind::Push => None,
    });

    TriggerEvent {
        kind,
        branch,
        reference,
    }
}
