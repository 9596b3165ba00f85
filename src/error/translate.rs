//! Failure translation: turns pipeline errors into user-facing diagnostics.
//!
//! Structured variants of [`NodeError`] are classified directly. Only errors
//! that arrive as plain text (SDK stderr, stream failures) go through the
//! message patterns below, which depend on the wording the CLI happens to use.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use strum::Display;

use super::NodeError;

const INSTALL_HELP: &str = "Install the Claude Code CLI with `npm install -g @anthropic-ai/claude-code`, \
make sure the `claude` binary is on the PATH of the process running the workflow \
(or set CLAUDE_CODE_CLI_PATH), then run `claude` once to finish setup.";

const AUTH_HELP: &str = "Run `claude login` on the machine running the workflow, \
or provide a valid ANTHROPIC_API_KEY in its environment.";

const PERMISSION_HELP: &str = "Check that the workflow process can read and write the project path. \
If tool permissions are being enforced, disable `requirePermissions` or allow the tools the prompt needs.";

/// Diagnostic category assigned to a failed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    Validation,
    Timeout,
    CliUnavailable,
    Authentication,
    Permission,
    Execution,
}

/// A categorized failure ready to be raised or recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub kind: FailureKind,
    /// Short, user-facing message.
    pub message: String,
    /// Long-form remediation, when there is one.
    pub description: Option<String>,
    /// The raw error text.
    pub details: String,
}

impl Failure {
    /// Value of the `errorType` field in continue-on-fail records.
    pub fn error_type(&self) -> &'static str {
        match self.kind {
            FailureKind::Timeout => "timeout",
            _ => "execution_error",
        }
    }
}

/// Translate an error raised while processing one item.
///
/// `timeout_secs` is the item's configured timeout, quoted in the timeout
/// message.
pub fn translate(error: &NodeError, timeout_secs: u64) -> Failure {
    let details = error.to_string();
    let kind = structured_kind(error).unwrap_or_else(|| kind_from_message(&details));
    build(kind, details, timeout_secs)
}

fn structured_kind(error: &NodeError) -> Option<FailureKind> {
    match error {
        NodeError::Cancelled => Some(FailureKind::Timeout),
        NodeError::Validation(_) | NodeError::Parameter { .. } => Some(FailureKind::Validation),
        NodeError::Process { .. } => Some(FailureKind::CliUnavailable),
        NodeError::Authentication(_) => Some(FailureKind::Authentication),
        NodeError::Permission(_) => Some(FailureKind::Permission),
        NodeError::Io(err) => match err.kind() {
            std::io::ErrorKind::NotFound => Some(FailureKind::CliUnavailable),
            std::io::ErrorKind::PermissionDenied => Some(FailureKind::Permission),
            _ => None,
        },
        NodeError::Configuration(_)
        | NodeError::Execution(_)
        | NodeError::Stream(_)
        | NodeError::Serialization(_) => None,
    }
}

struct Patterns {
    abort: Regex,
    spawn: Regex,
    auth: Regex,
    permission: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        abort: Regex::new(r"(?i)\babort(ed|error)?\b").expect("abort pattern"),
        spawn: Regex::new(
            r"(?i)exit(ed)? (with )?code 1\b|\bspawn\b|ENOENT|command not found|no such file or directory",
        )
        .expect("spawn pattern"),
        auth: Regex::new(r"(?i)auth|api[ _-]?key|unauthori[sz]ed|\blog ?in\b")
            .expect("auth pattern"),
        permission: Regex::new(r"(?i)permission|EACCES|EPERM|access denied|forbidden")
            .expect("permission pattern"),
    })
}

/// Classify free-form error text, checked in precedence order.
pub fn kind_from_message(message: &str) -> FailureKind {
    let patterns = patterns();
    if patterns.abort.is_match(message) {
        FailureKind::Timeout
    } else if patterns.spawn.is_match(message) {
        FailureKind::CliUnavailable
    } else if patterns.auth.is_match(message) {
        FailureKind::Authentication
    } else if patterns.permission.is_match(message) {
        FailureKind::Permission
    } else {
        FailureKind::Execution
    }
}

fn build(kind: FailureKind, details: String, timeout_secs: u64) -> Failure {
    let (message, description) = match kind {
        FailureKind::Validation => (details.clone(), None),
        FailureKind::Timeout => (
            format!("Claude Code execution timed out after {timeout_secs} seconds"),
            Some(
                "Increase the `timeout` parameter or lower `maxTurns` so the agent finishes sooner."
                    .to_string(),
            ),
        ),
        FailureKind::CliUnavailable => (
            "Claude Code CLI is not installed or not configured".to_string(),
            Some(INSTALL_HELP.to_string()),
        ),
        FailureKind::Authentication => (
            "Claude Code authentication failed".to_string(),
            Some(AUTH_HELP.to_string()),
        ),
        FailureKind::Permission => (
            "Claude Code permission denied".to_string(),
            Some(PERMISSION_HELP.to_string()),
        ),
        FailureKind::Execution => (format!("Claude Code execution failed: {details}"), None),
    };
    Failure {
        kind,
        message,
        description,
        details,
    }
}
