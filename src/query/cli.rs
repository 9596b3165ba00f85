//! Agent SDK backed by the `claude` executable in `stream-json` mode.

use std::process::Stdio;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio_stream::wrappers::LinesStream;

use super::{AgentSdk, QueryOptions, QueryRequest, RecordStream};
use crate::error::translate::kind_from_message;
use crate::error::{FailureKind, NodeError, Result};
use crate::types::{ResponseRecord, SettingSource, ToolName};

/// Spawns one `claude --print` process per query.
#[derive(Debug, Clone)]
pub struct ClaudeCli {
    binary: String,
}

impl Default for ClaudeCli {
    fn default() -> Self {
        Self::new("claude")
    }
}

impl ClaudeCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn spawn_error(&self, err: std::io::Error) -> NodeError {
        match err.kind() {
            std::io::ErrorKind::NotFound => NodeError::Process {
                message: format!("failed to spawn `{}`: executable not found", self.binary),
                source: Some(err),
            },
            std::io::ErrorKind::PermissionDenied => {
                NodeError::Permission(format!("failed to spawn `{}`: {err}", self.binary))
            }
            _ => NodeError::Process {
                message: format!("failed to spawn `{}`: {err}", self.binary),
                source: Some(err),
            },
        }
    }
}

/// Error for a process that exited unsuccessfully without a result record.
fn exit_error(code: &str, stderr: &str) -> NodeError {
    let stderr = stderr.trim();
    let message = format!("Claude Code process exited with code {code}: {stderr}");
    match kind_from_message(stderr) {
        FailureKind::Authentication => NodeError::Authentication(message),
        FailureKind::Permission => NodeError::Permission(message),
        _ => NodeError::Execution(message),
    }
}

/// Command-line arguments for one query, prompt last.
pub fn command_args(prompt: &str, options: &QueryOptions) -> Result<Vec<String>> {
    let mut args: Vec<String> = vec![
        "--print".into(),
        "--output-format".into(),
        "stream-json".into(),
        "--verbose".into(),
        "--max-turns".into(),
        options.max_turns.to_string(),
        "--model".into(),
        options.model.clone(),
        "--permission-mode".into(),
        options.permission_mode.to_string(),
    ];

    if let Some(system_prompt) = &options.system_prompt {
        args.push("--system-prompt".into());
        args.push(system_prompt.clone());
    }
    if let Some(tools) = &options.allowed_tools {
        args.push("--allowedTools".into());
        args.push(join(tools.iter().map(ToolName::to_string)));
    }
    if let Some(sources) = &options.setting_sources {
        // An empty value is passed on purpose: it disables settings loading.
        args.push("--setting-sources".into());
        args.push(join(sources.iter().map(SettingSource::to_string)));
    }
    if options.continue_conversation == Some(true) {
        args.push("--continue".into());
    }
    if let Some(servers) = &options.mcp_servers {
        let config = serde_json::json!({ "mcpServers": servers });
        args.push("--mcp-config".into());
        args.push(serde_json::to_string(&config)?);
    }

    args.push("--".into());
    args.push(prompt.to_string());
    Ok(args)
}

fn join(items: impl Iterator<Item = String>) -> String {
    items.collect::<Vec<_>>().join(",")
}

#[async_trait]
impl AgentSdk for ClaudeCli {
    async fn query(&self, request: QueryRequest) -> Result<RecordStream> {
        let args = command_args(&request.prompt, &request.options)?;

        let mut command = Command::new(&self.binary);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &request.options.cwd {
            command.current_dir(cwd);
        }

        let mut child = command.spawn().map_err(|err| self.spawn_error(err))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| NodeError::process("missing stdout pipe"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| NodeError::process("missing stderr pipe"))?;

        let stderr_reader = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = BufReader::new(stderr).read_to_string(&mut buf).await;
            buf
        });

        let cancel = request.cancel;
        let stream = async_stream::stream! {
            let mut lines = LinesStream::new(BufReader::new(stdout).lines());
            let mut seen_result = false;

            loop {
                let next = tokio::select! {
                    _ = cancel.cancelled() => None,
                    line = lines.next() => Some(line),
                };
                let Some(line) = next else {
                    let _ = child.start_kill();
                    yield Err(NodeError::Cancelled);
                    return;
                };

                match line {
                    Some(Ok(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        match ResponseRecord::from_json_line(line) {
                            Ok(record) => {
                                seen_result |= matches!(record, ResponseRecord::Result(_));
                                yield Ok(record);
                            }
                            Err(err) => {
                                yield Err(NodeError::Stream(format!("invalid stream-json line: {err}")));
                                return;
                            }
                        }
                    }
                    None => break,
                    Some(Err(err)) => {
                        yield Err(NodeError::Io(err));
                        return;
                    }
                }
            }

            match child.wait().await {
                Ok(status) if status.success() => {}
                Ok(status) => {
                    let stderr = stderr_reader.await.unwrap_or_default();
                    let code = status
                        .code()
                        .map_or_else(|| "signal".to_string(), |code| code.to_string());
                    if seen_result {
                        // The terminal record already describes the failure.
                        tracing::warn!(exit_code = %code, stderr = %stderr.trim(), "claude exited unsuccessfully after its result");
                    } else {
                        yield Err(exit_error(&code, &stderr));
                    }
                }
                Err(err) => yield Err(NodeError::Io(err)),
            }
        };

        Ok(Box::pin(stream))
    }
}
