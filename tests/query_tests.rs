//! Tests for query invocation: options handed to the SDK, timeouts, stream errors.

mod common;

use std::time::Duration;

use common::*;
use pretty_assertions::assert_eq;
use serde_json::json;

use claude_code_node::error::{translate, FailureKind, NodeError};
use claude_code_node::node::{Node, ParameterDefaults};
use claude_code_node::query::{run_query, PermissionMode};
use claude_code_node::types::{ExecutionContext, SettingSource, ToolName};

#[tokio::test]
async fn options_carry_resolved_parameters() {
    let sdk = MockSdk::new();
    node(&sdk)
        .execute(&host(json!([{
            "operation": "continue",
            "prompt": "Refactor main.rs",
            "model": "opus",
            "maxTurns": 4,
            "projectPath": "/srv/app",
            "allowedTools": ["Read", "Edit"],
            "settingSources": ["project"],
            "additionalOptions": {"systemPrompt": "Be terse", "requirePermissions": true}
        }])))
        .await
        .unwrap();

    let requests = sdk.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].prompt, "Refactor main.rs");
    assert_eq!(
        serde_json::to_value(&requests[0].options).unwrap(),
        json!({
            "maxTurns": 4,
            "permissionMode": "default",
            "model": "opus",
            "systemPrompt": "Be terse",
            "cwd": "/srv/app",
            "allowedTools": ["Read", "Edit"],
            "settingSources": ["project"],
            "continue": true
        })
    );
}

#[tokio::test]
async fn minimal_options_use_defaults_and_omit_optional_keys() {
    let sdk = MockSdk::new();
    node(&sdk)
        .execute(&host(json!([{"prompt": "hi", "projectPath": "  ", "allowedTools": []}])))
        .await
        .unwrap();

    let options = &sdk.requests()[0].options;
    assert_eq!(options.permission_mode, PermissionMode::BypassPermissions);
    assert_eq!(
        serde_json::to_value(options).unwrap(),
        json!({"maxTurns": 10, "permissionMode": "bypassPermissions", "model": "sonnet"})
    );
}

#[tokio::test]
async fn empty_setting_sources_reach_the_sdk_as_isolation() {
    let sdk = MockSdk::new();
    node(&sdk)
        .execute(&host(json!([
            {"prompt": "isolated", "settingSources": []},
            {"prompt": "defaults"}
        ])))
        .await
        .unwrap();

    let requests = sdk.requests();
    assert_eq!(requests[0].options.setting_sources, Some(vec![]));
    assert_eq!(requests[1].options.setting_sources, None);
}

#[tokio::test]
async fn configured_defaults_apply_to_unset_parameters() {
    let sdk = MockSdk::new();
    let mut servers = serde_json::Map::new();
    servers.insert("files".into(), json!({"command": "mcp-files"}));
    let defaults = ParameterDefaults {
        max_turns: 25,
        mcp_servers: Some(servers),
        ..ParameterDefaults::default()
    };
    node(&sdk)
        .with_defaults(defaults)
        .execute(&host(json!([{"prompt": "hi"}])))
        .await
        .unwrap();

    let options = &sdk.requests()[0].options;
    assert_eq!(options.max_turns, 25);
    assert_eq!(
        options.mcp_servers.as_ref().unwrap()["files"]["command"],
        json!("mcp-files")
    );
}

#[tokio::test(start_paused = true)]
async fn hanging_stream_times_out_with_configured_seconds() {
    let sdk = MockSdk::new();
    sdk.queue(Reply::Hang(vec![init_record()]));
    let host = host(json!([{"prompt": "slow", "timeout": 2, "outputFormat": "text"}]))
        .with_continue_on_fail(true);

    let items = node(&sdk).execute(&host).await.unwrap();
    let value = serde_json::to_value(&items[0]).unwrap();
    assert_eq!(value["json"]["errorType"], json!("timeout"));
    assert_eq!(
        value["json"]["error"],
        json!("Claude Code execution timed out after 2 seconds")
    );

    let request = &sdk.requests()[0];
    assert!(request.cancel.is_cancelled());
}

#[tokio::test(start_paused = true)]
async fn timeout_aborts_the_batch_without_continue_on_fail() {
    let sdk = MockSdk::new();
    sdk.queue(Reply::Hang(vec![]));
    let err = node(&sdk)
        .execute(&host(json!([{"prompt": "slow", "timeout": 5}, {"prompt": "next"}])))
        .await
        .unwrap_err();
    assert_eq!(err.message, "Claude Code execution timed out after 5 seconds");
    assert!(err.description.is_some());
    assert_eq!(sdk.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn timed_out_item_logs_the_timeout_and_a_recovery_hint() {
    let logs = CapturedLogs::default();
    let _guard = logs.install();

    let sdk = MockSdk::new();
    sdk.queue(Reply::Hang(vec![init_record()]));
    let host = host(json!([{"prompt": "slow", "timeout": 3}])).with_continue_on_fail(true);
    node(&sdk).execute(&host).await.unwrap();

    let logs = logs.contents();
    assert!(logs.contains("query timed out"), "{logs}");
    assert!(logs.contains("timeout_secs=3"), "{logs}");
    assert!(logs.contains("category=timeout"), "{logs}");
    assert!(logs.contains("recovery=IncreaseTimeout"), "{logs}");
}

#[tokio::test]
async fn rejected_spawn_logs_an_install_hint_but_no_timeout() {
    let logs = CapturedLogs::default();
    let _guard = logs.install();

    let sdk = MockSdk::new();
    sdk.queue(Reply::Reject(NodeError::process("spawn claude ENOENT")));
    let host = host(json!([{"prompt": "x"}])).with_continue_on_fail(true);
    node(&sdk).execute(&host).await.unwrap();

    let logs = logs.contents();
    assert!(logs.contains("recovery=InstallCli"), "{logs}");
    assert!(!logs.contains("query timed out"), "{logs}");
}

#[tokio::test(start_paused = true)]
async fn completed_query_releases_its_timer() {
    let sdk = MockSdk::new();
    let ctx = ExecutionContext::builder().prompt("fast").timeout_secs(1).build();
    let state = run_query(sdk.as_ref(), &ctx).await.unwrap();
    assert!(state.success());

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(!sdk.requests()[0].cancel.is_cancelled());
}

#[tokio::test]
async fn stream_error_after_records_is_translated() {
    let sdk = MockSdk::new();
    sdk.queue(Reply::FailAfter(
        vec![init_record(), assistant_text("working")],
        NodeError::Execution("EACCES: permission denied, open '/etc/shadow'".into()),
    ));
    let ctx = ExecutionContext::builder()
        .prompt("read it")
        .allowed_tools(vec![ToolName::Read])
        .setting_sources(vec![SettingSource::User])
        .build();

    let err = run_query(sdk.as_ref(), &ctx).await.unwrap_err();
    let failure = translate(&err, ctx.timeout_secs);
    assert_eq!(failure.kind, FailureKind::Permission);
    assert_eq!(failure.message, "Claude Code permission denied");
    assert!(failure.details.contains("/etc/shadow"));
}

#[tokio::test]
async fn generic_failures_quote_the_underlying_message() {
    let sdk = MockSdk::new();
    sdk.queue(Reply::Reject(NodeError::Execution("model overloaded".into())));
    let err = node(&sdk)
        .execute(&host(json!([{"prompt": "x"}])))
        .await
        .unwrap_err();
    assert_eq!(err.message, "Claude Code execution failed: model overloaded");
    assert!(err.description.is_none());
}
