use super::*;
use crate::config::InferenceConfig;
use crate::subprocess::{MockProcessRunner, ProcessError, ProcessRunner};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const BINARY: &str = "/opt/litert/litert_lm_main";

fn test_config() -> InferenceConfig {
    InferenceConfig {
        binary_path: PathBuf::from(BINARY),
        model_path: PathBuf::from("/models/gemma3-1b.litertlm"),
        backend: "cpu".to_string(),
        extra_args: vec!["--benchmark".to_string()],
        timeout: Duration::from_secs(30),
        max_concurrent: 2,
    }
}

fn client_with(mock: &MockProcessRunner, config: InferenceConfig) -> InferenceClient {
    InferenceClient::new(Arc::new(mock.clone()) as Arc<dyn ProcessRunner>, config)
}

#[test]
fn test_build_command_argument_order() {
    let mock = MockProcessRunner::new();
    let client = client_with(&mock, test_config());

    let command = client.build_command("What is Rust?", None, Duration::from_secs(5));
    assert_eq!(command.program, BINARY);
    assert_eq!(
        command.args,
        vec![
            "--backend=cpu",
            "--model_path=/models/gemma3-1b.litertlm",
            "--benchmark",
            "--input_prompt=What is Rust?",
        ]
    );
    assert_eq!(command.timeout, Some(Duration::from_secs(5)));

    let command = client.build_command("x", Some("gpu"), Duration::from_secs(5));
    assert_eq!(command.args[0], "--backend=gpu");
}

#[tokio::test]
async fn test_invoke_returns_extracted_answer() {
    let mut mock = MockProcessRunner::new();
    mock.expect_command(BINARY)
        .returns_stdout(
            "I0001 00:00:00 init\nResponse: Paris is the capital of France.\nPrefill: 120 tokens/sec\n",
        )
        .returns_success()
        .finish();

    let client = client_with(&mock, test_config());
    let answer = client.invoke("Capital of France?").await.unwrap();
    assert_eq!(answer, "Paris is the capital of France.");

    let history = mock.get_call_history();
    assert_eq!(history.len(), 1);
    assert_eq!(
        history[0].args.last().map(String::as_str),
        Some("--input_prompt=Capital of France?")
    );
}

#[tokio::test]
async fn test_complete_attaches_metrics() {
    let mut mock = MockProcessRunner::new();
    mock.expect_command(BINARY)
        .returns_stdout("Response: 4\nBenchmarkInfo:\nPrefill: 250.5 tokens/sec\nDecode: 30 tokens/sec")
        .finish();

    let client = client_with(&mock, test_config());
    let result = client.complete("2+2?", None).await.unwrap();
    assert_eq!(result.answer, "4");
    let metrics = result.metrics.unwrap();
    assert_eq!(metrics.prefill_tokens_per_sec, Some(250.5));
    assert_eq!(metrics.decode_tokens_per_sec, Some(30.0));
    assert_eq!(metrics.peak_memory_mb, None);
}

#[tokio::test]
async fn test_fatal_error_scenario() {
    let mut mock = MockProcessRunner::new();
    mock.expect_command(BINARY)
        .returns_stderr("F0000 00:00:00 Check failure: model load")
        .returns_exit_code(1)
        .finish();

    let client = client_with(&mock, test_config());
    match client.invoke("hi").await.unwrap_err() {
        InferenceError::Fatal { line } => {
            assert_eq!(line, "F0000 00:00:00 Check failure: model load")
        }
        other => panic!("expected fatal error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_fatal_error_carries_stderr() {
    let mut mock = MockProcessRunner::new();
    mock.expect_command(BINARY)
        .returns_stderr("E0000 00:00:00 model file is not readable")
        .returns_exit_code(3)
        .finish();

    let client = client_with(&mock, test_config());
    let err = client.invoke("hi").await.unwrap_err();
    assert!(matches!(
        err,
        InferenceError::NonFatal { exit_code: 3, ref stderr } if stderr.contains("not readable")
    ));
}

#[tokio::test]
async fn test_killed_process_reports_signal_exit_code() {
    let mut mock = MockProcessRunner::new();
    mock.expect_command(BINARY)
        .returns_stderr("I0001 00:00:00 loading model")
        .returns_signal(9)
        .finish();

    let client = client_with(&mock, test_config());
    let err = client.invoke("hi").await.unwrap_err();
    assert!(matches!(err, InferenceError::NonFatal { exit_code: 137, .. }));
}

#[tokio::test]
async fn test_exit_zero_without_body_returns_greeting() {
    let mut mock = MockProcessRunner::new();
    mock.expect_command(BINARY)
        .returns_stdout("I0001 00:00:00 init\nI0001 00:00:01 done\n")
        .returns_stderr("")
        .finish();

    let client = client_with(&mock, test_config());
    assert_eq!(client.invoke("hi").await.unwrap(), FALLBACK_GREETING);
}

#[tokio::test]
async fn test_startup_error() {
    let mut mock = MockProcessRunner::new();
    mock.expect_command(BINARY)
        .fails_with(|cmd| ProcessError::CommandNotFound(cmd.program.clone()))
        .finish();

    let client = client_with(&mock, test_config());
    let err = client.invoke("hi").await.unwrap_err();
    assert!(matches!(err, InferenceError::Startup { ref binary, .. } if binary == BINARY));
}

#[tokio::test]
async fn test_timeout_surfaces_as_timeout() {
    let mut mock = MockProcessRunner::new();
    mock.expect_command(BINARY)
        .with_delay(Duration::from_secs(60))
        .finish();

    let mut config = test_config();
    config.timeout = Duration::from_millis(20);
    let client = client_with(&mock, config);

    let err = client.invoke("hi").await.unwrap_err();
    assert!(matches!(err, InferenceError::Timeout(d) if d == Duration::from_millis(20)));
}

#[tokio::test]
async fn test_self_test_uses_caller_timeout() {
    let mut mock = MockProcessRunner::new();
    mock.expect_command(BINARY)
        .returns_stdout("Response: Hi there!")
        .finish();

    let client = client_with(&mock, test_config());
    let report = client.self_test(Duration::from_secs(7)).await.unwrap();
    assert_eq!(report.answer, "Hi there!");

    let history = mock.get_call_history();
    assert_eq!(history[0].timeout, Some(Duration::from_secs(7)));
    assert!(history[0]
        .args
        .contains(&format!("--input_prompt={SELF_TEST_PROMPT}")));
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let mut mock = MockProcessRunner::new();
    mock.expect_command(BINARY)
        .returns_stdout("Response: ok")
        .with_delay(Duration::from_millis(50))
        .finish();

    let mut config = test_config();
    config.max_concurrent = 2;
    let client = client_with(&mock, config);

    let tasks: Vec<_> = (0..6)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move { client.invoke(&format!("prompt {i}")).await })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap(), "ok");
    }
    assert_eq!(mock.peak_concurrency(), 2);
}

#[tokio::test]
async fn test_closed_client_is_unavailable() {
    let mock = MockProcessRunner::new();
    let client = client_with(&mock, test_config());
    client.close();
    assert!(matches!(
        client.invoke("hi").await.unwrap_err(),
        InferenceError::Unavailable
    ));
}
