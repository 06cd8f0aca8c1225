//! End-to-end tests for the request pipeline.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use commander_core::http::{Method, StatusCode};
use commander_core::{CommandError, Logger, PipelineError, RequestEvent, Response, Severity};
use commander_testing::{Call, RecordingLogger, RecordingValidator, ScriptedCommand};
use commander_web::cors::FIXED_HEADERS;
use commander_web::{CorsConfig, Handler, HandlerConfig, PathParameterMapper};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

const ORIGIN: &str = "https://b.example";

fn cors() -> CorsConfig {
    CorsConfig::new(["https://a.example", ORIGIN], ["GET", "POST"])
}

fn config() -> HandlerConfig {
    HandlerConfig::new(cors())
}

fn event(method: Method) -> RequestEvent {
    RequestEvent::new(method).with_header("Origin", ORIGIN)
}

fn shared(logger: &RecordingLogger) -> Arc<dyn Logger> {
    Arc::new(logger.clone())
}

fn body(response: &Response) -> Value {
    serde_json::from_str(&response.body).unwrap()
}

#[tokio::test]
async fn test_preflight_never_touches_command() {
    let logger = RecordingLogger::new();
    let command = ScriptedCommand::<RequestEvent, Value>::returning(shared(&logger), json!({}));
    let calls = command.calls();
    let validator = RecordingValidator::accepting();

    let mut handler = Handler::new(command, config(), shared(&logger))
        .add_input_validator(validator.clone());

    let response = handler.handle(event(Method::OPTIONS)).await;

    assert_eq!(response.status_code, StatusCode::OK);
    assert_eq!(response.body, "");
    assert_eq!(response.headers, cors().preflight_headers(&event(Method::OPTIONS).headers));
    assert!(calls.snapshot().is_empty());
    assert_eq!(validator.invocations(), 0);
    assert!(logger.contains(Severity::Info, "OPTIONS request"));
}

#[tokio::test]
async fn test_success_runs_lifecycle_in_order() {
    let logger = RecordingLogger::new();
    let command = ScriptedCommand::<RequestEvent, Value>::returning(
        shared(&logger),
        json!({ "id": "a-1", "size": 10 }),
    );
    let calls = command.calls();

    let mut handler = Handler::new(command, config(), shared(&logger));
    let response = handler.handle(event(Method::GET)).await;

    assert_eq!(response.status_code, StatusCode::OK);
    assert_eq!(body(&response), json!({ "id": "a-1", "size": 10 }));
    assert_eq!(response.headers, cors().response_headers(&event(Method::GET).headers));
    assert_eq!(
        calls.snapshot(),
        vec![Call::Clean, Call::SetLogger, Call::Authenticate, Call::Run]
    );
}

#[tokio::test]
async fn test_every_response_carries_fixed_headers() {
    let logger = RecordingLogger::new();
    let command = ScriptedCommand::<RequestEvent, Value>::failing(shared(&logger), || {
        CommandError::standard("nope").into()
    });

    let mut handler = Handler::new(command, config(), shared(&logger));
    let response = handler.handle(event(Method::POST)).await;

    for (name, value) in FIXED_HEADERS {
        assert_eq!(response.headers.get(name).unwrap().to_string(), value);
    }
    assert_eq!(
        response.headers.get("Access-Control-Allow-Origin").unwrap().to_string(),
        ORIGIN
    );
}

#[tokio::test]
async fn test_command_is_cleaned_on_every_invocation() {
    let logger = RecordingLogger::new();
    let command = ScriptedCommand::<RequestEvent, Value>::returning(shared(&logger), json!(1));
    let calls = command.calls();

    let mut handler = Handler::new(command, config(), shared(&logger));
    handler.handle(event(Method::GET)).await;
    handler.handle(event(Method::GET)).await;

    assert_eq!(calls.count(Call::Clean), 2);
    assert_eq!(calls.count(Call::Run), 2);
}

#[tokio::test]
async fn test_validators_see_mapped_input_once() {
    let logger = RecordingLogger::new();
    let command = ScriptedCommand::<Option<String>, String>::new(shared(&logger), |id| {
        Ok(id.unwrap_or_default())
    });
    let inputs = command.inputs();
    let events = command.events();
    let first = RecordingValidator::accepting();
    let second = RecordingValidator::accepting().delayed(Duration::from_millis(20));

    let mut handler = Handler::with_mapper(
        command,
        PathParameterMapper::new("assetId").required(),
        config(),
        shared(&logger),
    )
    .add_input_validator(first.clone())
    .add_input_validator(second.clone());

    let raw = event(Method::GET)
        .with_header("Authorization", "Bearer t")
        .with_path_parameter("assetId", "a-1");
    let response = handler.handle(raw.clone()).await;

    assert_eq!(response.status_code, StatusCode::OK);
    assert_eq!(body(&response), json!("a-1"));
    for validator in [&first, &second] {
        assert_eq!(validator.seen(), vec![Some("a-1".to_string())]);
        assert!(validator.has_logger());
    }
    assert_eq!(*inputs.lock().unwrap(), vec![Some("a-1".to_string())]);
    // authentication sees the raw event, not the mapped value
    assert_eq!(*events.lock().unwrap(), vec![raw]);
}

#[tokio::test]
async fn test_input_rejection_stops_before_command() {
    let logger = RecordingLogger::new();
    let command = ScriptedCommand::<RequestEvent, Value>::returning(shared(&logger), json!({}));
    let calls = command.calls();
    let accepting = RecordingValidator::accepting();

    let mut handler = Handler::new(command, config(), shared(&logger))
        .add_input_validator(accepting.clone())
        .add_input_validator(RecordingValidator::rejecting(CommandError::input_validation(
            "name is required",
        )));

    let response = handler.handle(event(Method::POST)).await;

    assert_eq!(response.status_code, StatusCode::BAD_REQUEST);
    assert_eq!(body(&response), json!({ "message": "name is required" }));
    assert_eq!(accepting.invocations(), 1);
    assert!(calls.snapshot().is_empty());
    assert!(logger.contains(Severity::Warning, "name is required"));
}

#[tokio::test]
async fn test_authentication_failure_skips_run() {
    let logger = RecordingLogger::new();
    let command = ScriptedCommand::<RequestEvent, Value>::returning(shared(&logger), json!({}))
        .rejecting_authentication(CommandError::authorisation("Invalid Token"));
    let calls = command.calls();

    let mut handler = Handler::new(command, config(), shared(&logger));
    let response = handler.handle(event(Method::GET)).await;

    assert_eq!(response.status_code, StatusCode::UNAUTHORIZED);
    assert_eq!(body(&response), json!({ "message": "Invalid Token" }));
    assert_eq!(calls.count(Call::Run), 0);
    assert!(logger.contains(Severity::Security, "Invalid Token"));
}

#[tokio::test]
async fn test_classified_failure_renders_itself() {
    let logger = RecordingLogger::new();
    let command = ScriptedCommand::<RequestEvent, Value>::failing(shared(&logger), || {
        CommandError::not_found("Asset a-1 not found").into()
    });

    let mut handler = Handler::new(command, config(), shared(&logger));
    let request = event(Method::GET);
    let response = handler.handle(request.clone()).await;

    let expected = CommandError::not_found("Asset a-1 not found")
        .render(&cors().response_headers(&request.headers));
    assert_eq!(response, expected);
    assert_eq!(response.status_code, StatusCode::NOT_FOUND);
    assert!(logger.contains(Severity::Info, "Asset a-1 not found"));
}

#[tokio::test]
async fn test_upstream_failure_keeps_its_status() {
    let logger = RecordingLogger::new();
    let command = ScriptedCommand::<RequestEvent, Value>::failing(shared(&logger), || {
        CommandError::upstream(Method::GET, StatusCode::BAD_GATEWAY, "inventory unavailable").into()
    });

    let mut handler = Handler::new(command, config(), shared(&logger));
    let response = handler.handle(event(Method::GET)).await;

    assert_eq!(response.status_code, StatusCode::BAD_GATEWAY);
    assert!(!logger.messages_at(Severity::Error).is_empty());
}

#[tokio::test]
async fn test_unclassified_failure_never_leaks() {
    let logger = RecordingLogger::new();
    let command = ScriptedCommand::<RequestEvent, Value>::failing(shared(&logger), || {
        PipelineError::from(anyhow::anyhow!("connection to db-7 refused"))
    });

    let mut handler = Handler::new(command, config(), shared(&logger));
    let request = event(Method::GET);
    let response = handler.handle(request.clone()).await;

    assert_eq!(response.status_code, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body(&response), json!({ "messages": ["Internal Server Error"] }));
    assert!(!response.body.contains("db-7"));
    assert_eq!(response.headers, cors().response_headers(&request.headers));
    assert!(logger.contains(Severity::Error, "db-7"));
}

#[tokio::test]
async fn test_mapper_failure_is_generic() {
    let logger = RecordingLogger::new();
    let command = ScriptedCommand::<Option<String>, String>::returning(shared(&logger), String::new());
    let calls = command.calls();

    let mut handler = Handler::with_mapper(
        command,
        PathParameterMapper::new("assetId").required(),
        config(),
        shared(&logger),
    );
    let response = handler.handle(event(Method::GET)).await;

    assert_eq!(response.status_code, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(calls.snapshot().is_empty());
    assert!(logger.contains(Severity::Error, "No Value for assetId present in the path"));
}

#[tokio::test]
async fn test_output_rejection_after_run() {
    let logger = RecordingLogger::new();
    let command = ScriptedCommand::<RequestEvent, Value>::returning(shared(&logger), json!({ "secret": true }));
    let calls = command.calls();
    let output = RecordingValidator::rejecting(CommandError::standard("Invalid Request"));

    let mut handler = Handler::new(command, config(), shared(&logger))
        .add_output_validator(output.clone());
    let response = handler.handle(event(Method::GET)).await;

    assert_eq!(response.status_code, StatusCode::BAD_REQUEST);
    assert_eq!(body(&response), json!({ "message": "Invalid Request" }));
    assert_eq!(calls.count(Call::Run), 1);
    assert_eq!(output.seen(), vec![json!({ "secret": true })]);
    assert!(output.has_logger());
}
