//! Full pipeline: path mapping, regex validation, bearer authentication and
//! repository access.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use commander_auth::Authenticated;
use commander_core::http::{Method, StatusCode};
use commander_core::{
    Identifiable, Logger, Operation, ReadOnlyRepository, RegexValidator, RequestEvent, Result,
    Scope, Severity,
};
use commander_testing::{InMemoryRepository, RecordingLogger};
use commander_web::{CorsConfig, Handler, HandlerConfig, PathParameterMapper};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct User {
    id: String,
    roles: Vec<String>,
}

impl Identifiable for User {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Asset {
    id: String,
    owner: String,
}

impl Identifiable for Asset {
    fn id(&self) -> &str {
        &self.id
    }
}

struct GetAsset {
    assets: InMemoryRepository<Asset>,
}

impl Operation for GetAsset {
    type Input = Option<String>;
    type Output = Asset;
    type Identity = User;

    async fn execute(&self, scope: Scope<'_, User>, id: Option<String>) -> Result<Asset> {
        let user = scope.identity()?;
        let id = id.unwrap_or_default();
        let asset = self.assets.get(&id).await?;
        if asset.owner != user.id {
            scope.check_role(user.roles.as_slice(), "read another user's asset")?;
        }
        Ok(asset)
    }
}

fn handler(
    logger: &RecordingLogger,
) -> Handler<Authenticated<GetAsset, InMemoryRepository<User>>, PathParameterMapper> {
    let shared: Arc<dyn Logger> = Arc::new(logger.clone());
    let users = InMemoryRepository::with_items([
        User { id: "ann".into(), roles: vec![] },
        User { id: "root".into(), roles: vec!["admin".into()] },
    ])
    .unwrap();
    let assets = InMemoryRepository::with_items([
        Asset { id: "a-1".into(), owner: "ann".into() },
        Asset { id: "a-2".into(), owner: "bob".into() },
    ])
    .unwrap();

    Handler::with_mapper(
        Authenticated::new(GetAsset { assets }, users, Arc::clone(&shared)),
        PathParameterMapper::new("assetId").required(),
        HandlerConfig::new(CorsConfig::new(["https://app.example"], ["GET"])),
        shared,
    )
    .add_input_validator(RegexValidator::parse("^a-[0-9]+$").unwrap())
}

fn request(token: Option<&str>, asset: &str) -> RequestEvent {
    let event = RequestEvent::new(Method::GET).with_path_parameter("assetId", asset);
    match token {
        Some(token) => event.with_header("authorization", format!("Bearer {token}")),
        None => event,
    }
}

fn body(response: &commander_core::Response) -> Value {
    serde_json::from_str(&response.body).unwrap()
}

#[tokio::test]
async fn test_owner_reads_asset() {
    let logger = RecordingLogger::new();
    let response = handler(&logger).handle(request(Some("ann"), "a-1")).await;

    assert_eq!(response.status_code, StatusCode::OK);
    assert_eq!(body(&response), json!({ "id": "a-1", "owner": "ann" }));
}

#[tokio::test]
async fn test_missing_token_is_unauthorised() {
    let logger = RecordingLogger::new();
    let response = handler(&logger).handle(request(None, "a-1")).await;

    assert_eq!(response.status_code, StatusCode::UNAUTHORIZED);
    assert_eq!(body(&response), json!({ "message": "Invalid Token" }));
}

#[tokio::test]
async fn test_unknown_asset_is_not_found() {
    let logger = RecordingLogger::new();
    let response = handler(&logger).handle(request(Some("ann"), "a-9")).await;

    assert_eq!(response.status_code, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_foreign_asset_needs_admin() {
    let logger = RecordingLogger::new();
    let mut handler = handler(&logger);

    let denied = handler.handle(request(Some("ann"), "a-2")).await;
    assert_eq!(denied.status_code, StatusCode::UNAUTHORIZED);
    assert_eq!(body(&denied), json!({ "message": "Insufficient permissions" }));
    assert!(logger.contains(Severity::Security, "unauthorised user ann"));

    let allowed = handler.handle(request(Some("root"), "a-2")).await;
    assert_eq!(allowed.status_code, StatusCode::OK);
}

#[tokio::test]
async fn test_identity_does_not_leak_between_invocations() {
    let logger = RecordingLogger::new();
    let mut handler = handler(&logger);

    assert_eq!(handler.handle(request(Some("root"), "a-2")).await.status_code, StatusCode::OK);
    assert!(handler.command().is_authenticated());

    let anonymous = handler.handle(request(None, "a-2")).await;
    assert_eq!(anonymous.status_code, StatusCode::UNAUTHORIZED);
    assert!(!handler.command().is_authenticated());
}

#[tokio::test]
async fn test_malformed_id_is_rejected_before_authentication() {
    let logger = RecordingLogger::new();
    let response = handler(&logger).handle(request(None, "../etc/passwd")).await;

    assert_eq!(response.status_code, StatusCode::BAD_REQUEST);
    assert_eq!(body(&response), json!({ "message": "Invalid Request" }));
    assert!(logger.contains(Severity::Error, "Invalid input: ../etc/passwd does not match |^a-[0-9]+$|"));
    assert!(logger.messages_at(Severity::Security).is_empty());
}
