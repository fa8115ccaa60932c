//! Get command tests against a loopback server

mod support;

use ghconnect::commands::get::resolve_token;
use ghconnect::commands::{Command, CommandContext, GetCommand};
use ghconnect::config::ConnectorConfig;
use serial_test::serial;
use support::{MockResponse, MockServer};

fn context_for(server: &MockServer) -> CommandContext {
    let mut config = ConnectorConfig::default();
    config.api_base = server.base_url();
    config.use_proxy = false;
    CommandContext { config }
}

fn get(target: &str) -> GetCommand {
    GetCommand {
        target: target.to_string(),
        token: Some("test-token".to_string()),
        max_age: None,
        no_cache: false,
        repeat: 1,
        body: false,
    }
}

#[tokio::test]
async fn test_get_sends_github_headers() {
    let server = MockServer::fixed(MockResponse::ok("{}")).await;

    get("/repos/octo/hello")
        .execute(&context_for(&server))
        .await
        .unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, "GET");
    assert_eq!(request.path, "/repos/octo/hello");
    assert_eq!(request.header("Accept"), Some("application/vnd.github.v3+json"));
    assert_eq!(request.header("Authorization"), Some("token test-token"));
    assert_eq!(request.header("Cache-Control"), Some("max-age=0"));
    assert!(
        request
            .header("User-Agent")
            .is_some_and(|agent| agent.starts_with("ghconnect/"))
    );
}

#[tokio::test]
async fn test_get_repeat_revalidates() {
    let server = MockServer::start(|request| {
        if request.header("If-None-Match") == Some("\"abc\"") {
            MockResponse::not_modified().with_header("ETag", "\"abc\"")
        } else {
            MockResponse::ok("{}").with_header("ETag", "\"abc\"")
        }
    })
    .await;

    let mut command = get("/rate_limit");
    command.repeat = 3;
    command.execute(&context_for(&server)).await.unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].header("If-None-Match"), None);
    assert_eq!(requests[1].header("If-None-Match"), Some("\"abc\""));
    assert_eq!(requests[2].header("If-None-Match"), Some("\"abc\""));
}

#[tokio::test]
async fn test_get_max_age_override_and_no_cache() {
    let server = MockServer::fixed(MockResponse::ok("{}")).await;
    let context = context_for(&server);

    let mut command = get("/rate_limit");
    command.max_age = Some(120);
    command.execute(&context).await.unwrap();

    let mut command = get("/rate_limit");
    command.no_cache = true;
    command.execute(&context).await.unwrap();

    let requests = server.requests();
    assert_eq!(requests[0].header("Cache-Control"), Some("max-age=120"));
    assert_eq!(requests[1].header("Cache-Control"), None);
}

#[tokio::test]
async fn test_get_reports_error_statuses_without_failing() {
    let server = MockServer::fixed(MockResponse {
        status: 404,
        reason: "Not Found",
        ..MockResponse::ok(r#"{"message":"Not Found"}"#)
    })
    .await;

    let mut command = get("/repos/octo/missing");
    command.body = true;
    command.execute(&context_for(&server)).await.unwrap();

    assert_eq!(server.request_count(), 1);
}

#[test]
#[serial]
fn test_resolve_token_prefers_explicit() {
    unsafe { std::env::set_var("GITHUB_TOKEN", "from-env") };
    assert_eq!(resolve_token(Some("explicit")), Some("explicit".to_string()));
    assert_eq!(resolve_token(None), Some("from-env".to_string()));
    assert_eq!(resolve_token(Some(" ")), Some("from-env".to_string()));
    unsafe { std::env::remove_var("GITHUB_TOKEN") };
}

#[test]
#[serial]
fn test_resolve_token_without_env() {
    unsafe { std::env::remove_var("GITHUB_TOKEN") };
    assert_eq!(resolve_token(None), None);

    unsafe { std::env::set_var("GITHUB_TOKEN", "   ") };
    assert_eq!(resolve_token(None), None);
    unsafe { std::env::remove_var("GITHUB_TOKEN") };
}

#[test]
#[serial]
fn test_resolve_token_ignores_blank_explicit_token() {
    unsafe { std::env::remove_var("GITHUB_TOKEN") };
    assert_eq!(resolve_token(Some("  ")), None);

    unsafe { std::env::set_var("GITHUB_TOKEN", "from-env") };
    assert_eq!(resolve_token(Some("  ")), Some("from-env".to_string()));
    unsafe { std::env::remove_var("GITHUB_TOKEN") };
}
