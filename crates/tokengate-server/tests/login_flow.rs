use std::collections::HashMap;

use reqwest::StatusCode;
use reqwest::header::{COOKIE, LOCATION, SET_COOKIE};
use serde_json::json;
use tokengate_auth::RemoteVerifier;
use tokengate_auth::config::ProviderConfig;
use tokengate_server::{AppConfig, build_app};
use tokio::task::JoinHandle;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RETURN_TO: &str = "http://app.example.com/home";

struct TestServer {
    base: String,
    client: reqwest::Client,
    _key_dir: tempfile::TempDir,
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

fn config(provider: &MockServer, key_dir: &tempfile::TempDir) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.auth.service.private_key_file = key_dir
        .path()
        .join("ed25519.pem")
        .to_string_lossy()
        .into_owned();
    cfg.auth.cookies.secure = false;
    cfg.auth.providers.insert(
        "mock".to_string(),
        ProviderConfig {
            active: true,
            client_id: Some("client-id".to_string()),
            client_secret: Some("client-secret".to_string()),
            auth_url: Some(format!("{}/authorize", provider.uri())),
            token_url: Some(format!("{}/token", provider.uri())),
            userinfo_url: Some(format!("{}/userinfo", provider.uri())),
            ..ProviderConfig::default()
        },
    );
    cfg
}

async fn start_server(provider: &MockServer) -> TestServer {
    let key_dir = tempfile::tempdir().unwrap();
    let app = build_app(&config(provider, &key_dir)).await.expect("build app");

    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await;
    });

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestServer {
        base: format!("http://{addr}"),
        client,
        _key_dir: key_dir,
        shutdown: Some(tx),
        handle: Some(handle),
    }
}

async fn mock_provider() -> MockServer {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("code=good-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "upstream-token",
            "token_type": "Bearer",
        })))
        .mount(&provider)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("code=bad-code"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
        })))
        .mount(&provider)
        .await;
    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .and(header("authorization", "Bearer upstream-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "1001",
            "email": "ada@example.com",
        })))
        .mount(&provider)
        .await;
    provider
}

/// `name -> value` for every `Set-Cookie` header of a response.
fn set_cookies(response: &reqwest::Response) -> HashMap<String, String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| {
            let pair = value.to_str().ok()?.split(';').next()?;
            let (name, value) = pair.split_once('=')?;
            Some((name.trim().to_string(), value.to_string()))
        })
        .collect()
}

/// Starts a login and returns the `state` value and the cookies to send back.
async fn begin_login(server: &TestServer) -> (String, String) {
    let response = server
        .client
        .get(format!("{}/auth/login/mock", server.base))
        .query(&[("return_to", RETURN_TO)])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    let location = url::Url::parse(response.headers()[LOCATION].to_str().unwrap()).unwrap();
    assert_eq!(location.path(), "/authorize");
    let query: HashMap<_, _> = location.query_pairs().into_owned().collect();
    assert_eq!(query["response_type"], "code");
    assert_eq!(query["client_id"], "client-id");
    assert!(query["redirect_uri"].ends_with("/auth/callback/mock"));

    let cookies = set_cookies(&response);
    assert_eq!(cookies["state"], query["state"]);
    assert!(!cookies["return_to"].is_empty());

    let cookie_header = format!("state={}; return_to={}", cookies["state"], cookies["return_to"]);
    (query["state"].clone(), cookie_header)
}

#[tokio::test]
async fn full_login_refresh_logout_flow() {
    let provider = mock_provider().await;
    let server = start_server(&provider).await;

    let (state, flow_cookies) = begin_login(&server).await;

    // Provider posts the code back
    let response = server
        .client
        .post(format!("{}/auth/callback/mock", server.base))
        .header(COOKIE, flow_cookies)
        .form(&[("code", "good-code"), ("state", state.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], RETURN_TO);

    let cookies = set_cookies(&response);
    let access_token = cookies["access_token"].clone();
    let refresh_token = cookies["refresh_token"].clone();
    assert!(!access_token.is_empty());
    assert!(!refresh_token.is_empty());
    assert_eq!(cookies["return_to"], "");
    assert_eq!(cookies["state"], "");

    // A protected service fetches the key once and verifies locally
    let verifier = RemoteVerifier::connect(server.base.clone(), vec!["mock".to_string()])
        .await
        .unwrap();
    let claims = verifier.verify_token(&access_token).unwrap();
    assert_eq!(claims.user_id, "1001");
    assert_eq!(claims.email, "ada@example.com");
    assert_eq!(
        verifier.login_urls(),
        vec![format!("{}/auth/login/mock", server.base)]
    );

    // Refresh issues a new access token and leaves the refresh token alone
    let response = server
        .client
        .post(format!("{}/auth/refresh", server.base))
        .header(COOKIE, format!("refresh_token={refresh_token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cookies = set_cookies(&response);
    assert!(!cookies.contains_key("refresh_token"));
    let refreshed = verifier.verify_token(&cookies["access_token"]).unwrap();
    assert_eq!(refreshed.email, "ada@example.com");

    // Logout revokes the refresh token and clears both token cookies
    let response = server
        .client
        .post(format!("{}/auth/refresh/logout", server.base))
        .header(COOKIE, format!("refresh_token={refresh_token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cookies = set_cookies(&response);
    assert_eq!(cookies["access_token"], "");
    assert_eq!(cookies["refresh_token"], "");

    let response = server
        .client
        .post(format!("{}/auth/refresh", server.base))
        .header(COOKIE, format!("refresh_token={refresh_token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    server.shutdown().await;
}

#[tokio::test]
async fn forged_state_never_reaches_provider() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&provider)
        .await;
    let server = start_server(&provider).await;

    let (_, flow_cookies) = begin_login(&server).await;

    let response = server
        .client
        .post(format!("{}/auth/callback/mock", server.base))
        .header(COOKIE, flow_cookies)
        .form(&[("code", "good-code"), ("state", "forged")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).get("access_token").is_none());

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "invalid_state");

    // No state cookie at all
    let response = server
        .client
        .post(format!("{}/auth/callback/mock", server.base))
        .form(&[("code", "good-code"), ("state", "anything")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    server.shutdown().await;
}

#[tokio::test]
async fn failed_exchange_issues_no_tokens() {
    let provider = mock_provider().await;
    let server = start_server(&provider).await;

    let (state, flow_cookies) = begin_login(&server).await;

    let response = server
        .client
        .get(format!("{}/auth/callback/mock", server.base))
        .header(COOKIE, flow_cookies)
        .query(&[("code", "bad-code"), ("state", state.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let cookies = set_cookies(&response);
    assert!(!cookies.contains_key("access_token"));
    assert!(!cookies.contains_key("refresh_token"));

    server.shutdown().await;
}

#[tokio::test]
async fn verification_key_and_health() {
    let provider = mock_provider().await;
    let server = start_server(&provider).await;

    let response = server
        .client
        .get(format!("{}/auth/verification-key", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let pem = response.text().await.unwrap();
    assert!(pem.starts_with("-----BEGIN PUBLIC KEY-----"));

    let response = server
        .client
        .get(format!("{}/healthz", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    let response = server
        .client
        .get(format!("{}/auth/login/unknown", server.base))
        .query(&[("return_to", RETURN_TO)])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    server.shutdown().await;
}
