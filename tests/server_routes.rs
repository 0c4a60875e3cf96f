mod support;

use calsync_auth_lib::test_support::callback_query;
use calsync_auth_lib::CallbackServer;
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use serde_json::{json, Value};
use wiremock::matchers::method;
use wiremock::{Mock, ResponseTemplate};

use support::{granted_body, TestEnv};

async fn start_server(env: &TestEnv) -> CallbackServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    CallbackServer::start_on(listener, env.settings()).expect("start callback server")
}

fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .expect("http client")
}

fn callback_url(server: &CallbackServer, code: &str) -> reqwest::Url {
    let mut url = reqwest::Url::parse(&format!("http://{}/", server.local_addr())).expect("url");
    {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in callback_query(code) {
            pairs.append_pair(&key, &value);
        }
    }
    url
}

#[tokio::test]
async fn health_reports_ok() {
    let env = TestEnv::new().await;
    let server = start_server(&env).await;

    let response = http_client()
        .get(format!("http://{}/health", server.local_addr()))
        .send()
        .await
        .expect("health request");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&response.text().await.expect("body")).expect("json");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["app"], "calsync-auth");

    server.stop().await.expect("stop");
}

#[tokio::test]
async fn login_redirects_to_google_consent() {
    let env = TestEnv::new().await;
    let server = start_server(&env).await;

    let response = http_client()
        .get(format!("http://{}/login", server.local_addr()))
        .send()
        .await
        .expect("login request");
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    let location = response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("location header");
    let location = reqwest::Url::parse(location).expect("location url");
    assert_eq!(location.host_str(), Some("accounts.google.com"));
    let pairs: std::collections::HashMap<_, _> = location.query_pairs().into_owned().collect();
    assert_eq!(pairs["access_type"], "offline");
    assert_eq!(pairs["prompt"], "consent");
    assert_eq!(pairs["client_id"], "test-client.apps.googleusercontent.com");

    server.stop().await.expect("stop");
}

#[tokio::test]
async fn plain_visit_to_callback_path_does_not_exchange() {
    let env = TestEnv::new().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(granted_body("a@b.com", Some("r"))))
        .expect(0)
        .mount(&env.server)
        .await;
    let server = start_server(&env).await;

    let response = http_client()
        .get(format!("http://{}/?code=only-code", server.local_addr()))
        .send()
        .await
        .expect("callback request");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(env.token_files().is_empty());

    server.stop().await.expect("stop");
}

#[tokio::test]
async fn redirect_with_all_params_stores_credentials() {
    let env = TestEnv::new().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(granted_body("a@b.com", Some("1//refresh"))),
        )
        .expect(1)
        .mount(&env.server)
        .await;
    let server = start_server(&env).await;

    let response = http_client()
        .get(callback_url(&server, "4/0AeaYSHB-code"))
        .send()
        .await
        .expect("callback request");
    assert_eq!(response.status(), StatusCode::OK);

    let raw = std::fs::read(env.tokens_dir().join("a@b.com.json")).expect("credential file");
    let record: Value = serde_json::from_slice(&raw).expect("json");
    assert_eq!(record["token"]["refresh_token"], json!("1//refresh"));
    assert_eq!(record["jwtData"]["email"], json!("a@b.com"));

    server.stop().await.expect("stop");
}

#[tokio::test]
async fn failed_exchange_surfaces_as_server_error() {
    let env = TestEnv::new().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&env.server)
        .await;
    let server = start_server(&env).await;

    let response = http_client()
        .get(callback_url(&server, "4/0Abc"))
        .send()
        .await
        .expect("callback request");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(env.token_files().is_empty());

    server.stop().await.expect("stop");
}

#[tokio::test]
async fn rejected_exchange_still_answers_ok() {
    let env = TestEnv::new().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})),
        )
        .expect(1)
        .mount(&env.server)
        .await;
    let server = start_server(&env).await;

    let response = http_client()
        .get(callback_url(&server, "4/0Abc"))
        .send()
        .await
        .expect("callback request");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(env.token_files().is_empty());

    server.stop().await.expect("stop");
}

#[tokio::test]
async fn callback_path_colliding_with_builtin_route_is_rejected() {
    let env = TestEnv::new().await;
    let mut settings = env.settings();
    settings.redirect_uri = "http://localhost:5173/health".to_string();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");

    let err = match CallbackServer::start_on(listener, settings) {
        Ok(_) => panic!("collision should be rejected"),
        Err(err) => err,
    };
    assert_eq!(err.code(), "CONFIG_INVALID");
}
