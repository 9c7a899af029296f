use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use wander_http::retry::{InstantSleeper, RetryPolicy};
use wander_http::{FetchError, HttpClient, RequestOpts};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, sleeper: Arc<InstantSleeper>) -> HttpClient {
    HttpClient::new(&server.uri())
        .expect("base url")
        .with_sleeper(sleeper)
}

#[tokio::test]
async fn repeated_429_exhausts_budget_then_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page/random/summary"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let sleeper = Arc::new(InstantSleeper::new());
    let client = client_for(&server, sleeper.clone());

    let err = client
        .fetch("page/random/summary", RequestOpts::default())
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::RateLimited { attempts: 3 }), "{err:?}");
    // two waits between three attempts, linear in the attempt number
    assert_eq!(
        sleeper.delays(),
        vec![Duration::from_millis(1500), Duration::from_millis(3000)]
    );
}

#[tokio::test]
async fn retry_after_header_is_honored() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(503).insert_header("Retry-After", "2"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let sleeper = Arc::new(InstantSleeper::new());
    let client = client_for(&server, sleeper.clone());

    let body = client.get_text("busy", RequestOpts::default()).await.unwrap();
    assert_eq!(body, "ok");
    assert_eq!(sleeper.delays(), vec![Duration::from_secs(2)]);
}

#[tokio::test]
async fn not_found_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page/summary/Nope"))
        .respond_with(ResponseTemplate::new(404).set_body_string(
            r#"{"title":"Not found.","detail":"Page or revision not found."}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let sleeper = Arc::new(InstantSleeper::new());
    let client = client_for(&server, sleeper.clone());

    let err = client
        .fetch("page/summary/Nope", RequestOpts::default())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::NotFound { .. }), "{err:?}");
    assert!(sleeper.delays().is_empty());
}

#[tokio::test]
async fn other_server_errors_surface_with_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string(
            r#"{"error":{"code":"internal","info":"database hiccup"}}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(InstantSleeper::new()));
    let err = client.fetch("x", RequestOpts::default()).await.unwrap_err();
    match err {
        FetchError::Status { status, message } => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(message, "database hiccup");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn network_failures_use_the_fixed_backoff() {
    // bind then drop to get a port nobody listens on
    let port = {
        let l = TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    let sleeper = Arc::new(InstantSleeper::new());
    let client = HttpClient::new(&format!("http://127.0.0.1:{port}"))
        .unwrap()
        .with_sleeper(sleeper.clone());

    let err = client.fetch("anything", RequestOpts::default()).await.unwrap_err();
    assert!(matches!(err, FetchError::Network(_)), "{err:?}");
    assert_eq!(
        sleeper.delays(),
        vec![Duration::from_millis(500), Duration::from_millis(500)]
    );
}

#[tokio::test]
async fn identity_headers_and_query_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("action", "opensearch"))
        .and(header("user-agent", "WanderTest/1.0"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"["q",["Cat"],[""],[""]]"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri())
        .unwrap()
        .with_identity("WanderTest/1.0", "application/json")
        .unwrap();

    let url = format!("{}/w/api.php", server.uri());
    let got: serde_json::Value = client
        .get_json(
            &url,
            RequestOpts {
                query: Some(vec![("action", "opensearch".into())]),
                allow_absolute: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(got[1][0], "Cat");
}

#[tokio::test]
async fn per_request_budget_overrides_policy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(InstantSleeper::new()))
        .with_retry(RetryPolicy::immediate(5));
    let err = client
        .fetch(
            "x",
            RequestOpts {
                attempts: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Unavailable { attempts: 1 }));
}

#[tokio::test]
async fn malformed_json_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(InstantSleeper::new()));
    let err = client
        .get_json::<serde_json::Value>("x", RequestOpts::default())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Decode(..)));
    assert_eq!(err.kind(), "decode");
}
