//! Adapter tests against mock HTTP servers
//!
//! These tests use wiremock to stand in for the CDX server and the GitHub API,
//! including one full session run end-to-end through each adapter.

use pagetrawl::config::{UserAgentConfig, WaybackConfig};
use pagetrawl::fetcher::{
    build_http_client, CountEstimator, FetchError, GitHubFetcher, PageFetcher, WaybackFetcher,
};
use pagetrawl::records::{CdxRecord, CommitRecord};
use pagetrawl::session::{Outcome, SessionController};
use pagetrawl::state::{ContinuationToken, ResourceKey};
use pagetrawl::storage::{RecordStore, ResumeStore, SqliteStorage};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CDX_PATH: &str = "/cdx/search/cdx";

fn user_agent() -> UserAgentConfig {
    UserAgentConfig {
        client_name: "TestClient".to_string(),
        client_version: "1.0".to_string(),
        contact_url: "https://example.com/about".to_string(),
    }
}

fn wayback(server: &MockServer, batch: u32) -> WaybackFetcher {
    let config = WaybackConfig {
        base_url: format!("{}{}", server.uri(), CDX_PATH),
        batch_size: batch,
        timeout_secs: 5,
    };
    WaybackFetcher::new(&config, &user_agent()).unwrap()
}

fn github(server: &MockServer, per_page: u32, token: Option<&str>) -> GitHubFetcher {
    let client = build_http_client(&user_agent(), Duration::from_secs(5)).unwrap();
    GitHubFetcher::with_client(client, &server.uri(), per_page, token.map(str::to_string))
}

fn commit_json(sha: &str) -> serde_json::Value {
    serde_json::json!({
        "sha": sha,
        "commit": {
            "author": { "name": "Ada", "email": "ada@example.com", "date": "2024-01-02T03:04:05Z" },
            "committer": { "name": "Ada", "email": "ada@example.com", "date": "2024-01-02T03:04:05Z" },
            "message": format!("commit {}", sha)
        },
        "author": { "login": "ada" },
        "committer": null,
        "html_url": format!("https://github.com/o/r/commit/{}", sha)
    })
}

#[tokio::test]
async fn test_wayback_first_page_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CDX_PATH))
        .and(query_param("url", "*.example.com"))
        .and(query_param("output", "json"))
        .and(query_param("fl", "original,timestamp,statuscode,mimetype"))
        .and(query_param("collapse", "urlkey"))
        .and(query_param("limit", "2"))
        .and(query_param("showResumeKey", "true"))
        .and(header("user-agent", "TestClient/1.0 (+https://example.com/about)"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[["original","timestamp","statuscode","mimetype"],
                ["http://example.com/","20200101000000","200","text/html"],
                ["http://www.example.com/x","20200102000000","404","text/html"],
                [],
                ["com,example,www)/x 20200102000000"]]"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let key = ResourceKey::wayback_domain("example.com").unwrap();
    let page = wayback(&server, 2)
        .fetch_page(&key, &ContinuationToken::start())
        .await
        .unwrap();

    assert_eq!(page.items.len(), 2);
    assert!(page.has_more);
    assert_eq!(
        page.continuation_token.as_str(),
        "com,example,www)/x 20200102000000"
    );
    assert_eq!(page.items[1].status_code, Some(404));
}

#[tokio::test]
async fn test_wayback_503_is_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CDX_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let key = ResourceKey::wayback_domain("example.com").unwrap();
    let err = wayback(&server, 2)
        .fetch_page(&key, &ContinuationToken::start())
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::RateLimited { status: 503 }));
    assert_eq!(err.reason(), "rate limited");
}

#[tokio::test]
async fn test_wayback_estimate() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CDX_PATH))
        .and(query_param("showNumPages", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_string("4\n"))
        .mount(&server)
        .await;

    let key = ResourceKey::wayback_domain("example.com").unwrap();
    let total = wayback(&server, 2).estimate_total(&key).await.unwrap();
    assert_eq!(total, 12_000);
}

#[tokio::test]
async fn test_wayback_session_end_to_end() {
    let server = MockServer::start().await;

    // Registered first so it wins over the first-page mock
    Mock::given(method("GET"))
        .and(path(CDX_PATH))
        .and(query_param("resumeKey", "com,example)/b 20200102000000"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[["original","timestamp","statuscode","mimetype"],
                ["http://example.com/c","20200103000000","200","text/html"]]"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(CDX_PATH))
        .and(query_param("output", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[["original","timestamp","statuscode","mimetype"],
                ["http://example.com/a","20200101000000","200","text/html"],
                ["http://example.com/b","20200102000000","200","text/html"],
                [],
                ["com,example)/b 20200102000000"]]"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(CDX_PATH))
        .and(query_param("showNumPages", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_string("1"))
        .mount(&server)
        .await;

    let fetcher = wayback(&server, 2);
    let store = Arc::new(Mutex::new(SqliteStorage::open_in_memory().unwrap()));
    let controller = SessionController::new(
        fetcher.clone(),
        fetcher,
        store.clone(),
        Duration::from_millis(10),
    );

    let key = ResourceKey::wayback_domain("https://Example.com/some/page").unwrap();
    let mut session = controller.start(key.clone()).unwrap();
    let done = controller.run(&mut session).await;

    assert_eq!(done.outcome, Outcome::Completed);
    assert_eq!(done.records_fetched, 3);
    assert_eq!(session.estimated_total(), Some(3000));

    let store = store.lock().unwrap();
    assert_eq!(
        RecordStore::<CdxRecord>::count_records(&*store, &key).unwrap(),
        3
    );
    assert!(store.load_fetch_state(&key).unwrap().unwrap().is_complete);
}

#[tokio::test]
async fn test_github_follows_link_header() {
    let server = MockServer::start().await;
    let next = format!("{}/repositories/7/commits?per_page=2&page=2", server.uri());

    Mock::given(method("GET"))
        .and(path("/repos/octo/widgets/commits"))
        .and(query_param("per_page", "2"))
        .and(header("accept", "application/vnd.github+json"))
        .and(header("x-github-api-version", "2022-11-28"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("link", format!("<{}>; rel=\"next\"", next).as_str())
                .set_body_json(vec![commit_json("aaa"), commit_json("bbb")]),
        )
        .expect(1)
        .mount(&server)
        .await;

    let key = ResourceKey::github_repo("octo/widgets").unwrap();
    let fetcher = github(&server, 2, Some("secret"));
    let page = fetcher
        .fetch_page(&key, &ContinuationToken::start())
        .await
        .unwrap();

    assert!(page.has_more);
    assert_eq!(page.continuation_token.as_str(), next);
    assert_eq!(page.items.len(), 2);

    let first: &CommitRecord = &page.items[0];
    assert_eq!(first.sha, "aaa");
    assert_eq!(first.author_name, "Ada");
    assert_eq!(first.github_author_login.as_deref(), Some("ada"));
    assert_eq!(first.github_committer_login, None);
}

#[tokio::test]
async fn test_github_exhausted_quota_is_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/widgets/commits"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("x-ratelimit-reset", "1700000000")
                .set_body_string(r#"{"message":"API rate limit exceeded"}"#),
        )
        .mount(&server)
        .await;

    let key = ResourceKey::github_repo("octo/widgets").unwrap();
    let err = github(&server, 2, None)
        .fetch_page(&key, &ContinuationToken::start())
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::RateLimited { status: 403 }));
}

#[tokio::test]
async fn test_github_not_found_is_permanent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/missing/commits"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"message":"Not Found"}"#))
        .mount(&server)
        .await;

    let key = ResourceKey::github_repo("octo/missing").unwrap();
    let err = github(&server, 2, None)
        .fetch_page(&key, &ContinuationToken::start())
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Status { status: 404, .. }));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_github_estimate_from_last_link() {
    let server = MockServer::start().await;
    let last = format!("{}/repositories/7/commits?per_page=1&page=1234", server.uri());

    Mock::given(method("GET"))
        .and(path("/repos/octo/widgets/commits"))
        .and(query_param("per_page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("link", format!("<{}>; rel=\"last\"", last).as_str())
                .set_body_json(vec![commit_json("aaa")]),
        )
        .mount(&server)
        .await;

    let key = ResourceKey::github_repo("octo/widgets").unwrap();
    let total = github(&server, 100, None).estimate_total(&key).await.unwrap();
    assert_eq!(total, 1234);
}

#[tokio::test]
async fn test_github_session_end_to_end() {
    let server = MockServer::start().await;
    let next = format!("{}/repositories/7/commits?per_page=2&page=2", server.uri());

    Mock::given(method("GET"))
        .and(path("/repositories/7/commits"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![commit_json("ccc")]))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/widgets/commits"))
        .and(query_param("per_page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("link", format!("<{}>; rel=\"next\"", next).as_str())
                .set_body_json(vec![commit_json("aaa"), commit_json("bbb")]),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/widgets/commits"))
        .and(query_param("per_page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![commit_json("aaa")]))
        .mount(&server)
        .await;

    let fetcher = github(&server, 2, None);
    let store = Arc::new(Mutex::new(SqliteStorage::open_in_memory().unwrap()));
    let controller =
        SessionController::new(fetcher.clone(), fetcher, store.clone(), Duration::ZERO);

    let key = ResourceKey::github_repo("octo/widgets").unwrap();
    let mut session = controller.start(key.clone()).unwrap();
    let done = controller.run(&mut session).await;

    assert_eq!(done.outcome, Outcome::Completed);
    assert_eq!(done.records_fetched, 3);

    let store = store.lock().unwrap();
    assert_eq!(
        RecordStore::<CommitRecord>::count_records(&*store, &key).unwrap(),
        3
    );
}
