//! End-to-end: suite documents executed through `ReqwestClient` against a
//! local mock server.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use apiprobe::collections::{ResolveOptions, SuiteDocument};
use apiprobe::{
    AssertionSpec, ErrorKind, HttpMethod, JsonReporter, ReqwestClient, RequestDescriptor,
    ResultKind, RunMode, RunOptions, Scenario, ScenarioRunner, storage,
};
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn post(id: u64, user_id: u64) -> Value {
    json!({
        "id": id,
        "userId": user_id,
        "title": format!("post {id}"),
        "body": "lorem ipsum"
    })
}

async fn posts_api() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/posts"))
        .and(query_param("userId", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([post(1, 1), post(2, 1)])))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([post(1, 1), post(2, 1), post(11, 2)])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/posts/1"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(post(1, 1)))
        .mount(&server)
        .await;
    Mock::given(path("/posts/9999"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/posts"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 101, "title": "foo", "body": "bar", "userId": 1
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/posts/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1, "title": "updated title", "body": "updated body", "userId": 1
        })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/posts/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1, "title": "partially updated title", "body": "lorem ipsum", "userId": 1
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/posts/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    server
}

fn demo_suite_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("suites/jsonplaceholder.json")
}

#[tokio::test]
async fn demo_suite_passes_against_conforming_api() {
    let server = posts_api().await;
    let mut overrides = BTreeMap::new();
    overrides.insert("base_url".to_string(), server.uri());

    let suite = storage::load_suite(&demo_suite_path())
        .unwrap()
        .resolve(&ResolveOptions {
            environment: None,
            overrides,
        })
        .unwrap();
    assert_eq!(suite.scenarios.len(), 12);
    assert_eq!(suite.options.mode, RunMode::Parallel);

    let client = ReqwestClient::with_timeout(suite.options.request_timeout()).unwrap();
    let runner = ScenarioRunner::new(Arc::new(client), suite.options.clone());
    let result = runner.run(&suite.scenarios).await;

    let failures: Vec<_> = result.results.iter().filter(|r| !r.passed).collect();
    assert!(failures.is_empty(), "unexpected failures: {failures:#?}");

    let names: Vec<&str> = result.by_scenario().into_iter().map(|(name, _)| name).collect();
    let expected: Vec<&str> = suite.scenarios.iter().map(Scenario::name).collect();
    assert_eq!(names, expected);
    assert_eq!(result.summary().scenarios, 12);
}

#[tokio::test]
async fn contract_violations_are_reported_per_assertion() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/plain")
                .set_body_string(r#"[{"userId":1},{"userId":2}]"#),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/posts/1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let raw = json!({
        "name": "violations",
        "variables": { "base_url": server.uri() },
        "scenarios": [
            {
                "name": "broken post",
                "request": { "url": "{{base_url}}/posts/1" },
                "assertions": [ { "type": "status_equals", "status": 200 } ]
            },
            {
                "name": "filtered posts",
                "request": { "url": "{{base_url}}/posts" },
                "assertions": [
                    { "type": "header_contains", "name": "Content-Type", "substring": "application/json" },
                    { "type": "all_items_satisfy", "assertion": { "type": "property_equals", "path": "userId", "value": 1 } },
                    { "type": "array_length_greater_than", "length": 1 }
                ]
            }
        ]
    })
    .to_string();

    let suite = SuiteDocument::from_json(&raw)
        .unwrap()
        .resolve(&ResolveOptions::default())
        .unwrap();
    let runner = ScenarioRunner::new(Arc::new(ReqwestClient::new().unwrap()), suite.options);
    let sink = JsonReporter::new(Vec::new()).with_title("violations");
    let result = runner.run_and_report(&suite.scenarios, &sink).await.unwrap();

    assert_eq!(result.results.len(), 4);
    assert_eq!(result.results[0].scenario, "broken post");
    assert_eq!(
        result.results[0].kind,
        ResultKind::ExecutionFailed(ErrorKind::Http)
    );
    assert!(result.results[0]
        .failure_detail
        .as_deref()
        .unwrap()
        .starts_with("HTTP 500"));

    assert!(!result.results[1].passed);
    assert_eq!(
        result.results[2].failure_detail.as_deref(),
        Some("item 1: expected `userId` to equal 1, got 2")
    );
    assert!(result.results[3].passed);

    let report: Value = serde_json::from_slice(&sink.into_inner()).unwrap();
    assert_eq!(report["passed"], false);
    assert_eq!(report["summary"]["failed"], 3);
}

#[tokio::test]
async fn request_timeout_is_reported_as_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let client = ReqwestClient::with_timeout(Some(Duration::from_millis(100))).unwrap();
    let runner = ScenarioRunner::new(Arc::new(client), RunOptions::default());
    let scenarios = vec![Scenario::new(
        "slow",
        RequestDescriptor::get(format!("{}/slow", server.uri())).build(),
        vec![AssertionSpec::StatusEquals { status: 200 }],
    )];

    let result = runner.run(&scenarios).await;
    assert_eq!(result.results.len(), 1);
    assert_eq!(
        result.results[0].kind,
        ResultKind::ExecutionFailed(ErrorKind::Timeout)
    );
}

#[tokio::test]
async fn suite_deadline_stops_slow_scenarios() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let options = RunOptions {
        deadline_ms: Some(200),
        ..Default::default()
    };
    let runner = ScenarioRunner::new(Arc::new(ReqwestClient::new().unwrap()), options);
    let scenarios = vec![
        Scenario::new(
            "slow",
            RequestDescriptor::get(format!("{}/slow", server.uri())).build(),
            vec![AssertionSpec::StatusEquals { status: 200 }],
        ),
        Scenario::new(
            "after",
            RequestDescriptor::builder(HttpMethod::Delete, format!("{}/slow", server.uri()))
                .build(),
            vec![AssertionSpec::StatusEquals { status: 200 }],
        ),
    ];

    let result = runner.run(&scenarios).await;
    let kinds: Vec<ResultKind> = result.results.iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ResultKind::ExecutionFailed(ErrorKind::Timeout),
            ResultKind::Skipped,
        ]
    );
    assert!(result.duration_ms < 3000);
}
