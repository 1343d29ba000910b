//! End-to-end client flows over real HTTP against a local mock server.

use dossier_core::{
    Clients, DocsOptions, DocsResponse, DossierConfig, ReqwestTransport, SearchOptions,
};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn clients_for(server: &MockServer) -> Clients {
    let mut config = DossierConfig::default();
    config.context7.base_url = format!("{}/api/v1", server.uri());
    config.context7.api_key = Some("ctx7".into());
    config.metasearch.base_url = server.uri();
    config.stackexchange.base_url = format!("{}/2.3", server.uri());
    let transport = Arc::new(ReqwestTransport::new().unwrap());
    let mut clients = Clients::with_transport(&config, transport.clone());
    clients.wiki = dossier_core::WikipediaClient::new(transport)
        .with_base_url(format!("{}/w/api.php", server.uri()));
    clients
}

#[tokio::test]
async fn qa_research_flow_builds_dossier() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2.3/search/advanced"))
        .and(query_param("tagged", "python"))
        .and(query_param("site", "stackoverflow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"question_id": 101, "title": "ValueError: invalid literal for int()", "score": 40,
                 "link": "https://stackoverflow.com/q/101", "tags": ["python"],
                 "accepted_answer_id": 1001, "is_answered": true},
                {"question_id": 102, "title": "No accepted answer", "score": 3,
                 "link": "https://stackoverflow.com/q/102", "is_answered": false}
            ],
            "quota_remaining": 9000
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2.3/questions/101/answers"))
        .and(query_param("filter", "withbody"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"answer_id": 1001, "question_id": 101, "body": "<p>Strip the newline.</p>",
                 "score": 55, "creation_date": 1_500_000_000, "is_accepted": true},
                {"answer_id": 1002, "question_id": 101, "body": "<p>Other</p>",
                 "score": 60, "creation_date": 1_500_000_100, "is_accepted": false}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let clients = clients_for(&server);
    let research = clients
        .qa
        .research("ValueError: invalid literal for int() with base 10: 'abc\\n'")
        .await
        .unwrap();

    assert_eq!(research.classification.language, "python");
    assert_eq!(research.items.len(), 1);
    let item = &research.items[0];
    assert_eq!(item.question().id, 101);
    assert_eq!(item.answer().id, 1001);
    assert_eq!(item.answer_link(), "https://stackoverflow.com/q/101");
}

#[tokio::test]
async fn docs_flow_with_text_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search"))
        .and(query_param("query", "tokio"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"id": "/tokio-rs/tokio", "title": "Tokio", "stars": 29000, "trustScore": 9.1}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tokio-rs/tokio"))
        .respond_with(ResponseTemplate::new(200).set_body_string("TITLE: Spawning\n-----\n"))
        .mount(&server)
        .await;

    let clients = clients_for(&server);
    let libraries = clients.docs.search("tokio").await.unwrap();
    assert_eq!(libraries[0].id, "/tokio-rs/tokio");

    let docs = clients
        .docs
        .get_docs(&libraries[0].id, &DocsOptions::default().with_topic("spawn"))
        .await
        .unwrap();
    assert_eq!(docs, DocsResponse::Text("TITLE: Spawning\n-----\n".into()));
}

#[tokio::test]
async fn docs_upstream_failure_carries_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let clients = clients_for(&server);
    let err = clients
        .docs
        .get_docs("acme/widgets", &DocsOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.upstream_status(), Some(401));
    assert_eq!(err.code_str(), "upstream_error");
}

#[tokio::test]
async fn metasearch_flow_truncates() {
    let server = MockServer::start().await;
    let hits: Vec<_> = (0..10)
        .map(|i| json!({"title": format!("r{}", i), "href": format!("https://r/{}", i), "body": ""}))
        .collect();
    Mock::given(method("GET"))
        .and(path("/search/text"))
        .and(query_param("max_results", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": hits })))
        .mount(&server)
        .await;

    let clients = clients_for(&server);
    let options = SearchOptions {
        max_results: 3,
        ..Default::default()
    };
    let results = clients.metasearch.search("anything", &options).await.unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[2].title, "r2");
}

#[tokio::test]
async fn wikipedia_flow_reads_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("action", "query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": {"pages": {"736": {
                "pageid": 736, "title": "Albert Einstein",
                "extract": "Albert Einstein was a physicist.",
                "fullurl": "https://en.wikipedia.org/wiki/Albert_Einstein"
            }}}
        })))
        .mount(&server)
        .await;

    let clients = clients_for(&server);
    let page = clients.wiki.get_page("Albert Einstein").await.unwrap();
    assert!(page.exists);
    assert_eq!(page.page_id, Some(736));
    assert_eq!(page.summary, "Albert Einstein was a physicist.");
}
