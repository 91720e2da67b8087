use advisor_core::constants::{keys, texts};
use advisor_core::export::{GoogleAuthConfig, StoredToken};
use advisor_core::search::GoogleSearchProvider;
use advisor_core::*;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct StaticToken(Option<&'static str>);

impl CredentialProvider for StaticToken {
    fn initiate_auth(&self) {}

    fn access_token(&self) -> Option<String> {
        self.0.map(str::to_string)
    }
}

fn exporter(server: &MockServer, token: Option<&'static str>, store: Arc<MemoryStore>) -> GoogleDocsExporter {
    GoogleDocsExporter::new(Arc::new(StaticToken(token)), store)
        .with_endpoints(format!("{}/docs", server.uri()), format!("{}/drive", server.uri()))
}

fn document_body(end_index: u64) -> serde_json::Value {
    json!({
        "body": { "content": [
            { "endIndex": 1, "sectionBreak": {} },
            { "startIndex": 1, "endIndex": end_index, "paragraph": {} }
        ]}
    })
}

// ========================================================================
// GoogleDocsExporter (export/google_docs.rs)
// ========================================================================

#[tokio::test]
async fn test_save_appends_to_remembered_document() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());
    store.set(keys::MAIN_DOCUMENT_ID, "doc-1").unwrap();

    Mock::given(method("GET"))
        .and(path("/docs/doc-1"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(document_body(42)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/docs/doc-1:batchUpdate"))
        .and(body_partial_json(json!({
            "requests": [{ "insertText": { "location": { "index": 41 } } }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/drive/doc-1"))
        .and(query_param("fields", "webViewLink"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "webViewLink": "https://docs.google.com/document/d/doc-1/edit" })),
        )
        .mount(&server)
        .await;
    // A create call would mean the remembered id was ignored
    Mock::given(method("POST"))
        .and(path("/docs"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let receipt = exporter(&server, Some("tok"), store.clone())
        .save("Diversify across asset classes.")
        .await
        .unwrap();

    assert_eq!(receipt.document_id, "doc-1");
    assert_eq!(
        receipt.document_url.as_deref(),
        Some("https://docs.google.com/document/d/doc-1/edit")
    );
    assert_eq!(store.get(keys::MAIN_DOCUMENT_ID).unwrap().as_deref(), Some("doc-1"));
}

#[tokio::test]
async fn test_save_recreates_missing_document() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());
    store.set(keys::MAIN_DOCUMENT_ID, "gone").unwrap();

    Mock::given(method("GET"))
        .and(path("/docs/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/docs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "documentId": "fresh" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs/fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "body": { "content": [] } })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/docs/fresh:batchUpdate"))
        .and(body_string_contains("Message from"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/drive/fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let receipt = exporter(&server, Some("tok"), store.clone())
        .save("Rebalance yearly.")
        .await
        .unwrap();

    assert_eq!(receipt.document_id, "fresh");
    assert_eq!(receipt.document_url, None);
    assert_eq!(store.get(keys::MAIN_DOCUMENT_ID).unwrap().as_deref(), Some("fresh"));
}

#[tokio::test]
async fn test_save_maps_unauthorized_to_auth_expired() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());
    store.set(keys::MAIN_DOCUMENT_ID, "doc-1").unwrap();

    Mock::given(method("GET"))
        .and(path("/docs/doc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(document_body(10)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/docs/doc-1:batchUpdate"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid credentials"))
        .mount(&server)
        .await;

    let err = exporter(&server, Some("stale"), store).save("Hi").await.unwrap_err();
    assert!(matches!(err, ExportError::AuthExpired), "got {err:?}");
}

#[tokio::test]
async fn test_expired_token_on_fetch_does_not_create_document() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());
    store.set(keys::MAIN_DOCUMENT_ID, "doc-1").unwrap();

    Mock::given(method("GET"))
        .and(path("/docs/doc-1"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/docs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "documentId": "other" })))
        .expect(0)
        .mount(&server)
        .await;

    let err = exporter(&server, Some("stale"), store.clone()).save("Hi").await.unwrap_err();
    assert!(matches!(err, ExportError::AuthExpired), "got {err:?}");
    assert_eq!(store.get(keys::MAIN_DOCUMENT_ID).unwrap().as_deref(), Some("doc-1"));
}

#[tokio::test]
async fn test_save_without_token_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = exporter(&server, None, Arc::new(MemoryStore::new()))
        .save("Hi")
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::NotAuthenticated));
}

// ========================================================================
// GoogleAuth token exchange (export/google_auth.rs)
// ========================================================================

fn google_auth(server: &MockServer, store: Arc<MemoryStore>) -> GoogleAuth {
    let mut config = GoogleAuthConfig::new("client-id", "client-secret");
    config.token_endpoint = format!("{}/token", server.uri());
    GoogleAuth::new(config, store).without_browser()
}

#[tokio::test]
async fn test_callback_exchanges_code_and_persists_token() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=4%2F0AbCd"))
        .and(body_string_contains("client_secret=client-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.token",
            "expires_in": 3599,
            "refresh_token": "1//refresh",
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let auth = google_auth(&server, store.clone());
    assert!(!auth.is_authenticated());

    let token = auth
        .handle_callback("http://localhost:8080/?code=4%2F0AbCd&scope=docs")
        .await
        .unwrap();
    assert_eq!(token.access_token, "ya29.token");
    assert_eq!(token.expires_in, Some(3599));
    assert!(token.timestamp.is_some());

    let raw = store.get(keys::GOOGLE_AUTH_TOKEN).unwrap().unwrap();
    let persisted: StoredToken = serde_json::from_str(&raw).unwrap();
    assert_eq!(persisted, token);
    assert_eq!(auth.access_token().as_deref(), Some("ya29.token"));
}

#[tokio::test]
async fn test_callback_error_reports_reason_and_stores_nothing() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Bad Request"
        })))
        .mount(&server)
        .await;

    let auth = google_auth(&server, store.clone());
    match auth.handle_callback("4/0AbCd").await {
        Err(AdvisorError::Auth(msg)) => assert!(msg.contains("invalid_grant: Bad Request"), "{msg}"),
        other => panic!("Expected Auth error, got {:?}", other),
    }
    assert!(store.get(keys::GOOGLE_AUTH_TOKEN).unwrap().is_none());
    assert!(!auth.is_authenticated());
}

// ========================================================================
// GoogleSearchProvider (search/google.rs)
// ========================================================================

fn google_search(server: &MockServer) -> GoogleSearchProvider {
    GoogleSearchProvider::new("api-key", "engine").with_base_url(format!("{}/customsearch/v1", server.uri()))
}

#[tokio::test]
async fn test_google_search_sends_query_and_parses_items() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .and(query_param("key", "api-key"))
        .and(query_param("cx", "engine"))
        .and(query_param("q", "loss aversion"))
        .and(query_param("num", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "title": "Loss aversion", "snippet": "Losses loom\nlarger.", "link": "https://example.com/a" },
                { "title": "Prospect theory", "snippet": "Kahneman and Tversky.", "link": "https://example.com/b" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let hits = google_search(&server).search("loss aversion", 3).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].title, "Loss aversion");
    assert_eq!(hits[0].snippet, "Losses loom larger.");
    assert_eq!(hits[1].url, "https://example.com/b");
}

#[tokio::test]
async fn test_google_search_error_status_is_search_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "Daily limit exceeded" }
        })))
        .mount(&server)
        .await;

    match google_search(&server).search("anything", 5).await {
        Err(AdvisorError::Search(msg)) => assert!(msg.contains("403"), "{msg}"),
        other => panic!("Expected Search error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_grounding_degrades_when_google_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let search = GroundingSearch::new(Box::new(google_search(&server)));
    assert_eq!(search.lookup("inflation").await, texts::SEARCH_FALLBACK);
}
