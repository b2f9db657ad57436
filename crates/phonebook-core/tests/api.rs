use std::path::PathBuf;

use phonebook_core::conversation::Request;
use phonebook_core::{ApiClient, ApiError, Body, Mode};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PNG_DATA_URL: &str = "data:image/png;base64,aGk=";

#[tokio::test]
async fn test_company_lookup_sends_name_and_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/company"))
        .and(header("x-api-key", "secret"))
        .and(body_json(json!({ "name": "Acme" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Acme",
            "industry": "Anvils",
            "employee_count": 42
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), Some("secret"));
    let company = client.company("Acme").await.expect("company response");

    assert_eq!(company.name, "Acme");
    assert_eq!(company.industry.as_deref(), Some("Anvils"));
    assert_eq!(company.employee_count.as_deref(), Some("42"));
}

#[tokio::test]
async fn test_error_detail_becomes_message_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/person"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({ "detail": "linkedin_url is invalid" })),
        )
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), None);
    let err = client.person("not a url").await.unwrap_err();

    match &err {
        ApiError::Status { status, detail } => {
            assert_eq!(*status, 422);
            assert_eq!(detail.as_deref(), Some("linkedin_url is invalid"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.to_string(), "linkedin_url is invalid");
}

#[tokio::test]
async fn test_error_without_detail_reports_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/company"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), None);
    let err = client.company("Acme").await.unwrap_err();
    assert_eq!(err.to_string(), "API error (HTTP 502)");
}

#[tokio::test]
async fn test_non_json_success_is_a_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/company"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), None);
    let err = client.company("Acme").await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn test_news_requests_a_briefing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/news"))
        .and(body_json(json!({ "topic": "fusion", "mode": "briefing" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "topic": "fusion",
            "articles": [{ "url": "https://example.com/a", "title": "Ignition" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), None);
    let news = client.news("fusion", None).await.expect("news response");
    assert_eq!(news.articles.len(), 1);
    assert_eq!(news.articles[0].title, "Ignition");
}

#[tokio::test]
async fn test_dashboard_unwraps_wrapped_digest() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/news"))
        .and(body_json(json!({
            "topic": "solar energy Singapore",
            "mode": "briefing",
            "days": 7
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "solar_sg": {
                "topic": "solar energy Singapore",
                "articles": [
                    { "url": "https://www.straitstimes.com/x", "title": "Floating farm" },
                    { "url": "https://example.com/y", "title": "Rooftops" }
                ]
            }
        })))
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), None);
    let digest = client
        .dashboard("solar energy Singapore")
        .await
        .expect("dashboard response");
    assert_eq!(digest.articles.len(), 2);
    assert_eq!(digest.articles[0].title, "Floating farm");
}

#[tokio::test]
async fn test_execute_image_saves_files() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/image"))
        .and(body_json(json!({ "prompt": "a red fox", "n": 1 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "image-model",
            "images": [{ "data_url": PNG_DATA_URL }, { "data_url": null }]
        })))
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let client = ApiClient::new(&server.uri(), None);
    let request = Request {
        mode: Mode::Image,
        prompt: "a red fox".to_string(),
        attachment: None,
    };

    let body = client.execute(&request, out.path()).await.expect("image body");
    let Body::Images(batch) = body else {
        panic!("expected images body");
    };
    assert_eq!(batch.model, "image-model");
    assert_eq!(batch.files.len(), 1);
    assert_eq!(std::fs::read(&batch.files[0]).unwrap(), b"hi");
}

#[tokio::test]
async fn test_execute_with_attachment_uses_edit_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/image/edit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "edit-model",
            "images": [{ "data_url": PNG_DATA_URL }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let source: PathBuf = tmp.path().join("cat.png");
    std::fs::write(&source, b"not really a png").unwrap();

    let client = ApiClient::new(&server.uri(), None);
    let request = Request {
        mode: Mode::Image,
        prompt: "add a hat".to_string(),
        attachment: Some(source),
    };

    let body = client
        .execute(&request, &tmp.path().join("out"))
        .await
        .expect("edit body");
    assert!(matches!(body, Body::Images(ref b) if b.model == "edit-model"));

    let received = server.received_requests().await.unwrap();
    let content_type = received[0]
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("multipart/form-data"));
}

#[tokio::test]
async fn test_missing_attachment_is_an_io_error() {
    let server = MockServer::start().await;
    let client = ApiClient::new(&server.uri(), None);
    let tmp = TempDir::new().unwrap();

    let err = client
        .edit_image("hat", 1, &tmp.path().join("missing.png"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Io { .. }));
}
