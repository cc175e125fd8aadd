//! The reqwest transport against a compressing upstream.

use axum::routing::get;
use axum::{Json, Router};
use integration_tests::{FixtureUpstream, FEED_FIXTURE};
use reqwest::header::{ACCEPT, ACCEPT_ENCODING, CONTENT_ENCODING};
use serde_json::Value;
use sq_core::parser::Envelope;
use sq_core::traits::Transport;
use sq_http_reqwest::{ReqwestTransport, TransportOptions};
use tower_http::compression::CompressionLayer;
use url::Url;

/// Fetches `url` without decoding and returns the `Content-Encoding` the
/// server applied.
async fn served_encoding(url: &Url, accept_encoding: &str) -> Option<String> {
    let raw = reqwest::Client::builder()
        .no_gzip()
        .no_deflate()
        .build()
        .unwrap();
    let response = raw
        .get(url.clone())
        .header(ACCEPT, "application/json")
        .header(ACCEPT_ENCODING, accept_encoding)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    response
        .headers()
        .get(CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

#[tokio::test]
async fn gzip_responses_are_decoded() {
    let upstream = FixtureUpstream::start().await;
    let transport = ReqwestTransport::new(TransportOptions::default()).unwrap();
    let url = upstream.base_url.join("search/advanced?page=1").unwrap();

    assert_eq!(served_encoding(&url, "gzip").await.as_deref(), Some("gzip"));

    let body = transport.get(&url).await.unwrap();
    let envelope = Envelope::parse(&body).expect("decoded JSON");
    assert_eq!(envelope.items.len(), 3);
    assert_eq!(envelope.meta.quota_remaining, Some(296));

    let request = upstream.requests().pop().unwrap();
    assert_eq!(request.accept.as_deref(), Some("application/json"));
    assert!(request
        .accept_encoding
        .as_deref()
        .is_some_and(|enc| enc.contains("gzip") && enc.contains("deflate")));
}

#[tokio::test]
async fn deflate_responses_are_decoded() {
    let feed: Value = serde_json::from_str(FEED_FIXTURE).unwrap();
    let app = Router::new()
        .route(
            "/2.2/search/advanced",
            get(move || {
                let feed = feed.clone();
                async move { Json(feed) }
            }),
        )
        .layer(CompressionLayer::new().no_gzip());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    let url = Url::parse(&format!("http://{addr}/2.2/search/advanced")).unwrap();

    assert_eq!(
        served_encoding(&url, "gzip, deflate").await.as_deref(),
        Some("deflate")
    );

    let transport = ReqwestTransport::new(TransportOptions::default()).unwrap();
    let body = transport.get(&url).await.unwrap();
    let envelope = Envelope::parse(&body).expect("decoded JSON");
    assert_eq!(envelope.items.len(), 3);
    assert_eq!(envelope.meta.quota_remaining, Some(296));
}

#[tokio::test]
async fn one_transport_serves_concurrent_calls() {
    let upstream = FixtureUpstream::start().await;
    let service = upstream.service();

    let (feed, question, verdict) = tokio::join!(
        service.fetch_answered_questions(15, 2, true),
        service.fetch_question_and_answers(sq_core::models::QuestionId(64215481)),
        service.is_accepted_answer(sq_core::models::AnswerId(64215530)),
    );
    assert_eq!(feed.unwrap().len(), 3);
    assert_eq!(question.unwrap().answers.len(), 2);
    assert!(verdict.unwrap());
    assert_eq!(upstream.requests().len(), 3);
}
