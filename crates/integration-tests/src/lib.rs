//! In-process stand-in for the Stack Exchange API.
//!
//! Serves the JSON fixtures under `fixtures/` on an ephemeral port, gzip
//! compressed, and records every request it sees so tests can assert on the
//! outbound query.

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use sq_core::settings::ApiSettings;
use sq_http_reqwest::{ReqwestTransport, TransportOptions};
use sq_service::{DataService, FeedDefaults, QuizHome};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use url::Url;

pub const FEED_FIXTURE: &str = include_str!("../fixtures/feed.json");
pub const QUESTIONS_FIXTURE: &str = include_str!("../fixtures/questions.json");
pub const ANSWERS_FIXTURE: &str = include_str!("../fixtures/answers.json");

/// What the fixture upstream saw for one request.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub query: Vec<(String, String)>,
    pub accept: Option<String>,
    pub accept_encoding: Option<String>,
}

impl RecordedRequest {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Clone)]
struct Upstream {
    feed: Arc<Value>,
    questions: Arc<Vec<Value>>,
    answers: Arc<Vec<Value>>,
    throttled: bool,
    log: Arc<Mutex<Vec<RecordedRequest>>>,
}

pub struct FixtureUpstream {
    pub base_url: Url,
    log: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FixtureUpstream {
    /// Serves the fixtures normally.
    pub async fn start() -> Self {
        Self::spawn(false).await
    }

    /// Rejects every request the way Stack Exchange does once a client
    /// exceeds its quota.
    pub async fn throttled() -> Self {
        Self::spawn(true).await
    }

    async fn spawn(throttled: bool) -> Self {
        let log = Arc::new(Mutex::new(Vec::new()));
        let state = Upstream {
            feed: Arc::new(parse_fixture(FEED_FIXTURE)),
            questions: Arc::new(fixture_items(QUESTIONS_FIXTURE)),
            answers: Arc::new(fixture_items(ANSWERS_FIXTURE)),
            throttled,
            log: log.clone(),
        };
        let app = Router::new()
            .route("/2.2/search/advanced", get(search))
            .route("/2.2/questions/{id}/", get(question))
            .route("/2.2/answers/{id}/", get(answer))
            .layer(CompressionLayer::new())
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fixture upstream");
        let addr = listener.local_addr().expect("fixture upstream address");
        tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app).await {
                tracing::error!(error = %err, "fixture upstream stopped");
            }
        });

        let base_url = Url::parse(&format!("http://{addr}/2.2/")).expect("fixture base URL");
        Self { base_url, log }
    }

    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings::new(self.base_url.clone())
    }

    /// A `DataService` wired to this upstream over real HTTP.
    pub fn service(&self) -> DataService {
        let transport = ReqwestTransport::new(TransportOptions {
            timeout: Duration::from_secs(5),
            ..TransportOptions::default()
        })
        .expect("build transport");
        DataService::new(Arc::new(transport), Arc::new(self.api_settings()))
    }

    pub fn home(&self) -> QuizHome {
        QuizHome::new(self.service(), FeedDefaults::default())
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.log.lock().expect("request log").clone()
    }
}

fn parse_fixture(raw: &str) -> Value {
    serde_json::from_str(raw).expect("fixture is valid JSON")
}

fn fixture_items(raw: &str) -> Vec<Value> {
    match parse_fixture(raw) {
        Value::Array(items) => items,
        _ => panic!("fixture must be a JSON array"),
    }
}

fn envelope(items: Vec<Value>) -> Value {
    json!({
        "items": items,
        "has_more": false,
        "quota_max": 300,
        "quota_remaining": 295
    })
}

/// Records the request, then rejects it when throttled or when the client
/// did not ask for JSON.
fn gate(up: &Upstream, headers: &HeaderMap, uri: &Uri) -> Option<Response> {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    let accept = header_value(header::ACCEPT);
    let query = url::form_urlencoded::parse(uri.query().unwrap_or_default().as_bytes())
        .into_owned()
        .collect();
    up.log.lock().expect("request log").push(RecordedRequest {
        path: uri.path().to_string(),
        query,
        accept: accept.clone(),
        accept_encoding: header_value(header::ACCEPT_ENCODING),
    });

    if up.throttled {
        let body = json!({
            "error_id": 502,
            "error_message": "too many requests from this IP, more requests available in 82466 seconds",
            "error_name": "throttle_violation"
        });
        return Some((StatusCode::BAD_REQUEST, Json(body)).into_response());
    }
    if accept.as_deref() != Some("application/json") {
        return Some((StatusCode::NOT_ACCEPTABLE, "JSON only").into_response());
    }
    None
}

async fn search(State(up): State<Upstream>, headers: HeaderMap, uri: Uri) -> Response {
    if let Some(rejection) = gate(&up, &headers, &uri) {
        return rejection;
    }
    Json(up.feed.as_ref().clone()).into_response()
}

async fn question(
    State(up): State<Upstream>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    if let Some(rejection) = gate(&up, &headers, &uri) {
        return rejection;
    }
    let items = matching(&up.questions, "question_id", id);
    Json(envelope(items)).into_response()
}

async fn answer(
    State(up): State<Upstream>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    if let Some(rejection) = gate(&up, &headers, &uri) {
        return rejection;
    }
    let items = matching(&up.answers, "answer_id", id);
    Json(envelope(items)).into_response()
}

fn matching(items: &[Value], key: &str, id: u64) -> Vec<Value> {
    items
        .iter()
        .filter(|item| item.get(key).and_then(Value::as_u64) == Some(id))
        .cloned()
        .collect()
}
