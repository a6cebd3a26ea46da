//! In-process fake Jenkins server for end-to-end tracker tests.
//!
//! Replies are scripted per endpoint and popped in order; every request
//! is recorded so tests can assert on what the client sent.

use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::sync::{Arc, Mutex};

use axum::extract::{Form, Path, Query, State};
use axum::http::header::{AUTHORIZATION, LOCATION};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;

/// `Basic` credentials for `admin:secret`.
pub const EXPECTED_AUTH: &str = "Basic YWRtaW46c2VjcmV0";

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "secret";

/// A scripted console page: body, `x-more-data`, `x-text-size`.
pub type ConsoleReply = (&'static [u8], Option<&'static str>, Option<&'static str>);

#[derive(Default)]
pub struct Script {
    /// Status for the trigger request; 201 when unset.
    pub trigger_status: Option<StatusCode>,
    pub queue: VecDeque<String>,
    pub console: VecDeque<ConsoleReply>,
    pub result: VecDeque<String>,
    /// Statuses returned once the scripted replies run out; 404 when unset.
    pub queue_status: Option<StatusCode>,
    pub console_status: Option<StatusCode>,
    pub result_status: Option<StatusCode>,
}

#[derive(Default)]
pub struct Recorded {
    pub triggers: Vec<(String, Option<HashMap<String, String>>)>,
    pub queue_polls: usize,
    pub console_starts: Vec<String>,
    pub result_polls: usize,
}

pub struct FakeJenkins {
    pub base_url: String,
    pub script: Mutex<Script>,
    pub recorded: Mutex<Recorded>,
}

type Shared = Arc<FakeJenkins>;

impl FakeJenkins {
    /// Bind to an ephemeral port and serve `script` in the background.
    pub async fn start(script: Script) -> Shared {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let fake = Arc::new(FakeJenkins {
            base_url: format!("http://{addr}"),
            script: Mutex::new(script),
            recorded: Mutex::new(Recorded::default()),
        });

        let app = Router::new()
            .route("/job/{job}/build", post(trigger))
            .route("/job/{job}/buildWithParameters", post(trigger_with_parameters))
            .route("/queue/item/{id}/api/json", get(queue_item))
            .route("/job/{job}/{number}/logText/progressiveText/", get(console))
            .route("/job/{job}/{number}/api/json", get(build))
            .with_state(Arc::clone(&fake));

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        fake
    }

    pub fn build_url(&self, job: &str, number: u64) -> String {
        format!("{}/job/{job}/{number}/", self.base_url)
    }

    pub fn recorded(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap()
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) == Some(EXPECTED_AUTH)
}

fn exhausted(status: Option<StatusCode>, endpoint: &str) -> Response {
    let status = status.unwrap_or(StatusCode::NOT_FOUND);
    (status, format!("{endpoint} rejected by fake")).into_response()
}

fn trigger_response(fake: &FakeJenkins) -> Response {
    let status = fake
        .script
        .lock()
        .unwrap()
        .trigger_status
        .unwrap_or(StatusCode::CREATED);
    if status != StatusCode::CREATED {
        return (status, "trigger rejected by fake").into_response();
    }
    let location = format!("{}/queue/item/5/", fake.base_url);
    (StatusCode::CREATED, [(LOCATION, location)]).into_response()
}

async fn trigger(
    State(fake): State<Shared>,
    Path(job): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    fake.recorded().triggers.push((job, None));
    trigger_response(&fake)
}

async fn trigger_with_parameters(
    State(fake): State<Shared>,
    Path(job): Path<String>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    fake.recorded().triggers.push((job, Some(form)));
    trigger_response(&fake)
}

async fn queue_item(State(fake): State<Shared>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    fake.recorded().queue_polls += 1;
    let mut script = fake.script.lock().unwrap();
    match script.queue.pop_front() {
        Some(body) => body.into_response(),
        None => exhausted(script.queue_status, "queue"),
    }
}

async fn console(
    State(fake): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    fake.recorded()
        .console_starts
        .push(query.get("start").cloned().unwrap_or_default());

    let (body, more, size) = {
        let mut script = fake.script.lock().unwrap();
        match script.console.pop_front() {
            Some(reply) => reply,
            None => return exhausted(script.console_status, "console"),
        }
    };
    let mut response = body.into_response();
    if let Some(more) = more {
        response
            .headers_mut()
            .insert("x-more-data", more.parse().unwrap());
    }
    if let Some(size) = size {
        response
            .headers_mut()
            .insert("x-text-size", size.parse().unwrap());
    }
    response
}

async fn build(State(fake): State<Shared>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    fake.recorded().result_polls += 1;
    let mut script = fake.script.lock().unwrap();
    match script.result.pop_front() {
        Some(body) => body.into_response(),
        None => exhausted(script.result_status, "build"),
    }
}

/// Cloneable in-memory writer so a `VsoHost` can be inspected while the
/// tracker still owns it.
#[derive(Clone, Default)]
pub struct SharedBuf(pub Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
