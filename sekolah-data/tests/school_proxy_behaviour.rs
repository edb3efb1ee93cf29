//! Behavioural tests for the schools proxy routes.
//!
//! These tests drive the router with [`StubSchoolsBackend`] through
//! `tower::ServiceExt::oneshot`, so no socket or upstream server is needed.
#![expect(clippy::expect_used, reason = "steps fail fast on unexpected state")]

use std::cell::RefCell;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use sekolah_data::test_support::StubSchoolsBackend;
use sekolah_data::{BackendError, UpstreamMethod, UpstreamPath, router};
use serde_json::{Value, json};
use tower::ServiceExt;

/// Status and JSON body answered by the proxy.
type Answer = RefCell<Option<(StatusCode, Value)>>;

fn upstream_payload() -> Value {
    json!({ "total": 1, "data": [{ "npsn": "20400001", "nama": "SD Negeri 1" }] })
}

fn new_school() -> Value {
    json!({ "npsn": "20400002", "nama": "SMP Negeri 2", "bentuk_pendidikan": "SMP" })
}

#[fixture]
fn backend() -> RefCell<Option<StubSchoolsBackend>> {
    RefCell::new(None)
}

#[fixture]
fn answer() -> Answer {
    RefCell::new(None)
}

fn send(backend: &RefCell<Option<StubSchoolsBackend>>, answer: &Answer, request: Request<Body>) {
    let stub = backend.borrow().clone().expect("backend must be initialised");
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime should build");
    let outcome = runtime.block_on(async {
        let response = router(Arc::new(stub))
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        let body = serde_json::from_slice(&bytes).expect("proxy answers JSON");
        (status, body)
    });
    *answer.borrow_mut() = Some(outcome);
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request should build")
}

fn post_json(uri: &str, body: String) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .expect("request should build")
}

// --- Given steps ---

#[given("an upstream returning one school")]
fn upstream_ok(#[from(backend)] backend: &RefCell<Option<StubSchoolsBackend>>) {
    *backend.borrow_mut() = Some(StubSchoolsBackend::with_response(200, upstream_payload()));
}

#[given("an upstream answering 404")]
fn upstream_not_found(#[from(backend)] backend: &RefCell<Option<StubSchoolsBackend>>) {
    *backend.borrow_mut() = Some(StubSchoolsBackend::with_response(
        404,
        json!({ "message": "not found" }),
    ));
}

#[given("an upstream that cannot be reached")]
fn upstream_down(#[from(backend)] backend: &RefCell<Option<StubSchoolsBackend>>) {
    *backend.borrow_mut() = Some(StubSchoolsBackend::with_error(BackendError::Network {
        url: "https://upstream.example/api/sekolah/filter".to_owned(),
        message: "connection refused".to_owned(),
    }));
}

#[given("an upstream answering 422 to writes")]
fn upstream_unprocessable(#[from(backend)] backend: &RefCell<Option<StubSchoolsBackend>>) {
    *backend.borrow_mut() = Some(StubSchoolsBackend::with_response(
        422,
        json!({ "message": "npsn already exists" }),
    ));
}

// --- When steps ---

#[when("I request the school list")]
fn request_list(
    #[from(backend)] backend: &RefCell<Option<StubSchoolsBackend>>,
    #[from(answer)] answer: &Answer,
) {
    send(backend, answer, get("/api/proxy/schools"));
}

#[when("I request school 20400001")]
fn request_school(
    #[from(backend)] backend: &RefCell<Option<StubSchoolsBackend>>,
    #[from(answer)] answer: &Answer,
) {
    send(backend, answer, get("/api/proxy/schools/20400001"));
}

#[when("I request schools filtered by level SD")]
fn request_filtered(
    #[from(backend)] backend: &RefCell<Option<StubSchoolsBackend>>,
    #[from(answer)] answer: &Answer,
) {
    send(
        backend,
        answer,
        get("/api/proxy/schools/filter?bentukPendidikan=SD"),
    );
}

#[when("I create a school")]
fn create_school(
    #[from(backend)] backend: &RefCell<Option<StubSchoolsBackend>>,
    #[from(answer)] answer: &Answer,
) {
    send(
        backend,
        answer,
        post_json("/api/proxy/schools", new_school().to_string()),
    );
}

#[when("I create a school with a malformed body")]
fn create_malformed(
    #[from(backend)] backend: &RefCell<Option<StubSchoolsBackend>>,
    #[from(answer)] answer: &Answer,
) {
    send(
        backend,
        answer,
        post_json("/api/proxy/schools", "{ not json".to_owned()),
    );
}

#[when("I delete school 20400001 with a bearer token")]
fn delete_with_token(
    #[from(backend)] backend: &RefCell<Option<StubSchoolsBackend>>,
    #[from(answer)] answer: &Answer,
) {
    let request = Request::delete("/api/proxy/schools/20400001")
        .header(header::AUTHORIZATION, "Bearer session-token")
        .body(Body::empty())
        .expect("request should build");
    send(backend, answer, request);
}

// --- Then steps ---

#[then("the proxy answers 200 with the upstream payload")]
fn answers_ok(#[from(answer)] answer: &Answer) {
    assert_eq!(
        *answer.borrow(),
        Some((StatusCode::OK, upstream_payload()))
    );
}

#[then("the proxy answers 404 with error \"API error: 404\"")]
fn answers_not_found(#[from(answer)] answer: &Answer) {
    assert_eq!(
        *answer.borrow(),
        Some((StatusCode::NOT_FOUND, json!({ "error": "API error: 404" })))
    );
}

#[then("the proxy answers 500 with error \"Failed to fetch filtered schools\"")]
fn answers_filter_failure(#[from(answer)] answer: &Answer) {
    assert_eq!(
        *answer.borrow(),
        Some((
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "Failed to fetch filtered schools" })
        ))
    );
}

#[then("the proxy answers 422 with the upstream payload")]
fn answers_unprocessable(#[from(answer)] answer: &Answer) {
    assert_eq!(
        *answer.borrow(),
        Some((
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "message": "npsn already exists" })
        ))
    );
}

#[then("the proxy answers 500 with error \"Failed to add school\"")]
fn answers_add_failure(#[from(answer)] answer: &Answer) {
    assert_eq!(
        *answer.borrow(),
        Some((
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "Failed to add school" })
        ))
    );
}

#[then("the upstream saw no request body")]
fn upstream_saw_no_body(#[from(backend)] backend: &RefCell<Option<StubSchoolsBackend>>) {
    let requests = backend.borrow().as_ref().expect("backend").requests();
    assert_eq!(requests.len(), 1);
    let request = requests.first().expect("one request");
    assert_eq!(request.method, UpstreamMethod::Get);
    assert_eq!(
        request.path,
        UpstreamPath::Filter("bentukPendidikan=SD".to_owned())
    );
    assert_eq!(request.body, None);
}

#[then("the upstream received the school as JSON")]
fn upstream_received_school(#[from(backend)] backend: &RefCell<Option<StubSchoolsBackend>>) {
    let requests = backend.borrow().as_ref().expect("backend").requests();
    let request = requests.first().expect("one request");
    assert_eq!(request.method, UpstreamMethod::Post);
    assert_eq!(request.path, UpstreamPath::Collection);
    assert_eq!(request.body, Some(new_school()));
}

#[then("the upstream was not called")]
fn upstream_not_called(#[from(backend)] backend: &RefCell<Option<StubSchoolsBackend>>) {
    let requests = backend.borrow().as_ref().expect("backend").requests();
    assert!(requests.is_empty());
}

#[then("the upstream received the bearer token")]
fn upstream_received_token(#[from(backend)] backend: &RefCell<Option<StubSchoolsBackend>>) {
    let requests = backend.borrow().as_ref().expect("backend").requests();
    let request = requests.first().expect("one request");
    assert_eq!(request.method, UpstreamMethod::Delete);
    assert_eq!(request.path, UpstreamPath::School("20400001".to_owned()));
    assert_eq!(request.authorization.as_deref(), Some("Bearer session-token"));
}

// --- Scenario registrations ---

macro_rules! register_scenario {
    ($fn_name:ident, $title:literal) => {
        #[scenario(path = "tests/features/school_proxy.feature", name = $title)]
        fn $fn_name(backend: RefCell<Option<StubSchoolsBackend>>, answer: Answer) {
            let _ = (backend, answer);
        }
    };
}

register_scenario!(
    list_passes_payload_through,
    "listing schools passes the upstream payload through"
);
register_scenario!(
    read_rejection_keeps_status,
    "an upstream rejection on a read keeps its status"
);
register_scenario!(
    unreachable_upstream_on_filter,
    "an unreachable upstream on a filtered read"
);
register_scenario!(
    create_forwards_status,
    "creating a school forwards the upstream status verbatim"
);
register_scenario!(malformed_create_body, "a malformed create body is rejected");
register_scenario!(
    authorization_is_forwarded,
    "the caller's authorization is forwarded"
);
