use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use calamine::{Data, Reader, Xlsx};
use mockall::mock;
use serde_json::{json, Value as JsonValue};
use submission_dashboard::{
    error::{Error, StoreError},
    models::submission::Submission,
    routes,
    services::{export_service::ExportOptions, submission_store::SubmissionStore},
    AppState,
};
use tower::ServiceExt;

mock! {
    pub Store {}

    #[async_trait]
    impl SubmissionStore for Store {
        async fn fetch_all(&self) -> Result<Vec<Submission>, StoreError>;
        async fn fetch_by_id(&self, id: &str) -> submission_dashboard::error::Result<Submission>;
    }
}

fn rows() -> Vec<Submission> {
    serde_json::from_value(json!([
        {
            "id": 1,
            "nama": "A",
            "kelas": "10A",
            "skor": 80,
            "jawaban_kuis": { "q1": "B", "q2": "C" },
            "jawaban_refleksi": {
                "refleksi_1": { "jawaban": "tinggi" },
                "target_upgrade": ["sholat", "puasa"]
            },
            "created_at": "2024-03-02T10:00:00+00:00"
        },
        {
            "id": 2,
            "nama": "B",
            "kelas": "10B",
            "skor": null,
            "jawaban_kuis": null,
            "jawaban_refleksi": null,
            "created_at": "2024-03-01T10:00:00+00:00"
        }
    ]))
    .expect("decode rows")
}

fn rejected() -> StoreError {
    StoreError::Rejected {
        status: 401,
        body: json!({ "message": "Invalid API key", "hint": "Double check your Supabase `anon` key." }),
    }
}

fn app(store: MockStore) -> Router {
    let state = AppState::new(Arc::new(store), ExportOptions::default());
    routes::router(state, "public-not-present")
}

async fn get(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, headers, bytes.to_vec())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, JsonValue) {
    let (status, _, bytes) = get(app, uri).await;
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

#[tokio::test]
async fn list_returns_normalized_rows() {
    let mut store = MockStore::new();
    store.expect_fetch_all().times(1).returning(|| Ok(rows()));

    let (status, body) = get_json(app(store), "/api/submissions").await;
    assert_eq!(status, StatusCode::OK);

    let items = body.as_array().expect("array");
    assert_eq!(items.len(), 2);

    assert_eq!(items[0]["id"], json!(1));
    assert_eq!(items[0]["nama"], json!("A"));
    assert_eq!(items[0]["skor_formatted"], json!("80: B C - - -"));
    assert_eq!(items[0]["refleksi_1"], json!("tinggi"));
    assert_eq!(items[0]["refleksi_2"], json!("-"));
    assert_eq!(items[0]["target_upgrade"], json!("sholat<br>puasa"));
    assert_eq!(items[0]["jawaban_kuis"], json!({ "q1": "B", "q2": "C" }));

    assert_eq!(items[1]["skor_formatted"], json!("0: -"));
    assert_eq!(items[1]["refleksi_4"], json!("-"));
    assert_eq!(items[1]["target_upgrade"], json!("-"));
}

#[tokio::test]
async fn list_store_failure_is_500_with_details() {
    let mut store = MockStore::new();
    store.expect_fetch_all().returning(|| Err(rejected()));

    let (status, body) = get_json(app(store), "/api/submissions").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], json!("Failed to fetch submissions"));
    assert_eq!(body["details"]["message"], json!("Invalid API key"));
}

#[tokio::test]
async fn by_id_returns_raw_row() {
    let mut store = MockStore::new();
    store
        .expect_fetch_by_id()
        .withf(|id| id.to_string() == "1")
        .returning(|_| Ok(rows().remove(0)));

    let (status, body) = get_json(app(store), "/api/submissions/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], json!(1));
    assert_eq!(body["kelas"], json!("10A"));
    assert!(body.get("skor_formatted").is_none());
    assert!(body.get("refleksi_1").is_none());
}

#[tokio::test]
async fn by_id_row_is_passed_through_untouched() {
    let stored = json!({
        "id": 3,
        "skor": "80",
        "jawaban_kuis": ["A", "B"],
        "jawaban_refleksi": "{\"refleksi_1\":{\"jawaban\":\"x\"}}",
        "created_at": "2024-03-01T08:15:00.123456+07:00"
    });
    let row: Submission = serde_json::from_value(stored.clone()).unwrap();

    let mut store = MockStore::new();
    store
        .expect_fetch_by_id()
        .returning(move |_| Ok(row.clone()));

    let (status, body) = get_json(app(store), "/api/submissions/3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, stored);
}

#[tokio::test]
async fn by_id_missing_is_404_without_details() {
    let mut store = MockStore::new();
    store
        .expect_fetch_by_id()
        .returning(|id| Err(Error::NotFound(format!("Submission {} not found", id))));

    let (status, body) = get_json(app(store), "/api/submissions/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Submission not found" }));
}

#[tokio::test]
async fn by_id_store_failure_is_also_404() {
    let mut store = MockStore::new();
    store
        .expect_fetch_by_id()
        .returning(|_| Err(Error::Store(rejected())));

    let (status, body) = get_json(app(store), "/api/submissions/1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Submission not found" }));
}

#[tokio::test]
async fn parsed_adds_key_value_lists() {
    let mut store = MockStore::new();
    store
        .expect_fetch_by_id()
        .withf(|id| id.to_string() == "1")
        .returning(|_| Ok(rows().remove(0)));

    let (status, body) = get_json(app(store), "/api/submissions/1/parsed").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nama"], json!("A"));
    assert_eq!(
        body["jawaban_kuis_parsed"],
        json!([{ "key": "q1", "value": "B" }, { "key": "q2", "value": "C" }])
    );
    assert_eq!(
        body["jawaban_refleksi_parsed"],
        json!([
            { "key": "refleksi_1", "value": { "jawaban": "tinggi" } },
            { "key": "target_upgrade", "value": ["sholat", "puasa"] }
        ])
    );
}

#[tokio::test]
async fn parsed_without_answers_has_empty_lists() {
    let mut store = MockStore::new();
    store
        .expect_fetch_by_id()
        .returning(|_| Ok(rows().remove(1)));

    let (status, body) = get_json(app(store), "/api/submissions/2/parsed").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["jawaban_kuis_parsed"], json!([]));
    assert_eq!(body["jawaban_refleksi_parsed"], json!([]));
}

#[tokio::test]
async fn parsed_lists_array_columns_by_index() {
    let row: Submission = serde_json::from_value(json!({
        "id": 4,
        "skor": "80",
        "jawaban_kuis": ["A", "B"]
    }))
    .unwrap();

    let mut store = MockStore::new();
    store
        .expect_fetch_by_id()
        .returning(move |_| Ok(row.clone()));

    let (status, body) = get_json(app(store), "/api/submissions/4/parsed").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["skor"], json!("80"));
    assert_eq!(body["jawaban_kuis"], json!(["A", "B"]));
    assert_eq!(
        body["jawaban_kuis_parsed"],
        json!([{ "key": "0", "value": "A" }, { "key": "1", "value": "B" }])
    );
    assert_eq!(body["jawaban_refleksi_parsed"], json!([]));
    assert!(body.get("jawaban_refleksi").is_none());
}

#[tokio::test]
async fn parsed_missing_is_404_with_details() {
    let mut store = MockStore::new();
    store
        .expect_fetch_by_id()
        .returning(|_| Err(Error::NotFound("Submission 5 not found".into())));

    let (status, body) = get_json(app(store), "/api/submissions/5/parsed").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("Submission not found"));
    assert_eq!(body["details"]["message"], json!("Not found: Submission 5 not found"));
}

#[tokio::test]
async fn export_returns_workbook_attachment() {
    let mut store = MockStore::new();
    store.expect_fetch_all().times(1).returning(|| Ok(rows()));
    store.expect_fetch_by_id().never();

    let (status, headers, bytes) = get(app(store), "/api/submissions/export/excel").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"submissions_"));
    assert!(disposition.ends_with(".xlsx\""));

    let mut workbook = Xlsx::new(Cursor::new(bytes)).expect("open workbook");
    let range = workbook.worksheet_range("Submissions").expect("sheet");
    assert_eq!(range.height(), 3);
    assert_eq!(range.get_value((0, 3)), Some(&Data::String("Kuis".into())));
    assert_eq!(range.get_value((1, 8)), Some(&Data::String("sholat, puasa".into())));
    assert_eq!(range.get_value((2, 3)), Some(&Data::String("0: -".into())));
}

#[tokio::test]
async fn export_store_failure_is_500() {
    let mut store = MockStore::new();
    store.expect_fetch_all().returning(|| Err(rejected()));

    let (status, body) = get_json(app(store), "/api/submissions/export/excel").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], json!("Failed to fetch submissions"));
    assert!(body.get("details").is_some());
}

struct PanickingStore;

#[async_trait]
impl SubmissionStore for PanickingStore {
    async fn fetch_all(&self) -> Result<Vec<Submission>, StoreError> {
        panic!("store double exploded")
    }

    async fn fetch_by_id(&self, _id: &str) -> submission_dashboard::error::Result<Submission> {
        panic!("store double exploded")
    }
}

#[tokio::test]
async fn handler_panic_becomes_internal_server_error() {
    let state = AppState::new(Arc::new(PanickingStore), ExportOptions::default());
    let app = routes::router(state, "public-not-present");

    let (status, body) = get_json(app, "/api/submissions").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], json!("Internal server error"));
    assert_eq!(body["details"], json!("store double exploded"));
}

#[tokio::test]
async fn health_and_openapi_are_served() {
    let (status, body) = get_json(app(MockStore::new()), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));

    let (status, body) = get_json(app(MockStore::new()), "/api/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"].get("/api/submissions/{id}/parsed").is_some());
    assert!(body["paths"].get("/api/submissions/export/excel").is_some());
}
