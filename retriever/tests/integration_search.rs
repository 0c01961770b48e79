use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use retriever::http::{build_app_with, AppConfig};
use retriever::Retriever;
use search_core::{build, store, RawDocument, TokenizerConfig};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;
use tower::ServiceExt;

fn write_index(path: &Path, texts: &[&str]) {
    let docs = texts.iter().enumerate().map(|(i, t)| {
        RawDocument::new(format!("https://ue.es/{}", i + 1), format!("pages/{}.json", i + 1), *t)
            .with_title(format!("Doc {}", i + 1))
    });
    let index = build(docs, TokenizerConfig::default()).unwrap();
    store::save(&index, path).unwrap();
}

fn scenario_index(dir: &Path) -> PathBuf {
    let path = dir.join("index.bqix");
    write_index(&path, &["universidad europea madrid", "campus universidad privado"]);
    path
}

fn app(index_path: PathBuf, admin_token: Option<&str>) -> Router {
    build_app_with(AppConfig { index_path, admin_token: admin_token.map(str::to_string) }).unwrap()
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn ids(json: &Value) -> Vec<u64> {
    json["results"].as_array().unwrap().iter().map(|h| h["doc_id"].as_u64().unwrap()).collect()
}

#[tokio::test]
async fn search_evaluates_boolean_queries() {
    let dir = tempdir().unwrap();
    let app = app(scenario_index(dir.path()), None);

    let (status, json) = call(app.clone(), get("/search?q=universidad%20AND%20campus")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&json), vec![2]);
    assert_eq!(json["parsed"], "(universidad AND campus)");

    let (_, json) = call(app.clone(), get("/search?q=NOT%20privado")).await;
    assert_eq!(ids(&json), vec![1]);
    assert_eq!(json["results"][0]["url"], "https://ue.es/1");

    let (_, json) = call(app, get("/search?q=inexistente")).await;
    assert_eq!(json["total_hits"], 0);
}

#[tokio::test]
async fn k_limits_results_but_not_total() {
    let dir = tempdir().unwrap();
    let app = app(scenario_index(dir.path()), None);
    let (_, json) = call(app, get("/search?q=universidad&k=1")).await;
    assert_eq!(ids(&json), vec![1]);
    assert_eq!(json["total_hits"], 2);
}

#[tokio::test]
async fn malformed_query_is_bad_request() {
    let dir = tempdir().unwrap();
    let app = app(scenario_index(dir.path()), None);
    let (status, json) = call(app, get("/search?q=AND%20universidad")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().starts_with("malformed query"));
}

#[tokio::test]
async fn doc_lookup() {
    let dir = tempdir().unwrap();
    let app = app(scenario_index(dir.path()), None);
    let (status, json) = call(app.clone(), get("/doc/2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "Doc 2");
    let (status, _) = call(app, get("/doc/42")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reload_requires_token_and_swaps_index() {
    let dir = tempdir().unwrap();
    let path = scenario_index(dir.path());
    let app = app(path.clone(), Some("secret"));

    let (status, _) = call(app.clone(), Request::post("/index/reload").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    write_index(&path, &["biblioteca", "campus", "campus biblioteca"]);
    let req = Request::post("/index/reload").header("X-ADMIN-TOKEN", "secret").body(Body::empty()).unwrap();
    let (status, json) = call(app.clone(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["num_docs"], 3);

    let (_, json) = call(app, get("/search?q=campus%20AND%20biblioteca")).await;
    assert_eq!(ids(&json), vec![3]);
}

#[tokio::test]
async fn reload_keeps_old_index_when_new_one_is_corrupt() {
    let dir = tempdir().unwrap();
    let path = scenario_index(dir.path());
    let app = app(path.clone(), Some("secret"));

    fs::write(&path, b"BQIX garbage").unwrap();
    let req = Request::post("/index/reload").header("X-ADMIN-TOKEN", "secret").body(Body::empty()).unwrap();
    let (status, _) = call(app.clone(), req).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, json) = call(app, get("/search?q=universidad")).await;
    assert_eq!(ids(&json), vec![1, 2]);
}

#[test]
fn batch_file_collects_per_line_outcomes() {
    let dir = tempdir().unwrap();
    let retriever = Retriever::open(scenario_index(dir.path())).unwrap();
    let queries = dir.path().join("queries.txt");
    fs::write(&queries, "universidad AND campus\nuniversidad OR\n\nuniversidad OR privado\n").unwrap();

    let report = retriever.search_file(&queries).unwrap();
    assert_eq!(report.entries.len(), 3);
    assert_eq!(report.failures(), 1);
    assert_eq!(report.entries[2].outcome.as_ref().unwrap().doc_ids, vec![1, 2]);
}

#[test]
fn missing_batch_file_is_read_error() {
    let dir = tempdir().unwrap();
    let retriever = Retriever::open(scenario_index(dir.path())).unwrap();
    let err = retriever.search_file(dir.path().join("none.txt")).unwrap_err();
    assert!(matches!(err, search_core::SearchError::IoRead { .. }));
}
