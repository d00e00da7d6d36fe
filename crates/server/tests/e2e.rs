use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use reqwest::StatusCode as HttpStatusCode;
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use models::RackLayout;
use server::routes::{self, AppState};
use service::storage::{FileVersionedStore, MemoryVersionedStore, VersionedFileStore};
use service::RackStore;

fn cors() -> CorsLayer { CorsLayer::very_permissive() }

struct TestApp {
    base_url: String,
}

async fn start_server(backend: Arc<dyn VersionedFileStore>) -> anyhow::Result<TestApp> {
    let store = RackStore::new(backend, RackLayout::default(), "rack.json");
    let app: Router = routes::build_router(AppState { store: Arc::new(store) }, cors());
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("server error: {}", e); }
    });

    Ok(TestApp { base_url })
}

fn client() -> reqwest::Client {
    reqwest::Client::builder().build().expect("reqwest client")
}

#[tokio::test]
async fn e2e_public_health_metrics_and_docs() -> anyhow::Result<()> {
    let app = start_server(Arc::new(MemoryVersionedStore::new())).await?;
    let c = client();

    let res = c.get(format!("{}/health", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["status"], "ok");

    let res = c.get(format!("{}/metrics", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    assert!(res.text().await?.contains("rack_document_loads_total"));

    let res = c.get(format!("{}/api-docs/openapi.json", app.base_url)).send().await?;
    let doc = res.json::<serde_json::Value>().await?;
    assert!(doc["paths"]["/api/racks/{rack}/{position}"]["put"].is_object());

    let layout = c.get(format!("{}/api/layout", app.base_url)).send().await?.json::<serde_json::Value>().await?;
    assert_eq!(layout["racks"][0], json!({"name": "No1", "rows": 16, "columns": 5}));
    assert_eq!(layout["racks"][4]["name"], "Stock Box");
    Ok(())
}

#[tokio::test]
async fn e2e_two_sessions_second_save_conflicts() -> anyhow::Result<()> {
    let app = start_server(Arc::new(MemoryVersionedStore::new())).await?;
    let c = client();

    // both sessions open the page before anything exists
    let view = c.get(format!("{}/api/racks", app.base_url)).send().await?.json::<serde_json::Value>().await?;
    assert!(view["version"].is_null());
    let seen = view["version"].clone();

    let alice = json!({"record": {"name": "CD4", "clone": "RPA-T4", "fluor": "FITC", "in_use": false}, "version": seen});
    let res = c.put(format!("{}/api/racks/No1/A1", app.base_url)).json(&alice).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let saved = res.json::<serde_json::Value>().await?;

    let bob = json!({"record": {"name": "CD8", "clone": "SK1", "fluor": "APC", "in_use": true}, "version": seen});
    let res = c.put(format!("{}/api/racks/No1/A2", app.base_url)).json(&bob).send().await?;
    assert_eq!(res.status(), HttpStatusCode::CONFLICT);

    // bob reloads and retries with the fresh version
    let fresh = c.get(format!("{}/api/racks/No1/A2", app.base_url)).send().await?.json::<serde_json::Value>().await?;
    assert_eq!(fresh["version"], saved["version"]);
    assert_eq!(fresh["record"]["name"], "");
    let bob = json!({"record": bob["record"], "version": fresh["version"]});
    let res = c.put(format!("{}/api/racks/No1/A2", app.base_url)).json(&bob).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);

    let hits = c.get(format!("{}/api/search?q=cd", app.base_url)).send().await?.json::<serde_json::Value>().await?;
    let positions: Vec<&str> = hits["hits"].as_array().unwrap().iter().map(|h| h["position"].as_str().unwrap()).collect();
    assert_eq!(positions, ["A1", "A2"]);
    Ok(())
}

#[tokio::test]
async fn e2e_file_backend_persists_across_restarts() -> anyhow::Result<()> {
    let dir = format!("target/test-data/{}", Uuid::new_v4());
    let app = start_server(Arc::new(FileVersionedStore::new(dir.as_str()).await?)).await?;
    let c = client();

    let edit = json!({"record": {"name": "IgG1 isotype", "clone": "MOPC-21", "fluor": "PE", "in_use": false}});
    let res = c.put(format!("{}/api/racks/Stock%20Box/B3", app.base_url)).json(&edit).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);

    let raw = tokio::fs::read_to_string(format!("{dir}/rack.json")).await?;
    assert!(raw.contains("\"MOPC-21\""));
    assert!(raw.starts_with("{\n  \""));

    // a new server on the same directory sees the record
    let again = start_server(Arc::new(FileVersionedStore::new(dir.as_str()).await?)).await?;
    let rec = c
        .get(format!("{}/api/racks/Stock%20Box/B3", again.base_url))
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;
    assert_eq!(rec["record"]["fluor"], "PE");
    assert!(rec["version"].is_string());

    let _ = tokio::fs::remove_dir_all(&dir).await;
    Ok(())
}
