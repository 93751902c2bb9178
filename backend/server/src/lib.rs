//! Documentation of the ingestion relay.
//!
//! A small HTTP service sitting in front of an external ingestion backend. It
//! starts ingestion runs on that backend, remembers which runs it started, and
//! keeps metadata about uploaded documents.
//!
//!
//!
//! # General Infrastructure
//! - Clients only ever talk to the relay
//! - The relay talks to the ingestion backend over plain HTTP on the same host
//! - Run status lives in SQLite, written once by the relay and afterwards only by the backend's own tooling
//! - The relay never polls the backend; whatever is in the `status` column is the answer
//!
//!
//!
//! # Routes
//!
//! | Method   | Path                      | Response                                   |
//! |----------|---------------------------|--------------------------------------------|
//! | `POST`   | `/ingestion/trigger`      | `Ingestion started: <backend message>`     |
//! | `GET`    | `/ingestion/status/{id}`  | `Status of process <id>: <status>`         |
//! | `GET`    | `/ingestion/all`          | every tracked run                          |
//! | `DELETE` | `/ingestion/{id}`         | the deleted run                            |
//! | `POST`   | `/documents`              | the created document                       |
//! | `GET`    | `/documents`              | every document                             |
//! | `GET`    | `/documents/{id}`         | one document                               |
//! | `PATCH`  | `/documents/{id}`         | the updated document                       |
//! | `DELETE` | `/documents/{id}`         | the deleted document                       |
//!
//!
//!
//! # Notes
//!
//! ## Trigger Atomicity
//! Starting a run and recording it are two separate steps. If the relay dies in between, the run
//! exists on the backend but not here. We accept that, runs are cheap to restart.
//!
//! ## Missing Process Ids
//! A backend reply without a `pid` is still reported as started, but nothing is recorded, so
//! status lookups for that run will 404.
//!
//!
//!
//! # Setup
//!
//! Environment variables, all optional.
//! ```sh
//! RUST_PORT=3000
//! DATABASE_URL=sqlite:relay.db?mode=rwc
//! DATABASE_MAX_CONNECTIONS=5
//! INGESTION_BACKEND_URL=http://127.0.0.1:5000/start-ingestion
//! RUST_LOG=info
//! ```
//!
//! Run.
//! ```sh
//! cargo run -p relay
//! ```
//!
//! Poke it.
//! ```sh
//! cargo run -p relayctl -- trigger "s3://bucket/reports"
//! cargo run -p relayctl -- status 4242
//! ```
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{delete, get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod database;
pub mod documents;
pub mod error;
pub mod ingestion;
pub mod models;
pub mod routes;
pub mod state;
pub mod upstream;

use routes::{
    create_document_handler, get_document_handler, list_documents_handler, list_ingestions_handler,
    remove_document_handler, remove_ingestion_handler, status_handler, trigger_handler, update_document_handler,
};
use state::State;

pub async fn start_server() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = State::new().await?;

    info!("Starting server...");
    let app = app(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.pool.close().await;
    info!("Server shut down");

    Ok(())
}

pub fn app(state: Arc<State>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/ingestion/trigger", post(trigger_handler))
        .route("/ingestion/status/{id}", get(status_handler))
        .route("/ingestion/all", get(list_ingestions_handler))
        .route("/ingestion/{id}", delete(remove_ingestion_handler))
        .route("/documents", post(create_document_handler).get(list_documents_handler))
        .route(
            "/documents/{id}",
            get(get_document_handler)
                .patch(update_document_handler)
                .delete(remove_document_handler),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use reqwest::Client;
    use serde_json::{Value, json};

    use super::*;
    use crate::{
        config::Config,
        database::init_database,
        upstream::{IngestionBackend, stub::StubBackend},
    };

    async fn serve(backend: StubBackend) -> String {
        let pool = init_database("sqlite::memory:", 1).await.unwrap();
        let backend: Arc<dyn IngestionBackend> = Arc::new(backend);
        let app = app(State::from_parts(Config::default(), pool, backend));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{address}")
    }

    #[tokio::test]
    async fn test_ingestion_routes_end_to_end() {
        let base = serve(StubBackend::started(json!(4242), "queued")).await;
        let client = Client::new();

        let res = client
            .post(format!("{base}/ingestion/trigger"))
            .json(&json!({ "message": "s3://bucket/reports" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 201);
        assert_eq!(res.text().await.unwrap(), "Ingestion started: queued");

        let status = client
            .get(format!("{base}/ingestion/status/4242"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(status, "Status of process 4242: InProgress");

        let all: Vec<Value> = client
            .get(format!("{base}/ingestion/all"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0]["processId"], "4242");
        let id = all[0]["id"].as_str().unwrap().to_string();

        let res = client.delete(format!("{base}/ingestion/{id}")).send().await.unwrap();
        assert_eq!(res.status(), 200);

        let res = client
            .get(format!("{base}/ingestion/status/4242"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 404);
        assert_eq!(res.text().await.unwrap(), "Process not found");
    }

    #[tokio::test]
    async fn test_document_routes_end_to_end() {
        let base = serve(StubBackend::without_pid("ok")).await;
        let client = Client::new();

        let created: Value = client
            .post(format!("{base}/documents"))
            .json(&json!({
                "documentTitle": "Handbook",
                "documentUrl": "https://files.local/documents/handbook.pdf",
                "userId": "u-1"
            }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap();

        let patched: Value = client
            .patch(format!("{base}/documents/{id}"))
            .json(&json!({ "documentTitle": "Handbook v2" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(patched["documentTitle"], "Handbook v2");
        assert_eq!(patched["userId"], "u-1");

        let res = client.get(format!("{base}/documents/{id}")).send().await.unwrap();
        assert_eq!(res.status(), 200);
    }
}
