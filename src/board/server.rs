use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::api::{self, AppState};
use super::memory::MemoryStore;
use super::store::{DocumentStore, MongoStore};
use crate::config::{Config, StoreBackend};
use crate::errors::StartupError;

/// Configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout: Duration,
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            request_timeout: Duration::from_secs(5),
            cors: false,
        }
    }
}

/// Build the full application router: API routes, request tracing and
/// optional permissive CORS.
pub fn build_router(state: Arc<AppState>, cors: bool) -> Router {
    let mut app = api::api_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors {
        app = app.layer(CorsLayer::permissive());
    }
    app
}

/// Open the configured document store. Failure here aborts startup.
pub async fn open_store(config: &Config) -> Result<Arc<dyn DocumentStore>, StartupError> {
    match &config.store {
        StoreBackend::Mongo { url, database } => {
            let store = MongoStore::connect(url, database, config.connect_timeout).await?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data will not survive a restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Serve until Ctrl+C / SIGTERM, then release the store connection.
pub async fn start_server(
    config: ServerConfig,
    store: Arc<dyn DocumentStore>,
) -> Result<(), StartupError> {
    let state = Arc::new(AppState::new(store.clone(), config.request_timeout));
    let app = build_router(state, config.cors);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(source) => {
            store.shutdown().await;
            return Err(StartupError::Bind { addr, source });
        }
    };

    let local_addr = listener.local_addr().map_err(StartupError::Serve)?;
    tracing::info!(%local_addr, "bug-point listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(StartupError::Serve);

    store.shutdown().await;
    tracing::info!("Server shut down");
    served
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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
    tracing::info!("Shutting down...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::query::{Collection, Filter, Update};
    use crate::errors::StoreError;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use bson::Document;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    /// Empty store that records whether it was shut down.
    #[derive(Default)]
    struct ClosingStore {
        closed: AtomicBool,
    }

    #[async_trait]
    impl DocumentStore for ClosingStore {
        async fn find(&self, _: Collection, _: &Filter) -> Result<Vec<Document>, StoreError> {
            Ok(Vec::new())
        }

        async fn find_one(&self, _: Collection, _: &Filter) -> Result<Option<Document>, StoreError> {
            Ok(None)
        }

        async fn insert_one(&self, _: Collection, _: Document) -> Result<(), StoreError> {
            Ok(())
        }

        async fn update_one(&self, _: Collection, _: &Filter, _: &Update) -> Result<u64, StoreError> {
            Ok(0)
        }

        async fn delete_one(&self, _: Collection, _: &Filter) -> Result<u64, StoreError> {
            Ok(0)
        }

        async fn shutdown(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    fn test_router(cors: bool) -> Router {
        let state = Arc::new(AppState::new(
            Arc::new(MemoryStore::new()),
            Duration::from_secs(5),
        ));
        build_router(state, cors)
    }

    #[tokio::test]
    async fn test_health_via_full_router() {
        let app = test_router(false);
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_api_routes_mounted() {
        let app = test_router(false);
        for uri in ["/api/v1/bugs", "/api/v1/lanes"] {
            let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
            let resp = app.clone().oneshot(req).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_cors_layer_only_when_enabled() {
        let request = || {
            Request::builder()
                .uri("/api/v1/bugs")
                .header(header::ORIGIN, "http://localhost:5173")
                .body(Body::empty())
                .unwrap()
        };

        let resp = test_router(true).oneshot(request()).await.unwrap();
        assert!(resp.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));

        let resp = test_router(false).oneshot(request()).await.unwrap();
        assert!(!resp.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[tokio::test]
    async fn test_open_store_in_memory() {
        let config = Config {
            store: StoreBackend::Memory,
            ..Config::default()
        };
        let store = open_store(&config).await.unwrap();
        let docs = store
            .find(crate::board::query::Collection::Bugs, &crate::board::query::Filter::all())
            .await
            .unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn test_open_store_rejects_bad_url() {
        let config = Config {
            store: StoreBackend::Mongo {
                url: "definitely not a url".into(),
                database: "bug-point".into(),
            },
            ..Config::default()
        };
        let err = open_store(&config).await.err().unwrap();
        assert!(matches!(err, StartupError::InvalidConnectionString(_)));
    }

    #[tokio::test]
    async fn test_start_server_reports_bind_failure() {
        let occupied = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = occupied.local_addr().unwrap().port();
        let config = ServerConfig {
            host: "127.0.0.1".into(),
            port,
            ..ServerConfig::default()
        };

        let store = Arc::new(ClosingStore::default());
        let err = start_server(config, store.clone()).await.unwrap_err();
        assert!(matches!(err, StartupError::Bind { .. }));
        assert!(store.closed.load(Ordering::SeqCst), "store left open after bind failure");
    }
}
