use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tower_http::trace::TraceLayer;

use tokengate_auth::config::StoreConfig;
use tokengate_auth::{
    AuthHandlerState, CookieSettings, LoginCoordinator, MemorySessionStore, ProviderRegistry,
    SessionStore, SigningKeyPair, TokenManager, auth_routes,
};
use tokengate_auth_postgres::PostgresSessionStore;

use crate::config::AppConfig;

pub struct TokengateServer {
    addr: SocketAddr,
    app: Router,
    tokens: Arc<TokenManager>,
}

/// Builds the router for `cfg` with providers and store taken from
/// configuration.
pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let server = ServerBuilder::new().with_config(cfg.clone()).build().await?;
    Ok(server.into_router())
}

/// Wraps the auth routes with access logging.
pub fn build_router(coordinator: Arc<LoginCoordinator>) -> Router {
    auth_routes(AuthHandlerState::new(coordinator)).layer(
        TraceLayer::new_for_http()
            .make_span_with(|req: &axum::http::Request<_>| {
                use tracing::field::Empty;
                // Query strings may carry authorization codes; log the path only.
                tracing::info_span!(
                    "http.request",
                    http.method = %req.method(),
                    http.target = %req.uri().path(),
                    http.status_code = Empty,
                )
            })
            .on_response(
                |res: &axum::http::Response<_>,
                 latency: std::time::Duration,
                 span: &tracing::Span| {
                    span.record(
                        "http.status_code",
                        tracing::field::display(res.status().as_u16()),
                    );
                    tracing::info!(
                        http.status = %res.status().as_u16(),
                        elapsed_ms = %latency.as_millis(),
                        "request handled"
                    );
                },
            ),
    )
}

/// Opens the session store selected by `store.driver`.
pub async fn create_session_store(config: &StoreConfig) -> anyhow::Result<Arc<dyn SessionStore>> {
    match config.driver.as_str() {
        "memory" => {
            tracing::warn!("Using in-memory session store, sessions are lost on restart");
            Ok(Arc::new(MemorySessionStore::new()))
        }
        "postgres" => {
            let url = config
                .connection_string
                .as_deref()
                .context("store.connection_string is required for the postgres driver")?;
            let store = PostgresSessionStore::connect(url, config.max_connections)
                .await
                .context("failed to connect to PostgreSQL")?;
            store
                .migrate()
                .await
                .context("failed to prepare session table")?;
            Ok(Arc::new(store))
        }
        other => anyhow::bail!("unknown session store driver: {other}"),
    }
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
    providers: Option<ProviderRegistry>,
    store: Option<Arc<dyn SessionStore>>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
            providers: None,
            store: None,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    /// Uses `providers` instead of building them from configuration.
    pub fn with_providers(mut self, providers: ProviderRegistry) -> Self {
        self.providers = Some(providers);
        self
    }

    /// Uses `store` instead of opening the configured driver.
    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub async fn build(self) -> anyhow::Result<TokengateServer> {
        let auth = &self.config.auth;

        let keys = SigningKeyPair::load_or_generate(&auth.service.private_key_file)
            .context("failed to load signing key")?;

        let store = match self.store {
            Some(store) => store,
            None => create_session_store(&auth.store).await?,
        };

        let tokens = Arc::new(TokenManager::new(keys, store, &auth.tokens)?);

        let providers = self
            .providers
            .unwrap_or_else(|| ProviderRegistry::from_config(auth));
        tracing::info!(providers = ?providers.names(), "Identity providers ready");

        let coordinator = LoginCoordinator::new(
            providers,
            tokens.clone(),
            CookieSettings::from_config(auth)?,
        )?;

        Ok(TokengateServer {
            addr: self.addr,
            app: build_router(Arc::new(coordinator)),
            tokens,
        })
    }
}

impl TokengateServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn into_router(self) -> Router {
        self.app
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        self.tokens.close().await;
        tracing::info!("session store closed");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
