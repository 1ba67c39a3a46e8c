//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the edge handler
//! - Wire up middleware (request ID, tracing, timeout)
//! - Run the routing normalizer on every in-scope request
//! - Answer redirects, forward rewrites and pass-throughs to the renderer
//! - Fall back to CMS redirections when the renderer answers 404
//! - Bind server to listener and drain on shutdown

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::EdgeConfig;
use crate::http::request::{request_id, UuidRequestId};
use crate::http::response;
use crate::http::upstream::Upstream;
use crate::i18n::{LocaleError, LocaleSet};
use crate::lifecycle::shutdown::wait as wait_for_shutdown;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::redirections::{CmsClient, CmsError, RedirectionRefresher, RedirectionStore};
use crate::routing::{Decision, Normalizer, RequestAttrs, RouteScope, RoutingAction, RuleSettings};

/// Rule name reported for requests outside the normalizer's scope.
const OUT_OF_SCOPE: &str = "out-of-scope";

/// Errors raised while assembling the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid locale set: {0}")]
    Locales(#[from] LocaleError),

    #[error("invalid upstream address: {0}")]
    Upstream(#[from] axum::http::uri::InvalidUri),

    #[error("failed to create CMS client: {0}")]
    Cms(#[from] CmsError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub normalizer: Arc<Normalizer>,
    pub scope: Arc<RouteScope>,
    pub upstream: Upstream,
    pub redirections: Arc<RedirectionStore>,
}

/// HTTP server for the signage edge.
pub struct EdgeServer {
    router: Router,
    config: EdgeConfig,
    redirections: Arc<RedirectionStore>,
    refresher: Option<RedirectionRefresher>,
}

impl EdgeServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: EdgeConfig) -> Result<Self, ServerError> {
        let locales = Arc::new(LocaleSet::new(
            config.locales.codes.clone(),
            config.locales.default.clone(),
        )?);
        let normalizer = Arc::new(Normalizer::new(
            locales,
            RuleSettings::from_config(&config.routing),
        ));
        let scope = Arc::new(RouteScope::from_config(&config.routing));
        let upstream = Upstream::new(&config.upstream.address)?;
        let redirections = Arc::new(RedirectionStore::new());

        let refresher = if config.cms.redirections_enabled {
            let client = CmsClient::new(&config.cms, Duration::from_secs(config.timeouts.cms_secs))?;
            Some(RedirectionRefresher::new(
                redirections.clone(),
                client,
                Duration::from_secs(config.cms.redirections_refresh_secs),
            ))
        } else {
            None
        };

        let state = AppState {
            normalizer,
            scope,
            upstream,
            redirections: redirections.clone(),
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            redirections,
            refresher,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &EdgeConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(edge_handler))
            .route("/", any(edge_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.address,
            locales = ?self.config.locales.codes,
            "HTTP server starting"
        );

        if let Some(refresher) = self.refresher {
            let rx = shutdown.subscribe();
            tokio::spawn(async move {
                refresher.run(rx).await;
            });
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for_shutdown(shutdown.subscribe()))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }

    /// The redirection table consulted on renderer 404s.
    pub fn redirections(&self) -> Arc<RedirectionStore> {
        self.redirections.clone()
    }
}

/// Main edge handler.
/// Decides the routing action and either redirects or forwards.
async fn edge_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let attrs = RequestAttrs::from_http(request.uri(), request.headers());

    let decision = if state.scope.includes(&attrs.path) {
        state.normalizer.decide(&attrs)
    } else {
        Decision {
            rule: OUT_OF_SCOPE,
            action: RoutingAction::PassThrough,
        }
    };

    tracing::debug!(
        request_id = %request_id,
        method = %request.method(),
        path = %attrs.path,
        rule = decision.rule,
        action = ?decision.action,
        "Routing decision"
    );

    let action_label = action_label(&decision.action);
    let response = match decision.action {
        RoutingAction::Redirect { location, status } => response::redirect(&attrs, &location, status),
        RoutingAction::Rewrite { target } => {
            forward(&state, request, Some(&target), &attrs, peer, &request_id).await
        }
        RoutingAction::PassThrough => forward(&state, request, None, &attrs, peer, &request_id).await,
    };

    metrics::record_request(action_label, decision.rule, response.status().as_u16(), start_time);
    response
}

async fn forward(
    state: &AppState,
    request: Request<Body>,
    target: Option<&str>,
    attrs: &RequestAttrs,
    peer: SocketAddr,
    request_id: &str,
) -> Response {
    let method = request.method().clone();

    match state.upstream.send(request, target, attrs, peer).await {
        Ok(response) => {
            if response.status() == StatusCode::NOT_FOUND
                && (method == Method::GET || method == Method::HEAD)
            {
                if let Some(redirection) = state.redirections.lookup(&attrs.path) {
                    tracing::info!(
                        request_id = %request_id,
                        path = %attrs.path,
                        destination = %redirection.destination_url,
                        "Serving CMS redirection"
                    );
                    return response::redirect(
                        attrs,
                        &redirection.destination_url,
                        redirection.status_code,
                    );
                }
            }
            response
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upstream error");
            metrics::record_upstream_error();
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}

fn action_label(action: &RoutingAction) -> &'static str {
    match action {
        RoutingAction::Redirect { .. } => "redirect",
        RoutingAction::Rewrite { .. } => "rewrite",
        RoutingAction::PassThrough => "pass_through",
    }
}
