use crate::{
    app::{App, AppError, Health, RecommendRequest, RecommendResponse},
    catalog::CatalogItem,
    extract::ExtractError,
    recommender::{FailureKind, RecommendError},
};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;

#[derive(Clone)]
struct SharedState {
    app: Arc<App>,
}

pub fn router(app: Arc<App>) -> Router {
    let shared_state = Arc::new(SharedState { app });

    Router::new()
        .route("/recommend", post(recommend))
        .route("/catalog", get(catalog))
        .route("/health", get(health))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        )
        .with_state(shared_state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {err}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                log::error!("failed to install signal handler: {err}");
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

    log::warn!("shutting down");
}

async fn serve(app: Arc<App>, listen: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(listen).await?;
    log::info!("listening on {listen}");
    axum::serve(listener, router(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Serve HTTP until interrupted.
///
/// `app` is fully initialised before the listener binds, so no request can
/// reach a partially built catalog.
pub fn start_daemon(app: App, listen: SocketAddr) -> anyhow::Result<()> {
    let app = Arc::new(app);

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(serve(app, listen))
}

#[derive(Debug)]
struct HttpError(AppError);

// Tell axum how to convert `AppError` into a response.
impl IntoResponse for HttpError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            AppError::Recommend(RecommendError::EmptyQuery)
            | AppError::Extract(ExtractError::InvalidUrl(_))
            | AppError::InvalidParams(_) => StatusCode::BAD_REQUEST,
            AppError::Extract(ExtractError::Fetch(_)) => StatusCode::BAD_GATEWAY,
            AppError::Recommend(RecommendError::Unavailable {
                kind: FailureKind::Transient,
                ..
            }) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Recommend(RecommendError::Unavailable {
                kind: FailureKind::Permanent,
                ..
            })
            | AppError::Catalog(_)
            | AppError::Embedding(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if self.0.is_user_error() {
            log::debug!("{self:?}");
        } else {
            log::error!("{self:?}");
        }

        (status, Json(json!({"error": self.0.to_string()}))).into_response()
    }
}

impl<E> From<E> for HttpError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

async fn recommend(
    State(state): State<Arc<SharedState>>,
    Json(payload): Json<RecommendRequest>,
) -> Result<Json<RecommendResponse>, HttpError> {
    log::debug!("payload: {payload:?}");

    let app = state.app.clone();

    tokio::task::block_in_place(move || app.recommend(payload).map(Json).map_err(Into::into))
}

async fn catalog(State(state): State<Arc<SharedState>>) -> Json<Vec<CatalogItem>> {
    Json(state.app.catalog().to_vec())
}

async fn health(State(state): State<Arc<SharedState>>) -> Json<Health> {
    Json(state.app.health())
}
