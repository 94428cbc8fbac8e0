use std::{net::SocketAddr, sync::Arc};

use {
    axum::{
        Router,
        extract::{Query, State},
        http::StatusCode,
        response::{IntoResponse, Json, Response},
        routing::get,
    },
    serde::Deserialize,
    serde_json::json,
    tower_http::cors::{Any, CorsLayer},
    tracing::{info, warn},
};

use {
    beacon_history::{FieldValue, HistoryStore},
    beacon_resolver::{IdKind, Resolve},
};

// ── Shared app state ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<HistoryStore>,
    pub resolver: Arc<dyn Resolve>,
    /// Seconds after which a record's live snapshot is considered stale.
    pub max_age: u64,
}

// ── Server startup ───────────────────────────────────────────────────────────

/// Build the gateway router (shared between production startup and tests).
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/info", get(info_handler))
        .route("/live", get(live_handler))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until shutdown.
pub async fn start_gateway(bind: &str, port: u16, state: AppState) -> anyhow::Result<()> {
    let app = build_app(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    info!(%addr, "gateway listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

// ── Handlers ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id_type: String,
    pub id: String,
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "channels": state.store.channel_count(),
    }))
}

/// Known snapshot, resolving only unknown channels.
async fn info_handler(Query(query): Query<IdQuery>, State(state): State<AppState>) -> Response {
    lookup(&state, &query, false).await
}

/// Known snapshot, re-resolving unknown and stale channels.
async fn live_handler(Query(query): Query<IdQuery>, State(state): State<AppState>) -> Response {
    lookup(&state, &query, true).await
}

async fn lookup(state: &AppState, query: &IdQuery, check_age: bool) -> Response {
    let Ok(kind) = query.id_type.parse::<IdKind>() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("unknown id_type: {}", query.id_type) })),
        )
            .into_response();
    };

    let predicate = [(kind.field(), FieldValue::from(query.id.clone()))];
    if let Some(snapshot) = state.store.find_one(&predicate)
        && (!check_age || !snapshot.is_stale(state.max_age))
    {
        return Json(snapshot).into_response();
    }

    match state.resolver.resolve(&state.store, kind, &query.id).await {
        Ok(Some(snapshot)) => Json(snapshot).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "unknown channel" })),
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, id = query.id, "resolution failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        },
    }
}
