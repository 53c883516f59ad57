//! MARES Server
//!
//! Axum surface over the core pipeline: start a run from a client brief,
//! stream stage events over SSE, answer pending questions with a revised
//! brief, and inspect session outcomes and configured connectors. Sessions
//! live in memory; persistence across restarts is out of scope.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json,
    },
    routing::{get, post},
    Router,
};
use clap::Parser;
use futures::{stream::Stream, StreamExt};
use mares_core::connectors::{
    google_docs_connector, google_drive_connector, ConnectorAction, ConnectorActionService,
    ConnectorConfig,
};
use mares_core::llm::{CompletionService, GeminiClient};
use mares_core::pipeline::{Coordinator, CoordinatorConfig, PipelineOutcome, StageEvent};
use mares_core::state::PipelineState;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, convert::Infallible, net::SocketAddr, sync::Arc};
use tokio::{
    net::TcpListener,
    sync::{broadcast, mpsc, RwLock},
};
use tokio_stream::wrappers::BroadcastStream;

#[derive(Parser)]
#[command(name = "mares", about = "MARES requirements-analysis pipeline server")]
struct Cli {
    /// Port to listen on
    #[arg(long, default_value_t = 8844)]
    port: u16,
    /// Default model for all LLM stages
    #[arg(long)]
    model: Option<String>,
    /// Cloud project hosting the prebuilt connectors
    #[arg(long)]
    project_id: Option<String>,
    /// Connector/service location
    #[arg(long, default_value = "global")]
    location: String,
}

/// Where a session currently stands.
#[derive(Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum SessionStatus {
    Running,
    Complete { final_report: String },
    AwaitingAnswers { questions: Vec<String> },
    Failed { reason: String },
}

struct Session {
    status: SessionStatus,
    /// Resumption token retained while the session awaits answers.
    resume_state: Option<PipelineState>,
}

struct AppState {
    config: CoordinatorConfig,
    service: Arc<dyn CompletionService>,
    sessions: RwLock<HashMap<String, Session>>,
    event_tx: broadcast::Sender<StageEvent>,
}

type SharedState = Arc<AppState>;

// === API Types ===

#[derive(Deserialize)]
struct BriefRequest {
    brief: String,
}

#[derive(Serialize)]
struct SessionStarted {
    session_id: String,
}

#[derive(Serialize)]
struct ApiError {
    success: bool,
    message: String,
}

impl ApiError {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: false,
            message: message.into(),
        })
    }
}

#[derive(Serialize)]
struct ConnectorCatalog {
    connection: String,
    actions: Vec<ConnectorAction>,
}

/// Generate a session ID from wall-clock nanos plus a random tail.
fn session_id() -> String {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_nanos();
    let tail = RandomState::new().build_hasher().finish() as u32;
    format!("sess-{nanos:x}-{tail:x}")
}

/// Run (or resume) the pipeline in the background, forwarding stage events
/// to the broadcast channel and recording the outcome on the session.
fn spawn_pipeline(
    state: SharedState,
    id: String,
    brief: String,
    resume_state: Option<PipelineState>,
) {
    tokio::spawn(async move {
        let (tx, mut rx) = mpsc::channel::<StageEvent>(64);
        let broadcast_tx = state.event_tx.clone();
        let forwarder = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let _ = broadcast_tx.send(event);
            }
        });

        let coordinator =
            Coordinator::new(state.config.clone(), state.service.clone()).with_event_channel(tx);
        let outcome = match resume_state {
            Some(resume) => coordinator.resume(resume, &brief).await,
            None => coordinator.run(&brief).await,
        };
        // The coordinator holds the last sender; drop it so the forwarder drains.
        drop(coordinator);
        let _ = forwarder.await;

        let (status, resume_state) = match outcome {
            Ok(PipelineOutcome::Complete { final_report, .. }) => {
                (SessionStatus::Complete { final_report }, None)
            }
            Ok(PipelineOutcome::NeedsClarification { questions, state }) => {
                (SessionStatus::AwaitingAnswers { questions }, Some(state))
            }
            Ok(PipelineOutcome::AnalysisFailed { reason }) => {
                (SessionStatus::Failed { reason }, None)
            }
            Err(err) => (
                SessionStatus::Failed {
                    reason: err.to_string(),
                },
                None,
            ),
        };

        let mut sessions = state.sessions.write().await;
        if let Some(session) = sessions.get_mut(&id) {
            session.status = status;
            session.resume_state = resume_state;
        }
    });
}

// === Handlers ===

async fn start_brief(
    State(state): State<SharedState>,
    Json(request): Json<BriefRequest>,
) -> impl IntoResponse {
    if request.brief.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            ApiError::new("brief must not be empty"),
        )
            .into_response();
    }

    let id = session_id();
    state.sessions.write().await.insert(
        id.clone(),
        Session {
            status: SessionStatus::Running,
            resume_state: None,
        },
    );

    tracing::info!(session = %id, "brief accepted");
    spawn_pipeline(state, id.clone(), request.brief, None);
    Json(SessionStarted { session_id: id }).into_response()
}

async fn revise_brief(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(request): Json<BriefRequest>,
) -> impl IntoResponse {
    let resume = {
        let mut sessions = state.sessions.write().await;
        match sessions.get_mut(&id) {
            Some(session) => match session.resume_state.take() {
                Some(resume) => {
                    session.status = SessionStatus::Running;
                    resume
                }
                None => {
                    return (
                        StatusCode::CONFLICT,
                        ApiError::new("session is not awaiting answers"),
                    )
                        .into_response()
                }
            },
            None => {
                return (StatusCode::NOT_FOUND, ApiError::new("unknown session")).into_response()
            }
        }
    };

    tracing::info!(session = %id, "revised brief accepted");
    spawn_pipeline(state, id.clone(), request.brief, Some(resume));
    Json(SessionStarted { session_id: id }).into_response()
}

async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.sessions.read().await.get(&id) {
        Some(session) => Json(session.status.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, ApiError::new("unknown session")).into_response(),
    }
}

async fn stream_events(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.event_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| async move {
        match msg {
            Ok(event) => Event::default().json_data(&event).ok().map(Ok),
            // Lagged receivers just skip ahead.
            Err(_) => None,
        }
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn list_connectors(State(state): State<SharedState>) -> impl IntoResponse {
    let catalogs: Vec<ConnectorCatalog> = match &state.config.project_id {
        Some(project_id) => {
            let docs = google_docs_connector(ConnectorConfig::new(
                project_id,
                &state.config.location,
                "google-docs-connector",
            ));
            let drive = google_drive_connector(ConnectorConfig::new(
                project_id,
                &state.config.location,
                "google-drive-connector",
            ));
            [&docs as &dyn ConnectorActionService, &drive]
                .into_iter()
                .map(|c| ConnectorCatalog {
                    connection: c.connection().to_string(),
                    actions: c.actions().to_vec(),
                })
                .collect()
        }
        None => Vec::new(),
    };
    Json(catalogs)
}

async fn run_server(cli: Cli) -> anyhow::Result<()> {
    let mut config = CoordinatorConfig {
        project_id: cli.project_id,
        location: cli.location,
        ..CoordinatorConfig::default()
    };
    if let Some(model) = cli.model {
        config.default_model = model;
    }

    let service: Arc<dyn CompletionService> = Arc::new(GeminiClient::from_env()?);
    let (event_tx, _) = broadcast::channel(256);

    let state: SharedState = Arc::new(AppState {
        config,
        service,
        sessions: RwLock::new(HashMap::new()),
        event_tx,
    });

    let app = Router::new()
        .route("/api/brief", post(start_brief))
        .route("/api/brief/:id/revise", post(revise_brief))
        .route("/api/sessions/:id", get(get_session))
        .route("/api/events", get(stream_events))
        .route("/api/connectors", get(list_connectors))
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    tracing::info!(%addr, "MARES server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    run_server(Cli::parse()).await
}
