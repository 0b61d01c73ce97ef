use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::Method,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use futures::Stream;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use tandem_registry::{HeartRegistry, MemoryStore, RegistryError};
use tandem_shared::{
    CheckIn, HeartCode, HeartRecord, HeartSnapshot, Letter, MusicTrack, QuestionAnswer,
    UserAccount, UserId,
};

use crate::config::ServerConfig;
use crate::error::ServerError;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<HeartRegistry<MemoryStore>>,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/info", get(server_info))
        .route("/accounts", post(register_account))
        .route("/accounts/:id", get(get_account))
        .route("/hearts", post(create_heart))
        .route("/hearts/:code", get(get_heart))
        .route("/hearts/:code/join", post(join_heart))
        .route("/hearts/:code/name", post(rename_heart))
        .route("/hearts/:code/watch", get(watch_heart))
        .route("/hearts/:code/letters", post(send_letter).get(list_letters))
        .route("/hearts/:code/letters/:id/read", post(mark_letter_read))
        .route(
            "/hearts/:code/check-ins",
            post(submit_check_in).get(list_check_ins),
        )
        .route("/hearts/:code/answers", post(submit_answer).get(list_answers))
        .route("/hearts/:code/tracks", post(share_track).get(list_tracks))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn parse_code(raw: &str) -> Result<HeartCode, ServerError> {
    HeartCode::parse(raw)
        .map_err(RegistryError::from)
        .map_err(ServerError::from)
}

// ---------------------------------------------------------------------------
// Health / info
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct ServerInfoResponse {
    name: String,
    version: &'static str,
    registration_open: bool,
}

async fn server_info(State(state): State<AppState>) -> Json<ServerInfoResponse> {
    Json(ServerInfoResponse {
        name: state.config.instance_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        registration_open: state.config.registration_open,
    })
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RegisterAccountRequest {
    id: UserId,
    name: String,
    email: String,
}

async fn register_account(
    State(state): State<AppState>,
    Json(req): Json<RegisterAccountRequest>,
) -> Result<Json<UserAccount>, ServerError> {
    if !state.config.registration_open {
        return Err(ServerError::Forbidden(
            "Registration is closed on this instance".into(),
        ));
    }

    let account = state
        .registry
        .register_account(&req.id, &req.name, &req.email)
        .await?;
    Ok(Json(account))
}

async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserAccount>, ServerError> {
    let account = state.registry.get_account(&UserId::new(id)).await?;
    Ok(Json(account))
}

// ---------------------------------------------------------------------------
// Hearts
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct CreateHeartRequest {
    name: String,
    creator_id: UserId,
    creator_name: String,
}

#[derive(Serialize)]
struct CreateHeartResponse {
    code: HeartCode,
}

async fn create_heart(
    State(state): State<AppState>,
    Json(req): Json<CreateHeartRequest>,
) -> Result<Json<CreateHeartResponse>, ServerError> {
    let code = state
        .registry
        .create_heart(&req.name, &req.creator_id, &req.creator_name)
        .await?;

    info!(code = %code, "heart created via API");
    Ok(Json(CreateHeartResponse { code }))
}

async fn get_heart(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<HeartRecord>, ServerError> {
    let code = parse_code(&code)?;
    let record = state.registry.get_heart(&code).await?;
    Ok(Json(record))
}

#[derive(Deserialize)]
struct JoinHeartRequest {
    user_id: UserId,
    user_name: String,
}

async fn join_heart(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(req): Json<JoinHeartRequest>,
) -> Result<Json<HeartSnapshot>, ServerError> {
    let code = parse_code(&code)?;
    let snapshot = state
        .registry
        .join_heart(&code, &req.user_id, &req.user_name)
        .await?;

    info!(code = %code, "heart joined via API");
    Ok(Json(snapshot))
}

#[derive(Deserialize)]
struct RenameHeartRequest {
    name: String,
}

async fn rename_heart(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(req): Json<RenameHeartRequest>,
) -> Result<Json<serde_json::Value>, ServerError> {
    if req.name.trim().is_empty() {
        return Err(ServerError::BadRequest("Heart name cannot be empty".into()));
    }

    let code = parse_code(&code)?;
    state.registry.rename_heart(&code, req.name.trim()).await?;
    Ok(Json(serde_json::json!({ "renamed": true })))
}

/// SSE stream of heart snapshots: the current state immediately, then one
/// event per committed change. The connection closing drops the watch
/// receiver and with it the subscription.
async fn watch_heart(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ServerError> {
    let code = parse_code(&code)?;
    let rx = state.registry.watch_heart(&code).await?;

    let stream = futures::stream::unfold((rx, true), |(mut rx, first)| async move {
        if !first && rx.changed().await.is_err() {
            return None;
        }

        let snapshot = HeartSnapshot::from(&rx.borrow_and_update().clone());
        let event = Event::default().json_data(&snapshot).ok()?;
        Some((Ok::<_, Infallible>(event), (rx, false)))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

// ---------------------------------------------------------------------------
// Letters
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct SendLetterRequest {
    sender_id: UserId,
    sender_name: String,
    content: String,
}

async fn send_letter(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(req): Json<SendLetterRequest>,
) -> Result<Json<Letter>, ServerError> {
    let code = parse_code(&code)?;
    let letter = state
        .registry
        .send_letter(&code, &req.sender_id, &req.sender_name, &req.content)
        .await?;
    Ok(Json(letter))
}

async fn list_letters(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Vec<Letter>>, ServerError> {
    let code = parse_code(&code)?;
    Ok(Json(state.registry.letters_for(&code).await?))
}

async fn mark_letter_read(
    State(state): State<AppState>,
    Path((code, id)): Path<(String, Uuid)>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let code = parse_code(&code)?;
    state.registry.mark_letter_read(&code, id).await?;
    Ok(Json(serde_json::json!({ "read": true })))
}

// ---------------------------------------------------------------------------
// Check-ins
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct SubmitCheckInRequest {
    user_id: UserId,
    user_name: String,
    mood: String,
    note: String,
}

async fn submit_check_in(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(req): Json<SubmitCheckInRequest>,
) -> Result<Json<CheckIn>, ServerError> {
    let code = parse_code(&code)?;
    let check_in = state
        .registry
        .submit_check_in(&code, &req.user_id, &req.user_name, &req.mood, &req.note)
        .await?;
    Ok(Json(check_in))
}

async fn list_check_ins(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Vec<CheckIn>>, ServerError> {
    let code = parse_code(&code)?;
    Ok(Json(state.registry.check_ins_for(&code).await?))
}

// ---------------------------------------------------------------------------
// Question answers
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct SubmitAnswerRequest {
    question_id: String,
    question: String,
    user_id: UserId,
    user_name: String,
    answer: String,
}

async fn submit_answer(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(req): Json<SubmitAnswerRequest>,
) -> Result<Json<QuestionAnswer>, ServerError> {
    let code = parse_code(&code)?;
    let answer = state
        .registry
        .submit_answer(
            &code,
            &req.question_id,
            &req.question,
            &req.user_id,
            &req.user_name,
            &req.answer,
        )
        .await?;
    Ok(Json(answer))
}

async fn list_answers(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Vec<QuestionAnswer>>, ServerError> {
    let code = parse_code(&code)?;
    Ok(Json(state.registry.answers_for(&code).await?))
}

// ---------------------------------------------------------------------------
// Music tracks
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ShareTrackRequest {
    user_id: UserId,
    user_name: String,
    track_name: String,
    artist_name: String,
    message: String,
}

async fn share_track(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(req): Json<ShareTrackRequest>,
) -> Result<Json<MusicTrack>, ServerError> {
    let code = parse_code(&code)?;
    let track = state
        .registry
        .share_track(
            &code,
            &req.user_id,
            &req.user_name,
            &req.track_name,
            &req.artist_name,
            &req.message,
        )
        .await?;
    Ok(Json(track))
}

async fn list_tracks(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Vec<MusicTrack>>, ServerError> {
    let code = parse_code(&code)?;
    Ok(Json(state.registry.tracks_for(&code).await?))
}

// ---------------------------------------------------------------------------
// Serve
// ---------------------------------------------------------------------------

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
