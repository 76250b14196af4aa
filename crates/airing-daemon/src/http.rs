use std::convert::Infallible;
use std::sync::Arc;

use airing_proto::input::Gesture;
use airing_proto::protocol::{Broadcast, Command, GuideState, GuideStatus, PROTOCOL_VERSION};
use airing_proto::state::StateManager;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
    routing::{get, post},
    Router,
};
use futures_util::stream::{self, Stream, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info, warn};

use crate::core::GuideEvent;
use crate::text;
use crate::BroadcastMessage;

#[derive(Clone)]
struct HttpState {
    state_manager: Arc<StateManager>,
    event_tx: mpsc::Sender<GuideEvent>,
    broadcast_tx: broadcast::Sender<BroadcastMessage>,
}

pub fn router(
    state_manager: Arc<StateManager>,
    event_tx: mpsc::Sender<GuideEvent>,
    broadcast_tx: broadcast::Sender<BroadcastMessage>,
) -> Router {
    let app_state = HttpState {
        state_manager,
        event_tx,
        broadcast_tx,
    };

    Router::new()
        .route("/api/state", get(get_state))
        .route("/api/grid", get(get_grid))
        .route("/api/toggle", get(toggle).post(toggle))
        .route("/api/show", get(show).post(show))
        .route("/api/hide", get(hide).post(hide))
        .route("/api/close/:reason", get(close).post(close))
        .route("/api/select/:idx", get(select).post(select))
        .route("/api/gesture", post(gesture))
        .route("/api/command", post(command))
        .route("/api/events", get(events))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

pub fn start_server(
    bind_address: String,
    port: u16,
    state_manager: Arc<StateManager>,
    event_tx: mpsc::Sender<GuideEvent>,
    broadcast_tx: broadcast::Sender<BroadcastMessage>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let app = router(state_manager, event_tx, broadcast_tx);

        let addr = format!("{}:{}", bind_address, port);
        let listener = match TcpListener::bind(&addr).await {
            Ok(l) => l,
            Err(e) => {
                error!("Failed to bind HTTP server to {}: {}", addr, e);
                return;
            }
        };

        info!("HTTP API server listening on http://{}", addr);

        if let Err(e) = axum::serve(listener, app).await {
            error!("HTTP server error: {}", e);
        }
    })
}

async fn send(state: &HttpState, cmd: Command) -> StatusCode {
    if state.event_tx.send(GuideEvent::Command(cmd)).await.is_err() {
        error!("Failed to forward command to the guide core");
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    StatusCode::OK
}

async fn get_state(State(state): State<HttpState>) -> Json<GuideState> {
    Json(state.state_manager.get_state().await)
}

async fn get_grid(State(state): State<HttpState>) -> (StatusCode, String) {
    let guide = state.state_manager.get_state().await;
    let code = match guide.status {
        GuideStatus::Ready { .. } => StatusCode::OK,
        GuideStatus::Loading | GuideStatus::Failed { .. } => StatusCode::SERVICE_UNAVAILABLE,
    };
    let body = match guide.frame() {
        Some(frame) => text::paint_grid(&frame.grid),
        None => text::paint_state(&guide),
    };
    (code, body)
}

async fn toggle(State(state): State<HttpState>) -> StatusCode {
    info!("HTTP API: Toggle view");
    send(&state, Command::Toggle).await
}

async fn show(State(state): State<HttpState>) -> StatusCode {
    info!("HTTP API: Show schedule");
    send(&state, Command::Show).await
}

async fn hide(State(state): State<HttpState>) -> StatusCode {
    info!("HTTP API: Hide schedule");
    send(&state, Command::Hide).await
}

/// Explicit close actions: `control`, `escape`, `now` (the highlighted grid
/// cell) and `standby` (the standby placeholder's alternate action).
async fn close(State(state): State<HttpState>, Path(reason): Path<String>) -> StatusCode {
    let gesture = match reason.as_str() {
        "control" => Gesture::CloseControl,
        "escape" => Gesture::Escape,
        "now" => Gesture::NowCellSelected,
        "standby" => Gesture::StandbyAlternate,
        other => {
            warn!("HTTP API: unknown close reason {:?}", other);
            return StatusCode::BAD_REQUEST;
        }
    };
    info!("HTTP API: Close ({})", reason);
    send(&state, Command::Gesture { gesture }).await
}

async fn select(State(state): State<HttpState>, Path(idx): Path<usize>) -> StatusCode {
    info!("HTTP API: Select entry {}", idx);
    send(&state, Command::Select { index: idx }).await
}

async fn gesture(State(state): State<HttpState>, Json(gesture): Json<Gesture>) -> StatusCode {
    debug!("HTTP API: Gesture {:?}", gesture);
    send(&state, Command::Gesture { gesture }).await
}

async fn command(State(state): State<HttpState>, Json(cmd): Json<Command>) -> StatusCode {
    info!("HTTP API: Command {:?}", cmd);
    send(&state, cmd).await
}

/// Server-sent events: `hello` with the full state, then a `state` per
/// update and a `log` per forwarded WARN/ERROR line.
async fn events(
    State(state): State<HttpState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let hello = Broadcast::Hello {
        protocol_version: PROTOCOL_VERSION,
        state: state.state_manager.get_state().await,
    };
    let rx = state.broadcast_tx.subscribe();
    let manager = Arc::clone(&state.state_manager);

    let updates = stream::unfold((rx, manager), |(mut rx, manager)| async move {
        loop {
            let msg = match rx.recv().await {
                Ok(BroadcastMessage::StateUpdated) => Broadcast::State {
                    data: manager.get_state().await,
                },
                Ok(BroadcastMessage::Log(message)) => Broadcast::Log { message },
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    debug!("SSE client lagged by {} messages", n);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            };
            return Some((msg, (rx, manager)));
        }
    });

    let stream = stream::once(async move { hello })
        .chain(updates)
        .map(|msg| Ok(to_event(&msg)));

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn to_event(msg: &Broadcast) -> Event {
    let name = match msg {
        Broadcast::Hello { .. } => "hello",
        Broadcast::State { .. } => "state",
        Broadcast::Log { .. } => "log",
    };
    match Event::default().event(name).json_data(msg) {
        Ok(event) => event,
        Err(e) => {
            warn!("Failed to encode {} event: {}", name, e);
            Event::default().event(name).comment("encoding failed")
        }
    }
}
