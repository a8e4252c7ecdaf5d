use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::SinkExt;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::assignment::TourAssignmentResult;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchQuery {
    /// Only forward results for this schedule.
    pub schedule_id: Option<Uuid>,
}

#[derive(Serialize)]
struct ResultEvent<'a> {
    event: &'static str,
    data: &'a TourAssignmentResult,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WatchQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, query.schedule_id))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, schedule_id: Option<Uuid>) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.result_events_tx.subscribe();

    info!(schedule_id = ?schedule_id, "websocket watcher connected");

    let send_task = tokio::spawn(async move {
        loop {
            let result = match rx.recv().await {
                Ok(result) => result,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "websocket watcher fell behind, results dropped");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            if schedule_id.is_some_and(|id| id != result.schedule_id) {
                continue;
            }

            let event = ResultEvent {
                event: "tour_assigned",
                data: &result,
            };
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize assignment result for ws");
                    continue;
                }
            };

            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(_msg)) = receiver.next().await {}
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    info!("websocket watcher disconnected");
}
