use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tower_http::services::ServeDir;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::model::ConnId;
use crate::protocol::{ClientMessage, Outbound, ServerMessage};
use crate::world::World;

/// Everything a socket task can ask of the game task.
#[derive(Debug)]
pub enum GameCommand {
    Connect {
        id: ConnId,
        sender: mpsc::UnboundedSender<ServerMessage>,
    },
    Client {
        id: ConnId,
        message: ClientMessage,
    },
    Disconnect {
        id: ConnId,
    },
}

#[derive(Clone)]
pub struct AppState {
    pub commands: mpsc::UnboundedSender<GameCommand>,
}

pub fn router(app_state: AppState, public_dir: &Path) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .fallback_service(ServeDir::new(public_dir).append_index_html_on_directories(true))
        .with_state(app_state)
}

async fn ws_handler(State(app_state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: AppState) {
    let id = Uuid::new_v4();
    let (mut socket_sender, mut socket_receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    if app_state
        .commands
        .send(GameCommand::Connect { id, sender: tx })
        .is_err()
    {
        warn!("game loop is gone, dropping connection {}", id);
        return;
    }
    info!("connection {} opened", id);

    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let payload = match serde_json::to_string(&msg) {
                Ok(text) => text,
                Err(err) => {
                    warn!("serialize message failed: {}", err);
                    continue;
                }
            };
            if socket_sender.send(Message::Text(payload)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = socket_receiver.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(message) => {
                    if app_state
                        .commands
                        .send(GameCommand::Client { id, message })
                        .is_err()
                    {
                        break;
                    }
                }
                Err(err) => debug!("ignoring malformed message from {}: {}", id, err),
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    let _ = app_state.commands.send(GameCommand::Disconnect { id });
    info!("connection {} closed", id);
    let _ = send_task.await;
}

pub fn spawn_game_loop(
    world: World,
    tick_ms: u64,
    commands: mpsc::UnboundedReceiver<GameCommand>,
) -> JoinHandle<()> {
    tokio::spawn(run_game_loop(world, tick_ms, commands))
}

/// Owns the world for the lifetime of the server. Ticks and commands are
/// handled one at a time on this task, so no lock guards the state.
pub async fn run_game_loop(
    mut world: World,
    tick_ms: u64,
    mut commands: mpsc::UnboundedReceiver<GameCommand>,
) {
    let mut clients: HashMap<ConnId, mpsc::UnboundedSender<ServerMessage>> = HashMap::new();
    let mut interval = tokio::time::interval(Duration::from_millis(tick_ms.max(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                world.tick(now_millis());
                dispatch(&clients, world.drain_events());
                let state = ServerMessage::State(world.tick_snapshot());
                broadcast_message_inline(&clients, state);
            }
            command = commands.recv() => {
                let command = match command {
                    Some(command) => command,
                    None => break,
                };
                match command {
                    GameCommand::Connect { id, sender } => {
                        clients.insert(id, sender);
                        world.welcome(id);
                    }
                    GameCommand::Client { id, message } => {
                        world.handle_command(id, message, now_millis());
                    }
                    GameCommand::Disconnect { id } => {
                        clients.remove(&id);
                        world.disconnect(id, now_millis());
                    }
                }
                dispatch(&clients, world.drain_events());
            }
        }
    }
    info!("game loop stopped");
}

fn dispatch(clients: &HashMap<ConnId, mpsc::UnboundedSender<ServerMessage>>, events: Vec<Outbound>) {
    for event in events {
        for (id, sender) in clients {
            if event.audience.includes(*id) {
                let _ = sender.send(event.message.clone());
            }
        }
    }
}

fn broadcast_message_inline(
    clients: &HashMap<ConnId, mpsc::UnboundedSender<ServerMessage>>,
    msg: ServerMessage,
) {
    for sender in clients.values() {
        let _ = sender.send(msg.clone());
    }
}

pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as i64
}
