use crate::domain::{EngineEvent, PlayerId, PlayerInput};
use crate::interface_adapters::http::error_response;
use crate::interface_adapters::protocol::{ClientMessage, ServerMessage, WorldUpdateDto};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rng::rand_id;
use crate::use_cases::{SessionCommand, SessionHandle, SessionStatus, WorldUpdate};

use axum::{
    Error,
    extract::{
        Query, State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::timeout;
use tracing::{Instrument, debug, error, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    CommandsClosed,
    WorldUpdatesClosed,
    StatusClosed,
    JoinRequired,
    JoinTimeout,
    ClosedBeforeJoin,
}

#[derive(Debug, serde::Deserialize)]
pub struct SessionQuery {
    // The session the client wants to join.
    #[serde(default)]
    session_id: Option<String>,
}

pub async fn world_update_serializer(
    mut world_rx: broadcast::Receiver<WorldUpdate>,
    world_bytes_tx: broadcast::Sender<Utf8Bytes>,
    world_latest_tx: watch::Sender<Utf8Bytes>,
) {
    // Serialize each world update once and broadcast the shared bytes.
    loop {
        match world_rx.recv().await {
            Ok(update) => {
                let msg = ServerMessage::WorldUpdate(WorldUpdateDto::from(update));
                let txt = match serde_json::to_string(&msg) {
                    Ok(txt) => txt,
                    Err(e) => {
                        error!(error = ?e, "failed to serialize world update");
                        continue;
                    }
                };

                let bytes = Utf8Bytes::from(txt);
                // Late joiners and lagging clients resync from the latest bytes.
                let _ = world_latest_tx.send(bytes.clone());
                let _ = world_bytes_tx.send(bytes);
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(
                    missed = n,
                    "world serializer lagged; skipping to latest update"
                );
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("world updates channel closed; serializer exiting");
                break;
            }
        }
    }
}

pub fn spawn_session_serializer(session: &SessionHandle) {
    tokio::spawn(world_update_serializer(
        session.world_tx.subscribe(),
        session.world_bytes_tx.clone(),
        session.world_latest_tx.clone(),
    ));
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
) -> impl IntoResponse {
    let session_id = query
        .session_id
        .unwrap_or_else(|| state.default_session_id.to_string());

    let Some(session) = state.sessions.get_session(&session_id).await else {
        return error_response(StatusCode::NOT_FOUND, "session not found");
    };

    let player_id = state.next_player_id();
    let admin_commands = state.admin_commands;
    ws.on_upgrade(move |socket| handle_socket(socket, session, player_id, admin_commands))
}

async fn handle_socket(
    socket: WebSocket,
    session: SessionHandle,
    player_id: PlayerId,
    admin_commands: bool,
) {
    // Separate connection id for correlating logs with a transport connection.
    let conn_id = rand_id();
    let span = info_span!(
        "conn",
        conn_id,
        player_id,
        session_id = %session.session_id
    );
    serve_socket(socket, session, player_id, admin_commands)
        .instrument(span)
        .await
}

async fn serve_socket(
    mut socket: WebSocket,
    session: SessionHandle,
    player_id: PlayerId,
    admin_commands: bool,
) {
    let mut ctx = match bootstrap_connection(&mut socket, &session, player_id, admin_commands).await
    {
        Ok(ctx) => ctx,
        Err(NetError::ClosedBeforeJoin) => {
            info!("client disconnected before join handshake");
            return;
        }
        Err(e) => {
            error!(error = ?e, "failed to bootstrap connection");
            let _ = send_close_with_reason(&mut socket, close_code::POLICY, "bootstrap failed").await;
            return;
        }
    };

    info!(display_name = %ctx.display_name, "client connected");

    if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
        warn!(error = ?e, "client loop exited with error");
    }
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)?;
    Ok(bytes)
}

struct ConnCtx {
    player_id: PlayerId,
    display_name: String,
    admin_commands: bool,
    command_tx: mpsc::Sender<SessionCommand>,
    world_bytes_rx: broadcast::Receiver<Utf8Bytes>,
    world_latest_rx: watch::Receiver<Utf8Bytes>,
    status_rx: watch::Receiver<SessionStatus>,
    event_rx: broadcast::Receiver<EngineEvent>,
    // Count lag recovery snapshots sent to this client.
    lag_recovery_count: u64,

    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,

    invalid_json: u32,

    last_command_full_log: Instant,
    last_world_lag_log: Instant,
    last_invalid_input_log: Instant,

    close_frame: Option<CloseFrame>,
}

#[derive(Debug)]
struct JoinHandshake {
    display_name: String,
    character: String,
    bytes_in: u64,
}

async fn bootstrap_connection(
    socket: &mut WebSocket,
    session: &SessionHandle,
    player_id: PlayerId,
    admin_commands: bool,
) -> Result<ConnCtx, NetError> {
    // Subscribe to updates *before* doing anything else (awaits) to not miss packets.
    let world_bytes_rx = session.world_bytes_tx.subscribe();
    let world_latest_rx = session.world_latest_tx.subscribe();
    let status_rx = session.status_tx.subscribe();
    let event_rx = session.event_tx.subscribe();

    let join = match timeout(JOIN_HANDSHAKE_TIMEOUT, read_join_handshake(socket)).await {
        Ok(result) => result?,
        Err(_) => {
            let _ = send_close_with_reason(socket, close_code::POLICY, "join timeout").await;
            return Err(NetError::JoinTimeout);
        }
    };

    // Join happens before the identity reply so the next snapshot already
    // contains the player.
    session
        .command_tx
        .send(SessionCommand::Join {
            player_id,
            name: join.display_name.clone(),
            character: join.character,
        })
        .await
        .map_err(|_| NetError::CommandsClosed)?;

    let mut msgs_out = 0;
    let mut bytes_out = 0;
    let greeting = [
        ServerMessage::Identity { player_id },
        ServerMessage::SessionStatus((*status_rx.borrow()).into()),
    ];
    for msg in &greeting {
        match send_message(socket, msg).await {
            Ok(bytes) => {
                msgs_out += 1;
                bytes_out += bytes as u64;
            }
            Err(err) => {
                // Compensate so the player is not left standing in the session.
                let _ = session
                    .command_tx
                    .send(SessionCommand::Leave { player_id })
                    .await;
                return Err(err);
            }
        }
    }

    let now = Instant::now() - LOG_THROTTLE;
    Ok(ConnCtx {
        player_id,
        display_name: join.display_name,
        admin_commands,
        command_tx: session.command_tx.clone(),
        world_bytes_rx,
        world_latest_rx,
        status_rx,
        event_rx,
        lag_recovery_count: 0,

        msgs_in: 1,
        msgs_out,
        bytes_in: join.bytes_in,
        bytes_out,

        invalid_json: 0,

        last_command_full_log: now,
        last_world_lag_log: now,
        last_invalid_input_log: now,

        close_frame: None,
    })
}

enum LoopControl {
    Continue,
    Disconnect,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;
const MAX_DISPLAY_NAME_LEN: usize = 32;
const JOIN_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

async fn send_close_with_reason(
    socket: &mut WebSocket,
    code: u16,
    reason: &'static str,
) -> Result<(), NetError> {
    socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await
        .map_err(NetError::Ws)?;
    socket.close().await.map_err(NetError::Ws)
}

async fn read_join_handshake(socket: &mut WebSocket) -> Result<JoinHandshake, NetError> {
    loop {
        let Some(incoming) = socket.recv().await else {
            return Err(NetError::ClosedBeforeJoin);
        };

        match incoming.map_err(NetError::Ws)? {
            Message::Text(text) => {
                let payload = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Join(payload)) => payload,
                    Ok(_) => {
                        let _ = send_close_with_reason(socket, close_code::POLICY, "join required")
                            .await;
                        return Err(NetError::JoinRequired);
                    }
                    Err(_) => {
                        let _ = send_close_with_reason(
                            socket,
                            close_code::POLICY,
                            "invalid join payload",
                        )
                        .await;
                        return Err(NetError::JoinRequired);
                    }
                };

                let display_name = payload.display_name.trim();
                if display_name.is_empty() || display_name.chars().count() > MAX_DISPLAY_NAME_LEN {
                    let _ = send_close_with_reason(socket, close_code::POLICY, "invalid display name")
                        .await;
                    return Err(NetError::JoinRequired);
                }

                return Ok(JoinHandshake {
                    display_name: display_name.to_string(),
                    character: payload.character,
                    bytes_in: text.len() as u64,
                });
            }
            Message::Binary(_) => {
                let _ = send_close_with_reason(
                    socket,
                    close_code::UNSUPPORTED,
                    "binary messages not supported",
                )
                .await;
                return Err(NetError::JoinRequired);
            }
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => return Err(NetError::ClosedBeforeJoin),
        }
    }
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

// Queue a command without blocking the socket loop; a full queue drops it.
fn submit_command(ctx: &mut ConnCtx, command: SessionCommand) -> Result<LoopControl, NetError> {
    match ctx.command_tx.try_send(command) {
        Ok(()) => Ok(LoopControl::Continue),
        Err(mpsc::error::TrySendError::Full(command)) => {
            if should_log(&mut ctx.last_command_full_log) {
                warn!(?command, "command channel full; dropping command");
            }
            Ok(LoopControl::Continue)
        }
        Err(mpsc::error::TrySendError::Closed(_)) => Err(NetError::CommandsClosed),
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let mut fatal: Option<NetError> = None;

    // Clients joining mid-run get the current world straight away.
    let latest = ctx.world_latest_rx.borrow().clone();
    if !latest.is_empty() {
        forward_world_bytes(latest, socket, ctx).await;
    }

    loop {
        let disconnect: bool = tokio::select! {
            incoming = socket.recv() => {
                match handle_incoming_ws(incoming, ctx) {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            world_msg = ctx.world_bytes_rx.recv() => {
                match world_msg {
                    Ok(bytes) => matches!(
                        forward_world_bytes(bytes, socket, ctx).await,
                        LoopControl::Disconnect
                    ),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        if should_log(&mut ctx.last_world_lag_log) {
                            warn!(missed = n, "world updates lagged; sending snapshot");
                        }
                        // Resync strategy: send the latest world snapshot.
                        let latest = ctx.world_latest_rx.borrow().clone();
                        if latest.is_empty() {
                            false
                        } else {
                            ctx.lag_recovery_count += 1;
                            matches!(
                                forward_world_bytes(latest, socket, ctx).await,
                                LoopControl::Disconnect
                            )
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::WorldUpdatesClosed);
                        true
                    }
                }
            }

            changed = ctx.status_rx.changed() => {
                match changed {
                    Ok(()) => {
                        let status = *ctx.status_rx.borrow_and_update();
                        let msg = ServerMessage::SessionStatus(status.into());
                        matches!(forward_message(&msg, socket, ctx).await, LoopControl::Disconnect)
                    }
                    Err(_) => {
                        warn!("session status channel closed; disconnecting");
                        fatal = Some(NetError::StatusClosed);
                        true
                    }
                }
            }

            event = ctx.event_rx.recv() => {
                match event {
                    Ok(event) => {
                        let msg = ServerMessage::Event(event);
                        matches!(forward_message(&msg, socket, ctx).await, LoopControl::Disconnect)
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(missed = n, "engine events lagged; some were dropped");
                        false
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::WorldUpdatesClosed);
                        true
                    }
                }
            }
        };

        if disconnect {
            if let Some(frame) = ctx.close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    if let Err(e) = disconnect_cleanup(ctx).await {
        warn!(error = ?e, "error during disconnect cleanup");
        if fatal.is_none() {
            fatal = Some(e);
        }
    }

    match fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    ctx: &mut ConnCtx,
) -> Result<LoopControl, NetError> {
    let player_id = ctx.player_id;
    let msg = match incoming {
        Some(Ok(msg)) => msg,
        Some(Err(e)) => {
            warn!(error = %e, "websocket recv error");
            return Ok(LoopControl::Disconnect);
        }
        None => {
            info!("websocket closed");
            return Ok(LoopControl::Disconnect);
        }
    };

    let text = match msg {
        Message::Text(text) => text,
        Message::Binary(_) => {
            ctx.close_frame = Some(CloseFrame {
                code: close_code::UNSUPPORTED,
                reason: "binary messages not supported".into(),
            });
            return Ok(LoopControl::Disconnect);
        }
        Message::Ping(_) | Message::Pong(_) => return Ok(LoopControl::Continue),
        Message::Close(_) => return Ok(LoopControl::Disconnect),
    };

    ctx.msgs_in += 1;
    ctx.bytes_in += text.len() as u64;

    match serde_json::from_str::<ClientMessage>(&text) {
        Ok(ClientMessage::Join(_)) => {
            // Ignore repeated Join packets after bootstrap to keep the session stable.
            if should_log(&mut ctx.last_invalid_input_log) {
                warn!("duplicate join ignored");
            }
            Ok(LoopControl::Continue)
        }
        Ok(ClientMessage::Input(input)) => submit_command(
            ctx,
            SessionCommand::Input {
                player_id,
                input: PlayerInput::from(input),
            },
        ),
        Ok(ClientMessage::SelectUpgrade { option_id }) => submit_command(
            ctx,
            SessionCommand::SelectUpgrade {
                player_id,
                option_id,
            },
        ),
        Ok(ClientMessage::Admin(command)) => {
            if !ctx.admin_commands {
                if should_log(&mut ctx.last_invalid_input_log) {
                    warn!(?command, "admin command rejected; admin commands disabled");
                }
                return Ok(LoopControl::Continue);
            }
            info!(?command, "admin command accepted");
            submit_command(ctx, SessionCommand::Admin(command))
        }
        Err(parse_err) => {
            ctx.invalid_json += 1;
            if should_log(&mut ctx.last_invalid_input_log) {
                warn!(
                    bytes = text.len(),
                    error = %parse_err,
                    "failed to parse client message"
                );
            }

            if ctx.invalid_json > MAX_INVALID_JSON {
                ctx.close_frame = Some(CloseFrame {
                    code: close_code::POLICY,
                    reason: "too many invalid messages".into(),
                });
                return Ok(LoopControl::Disconnect);
            }
            Ok(LoopControl::Continue)
        }
    }
}

async fn forward_world_bytes(
    world_msg: Utf8Bytes,
    socket: &mut WebSocket,
    ctx: &mut ConnCtx,
) -> LoopControl {
    let bytes_len = world_msg.len();
    match socket.send(Message::Text(world_msg)).await {
        Ok(()) => {
            ctx.msgs_out += 1;
            ctx.bytes_out += bytes_len as u64;
            LoopControl::Continue
        }
        Err(err) => {
            // Disconnect follows immediately.
            warn!(error = ?err, "failed to send world update");
            LoopControl::Disconnect
        }
    }
}

async fn forward_message(
    msg: &ServerMessage,
    socket: &mut WebSocket,
    ctx: &mut ConnCtx,
) -> LoopControl {
    match send_message(socket, msg).await {
        Ok(bytes) => {
            ctx.msgs_out += 1;
            ctx.bytes_out += bytes as u64;
            LoopControl::Continue
        }
        Err(err) => {
            warn!(error = ?err, "failed to send message");
            LoopControl::Disconnect
        }
    }
}

async fn disconnect_cleanup(ctx: &ConnCtx) -> Result<(), NetError> {
    let player_id = ctx.player_id;
    ctx.command_tx
        .send(SessionCommand::Leave { player_id })
        .await
        .map_err(|_| NetError::CommandsClosed)?;

    debug!(
        msgs_in = ctx.msgs_in,
        msgs_out = ctx.msgs_out,
        bytes_in = ctx.bytes_in,
        bytes_out = ctx.bytes_out,
        invalid_json = ctx.invalid_json,
        lag_recovery_count = ctx.lag_recovery_count,
        "connection stats"
    );
    info!("client disconnected");
    Ok(())
}
