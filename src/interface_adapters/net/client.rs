use crate::domain::{BodyId, Command, CommandSender, SubmitError, Vector};
use crate::interface_adapters::net::fanout::{SessionHandle, SessionLiveness};
use crate::interface_adapters::protocol::{ClientMessage, ServerMessage};
use crate::interface_adapters::state::AppState;

use axum::{
    extract::{
        State,
        ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{Instrument, Span, debug, info, info_span, warn};
use uuid::Uuid;

/// Largest inbound websocket message accepted from a client.
pub const MAX_MESSAGE_BYTES: usize = 4 * 1024;

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;
const SPAWN_TIMEOUT: Duration = Duration::from_secs(5);
const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
enum NetError {
    // Categorizes session lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    CommandsFull,
    CommandsClosed,
    SpawnTimeout,
    SpawnRejected,
    WriterClosed,
    WriteTimeout,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

impl From<SubmitError> for NetError {
    fn from(e: SubmitError) -> Self {
        match e {
            SubmitError::Full => NetError::CommandsFull,
            SubmitError::Closed => NetError::CommandsClosed,
        }
    }
}

enum LoopControl {
    Continue,
    Disconnect,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.max_message_size(MAX_MESSAGE_BYTES)
        .max_frame_size(MAX_MESSAGE_BYTES)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let session_id = Uuid::new_v4();
    let span = info_span!("session", %session_id, body_id = tracing::field::Empty);
    start_session(socket, state, session_id, span.clone())
        .instrument(span)
        .await;
}

async fn start_session(socket: WebSocket, state: Arc<AppState>, session_id: Uuid, span: Span) {
    let (sink, stream) = socket.split();
    let (outbound_tx, outbound_rx) = mpsc::channel::<Utf8Bytes>(state.outbound_capacity.max(1));
    let liveness = SessionLiveness::new();

    // The writer owns the sink for the whole session, including the bootstrap frame.
    let writer = tokio::spawn(
        run_writer(sink, outbound_rx, liveness.clone()).instrument(span.clone()),
    );

    let body_id = match request_body(&state.commands).await {
        Ok(id) => id,
        Err(e) => {
            warn!(error = ?e, "no body assigned; closing session");
            liveness.close_with(close_code::AGAIN, "no body available");
            drop(outbound_tx);
            let _ = writer.await;
            return;
        }
    };
    span.record("body_id", body_id.0);

    // AssignedBodyId goes out before the session can receive any snapshot.
    if let Err(e) = send_assignment(&outbound_tx, body_id).await {
        warn!(error = ?e, "failed to send body assignment");
        release_body(&state.commands, body_id);
        liveness.close_with(close_code::ERROR, "bootstrap failed");
        drop(outbound_tx);
        let _ = writer.await;
        return;
    }

    let reader = tokio::spawn(
        run_reader(
            stream,
            ReaderCtx::new(body_id, state.commands.clone(), liveness.clone()),
        )
        .instrument(span.clone()),
    );

    let session = SessionHandle::new(session_id, outbound_tx, liveness)
        .with_task(writer)
        .with_task(reader);
    if let Err(refused) = state.sessions.register(session) {
        info!("server shutting down; refusing session");
        release_body(&state.commands, body_id);
        refused.abort();
        return;
    }

    info!(%body_id, "client connected");
}

async fn request_body(commands: &CommandSender) -> Result<BodyId, NetError> {
    let (tx, rx) = oneshot::channel();
    commands.submit(Command::SpawnPlayer { assigned: tx })?;

    // A dropped receiver makes the universe discard the body it created.
    match timeout(SPAWN_TIMEOUT, rx).await {
        Ok(Ok(id)) => Ok(id),
        Ok(Err(_)) => Err(NetError::SpawnRejected),
        Err(_) => Err(NetError::SpawnTimeout),
    }
}

async fn send_assignment(
    outbound: &mpsc::Sender<Utf8Bytes>,
    body_id: BodyId,
) -> Result<(), NetError> {
    let frame = encode(&ServerMessage::assigned_body_id(body_id))?;
    outbound
        .send(frame)
        .await
        .map_err(|_| NetError::WriterClosed)
}

fn encode(msg: &ServerMessage) -> Result<Utf8Bytes, NetError> {
    serde_json::to_string(msg)
        .map(Utf8Bytes::from)
        .map_err(NetError::Serialization)
}

fn release_body(commands: &CommandSender, body_id: BodyId) {
    if let Err(e) = commands.submit(Command::RemoveBody { id: body_id }) {
        debug!(%body_id, error = ?e, "could not queue body removal");
    }
}

async fn run_writer(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<Utf8Bytes>,
    liveness: SessionLiveness,
) {
    let mut msgs_out: u64 = 0;
    let mut bytes_out: u64 = 0;

    let result = loop {
        let frame = tokio::select! {
            biased;
            frame = outbound.recv() => frame,
            _ = liveness.dead() => None,
        };
        // Closed buffer: the hub dropped the session or the server is stopping.
        let Some(frame) = frame else {
            break Ok(());
        };

        let len = frame.len();
        match timeout(WRITE_TIMEOUT, sink.send(Message::Text(frame))).await {
            Ok(Ok(())) => {
                msgs_out += 1;
                bytes_out += len as u64;
            }
            Ok(Err(e)) => break Err(NetError::Ws(e)),
            Err(_) => break Err(NetError::WriteTimeout),
        }
    };

    if let Err(e) = &result {
        debug!(error = ?e, "writer stopped");
    }
    liveness.mark_dead();

    let frame = liveness.take_close_frame();
    let close = async {
        sink.send(Message::Close(Some(frame))).await?;
        sink.close().await
    };
    if let Ok(Err(e)) = timeout(WRITE_TIMEOUT, close).await {
        debug!(error = %e, "socket close error");
    }

    debug!(msgs_out, bytes_out, "writer stats");
}

struct ReaderCtx {
    body_id: BodyId,
    commands: CommandSender,
    liveness: SessionLiveness,

    msgs_in: u64,
    bytes_in: u64,
    invalid_json: u32,

    last_invalid_log: Instant,
}

impl ReaderCtx {
    fn new(body_id: BodyId, commands: CommandSender, liveness: SessionLiveness) -> Self {
        let now = Instant::now();
        Self {
            body_id,
            commands,
            liveness,
            msgs_in: 0,
            bytes_in: 0,
            invalid_json: 0,
            last_invalid_log: now.checked_sub(LOG_THROTTLE).unwrap_or(now),
        }
    }
}

async fn run_reader(mut stream: SplitStream<WebSocket>, mut ctx: ReaderCtx) {
    match read_loop(&mut stream, &mut ctx).await {
        Ok(()) => info!("client disconnected"),
        Err(e) => warn!(error = ?e, "reader exited with error"),
    }

    // The hub prunes the session on the next tick; the body goes with it.
    ctx.liveness.mark_dead();
    release_body(&ctx.commands, ctx.body_id);

    debug!(
        msgs_in = ctx.msgs_in,
        bytes_in = ctx.bytes_in,
        invalid_json = ctx.invalid_json,
        "reader stats"
    );
}

async fn read_loop(stream: &mut SplitStream<WebSocket>, ctx: &mut ReaderCtx) -> Result<(), NetError> {
    loop {
        let incoming = tokio::select! {
            incoming = stream.next() => incoming,
            _ = ctx.liveness.dead() => return Ok(()),
        };
        let Some(incoming) = incoming else {
            return Ok(());
        };

        match incoming? {
            Message::Text(text) => match handle_text(ctx, text.as_str())? {
                LoopControl::Continue => {}
                LoopControl::Disconnect => return Ok(()),
            },
            Message::Binary(_) => {
                ctx.liveness
                    .close_with(close_code::UNSUPPORTED, "binary messages not supported");
                return Ok(());
            }
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => return Ok(()),
        }
    }
}

fn handle_text(ctx: &mut ReaderCtx, text: &str) -> Result<LoopControl, NetError> {
    ctx.msgs_in += 1;
    ctx.bytes_in += text.len() as u64;

    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(parse_err) => {
            ctx.invalid_json += 1;
            if should_log(&mut ctx.last_invalid_log) {
                warn!(
                    bytes = text.len(),
                    error = %parse_err,
                    "failed to parse client message"
                );
            }
            if ctx.invalid_json > MAX_INVALID_JSON {
                ctx.liveness
                    .close_with(close_code::POLICY, "too many invalid messages");
                return Ok(LoopControl::Disconnect);
            }
            return Ok(LoopControl::Continue);
        }
    };

    let Some(thrust) = message.thrust else {
        return Ok(LoopControl::Continue);
    };
    let Some(thrust) = sanitize_thrust(thrust.into()) else {
        if should_log(&mut ctx.last_invalid_log) {
            warn!("invalid thrust values (NaN/inf); dropping");
        }
        return Ok(LoopControl::Continue);
    };

    match ctx.commands.submit(Command::thrust(ctx.body_id, thrust)) {
        // A full queue is logged by the sender; the thrust is simply lost.
        Ok(()) | Err(SubmitError::Full) => Ok(LoopControl::Continue),
        Err(SubmitError::Closed) => Err(NetError::CommandsClosed),
    }
}

fn sanitize_thrust(thrust: Vector) -> Option<Vector> {
    thrust.is_finite().then_some(thrust)
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commands::CommandQueue;

    fn ctx(queue: &CommandQueue) -> ReaderCtx {
        ReaderCtx::new(BodyId(5), queue.sender(), SessionLiveness::new())
    }

    #[test]
    fn thrust_message_becomes_set_thrust() {
        let mut queue = CommandQueue::new(4);
        let mut reader = ctx(&queue);

        let control = handle_text(&mut reader, r#"{"Thrust":{"X":0,"Y":-1}}"#).unwrap();

        assert!(matches!(control, LoopControl::Continue));
        match queue.take_batch().as_slice() {
            [Command::SetThrust { id, thrust }] => {
                assert_eq!(*id, BodyId(5));
                assert_eq!(*thrust, Vector::new(0.0, -1.0));
            }
            other => panic!("unexpected batch {other:?}"),
        }
    }

    #[test]
    fn non_finite_thrust_is_dropped() {
        assert_eq!(sanitize_thrust(Vector::new(f64::NAN, 1.0)), None);
        assert_eq!(sanitize_thrust(Vector::new(1.0, f64::INFINITY)), None);
        assert_eq!(
            sanitize_thrust(Vector::new(3.0, 4.0)),
            Some(Vector::new(3.0, 4.0))
        );
    }

    #[test]
    fn messages_without_thrust_are_ignored() {
        let mut queue = CommandQueue::new(4);
        let mut reader = ctx(&queue);

        handle_text(&mut reader, r#"{"Hello":1}"#).unwrap();

        assert_eq!(queue.pending(), 0);
        assert_eq!(reader.invalid_json, 0);
        assert!(queue.take_batch().is_empty());
    }

    #[test]
    fn repeated_invalid_json_disconnects_with_policy_close() {
        let queue = CommandQueue::new(4);
        let mut reader = ctx(&queue);

        for _ in 0..MAX_INVALID_JSON {
            let control = handle_text(&mut reader, "{nope").unwrap();
            assert!(matches!(control, LoopControl::Continue));
        }
        let control = handle_text(&mut reader, "{nope").unwrap();

        assert!(matches!(control, LoopControl::Disconnect));
        assert!(!reader.liveness.is_alive());
        assert_eq!(reader.liveness.take_close_frame().code, close_code::POLICY);
    }

    #[test]
    fn closed_queue_ends_the_reader() {
        let queue = CommandQueue::new(4);
        let mut reader = ctx(&queue);
        drop(queue);

        let result = handle_text(&mut reader, r#"{"thrust":{"x":1,"y":0}}"#);
        assert!(matches!(result, Err(NetError::CommandsClosed)));
    }
}
