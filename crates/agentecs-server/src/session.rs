//! Per-connection session multiplexer.
//!
//! On accept, a connection gets exactly one `metadata` event followed by one
//! `snapshot` event, then two cooperating tasks take over: a writer that
//! drains a fresh [`Subscription`](agentecs_source::Subscription) for
//! broadcast events, and a reader that parses and dispatches commands,
//! replying with direct (non-broadcast) events over a side channel so
//! command acknowledgements and broadcast events can freely interleave on
//! the wire. Either task exiting tears the whole session down.

use agentecs_protocol::{parse_command, ClientCommand, ServerEvent};
use agentecs_source::TickLoopSource;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::state::SharedAppState;

/// Axum handler: upgrade the HTTP connection and hand it off to
/// [`handle_socket`].
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<SharedAppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, Arc::clone(state.source())))
}

/// Drive one WebSocket connection end to end.
async fn handle_socket(socket: WebSocket, source: Arc<TickLoopSource>) {
    let (mut sender, receiver) = socket.split();

    if send_event(&mut sender, &metadata_event(&source)).await.is_err() {
        return;
    }
    let snapshot = source.get_snapshot(None);
    let snapshot_event = ServerEvent::Snapshot { tick: snapshot.tick, snapshot };
    if send_event(&mut sender, &snapshot_event).await.is_err() {
        return;
    }

    let subscription = source.subscribe();
    let (direct_tx, direct_rx) = mpsc::unbounded_channel::<ServerEvent>();

    let writer = tokio::spawn(run_writer(sender, subscription, direct_rx));
    let reader = tokio::spawn(run_reader(receiver, Arc::clone(&source), direct_tx));

    tokio::select! {
        _ = writer => {
            reader.abort();
        }
        _ = reader => {
            writer.abort();
        }
    }

    debug!("session closed");
}

/// Forward broadcast events and direct command responses to the socket,
/// interleaved in whichever order they arrive. Exits when the broadcast
/// subscription closes (source disconnected) or a send fails.
async fn run_writer(
    mut sender: SplitSink<WebSocket, Message>,
    mut subscription: agentecs_source::Subscription,
    mut direct_rx: mpsc::UnboundedReceiver<ServerEvent>,
) {
    let mut direct_closed = false;
    loop {
        tokio::select! {
            biased;
            direct = direct_rx.recv(), if !direct_closed => {
                match direct {
                    Some(event) => {
                        if send_event(&mut sender, &event).await.is_err() {
                            break;
                        }
                    }
                    None => direct_closed = true,
                }
            }
            event = subscription.recv() => {
                match event {
                    Some(event) => {
                        if send_event(&mut sender, &event).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }
    debug!("session writer exiting");
}

/// Read and dispatch client commands until the socket closes or errors.
async fn run_reader(
    mut receiver: futures::stream::SplitStream<WebSocket>,
    source: Arc<TickLoopSource>,
    direct_tx: mpsc::UnboundedSender<ServerEvent>,
) {
    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                if let Some(reply) = handle_raw_command(&source, &text) {
                    if direct_tx.send(reply).is_err() {
                        break;
                    }
                }
            }
            Ok(Message::Close(_)) => {
                debug!("client closed the connection");
                break;
            }
            Ok(_) => {
                // Ping/Pong/Binary: axum answers pings automatically; we have
                // no use for binary frames in this protocol.
            }
            Err(e) => {
                warn!(error = %e, "websocket receive error");
                break;
            }
        }
    }
    debug!("session reader exiting");
}

/// Parse and dispatch one raw command, returning the direct-response event
/// (if any) to send back on this connection.
///
/// Pulled out of the socket-handling loop so it can be exercised directly in
/// tests without standing up a real WebSocket.
fn handle_raw_command(source: &TickLoopSource, raw: &str) -> Option<ServerEvent> {
    match parse_command(raw) {
        Ok(command) => dispatch(source, command),
        Err(e) => Some(ServerEvent::Error {
            tick: source.get_current_tick(),
            message: e.to_string(),
        }),
    }
}

fn dispatch(source: &TickLoopSource, command: ClientCommand) -> Option<ServerEvent> {
    match command {
        ClientCommand::Seek { tick } => Some(match source.historical_snapshot(tick) {
            Some(snapshot) => ServerEvent::Snapshot { tick, snapshot },
            None => ServerEvent::Error {
                tick: source.get_current_tick(),
                message: agentecs_core::VizError::UnknownTick(tick).to_string(),
            },
        }),
        ClientCommand::Pause | ClientCommand::Resume | ClientCommand::Step => {
            let _ = source.send_command(&command);
            let snapshot = source.get_snapshot(None);
            Some(ServerEvent::TickUpdate {
                tick: snapshot.tick,
                entity_count: snapshot.entity_count(),
                is_paused: source.is_paused(),
            })
        }
        ClientCommand::SetSpeed { .. } => match source.send_command(&command) {
            Ok(()) => None,
            Err(e) => Some(ServerEvent::Error {
                tick: source.get_current_tick(),
                message: e.to_string(),
            }),
        },
    }
}

fn metadata_event(source: &TickLoopSource) -> ServerEvent {
    ServerEvent::Metadata {
        tick: source.get_current_tick(),
        visualization: source.visualization_config(),
        tick_range: source.get_tick_range(),
        supports_history: true,
        is_paused: source.is_paused(),
    }
}

async fn send_event(sender: &mut SplitSink<WebSocket, Message>, event: &ServerEvent) -> Result<(), axum::Error> {
    match serde_json::to_string(event) {
        Ok(json) => sender.send(Message::Text(json.into())).await,
        Err(e) => {
            warn!(error = %e, "failed to serialize server event");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentecs_core::VizConfig;
    use agentecs_source::DemoWorldGenerator;

    fn new_source() -> TickLoopSource {
        TickLoopSource::new(VizConfig::default(), Box::new(DemoWorldGenerator::new(2)))
    }

    #[test]
    fn pause_acks_with_tick_update() {
        let source = new_source();
        let reply = handle_raw_command(&source, r#"{"command":"pause"}"#).expect("reply");
        assert!(matches!(reply, ServerEvent::TickUpdate { is_paused: true, .. }));
    }

    #[test]
    fn set_speed_has_no_ack_on_success() {
        let source = new_source();
        let reply = handle_raw_command(&source, r#"{"command":"set_speed","ticks_per_second":5.0}"#);
        assert!(reply.is_none());
    }

    #[test]
    fn set_speed_replies_with_error_on_invalid_value() {
        let source = new_source();
        let reply = handle_raw_command(&source, r#"{"command":"set_speed","ticks_per_second":0}"#);
        assert!(matches!(reply, Some(ServerEvent::Error { .. })));
    }

    #[test]
    fn seek_to_retained_tick_replies_with_snapshot() {
        let source = new_source();
        source.history().record_tick(agentecs_snapshot::WorldSnapshot::new(0, 0.0));
        let reply = handle_raw_command(&source, r#"{"command":"seek","tick":0}"#);
        assert!(matches!(reply, Some(ServerEvent::Snapshot { tick: 0, .. })));
    }

    #[test]
    fn seek_to_unknown_tick_replies_with_error() {
        let source = new_source();
        let reply = handle_raw_command(&source, r#"{"command":"seek","tick":999}"#);
        match reply {
            Some(ServerEvent::Error { message, .. }) => assert!(message.contains("unknown tick")),
            other => panic!("expected error event, got {other:?}"),
        }
    }

    #[test]
    fn malformed_command_replies_with_error() {
        let source = new_source();
        let reply = handle_raw_command(&source, "not json");
        assert!(matches!(reply, Some(ServerEvent::Error { .. })));
    }

    #[test]
    fn unknown_command_tag_replies_with_error() {
        let source = new_source();
        let reply = handle_raw_command(&source, r#"{"command":"bogus"}"#);
        assert!(matches!(reply, Some(ServerEvent::Error { .. })));
    }

    #[test]
    fn metadata_event_reflects_paused_state() {
        let source = new_source();
        source.send_command(&ClientCommand::Pause).unwrap();
        let event = metadata_event(&source);
        assert!(matches!(event, ServerEvent::Metadata { is_paused: true, .. }));
    }

    #[test]
    fn metadata_event_passes_through_visualization_config() {
        let source = new_source();
        match metadata_event(&source) {
            ServerEvent::Metadata { visualization, .. } => {
                assert_eq!(visualization.expect("config")["world_name"], "AgentECS Demo World");
            }
            other => panic!("expected metadata event, got {other:?}"),
        }
    }
}
