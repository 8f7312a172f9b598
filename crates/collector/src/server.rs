// WebSocket accept loop and per-session handling. Every accepted
// connection gets its own task; sessions share nothing but the record
// queue, so one failing session never affects the others.

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{error, info, warn};
use uuid::Uuid;

use fluxmos_core::TelemetryRecord;

use crate::recorder::Metrics;

/// Accepts sessions indefinitely. Accept errors are logged and the loop
/// keeps going.
pub async fn serve(
    listener: TcpListener,
    records: mpsc::Sender<TelemetryRecord>,
    metrics: Arc<Metrics>,
) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "accept failed");
                continue;
            }
        };
        let session = Uuid::new_v4();
        tokio::spawn(handle_session(
            session,
            peer,
            stream,
            records.clone(),
            metrics.clone(),
        ));
    }
}

async fn handle_session(
    session: Uuid,
    peer: SocketAddr,
    stream: TcpStream,
    records: mpsc::Sender<TelemetryRecord>,
    metrics: Arc<Metrics>,
) {
    let mut ws = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(%session, %peer, error = %e, "websocket handshake failed");
            return;
        }
    };
    metrics.sessions.fetch_add(1, Ordering::Relaxed);
    info!(%session, %peer, "session opened");

    while let Some(frame) = ws.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                metrics.frames_received.fetch_add(1, Ordering::Relaxed);
                match TelemetryRecord::decode(&text) {
                    Ok(record) => {
                        info!(%session, vehicle = %record.vehicle_id, soc = record.soc, "telemetry received");
                        if records.send(record).await.is_err() {
                            error!(%session, "record writer is gone; closing session");
                            break;
                        }
                    }
                    Err(e) => {
                        // Non-fatal: skip the frame, keep the session.
                        metrics.frames_discarded.fetch_add(1, Ordering::Relaxed);
                        warn!(%session, error = %e, "discarding frame");
                    }
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(%session, error = %e, "session error");
                break;
            }
        }
    }

    metrics.sessions.fetch_sub(1, Ordering::Relaxed);
    info!(%session, %peer, "session closed");
}
