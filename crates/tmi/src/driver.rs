//! Per-connection driver: connect, handshake, and signal routing.
//!
//! Each client gets its own Tokio task running this driver. The flow is:
//!   1. Open the transport (failure → `close`)
//!   2. Feed the connected signal → handshake lines are flushed
//!   3. Loop: inbound lines and queued requests, one at a time, each one's
//!      output flushed before the next is looked at
//!   4. Transport gone or close requested → `close`

use std::time::Instant;

use tmi_session::{OutboundBuffer, Request, Session, SessionState};
use tmi_transport::{Connection, Transport, TransportError, WebSocketTransport};
use tokio::sync::{mpsc, watch};

use crate::TmiError;

/// Snapshot of session state published to every [`ChatHandle`](crate::ChatHandle).
#[derive(Debug, Clone, Copy)]
pub(crate) struct Status {
    pub(crate) state: SessionState,
    pub(crate) last_ping: Instant,
}

impl Status {
    pub(crate) fn of(session: &Session<OutboundBuffer>) -> Self {
        Self {
            state: session.state(),
            last_ping: session.last_ping(),
        }
    }
}

/// Runs one session from connect to close.
///
/// Takes the concrete WebSocket transport so the spawned future is
/// provably `Send`.
pub(crate) async fn drive(
    transport: WebSocketTransport,
    mut session: Session<OutboundBuffer>,
    mut requests: mpsc::UnboundedReceiver<Request>,
    status: watch::Sender<Status>,
) -> Result<(), TmiError> {
    let username = session.credentials().username().to_owned();

    let conn = match transport.connect().await {
        Ok(conn) => conn,
        Err(e) => {
            tracing::warn!(%username, url = transport.url(), error = %e, "connect failed");
            session.handle_closed();
            status.send_replace(Status::of(&session));
            return Err(e.into());
        }
    };

    let conn_id = conn.id();
    tracing::info!(%conn_id, %username, "connected");

    let result = run(&conn, &mut session, &mut requests, &status).await;
    if let Err(e) = &result {
        tracing::debug!(%conn_id, error = %e, "connection ended with error");
        let _ = conn.close().await;
    }

    session.handle_closed();
    status.send_replace(Status::of(&session));
    tracing::info!(%conn_id, "driver finished");
    result
}

async fn run<C>(
    conn: &C,
    session: &mut Session<OutboundBuffer>,
    requests: &mut mpsc::UnboundedReceiver<Request>,
    status: &watch::Sender<Status>,
) -> Result<(), TmiError>
where
    C: Connection<Error = TransportError>,
{
    session.handle_connected()?;
    status.send_replace(Status::of(session));
    flush(conn, session).await?;

    loop {
        tokio::select! {
            incoming = conn.recv() => match incoming? {
                Some(line) => {
                    tracing::trace!(conn_id = %conn.id(), %line, "<<");
                    session.handle_line(&line)?;
                }
                None => {
                    tracing::info!(conn_id = %conn.id(), "connection closed by server");
                    return Ok(());
                }
            },
            request = requests.recv() => match request {
                Some(request) => {
                    // A rejected command is the caller's problem, not the
                    // connection's.
                    if let Err(e) = session.handle_request(request) {
                        tracing::warn!(error = %e, "request rejected");
                    }
                }
                // Every handle is gone; nobody can talk on this
                // connection any more.
                None => session.close(),
            },
        }

        status.send_replace(Status::of(session));
        flush(conn, session).await?;

        if session.sink().close_requested() {
            conn.close().await?;
            tracing::info!(conn_id = %conn.id(), "connection closed by client");
            return Ok(());
        }
    }
}

/// Writes every line the session has queued, oldest first.
async fn flush<C>(conn: &C, session: &mut Session<OutboundBuffer>) -> Result<(), TmiError>
where
    C: Connection<Error = TransportError>,
{
    for line in session.sink_mut().drain() {
        tracing::trace!(conn_id = %conn.id(), line = %redacted(&line), ">>");
        conn.send(&line).await?;
    }
    Ok(())
}

/// Hides the token on `PASS` lines so traces can be shared.
fn redacted(line: &str) -> &str {
    if line.starts_with("PASS ") {
        "PASS <redacted>"
    } else {
        line
    }
}
