//! Connection supervisor: bounded-retry reconnection over the connection's
//! status stream.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use tonearm_core::Error;
use tracing::{debug, warn};

use crate::connection::ConnectionStatus;
use crate::player::PlayerInner;

/// How long a resumable disconnect may take to re-enter `Connecting`.
pub const RESUME_WAIT: Duration = Duration::from_secs(5);

/// How long `Signalling`/`Connecting` may take to reach `Ready`.
pub const READY_WAIT: Duration = Duration::from_secs(20);

/// Rejoin ceiling; at this many attempts the connection is destroyed.
pub const MAX_REJOIN_ATTEMPTS: u32 = 5;

/// Backoff unit: a rejoin waits `(attempts + 1) * BACKOFF_UNIT`.
pub const BACKOFF_UNIT: Duration = Duration::from_secs(5);

/// Outcome of a bounded wait on the status stream.
enum Waited {
    Reached,
    Destroyed,
    TimedOut,
    Closed,
}

async fn await_status(
    events: &mut mpsc::UnboundedReceiver<ConnectionStatus>,
    target: fn(ConnectionStatus) -> bool,
    wait: Duration,
) -> Waited {
    let outcome = timeout(wait, async {
        while let Some(status) = events.recv().await {
            if target(status) {
                return Waited::Reached;
            }
            if status == ConnectionStatus::Destroyed {
                return Waited::Destroyed;
            }
        }
        Waited::Closed
    })
    .await;
    outcome.unwrap_or(Waited::TimedOut)
}

fn teardown(inner: &Arc<PlayerInner>) {
    inner.destroy_session();
    inner.transport.lock().stop(true);
}

/// Require `Ready` within [`READY_WAIT`]; on timeout destroy the connection
/// unless it already is. Returns false when the supervisor should stop.
async fn ensure_ready(
    inner: &Arc<PlayerInner>,
    events: &mut mpsc::UnboundedReceiver<ConnectionStatus>,
) -> bool {
    match await_status(events, |s| s == ConnectionStatus::Ready, READY_WAIT).await {
        Waited::Reached => true,
        Waited::Destroyed => {
            teardown(inner);
            false
        }
        Waited::Closed => false,
        Waited::TimedOut => {
            warn!(
                "{}",
                Error::ConnectionTimeout {
                    target: "Ready",
                    waited_secs: READY_WAIT.as_secs(),
                }
            );
            let mut connection = inner.connection.lock();
            if !connection.is_destroyed() {
                connection.destroy();
            }
            true
        }
    }
}

/// Supervise the connection's lifecycle for one session.
pub(crate) async fn run(
    inner: Arc<PlayerInner>,
    mut events: mpsc::UnboundedReceiver<ConnectionStatus>,
) {
    while let Some(status) = events.recv().await {
        match status {
            ConnectionStatus::Ready => {}
            ConnectionStatus::Signalling | ConnectionStatus::Connecting => {
                if !ensure_ready(&inner, &mut events).await {
                    break;
                }
            }
            ConnectionStatus::Disconnected(reason) if reason.is_resumable() => {
                // The endpoint moved the session and should re-signal on its
                // own; give it a bounded window to do so.
                let reconnecting = |s: ConnectionStatus| {
                    matches!(
                        s,
                        ConnectionStatus::Connecting | ConnectionStatus::Signalling
                    )
                };
                match await_status(&mut events, reconnecting, RESUME_WAIT).await {
                    Waited::Reached => {
                        if !ensure_ready(&inner, &mut events).await {
                            break;
                        }
                    }
                    Waited::Destroyed | Waited::Closed => {
                        teardown(&inner);
                        break;
                    }
                    Waited::TimedOut => {
                        // The session was dropped, not moved.
                        warn!(
                            "{}",
                            Error::ConnectionTimeout {
                                target: "Connecting",
                                waited_secs: RESUME_WAIT.as_secs(),
                            }
                        );
                        inner.connection.lock().destroy();
                        teardown(&inner);
                        break;
                    }
                }
            }
            ConnectionStatus::Disconnected(_) => {
                let attempts = inner.connection.lock().rejoin_attempts();
                if attempts < MAX_REJOIN_ATTEMPTS {
                    let backoff = BACKOFF_UNIT * (attempts + 1);
                    debug!(
                        "disconnected; rejoining in {}s (attempt {})",
                        backoff.as_secs(),
                        attempts + 1
                    );
                    tokio::time::sleep(backoff).await;
                    inner.connection.lock().rejoin();
                } else {
                    warn!("{}", Error::RejoinExhausted { attempts });
                    inner.connection.lock().destroy();
                }
            }
            ConnectionStatus::Destroyed => {
                teardown(&inner);
                break;
            }
        }
    }
    debug!("connection supervisor stopped");
}
