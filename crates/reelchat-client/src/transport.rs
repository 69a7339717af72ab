//! TCP transport for the session.
//!
//! Speaks the newline-delimited JSON protocol from [`reelchat_proto`]. This
//! is a thin layer that just moves frames - connection policy (retries,
//! generations, timeouts) lives in the Sans-IO session.
//!
//! Note: the reference transport does not authenticate at dial time; the
//! opaque identity token is carried for transports that do.

use futures::{SinkExt, StreamExt};
use reelchat_core::TransportEvent;
use reelchat_proto::{ClientFrame, MAX_FRAME_SIZE, ServerFrame};
use tokio::{net::TcpStream, sync::mpsc};
use tokio_util::codec::{Framed, LinesCodec};

use crate::error::TransportError;

/// Channel depth for both directions. Backpressure past this point blocks
/// the producing side rather than growing without bound.
const CHANNEL_CAPACITY: usize = 32;

/// Handle to a live connection.
///
/// Frames are sent and received via the channels; an internal task handles
/// the socket I/O. Dropping the handle (or calling [`TcpTransport::stop`])
/// tears the task down.
pub struct TcpTransport {
    /// Send frames to the server.
    pub to_server: mpsc::Sender<ClientFrame>,
    /// Transport events: decoded frames, stream close, stream errors.
    pub events: mpsc::Receiver<TransportEvent>,
    /// Abort handle to stop the connection task.
    abort_handle: tokio::task::AbortHandle,
}

impl TcpTransport {
    /// Connect to a chat server.
    pub async fn connect(addr: &str) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_FRAME_SIZE));

        let (to_server_tx, to_server_rx) = mpsc::channel::<ClientFrame>(CHANNEL_CAPACITY);
        let (events_tx, events_rx) = mpsc::channel::<TransportEvent>(CHANNEL_CAPACITY);

        let handle = tokio::spawn(run_connection(framed, to_server_rx, events_tx));

        Ok(Self {
            to_server: to_server_tx,
            events: events_rx,
            abort_handle: handle.abort_handle(),
        })
    }

    /// Stop the connection task.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.abort_handle.abort();
    }
}

/// Run the connection, bridging between channels and the socket.
///
/// Exits when either side closes: the driver dropping its sender, the
/// server closing the stream, or an I/O error. A terminal event is pushed
/// before exit so the driver learns why.
async fn run_connection(
    mut framed: Framed<TcpStream, LinesCodec>,
    mut to_server: mpsc::Receiver<ClientFrame>,
    events: mpsc::Sender<TransportEvent>,
) {
    loop {
        tokio::select! {
            outbound = to_server.recv() => match outbound {
                Some(frame) => {
                    let line = match frame.encode() {
                        Ok(line) => line,
                        Err(error) => {
                            tracing::warn!(%error, "dropping unencodable outbound frame");
                            continue;
                        },
                    };
                    if let Err(error) = framed.send(line).await {
                        let _ = events
                            .send(TransportEvent::Error { error: error.to_string() })
                            .await;
                        return;
                    }
                },
                // Driver released the transport; plain teardown.
                None => return,
            },
            inbound = framed.next() => match inbound {
                Some(Ok(line)) => match ServerFrame::decode(&line) {
                    Ok(frame) => {
                        if events.send(TransportEvent::Frame(frame)).await.is_err() {
                            return;
                        }
                    },
                    // Malformed inbound payloads are dropped, never fatal.
                    Err(error) => {
                        tracing::warn!(%error, "dropping malformed inbound frame");
                    },
                },
                Some(Err(error)) => {
                    let _ = events
                        .send(TransportEvent::Error { error: error.to_string() })
                        .await;
                    return;
                },
                None => {
                    let _ = events
                        .send(TransportEvent::Down { reason: "closed by server".to_string() })
                        .await;
                    return;
                },
            },
        }
    }
}
