//! Speech relay — best-effort UDP uplink for communications pass-through.
//!
//! One datagram per speech block, raw little-endian `f32` samples, no
//! framing, no acknowledgment, no retry: this is live audio, and a lost
//! block is cheaper than a late one.  The socket is bound, connected and
//! switched to non-blocking at startup (failures there are fatal — the
//! headset must not start without its comms uplink); after that, a send
//! either completes immediately or the block is dropped — the audio thread
//! is never back-pressured by a slow or unreachable receiver.
//!
//! [`RelayLink`] is the seam the router talks through, so pipeline tests
//! can count sends without touching the network.

use std::net::UdpSocket;

use thiserror::Error;

// ---------------------------------------------------------------------------
// RelayError
// ---------------------------------------------------------------------------

/// Errors from the relay subsystem.  Setup variants are startup-fatal;
/// [`RelayError::Send`] is dropped silently per block by the router.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("failed to bind relay socket: {0}")]
    Bind(std::io::Error),

    #[error("failed to set relay target {target}: {source}")]
    Connect {
        target: String,
        source: std::io::Error,
    },

    #[error("relay send failed: {0}")]
    Send(std::io::Error),
}

// ---------------------------------------------------------------------------
// RelayLink trait
// ---------------------------------------------------------------------------

/// One-way block transmitter.  `Send` so the link can live inside the cpal
/// callback closure alongside the rest of the pipeline.
pub trait RelayLink: Send {
    /// Transmit one block, best-effort.  A `Err(RelayError::Send)` means
    /// this block was lost; the caller decides whether anyone cares.
    fn send_block(&mut self, samples: &[f32]) -> Result<(), RelayError>;
}

// ---------------------------------------------------------------------------
// UdpRelay
// ---------------------------------------------------------------------------

/// Production [`RelayLink`] over a connected, non-blocking UDP socket.
#[derive(Debug)]
pub struct UdpRelay {
    socket: UdpSocket,
    /// Reused payload buffer so sends never allocate on the audio thread.
    payload: Vec<u8>,
}

impl UdpRelay {
    /// Bind an ephemeral local socket and aim it at `host:port`.
    ///
    /// # Errors
    ///
    /// [`RelayError::Bind`] or [`RelayError::Connect`] — both fatal at
    /// startup; the headset must not run without its uplink.
    pub fn connect(host: &str, port: u16) -> Result<Self, RelayError> {
        let socket = UdpSocket::bind("0.0.0.0:0").map_err(RelayError::Bind)?;
        let target = format!("{host}:{port}");

        socket
            .connect(&target)
            .and_then(|()| socket.set_nonblocking(true))
            .map_err(|source| RelayError::Connect {
                target: target.clone(),
                source,
            })?;

        log::info!("speech relay aimed at {target}");
        Ok(Self {
            socket,
            payload: Vec::new(),
        })
    }
}

impl RelayLink for UdpRelay {
    fn send_block(&mut self, samples: &[f32]) -> Result<(), RelayError> {
        encode_le(samples, &mut self.payload);
        self.socket
            .send(&self.payload)
            .map(|_| ())
            .map_err(RelayError::Send)
    }
}

/// Serialise `samples` as little-endian `f32` into `out` (cleared first).
pub fn encode_le(samples: &[f32], out: &mut Vec<u8>) {
    out.clear();
    out.reserve(samples.len() * 4);
    for &s in samples {
        out.extend_from_slice(&s.to_le_bytes());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
