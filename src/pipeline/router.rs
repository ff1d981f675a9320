//! Output routing — the block's two destinations.
//!
//! Every limited block goes to local playback: the wearer always hears the
//! protected audio, whatever else happens.  The same block additionally
//! goes out over the relay **only** while the wearer is speaking — silence
//! and ambient noise are never transmitted, for both bandwidth and privacy.
//!
//! Relay failures stay inside this module: the send is fire-and-forget, a
//! failed block is counted and forgotten, and nothing here can stall or
//! abort the audio thread.

use crate::audio::PlaybackQueue;
use crate::relay::RelayLink;

/// Routes finished blocks to playback and, while speaking, the relay.
pub struct OutputRouter {
    playback: PlaybackQueue,
    relay: Option<Box<dyn RelayLink>>,
    dropped_sends: u64,
}

impl OutputRouter {
    /// `relay = None` runs the headset in local-only mode (no uplink).
    pub fn new(playback: PlaybackQueue, relay: Option<Box<dyn RelayLink>>) -> Self {
        Self {
            playback,
            relay,
            dropped_sends: 0,
        }
    }

    /// Route one limited block.
    ///
    /// Playback is unconditional.  The relay send happens iff `is_speech`;
    /// its failure is counted, never retried, never propagated.
    pub fn route(&mut self, block: &[f32], is_speech: bool) {
        if let Ok(mut queue) = self.playback.lock() {
            queue.push_slice(block);
        }

        if is_speech {
            if let Some(relay) = self.relay.as_mut() {
                if let Err(e) = relay.send_block(block) {
                    self.dropped_sends += 1;
                    log::debug!("relay send dropped ({}): {e}", self.dropped_sends);
                }
            }
        }
    }

    /// Relay datagrams lost since startup.
    pub fn dropped_sends(&self) -> u64 {
        self.dropped_sends
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
