//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART in production, stderr on the host).

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::guard::DropReason;
use crate::app::peer::PeerOutcome;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Booted(s) => {
                info!(
                    "STATUS | unlock {} | window {} | peer {} | {}",
                    if s.unlock_allowed { "ALLOWED" } else { "DENIED" },
                    s.window,
                    if s.peer_present { "connected" } else { "absent" },
                    s.now,
                );
            }
            AppEvent::PressDropped(reason) => match reason {
                DropReason::Busy => debug!("PRESS | dropped: already processing"),
                DropReason::Bounce { elapsed_ms } => debug!("PRESS | debounced: {}ms", elapsed_ms),
                DropReason::Released => debug!("PRESS | dropped: button not held"),
            },
            AppEvent::PressAccepted { at_ms } => {
                info!("PRESS | accepted at {}ms", at_ms);
            }
            AppEvent::PeerHandshake(outcome) => match outcome {
                PeerOutcome::Responded { after_ms } => {
                    info!("PEER | responded after {}ms", after_ms);
                }
                PeerOutcome::TimedOut { waited_ms } => {
                    warn!("PEER | no response in {}ms", waited_ms);
                }
            },
            AppEvent::Outcome(outcome) => {
                info!("UNLOCK | {:?}", outcome);
            }
            AppEvent::UnlockSkipped => {
                info!("UNLOCK | already in progress");
            }
            AppEvent::ClockSynced { now } => {
                info!("SYNC | clock set to {}", now);
            }
            AppEvent::ClockSyncFailed(e) => {
                warn!("SYNC | failed: {}", e);
            }
            AppEvent::HandlerFault(e) => {
                warn!("PRESS | aborted: {}", e);
            }
            AppEvent::Shutdown => {
                info!("STATUS | outputs safe, stopping");
            }
        }
    }
}
