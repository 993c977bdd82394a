//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing application events to the `log`
//! facade (stderr via `env_logger` in the binary).

use log::{info, warn};

use super::utils::fmt_hms;
use crate::app::events::{AppEvent, CommandReason};
use crate::app::ports::EventSink;
use crate::occupancy::SensorId;

/// Adapter that logs every [`AppEvent`].
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

fn source_name(source: Option<&SensorId>) -> &str {
    source.map_or("-", |s| s.as_str())
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { presence } => {
                if presence.active {
                    info!(
                        "START | someone is here on {}",
                        source_name(presence.source.as_ref())
                    );
                } else {
                    info!("START | no one here");
                }
            }
            AppEvent::PresenceStarted {
                source,
                absent_for_ms,
            } => match absent_for_ms {
                Some(ms) => info!(
                    "PRESENCE | {} HIGH after {}",
                    source_name(source.as_ref()),
                    fmt_hms(*ms)
                ),
                None => info!("PRESENCE | {} HIGH", source_name(source.as_ref())),
            },
            AppEvent::PresenceEnded {
                source,
                present_for_ms,
            } => match present_for_ms {
                Some(ms) => info!(
                    "PRESENCE | {} LOW after {}",
                    source_name(source.as_ref()),
                    fmt_hms(*ms)
                ),
                None => info!("PRESENCE | {} LOW", source_name(source.as_ref())),
            },
            AppEvent::OnSuppressed { source } => {
                info!(
                    "PRESENCE | {} outside allowed window, outlet left alone",
                    source_name(source.as_ref())
                );
            }
            AppEvent::OutletCommanded { state, reason } => match reason {
                CommandReason::GraceExpired { idle_ms } => {
                    info!("OUTLET | {} (no presence for {})", state, fmt_hms(*idle_ms));
                }
                CommandReason::Reassert { idle_ms } => {
                    info!("OUTLET | {} re-sent (idle {})", state, fmt_hms(*idle_ms));
                }
                other => info!("OUTLET | {} ({:?})", state, other),
            },
            AppEvent::WindowRefreshed(w) => {
                info!(
                    "WINDOW | {} allowed until {} and from {}",
                    w.for_date, w.not_after, w.not_before
                );
            }
            AppEvent::WindowStale { date, error } => {
                warn!("WINDOW | {} unavailable ({}), keeping previous", date, error);
            }
            AppEvent::Stopped => info!("STOP | outlet off, sensors released"),
        }
    }
}
