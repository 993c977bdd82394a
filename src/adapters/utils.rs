//! Shared formatting helpers for adapter-layer log output.

use core::fmt::Write;

/// Render a millisecond span as `HH:MM:SS`.  Hours do not wrap at 24.
pub(super) fn fmt_hms(ms: u64) -> heapless::String<24> {
    let secs = ms / 1000;
    let mut out = heapless::String::<24>::new();
    let _ = write!(
        out,
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    );
    out
}
