//! SIGINT / SIGTERM → shutdown flag.
//!
//! The handler only stores to an atomic; the poll loop observes the flag
//! between ticks and runs the normal stop path (final off, release pins).

use core::ffi::c_int;
use core::sync::atomic::{AtomicBool, Ordering};

use log::info;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};

/// Raised by the signal handler, read by [`AppService::run`](crate::app::service::AppService::run).
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_signal(_signum: c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::Release);
}

/// Route SIGINT and SIGTERM to the shutdown flag.
pub fn install_signal_handlers() -> nix::Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(on_signal),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    for sig in [Signal::SIGINT, Signal::SIGTERM] {
        // SAFETY: `on_signal` is async-signal-safe; it performs a single
        // atomic store and touches no other state.
        unsafe { signal::sigaction(sig, &action) }?;
    }
    info!("signal handlers installed (SIGINT, SIGTERM)");
    Ok(())
}

/// The flag the poll loop watches.
pub fn shutdown_flag() -> &'static AtomicBool {
    &SHUTDOWN_REQUESTED
}
