//! Ctrl+C handling.
//!
//! The first interrupt asks the running operation to stop through the
//! cancel token. A second one releases the camera and exits.

use std::io::Write;

use crate::context::{CancelToken, Escalation};
use crate::session::ReleaseHandle;

/// React to one interrupt. Returns what the interrupt escalated to.
///
/// On [`Escalation::Abort`] the camera and context are released before
/// returning, after the driver call in progress (if any) gives the camera
/// back. The caller is expected to exit.
pub fn handle_interrupt(
    token: &CancelToken,
    release: &ReleaseHandle,
    quiet: bool,
    out: &mut dyn Write,
) -> Escalation {
    let escalation = token.interrupt();
    match escalation {
        Escalation::Cancel => {
            log::debug!("Interrupt received, cancelling");
            if !quiet {
                let _ = write!(out, "\nCancelling...\n");
            }
        }
        Escalation::Abort => {
            log::debug!("Second interrupt received, aborting");
            if !quiet {
                let _ = write!(out, "\nAborting...\n");
            }
            release.release();
            if !quiet {
                let _ = write!(out, "Aborted.\n");
            }
        }
    }
    let _ = out.flush();
    escalation
}

/// Set up the Ctrl+C handler.
///
/// This should be called once at program startup.
pub fn install(token: CancelToken, release: ReleaseHandle) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        let quiet = release.context().is_quiet();
        let mut stderr = std::io::stderr();
        if handle_interrupt(&token, &release, quiet, &mut stderr) == Escalation::Abort {
            std::process::exit(1);
        }
    })
}
