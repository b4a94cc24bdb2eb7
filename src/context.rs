//! Execution context handed to every driver call.
//!
//! Carries the status and error sinks, a small fixed pool of progress
//! slots, and the cooperative [`CancelToken`] that drivers poll between
//! internal steps.

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Number of progress regions that can be tracked at the same time.
pub const PROGRESS_SLOTS: usize = 8;

/// Identifier of an active progress region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressId(usize);

impl ProgressId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Answer to a driver's cancellation poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Ok,
    Cancel,
}

/// What an interrupt should do, given how many were received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    /// First interrupt: ask the running operation to stop.
    Cancel,
    /// Interrupt while already cancelling: release resources and exit.
    Abort,
}

/// Shared cancellation flag, settable from the interrupt handler thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    interrupts: Arc<AtomicUsize>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an interrupt and report how it escalates.
    pub fn interrupt(&self) -> Escalation {
        if self.interrupts.fetch_add(1, Ordering::SeqCst) == 0 {
            Escalation::Cancel
        } else {
            Escalation::Abort
        }
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.interrupts.load(Ordering::SeqCst) > 0
    }
}

/// Callbacks and state shared between the command surface and drivers.
pub struct Context {
    diag: Mutex<Box<dyn Write + Send>>,
    /// Target of each progress slot; `None` marks a free slot
    targets: Mutex<[Option<f32>; PROGRESS_SLOTS]>,
    cancel: CancelToken,
    quiet: AtomicBool,
    closed: AtomicBool,
}

impl Context {
    /// Create a context that writes diagnostics to stderr.
    pub fn new(cancel: CancelToken) -> Self {
        Self::with_writer(cancel, Box::new(std::io::stderr()))
    }

    /// Create a context with a custom diagnostic stream.
    pub fn with_writer(cancel: CancelToken, diag: Box<dyn Write + Send>) -> Self {
        Self {
            diag: Mutex::new(diag),
            targets: Mutex::new([None; PROGRESS_SLOTS]),
            cancel,
            quiet: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn set_quiet(&self, quiet: bool) {
        self.quiet.store(quiet, Ordering::SeqCst);
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet.load(Ordering::SeqCst)
    }

    /// Print a status line on the diagnostic stream.
    pub fn status(&self, message: &str) {
        self.write_diag(&format!("{}\n", message));
    }

    /// Print an error block on the diagnostic stream.
    pub fn error(&self, message: &str) {
        self.write_diag(&format!("\n*** Error ***              \n{}\n", message));
    }

    /// Start a progress region of `target` units and announce it.
    ///
    /// Returns `None` when every slot is taken; the region is then untracked
    /// and updates for it are ignored.
    pub fn progress_start(&self, target: f32, message: &str) -> Option<ProgressId> {
        let id = match self.targets.lock() {
            Ok(mut targets) => {
                let free = targets.iter().position(Option::is_none);
                if let Some(slot) = free {
                    targets[slot] = Some(target);
                }
                free
            }
            Err(_) => None,
        };
        if id.is_none() {
            log::warn!("No free progress slot for '{}'", message);
        }
        self.status(message);
        id.map(ProgressId)
    }

    /// Print the completion percentage of a progress region.
    pub fn progress_update(&self, id: ProgressId, current: f32) {
        let target = match self.targets.lock() {
            Ok(targets) => targets[id.0],
            Err(_) => return,
        };
        // Empty regions have nothing to report.
        let Some(target) = target.filter(|t| *t > 0.0) else {
            return;
        };
        let percent = current / target * 100.0;
        self.write_diag(&format!("Percent completed: {:04.1}\r", percent));
    }

    /// Free a progress slot.
    pub fn progress_stop(&self, id: ProgressId) {
        if let Ok(mut targets) = self.targets.lock() {
            targets[id.0] = None;
        }
    }

    /// Number of progress regions currently active.
    pub fn active_progress(&self) -> usize {
        self.targets
            .lock()
            .map(|t| t.iter().filter(|v| v.is_some()).count())
            .unwrap_or(0)
    }

    /// Cancellation poll used by drivers.
    pub fn check_cancel(&self) -> Feedback {
        if self.cancel.is_cancelled() {
            Feedback::Cancel
        } else {
            Feedback::Ok
        }
    }

    /// Flush diagnostics and drop all progress regions. Runs at most once.
    pub fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::SeqCst) {
            return false;
        }
        if let Ok(mut targets) = self.targets.lock() {
            *targets = [None; PROGRESS_SLOTS];
        }
        if let Ok(mut diag) = self.diag.try_lock() {
            diag.flush().ok();
        }
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn write_diag(&self, text: &str) {
        if let Ok(mut diag) = self.diag.lock() {
            let _ = diag.write_all(text.as_bytes());
            diag.flush().ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::SharedBuffer;

    fn context() -> (Context, SharedBuffer) {
        let buffer = SharedBuffer::new();
        let ctx = Context::with_writer(CancelToken::new(), Box::new(buffer.clone()));
        (ctx, buffer)
    }

    #[test]
    fn test_first_interrupt_cancels_second_aborts() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert_eq!(token.interrupt(), Escalation::Cancel);
        assert!(token.is_cancelled());
        assert_eq!(token.interrupt(), Escalation::Abort);
        assert_eq!(token.interrupt(), Escalation::Abort);
    }

    #[test]
    fn test_token_clones_share_state() {
        let token = CancelToken::new();
        let ctx = Context::with_writer(token.clone(), Box::new(SharedBuffer::new()));
        assert_eq!(ctx.check_cancel(), Feedback::Ok);
        token.interrupt();
        assert_eq!(ctx.check_cancel(), Feedback::Cancel);
    }

    #[test]
    fn test_progress_slots_are_reused() {
        let (ctx, _) = context();
        let a = ctx.progress_start(10.0, "a").unwrap();
        let b = ctx.progress_start(10.0, "b").unwrap();
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);

        ctx.progress_stop(a);
        let c = ctx.progress_start(5.0, "c").unwrap();
        assert_eq!(c.index(), 0);
        assert_eq!(ctx.active_progress(), 2);
    }

    #[test]
    fn test_empty_region_keeps_its_slot() {
        let (ctx, buffer) = context();
        let empty = ctx.progress_start(0.0, "empty").unwrap();
        let next = ctx.progress_start(4.0, "next").unwrap();
        assert_ne!(empty, next);
        assert_eq!(ctx.active_progress(), 2);

        ctx.progress_update(empty, 0.0);
        assert!(!buffer.contents().contains("Percent completed"));
        ctx.progress_stop(empty);
        assert_eq!(ctx.active_progress(), 1);
    }

    #[test]
    fn test_progress_pool_exhaustion() {
        let (ctx, _) = context();
        for _ in 0..PROGRESS_SLOTS {
            assert!(ctx.progress_start(1.0, "busy").is_some());
        }
        assert!(ctx.progress_start(1.0, "overflow").is_none());
    }

    #[test]
    fn test_progress_update_prints_percentage() {
        let (ctx, buffer) = context();
        let id = ctx.progress_start(200.0, "Downloading").unwrap();
        ctx.progress_update(id, 50.0);
        let text = buffer.contents();
        assert!(text.contains("Downloading\n"));
        assert!(text.contains("Percent completed: 25.0\r"));
    }

    #[test]
    fn test_error_block_format() {
        let (ctx, buffer) = context();
        ctx.error("Could not capture.");
        assert!(buffer.contents().contains("*** Error ***"));
        assert!(buffer.contents().contains("Could not capture."));
    }

    #[test]
    fn test_close_runs_once() {
        let (ctx, _) = context();
        ctx.progress_start(3.0, "x");
        assert!(ctx.close());
        assert!(!ctx.close());
        assert!(ctx.is_closed());
        assert_eq!(ctx.active_progress(), 0);
    }
}
