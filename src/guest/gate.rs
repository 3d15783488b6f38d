//! Output-stream suppression for the hosted process.
//!
//! The process's real stdout is the protocol channel back to the caller, so
//! any incidental write by the hosted program would corrupt the exchange. The
//! gate claims that stream at descriptor level: it duplicates the real stdout
//! handle for protocol use, then points the process's default sink at the
//! null device. Hosted-program output lands in the discard target for the
//! gate's whole lifetime; protocol lines travel through the saved duplicate
//! and never interleave with anything.

use std::io::{self, Write};

#[cfg(unix)]
use tracing::warn;

/// Capability owning the process's protocol output stream.
///
/// Implemented by [`StdioGate`] for real processes and by in-memory doubles
/// in tests.
pub trait OutputGate {
    /// Route the process's default output sink to a discard target, saving a
    /// handle to the real sink. Idempotent; best-effort.
    fn engage(&mut self);

    /// Write one protocol line (a trailing newline is appended) to the real
    /// output sink.
    ///
    /// # Errors
    ///
    /// Propagates the underlying write failure; the caller logs and carries on.
    fn write_line(&mut self, line: &str) -> io::Result<()>;

    /// Restore the real output sink permanently and drop the saved handle.
    /// Idempotent.
    fn release(&mut self);
}

// ── StdioGate (unix) ──────────────────────────────────────────────────────────

/// Descriptor-level gate over the process's stdout.
///
/// On Unix, `engage` duplicates descriptor 1 and then redirects it to
/// `/dev/null` with `dup2`; `release` points it back at the saved duplicate.
/// On other platforms the gate is inert: protocol lines go straight to
/// stdout and hosted-program writes are not suppressed (the caller's
/// correlation-key filter still drops them).
#[derive(Debug, Default)]
pub struct StdioGate {
    #[cfg(unix)]
    real: Option<std::fs::File>,
    #[cfg(unix)]
    discard: Option<std::fs::File>,
}

impl StdioGate {
    /// Create a gate in the released (pass-through) state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(unix)]
impl OutputGate for StdioGate {
    fn engage(&mut self) {
        use std::os::fd::{AsFd, AsRawFd};

        if self.real.is_some() {
            return;
        }

        // Flush whatever buffered output the hosted program produced before
        // the stream changes hands.
        let _ = io::stdout().flush();

        let saved = match io::stdout().as_fd().try_clone_to_owned() {
            Ok(fd) => std::fs::File::from(fd),
            Err(e) => {
                warn!(error = %e, "output gate: failed to save the real stdout handle");
                return;
            }
        };
        let discard = match std::fs::OpenOptions::new().write(true).open("/dev/null") {
            Ok(f) => f,
            Err(e) => {
                warn!(error = %e, "output gate: failed to open the discard target");
                return;
            }
        };

        if let Err(e) = nix::unistd::dup2(discard.as_raw_fd(), io::stdout().as_raw_fd()) {
            warn!(error = %e, "output gate: failed to redirect stdout");
            return;
        }

        self.real = Some(saved);
        self.discard = Some(discard);
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        if let Some(real) = self.real.as_mut() {
            real.write_all(line.as_bytes())?;
            real.write_all(b"\n")?;
            real.flush()
        } else {
            // Gate never engaged; fall back to the live stream.
            let mut out = io::stdout().lock();
            out.write_all(line.as_bytes())?;
            out.write_all(b"\n")?;
            out.flush()
        }
    }

    fn release(&mut self) {
        use std::os::fd::AsRawFd;

        if let Some(real) = self.real.take() {
            if let Err(e) = nix::unistd::dup2(real.as_raw_fd(), io::stdout().as_raw_fd()) {
                warn!(error = %e, "output gate: failed to restore stdout");
            }
        }
        self.discard = None;
    }
}

#[cfg(not(unix))]
impl OutputGate for StdioGate {
    fn engage(&mut self) {}

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(line.as_bytes())?;
        out.write_all(b"\n")?;
        out.flush()
    }

    fn release(&mut self) {}
}
