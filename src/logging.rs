// ============================================================================
// File: src/logging.rs
// Tracing subscriber setup that shares stderr with the progress spinner
// ============================================================================

use anyhow::Result;
use indicatif::MultiProgress;
use std::io::{self, Write};
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::FmtSubscriber;

/// Install the global subscriber: INFO by default, DEBUG with `--debug`.
///
/// Log lines are written while `progress` is suspended so they never land in
/// the middle of a spinner frame.
pub fn initialize_logging(debug: bool, progress: MultiProgress) -> Result<()> {
    let level = if debug { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(ProgressAwareStderr { progress })
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// `MakeWriter` handing out stderr writers tied to the spinner display
#[derive(Clone)]
pub struct ProgressAwareStderr {
    progress: MultiProgress,
}

impl<'a> MakeWriter<'a> for ProgressAwareStderr {
    type Writer = SuspendingWriter<io::Stderr>;

    fn make_writer(&'a self) -> Self::Writer {
        SuspendingWriter::new(self.progress.clone(), io::stderr())
    }
}

/// Writes to `inner` with every progress bar hidden for the duration
pub struct SuspendingWriter<W> {
    progress: MultiProgress,
    inner: W,
}

impl<W: Write> SuspendingWriter<W> {
    pub fn new(progress: MultiProgress, inner: W) -> Self {
        Self { progress, inner }
    }
}

impl<W: Write> Write for SuspendingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let inner = &mut self.inner;
        self.progress.suspend(|| inner.write(buf))
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        let inner = &mut self.inner;
        self.progress.suspend(|| inner.write_all(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        let inner = &mut self.inner;
        self.progress.suspend(|| inner.flush())
    }
}
