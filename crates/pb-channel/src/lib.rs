//! File mailbox shared with the engine.
//!
//! Round trip `n` writes `in<n>.txt` and waits for the engine to answer with
//! `out<n>.txt`. There is no other signalling path, so the wait is a poll
//! loop that only ends when the answer shows up or the cancel flag is raised.

mod cleanup;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use pb_core::{BridgeError, Payload, SequenceIndex};

pub use cleanup::{is_transport_file_name, remove_transport_files, CleanupReport};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const REQUEST_PREFIX: &str = "in";
pub const RESPONSE_PREFIX: &str = "out";
pub const TRANSPORT_EXTENSION: &str = "txt";

#[derive(Debug)]
pub struct Channel {
    root: PathBuf,
    sequence: SequenceIndex,
    poll_interval: Duration,
    cancel: Arc<AtomicBool>,
}

impl Channel {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            sequence: SequenceIndex::ZERO,
            poll_interval: DEFAULT_POLL_INTERVAL,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sequence(&self) -> SequenceIndex {
        self.sequence
    }

    /// Moves the counter without touching any file.
    pub fn jump(&mut self, sequence: SequenceIndex) {
        tracing::info!(from = %self.sequence, to = %sequence, "sequence jump");
        self.sequence = sequence;
    }

    /// Removes every transport file and restarts numbering at 0.
    pub fn reset(&mut self) -> CleanupReport {
        let report = remove_transport_files(&self.root);
        self.sequence = SequenceIndex::ZERO;
        tracing::info!(removed = report.removed.len(), "channel reset");
        report
    }

    pub fn request_path(&self, sequence: SequenceIndex) -> PathBuf {
        self.transport_path(REQUEST_PREFIX, sequence)
    }

    pub fn response_path(&self, sequence: SequenceIndex) -> PathBuf {
        self.transport_path(RESPONSE_PREFIX, sequence)
    }

    /// One blocking round trip. The counter advances as soon as the response
    /// has been read: by then the engine has consumed `in<n>.txt` and waits
    /// for `in<n+1>.txt`, even when the answer turns out to be corrupt.
    pub fn send(&mut self, payload: &Payload) -> Result<Payload, BridgeError> {
        let sequence = self.sequence;
        let document = pb_codec::encode(payload)?;
        let request = self.request_path(sequence);
        if self.is_cancelled() {
            return Err(BridgeError::Cancelled { path: request });
        }

        fs::create_dir_all(&self.root).map_err(|source| BridgeError::io(&self.root, source))?;
        fs::write(&request, document).map_err(|source| BridgeError::io(&request, source))?;
        tracing::debug!(path = %request.display(), bytes = payload.len(), "request written");

        let response = self.response_path(sequence);
        wait_for_file(&response, self.poll_interval, &self.cancel)?;

        let raw = fs::read(&response).map_err(|source| BridgeError::io(&response, source))?;
        self.sequence = sequence.next();

        let answer = pb_codec::decode(&raw).map_err(|error| match error {
            BridgeError::CorruptResponse { reason } => BridgeError::corrupt_response(format!(
                "{}: {}",
                response.display(),
                reason
            )),
            other => other,
        })?;
        tracing::info!(sequence = %sequence, bytes = answer.len(), "round trip complete");
        Ok(answer)
    }

    fn transport_path(&self, prefix: &str, sequence: SequenceIndex) -> PathBuf {
        self.root
            .join(format!("{}{}.{}", prefix, sequence, TRANSPORT_EXTENSION))
    }
}

/// Sleeps in `poll_interval` steps until `path` exists. Unbounded; only the
/// cancel flag ends it early.
pub fn wait_for_file(
    path: &Path,
    poll_interval: Duration,
    cancel: &AtomicBool,
) -> Result<(), BridgeError> {
    tracing::debug!(path = %path.display(), "waiting for response");
    loop {
        if path.exists() {
            return Ok(());
        }
        if cancel.load(Ordering::SeqCst) {
            return Err(BridgeError::Cancelled {
                path: path.to_path_buf(),
            });
        }
        thread::sleep(poll_interval);
    }
}
