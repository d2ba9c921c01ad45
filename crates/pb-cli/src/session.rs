use std::fs;
use std::path::Path;

use pb_channel::{Channel, CleanupReport};
use pb_core::{BridgeError, FunctionQuery, Payload, SequenceIndex};
use pb_patch::{PatchResult, SourceTree};

/// State of one console session: the channel (and with it the sequence
/// index) plus the Lua sources loaded for patching.
#[derive(Debug)]
pub(crate) struct Session {
    channel: Channel,
    sources: SourceTree,
}

impl Session {
    pub(crate) fn new(channel: Channel, sources: SourceTree) -> Self {
        Self { channel, sources }
    }

    pub(crate) fn sequence(&self) -> SequenceIndex {
        self.channel.sequence()
    }

    /// True once a termination signal has been seen.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.channel.is_cancelled()
    }

    pub(crate) fn root(&self) -> &Path {
        self.channel.root()
    }

    pub(crate) fn sources(&self) -> &SourceTree {
        &self.sources
    }

    pub(crate) fn reset(&mut self) -> CleanupReport {
        self.channel.reset()
    }

    pub(crate) fn jump(&mut self, sequence: SequenceIndex) {
        self.channel.jump(sequence);
    }

    /// Returns `None` when the engine answered with the `nil` sentinel.
    pub(crate) fn send_text(&mut self, text: &str) -> Result<Option<Payload>, BridgeError> {
        let answer = self.channel.send(&Payload::from_text(text))?;
        Ok((!answer.is_nil()).then_some(answer))
    }

    pub(crate) fn send_file(&mut self, path: &Path) -> Result<Option<Payload>, BridgeError> {
        if !path.is_file() {
            return Err(BridgeError::MissingFile {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path).map_err(|source| BridgeError::io(path, source))?;
        self.send_text(&content)
    }

    /// Patches a function and writes the file back to its path.
    pub(crate) fn patch(
        &mut self,
        file: Option<&Path>,
        query: &FunctionQuery,
        text: &str,
        after_line: usize,
    ) -> Result<PatchResult, BridgeError> {
        let result = self.sources.patch(file, query, text, after_line)?;
        fs::write(&result.file.path, &result.file.content)
            .map_err(|source| BridgeError::io(&result.file.path, source))?;
        tracing::info!(
            path = %result.file.path.display(),
            query = %query,
            "function patched"
        );
        self.sources.insert(result.file.clone());
        Ok(result)
    }
}
