use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "pb-cli")]
#[command(version)]
#[command(about = "Bridge console for a preload-file script engine")]
pub(crate) struct Cli {
    /// Transport directory shared with the engine.
    #[arg(long = "root-dir", global = true)]
    pub(crate) root_dir: Option<PathBuf>,
    /// Directory of .lua sources available to `patch`.
    #[arg(long = "source-dir", global = true)]
    pub(crate) source_dir: Option<PathBuf>,
    #[arg(long = "poll-ms", global = true, default_value_t = 100)]
    pub(crate) poll_ms: u64,
    #[command(subcommand)]
    pub(crate) command: Option<Mode>,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    /// Interactive console (default).
    Repl,
    /// One round trip at a given sequence index.
    Send(SendArgs),
    /// Print the span of a function.
    Locate(LocateArgs),
    /// Inject a line into a function and write the file back.
    Patch(PatchArgs),
    /// Delete all request/response files.
    Clean,
}

#[derive(Debug, Args)]
pub(crate) struct SendArgs {
    #[arg(long = "seq", default_value_t = 0)]
    pub(crate) seq: u64,
    #[arg(long = "text", conflicts_with = "file", required_unless_present = "file")]
    pub(crate) text: Option<String>,
    #[arg(long = "file")]
    pub(crate) file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub(crate) struct FunctionSelector {
    #[arg(long = "function", conflicts_with = "line", required_unless_present = "line")]
    pub(crate) function: Option<String>,
    #[arg(long = "line")]
    pub(crate) line: Option<usize>,
}

#[derive(Debug, Args)]
pub(crate) struct LocateArgs {
    #[arg(long = "file")]
    pub(crate) file: PathBuf,
    #[command(flatten)]
    pub(crate) selector: FunctionSelector,
}

#[derive(Debug, Args)]
pub(crate) struct PatchArgs {
    #[arg(long = "file")]
    pub(crate) file: Option<PathBuf>,
    #[command(flatten)]
    pub(crate) selector: FunctionSelector,
    #[arg(long = "text")]
    pub(crate) text: String,
    #[arg(long = "after-line", default_value_t = pb_patch::DEFAULT_AFTER_LINE)]
    pub(crate) after_line: usize,
}
