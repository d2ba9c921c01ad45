use std::path::{Path, PathBuf};
use std::time::Duration;

use pb_core::BridgeError;

use crate::Cli;

/// Environment variable holding the `tracing` filter directive.
pub(crate) const LOG_ENV: &str = "PB_LOG";
const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(crate) root_dir: PathBuf,
    pub(crate) source_dir: Option<PathBuf>,
    pub(crate) poll_interval: Duration,
}

impl Settings {
    pub(crate) fn from_cli(cli: &Cli) -> Result<Self, BridgeError> {
        let root_dir = match &cli.root_dir {
            Some(root_dir) => root_dir.clone(),
            None => default_root_dir().ok_or_else(|| {
                BridgeError::invalid_command(
                    "cannot resolve the documents folder; pass --root-dir",
                )
            })?,
        };
        Ok(Self {
            root_dir,
            source_dir: cli.source_dir.clone(),
            poll_interval: Duration::from_millis(cli.poll_ms.max(1)),
        })
    }
}

/// `<documents>/Warcraft III/CustomMapData/Interpreter`, the folder the
/// map-side loader reads from.
pub(crate) fn default_root_dir() -> Option<PathBuf> {
    dirs::document_dir().map(|documents| interpreter_dir(&documents))
}

fn interpreter_dir(documents: &Path) -> PathBuf {
    documents
        .join("Warcraft III")
        .join("CustomMapData")
        .join("Interpreter")
}

pub(crate) fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
