use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use pb_channel::{remove_transport_files, CleanupReport};
use pb_core::BridgeError;

/// Owns the end-of-process sweep of the transport folder. Clones share the
/// "already finished" flag, so whichever exit path runs first does the work.
#[derive(Debug, Clone)]
pub(crate) struct Janitor {
    root: PathBuf,
    finished: Arc<AtomicBool>,
}

impl Janitor {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            finished: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Removes transport files now. Usable any number of times.
    pub(crate) fn sweep(&self) -> CleanupReport {
        remove_transport_files(&self.root)
    }

    /// Final sweep; returns false if another exit path already ran it.
    pub(crate) fn finish(&self) -> bool {
        if self.finished.swap(true, Ordering::SeqCst) {
            return false;
        }
        let report = self.sweep();
        tracing::info!(
            removed = report.removed.len(),
            failed = report.failed.len(),
            "transport folder cleaned on exit"
        );
        true
    }
}

/// Runs the final sweep when dropped, covering normal returns, early `?`
/// returns and unwinding panics.
pub(crate) struct CleanupGuard {
    janitor: Janitor,
}

impl CleanupGuard {
    pub(crate) fn new(janitor: Janitor) -> Self {
        Self { janitor }
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        self.janitor.finish();
    }
}

/// Spawns a thread that, on the first termination signal, cancels any
/// pending response wait, sweeps the transport folder and exits.
#[cfg(unix)]
pub(crate) fn install_signal_cleanup(
    janitor: Janitor,
    cancel: Arc<AtomicBool>,
) -> Result<(), BridgeError> {
    use signal_hook::consts::{SIGABRT, SIGHUP, SIGINT, SIGQUIT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGABRT, SIGHUP, SIGQUIT])
        .map_err(crate::map_signal_setup)?;
    std::thread::Builder::new()
        .name("pb-signals".to_string())
        .spawn(move || {
            if let Some(signal) = signals.forever().next() {
                tracing::info!(signal, "termination signal received");
                cancel.store(true, Ordering::SeqCst);
                janitor.finish();
                std::process::exit(0);
            }
        })
        .map_err(crate::map_signal_setup)?;
    Ok(())
}

/// How often the watcher thread checks the flag raised by the handlers.
#[cfg(not(unix))]
const SIGNAL_POLL: std::time::Duration = std::time::Duration::from_millis(50);

/// Without a signal iterator the handlers only raise `cancel`; a watcher
/// thread then sweeps the transport folder and exits, as on unix.
#[cfg(not(unix))]
pub(crate) fn install_signal_cleanup(
    janitor: Janitor,
    cancel: Arc<AtomicBool>,
) -> Result<(), BridgeError> {
    use signal_hook::consts::{SIGINT, SIGTERM};

    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register(signal, Arc::clone(&cancel))
            .map_err(crate::map_signal_setup)?;
    }
    std::thread::Builder::new()
        .name("pb-signals".to_string())
        .spawn(move || {
            while !cancel.load(Ordering::SeqCst) {
                std::thread::sleep(SIGNAL_POLL);
            }
            tracing::info!("termination signal received");
            janitor.finish();
            std::process::exit(0);
        })
        .map_err(crate::map_signal_setup)?;
    Ok(())
}

#[cfg(test)]
mod shutdown_tests {
    use super::*;
    use std::fs;

    #[test]
    fn finish_runs_once_and_sweep_is_repeatable() {
        let root = tempfile::tempdir().expect("tempdir");
        fs::write(root.path().join("in0.txt"), "x").expect("write");
        let janitor = Janitor::new(root.path());
        let clone = janitor.clone();

        assert!(janitor.finish());
        assert!(!clone.finish());
        assert!(!root.path().join("in0.txt").exists());

        fs::write(root.path().join("out1.txt"), "x").expect("write");
        assert_eq!(clone.sweep().removed.len(), 1);
        assert!(clone.sweep().is_clean());
    }

    #[test]
    fn guard_sweeps_on_drop_and_on_panic() {
        let root = tempfile::tempdir().expect("tempdir");
        fs::write(root.path().join("in4.txt"), "x").expect("write");
        {
            let _guard = CleanupGuard::new(Janitor::new(root.path()));
        }
        assert!(!root.path().join("in4.txt").exists());

        fs::write(root.path().join("out4.txt"), "x").expect("write");
        let path = root.path().to_path_buf();
        let result = std::panic::catch_unwind(move || {
            let _guard = CleanupGuard::new(Janitor::new(path));
            panic!("session crashed");
        });
        assert!(result.is_err());
        assert!(!root.path().join("out4.txt").exists());
    }

    #[test]
    fn guard_on_missing_folder_is_quiet() {
        let root = tempfile::tempdir().expect("tempdir");
        let janitor = Janitor::new(root.path().join("never-created"));
        assert!(janitor.sweep().is_clean());
        drop(CleanupGuard::new(janitor));
    }
}
