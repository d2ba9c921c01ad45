use std::ffi::OsString;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use clap::Parser;
use pb_channel::Channel;
use pb_core::BridgeError;
use pb_patch::SourceTree;

mod cli_args;
mod command;
mod error_map;
mod line_repl;
mod one_shot;
mod session;
mod settings;
mod shutdown;

pub(crate) use cli_args::{Cli, FunctionSelector, LocateArgs, Mode, PatchArgs, SendArgs};
pub(crate) use command::{parse_command, ReplCommand, HELP_LINES};
pub(crate) use error_map::{
    emit_error, json_string, json_value, map_console_io, map_signal_setup, write_repl_error,
};
pub(crate) use line_repl::run_repl;
pub(crate) use session::Session;
pub(crate) use settings::{init_logging, Settings};
pub(crate) use shutdown::{install_signal_cleanup, CleanupGuard, Janitor};

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    init_logging();
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, BridgeError> {
    let settings = Settings::from_cli(&cli)?;
    match cli.command {
        None | Some(Mode::Repl) => run_console(&settings),
        Some(Mode::Send(args)) => one_shot::run_send(&settings, args),
        Some(Mode::Locate(args)) => one_shot::run_locate(args),
        Some(Mode::Patch(args)) => one_shot::run_patch(&settings, args),
        Some(Mode::Clean) => one_shot::run_clean(&settings),
    }
}

/// Interactive session. Stale files from an earlier run are cleared first,
/// and the transport folder is swept again on every way out.
fn run_console(settings: &Settings) -> Result<i32, BridgeError> {
    let cancel = Arc::new(AtomicBool::new(false));
    let janitor = Janitor::new(&settings.root_dir);
    janitor.sweep();
    install_signal_cleanup(janitor.clone(), Arc::clone(&cancel))?;
    let _guard = CleanupGuard::new(janitor);

    let sources = match &settings.source_dir {
        Some(source_dir) => SourceTree::load(source_dir)?,
        None => SourceTree::default(),
    };
    let channel = Channel::new(&settings.root_dir)
        .with_poll_interval(settings.poll_interval)
        .with_cancel_flag(cancel);
    let mut session = Session::new(channel, sources);
    tracing::info!(
        root = %session.root().display(),
        sources = session.sources().len(),
        "session started"
    );

    run_repl(&mut session)
}

#[cfg(test)]
mod cli_test_support;

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn parse_errors_return_clap_exit_code() {
        assert_ne!(run_cli_from_args(["pb-cli", "unknown-mode"]), 0);
        assert_ne!(
            run_cli_from_args(["pb-cli", "locate", "--file", "a.lua"]),
            0
        );
        assert_ne!(
            run_cli_from_args([
                "pb-cli", "send", "--text", "x", "--file", "a.lua"
            ]),
            0
        );
    }

    #[test]
    fn modes_parse_with_global_options() {
        let cli = Cli::try_parse_from([
            "pb-cli",
            "patch",
            "--root-dir",
            "/tmp/t",
            "--function",
            "OnTick",
            "--text",
            "x()",
        ])
        .expect("patch args");
        assert!(matches!(
            cli.command,
            Some(Mode::Patch(PatchArgs { after_line: 1, .. }))
        ));
        assert_eq!(cli.root_dir.as_deref(), Some(std::path::Path::new("/tmp/t")));

        let cli = Cli::try_parse_from(["pb-cli"]).expect("default mode");
        assert!(cli.command.is_none());
    }

    #[test]
    fn run_clean_mode_succeeds_on_empty_root() {
        let root = tempfile::tempdir().expect("tempdir");
        let code = run_cli_from_args([
            "pb-cli".to_string(),
            "--root-dir".to_string(),
            root.path().display().to_string(),
            "clean".to_string(),
        ]);
        assert_eq!(code, 0);
    }
}
