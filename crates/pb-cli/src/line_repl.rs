use std::io::{self, BufRead, Write};

use pb_core::{BridgeError, Payload};
use pb_patch::DEFAULT_AFTER_LINE;

use crate::{map_console_io, parse_command, write_repl_error, ReplCommand, Session, HELP_LINES};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReplAction {
    Continue,
    Quit,
}

pub(crate) fn run_repl(session: &mut Session) -> Result<i32, BridgeError> {
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut writer = io::stdout();
    run_repl_with_io(session, &mut reader, &mut writer)
}

/// Reads commands until `exit`, end of input or cancellation. Other command
/// failures are reported and the loop keeps going.
pub(crate) fn run_repl_with_io(
    session: &mut Session,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<i32, BridgeError> {
    writeln!(
        writer,
        "pb-cli {}. For help, type `help`.",
        env!("CARGO_PKG_VERSION")
    )
    .map_err(map_console_io)?;

    loop {
        if session.is_cancelled() {
            tracing::info!("session cancelled");
            return Ok(0);
        }
        let prompt = format!("{} >>> ", session.sequence());
        let Some(raw) = prompt_input_from(&prompt, reader, writer)? else {
            writeln!(writer).map_err(map_console_io)?;
            return Ok(0);
        };

        let outcome = parse_command(&raw).and_then(|command| handle_repl_command(command, session, writer));
        match outcome {
            Ok(ReplAction::Continue) => {}
            Ok(ReplAction::Quit) => return Ok(0),
            Err(error @ BridgeError::Cancelled { .. }) => {
                write_repl_error(writer, &error).map_err(map_console_io)?;
                return Ok(0);
            }
            Err(error) => {
                tracing::debug!(code = error.code(), "command failed");
                write_repl_error(writer, &error).map_err(map_console_io)?;
            }
        }
    }
}

pub(crate) fn handle_repl_command(
    command: ReplCommand,
    session: &mut Session,
    writer: &mut dyn Write,
) -> Result<ReplAction, BridgeError> {
    match command {
        ReplCommand::Empty => {}
        ReplCommand::Help => {
            for line in HELP_LINES {
                writeln!(writer, "{}", line).map_err(map_console_io)?;
            }
        }
        ReplCommand::Exit => return Ok(ReplAction::Quit),
        ReplCommand::Restart => {
            session.reset();
            writeln!(writer, "State reset. You can start a new game now.").map_err(map_console_io)?;
        }
        ReplCommand::Jump(sequence) => session.jump(sequence),
        ReplCommand::File(path) => {
            if !path.is_file() {
                return Err(BridgeError::MissingFile { path });
            }
            writeln!(
                writer,
                "Sent file {} to game as in{}.txt",
                path.display(),
                session.sequence()
            )
            .map_err(map_console_io)?;
            writer.flush().map_err(map_console_io)?;
            let answer = session.send_file(&path)?;
            echo_answer(writer, answer)?;
        }
        ReplCommand::Patch { file, query, text } => {
            let result = session.patch(file.as_deref(), &query, &text, DEFAULT_AFTER_LINE)?;
            writeln!(writer, "Patched {} in {}", query, result.file.path.display())
                .map_err(map_console_io)?;
        }
        ReplCommand::Send(text) => {
            let answer = session.send_text(&text)?;
            echo_answer(writer, answer)?;
        }
    }
    Ok(ReplAction::Continue)
}

fn echo_answer(writer: &mut dyn Write, answer: Option<Payload>) -> Result<(), BridgeError> {
    if let Some(answer) = answer {
        writeln!(writer, "{}", answer).map_err(map_console_io)?;
    }
    Ok(())
}

/// `None` at end of input.
pub(crate) fn prompt_input_from(
    prefix: &str,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<Option<String>, BridgeError> {
    write!(writer, "{}", prefix).map_err(map_console_io)?;
    writer.flush().map_err(map_console_io)?;
    let mut input = String::new();
    let read = reader.read_line(&mut input).map_err(map_console_io)?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim_end_matches(&['\r', '\n'][..]).to_string()))
}
