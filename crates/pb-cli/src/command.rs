use std::path::PathBuf;

use pb_core::{BridgeError, FunctionQuery, SequenceIndex};

pub(crate) const HELP_LINES: &[&str] = &[
    "Available commands:",
    "  help - Show this help message",
    "  exit - Exit the program",
    "  restart - Clean the transport folder so a new game can be started (same as exiting and restarting)",
    "  jump <number> - Continue from a specific file index after the console was closed while the game kept running. Use the index shown before `>>>`",
    "  file <path> - Send a file with Lua code to the game. End the file with `return <data>` to print the data here",
    "  patch <function|file:line> <code> - Insert a line of code after the header of a loaded function and save the file",
    "  <lua code> - Run Lua code in the game. A `return` statement prints its value here",
    "** Exiting or restarting while the game is running stops the game side until the game is restarted too **",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ReplCommand {
    Empty,
    Help,
    Exit,
    Restart,
    Jump(SequenceIndex),
    File(PathBuf),
    Patch {
        file: Option<PathBuf>,
        query: FunctionQuery,
        text: String,
    },
    Send(String),
}

pub(crate) fn parse_command(raw: &str) -> Result<ReplCommand, BridgeError> {
    match raw {
        "" => return Ok(ReplCommand::Empty),
        "help" => return Ok(ReplCommand::Help),
        "exit" => return Ok(ReplCommand::Exit),
        "restart" => return Ok(ReplCommand::Restart),
        _ => {}
    }

    if let Some(rest) = raw.strip_prefix("jump ") {
        let value = rest.trim();
        return value
            .parse::<u64>()
            .map(|index| ReplCommand::Jump(SequenceIndex::new(index)))
            .map_err(|_| {
                BridgeError::invalid_command(format!("jump needs a non-negative integer, got `{}`", value))
            });
    }

    if let Some(rest) = raw.strip_prefix("file ") {
        let path = rest.trim();
        if path.is_empty() {
            return Err(BridgeError::invalid_command("file needs a path"));
        }
        return Ok(ReplCommand::File(PathBuf::from(path)));
    }

    if let Some(rest) = raw.strip_prefix("patch ") {
        return parse_patch(rest.trim_start());
    }

    Ok(ReplCommand::Send(raw.to_string()))
}

/// `<target> <code>` where target is `name` or `path:line`. A target whose
/// last `:` segment is not a number stays a name, so `obj:method` works.
fn parse_patch(rest: &str) -> Result<ReplCommand, BridgeError> {
    let Some((target, text)) = rest.split_once(char::is_whitespace) else {
        return Err(BridgeError::invalid_command(
            "patch needs a target and the code to insert",
        ));
    };
    let text = text.trim_start();
    if text.is_empty() {
        return Err(BridgeError::invalid_command("patch needs code to insert"));
    }

    let file_line = target
        .rsplit_once(':')
        .filter(|(path, _)| !path.is_empty())
        .and_then(|(path, line)| line.parse::<usize>().ok().map(|line| (path, line)));
    let (file, query) = match file_line {
        Some((path, line)) => (Some(PathBuf::from(path)), FunctionQuery::Line(line)),
        None => (None, FunctionQuery::Name(target.to_string())),
    };

    Ok(ReplCommand::Patch {
        file,
        query,
        text: text.to_string(),
    })
}
