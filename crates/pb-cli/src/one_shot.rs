use std::fs;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use pb_channel::{remove_transport_files, Channel};
use pb_core::{BridgeError, FunctionQuery, SequenceIndex};
use pb_patch::{locate, SourceTree};

use crate::{
    install_signal_cleanup, json_string, json_value, CleanupGuard, FunctionSelector, Janitor,
    LocateArgs, PatchArgs, SendArgs, Session, Settings,
};

pub(crate) fn run_send(settings: &Settings, args: SendArgs) -> Result<i32, BridgeError> {
    let cancel = Arc::new(AtomicBool::new(false));
    let janitor = Janitor::new(&settings.root_dir);
    install_signal_cleanup(janitor.clone(), Arc::clone(&cancel))?;
    let _guard = CleanupGuard::new(janitor);

    let channel = Channel::new(&settings.root_dir)
        .with_poll_interval(settings.poll_interval)
        .with_cancel_flag(cancel);
    let mut session = Session::new(channel, SourceTree::default());
    let sequence = SequenceIndex::new(args.seq);
    session.jump(sequence);

    let answer = match (&args.text, &args.file) {
        (Some(text), _) => session.send_text(text)?,
        (None, Some(file)) => session.send_file(file)?,
        (None, None) => return Err(BridgeError::invalid_command("send needs --text or --file")),
    };

    println!("RESULT:OK");
    println!("SEQ:{}", sequence);
    println!("NEXT_SEQ:{}", session.sequence());
    match answer {
        Some(answer) => println!("VALUE_JSON:{}", json_string(&answer.to_text_lossy())),
        None => println!("VALUE:NIL"),
    }
    Ok(0)
}

pub(crate) fn run_locate(args: LocateArgs) -> Result<i32, BridgeError> {
    if !args.file.is_file() {
        return Err(BridgeError::MissingFile { path: args.file });
    }
    let content =
        fs::read_to_string(&args.file).map_err(|source| BridgeError::io(&args.file, source))?;
    let span = locate(&content, &selector_query(&args.selector))?;

    println!("RESULT:OK");
    println!("FILE:{}", args.file.display());
    println!("START:{}", span.start);
    println!("END:{}", span.end);
    println!("SPAN_JSON:{}", json_value(&span));
    Ok(0)
}

pub(crate) fn run_patch(settings: &Settings, args: PatchArgs) -> Result<i32, BridgeError> {
    let sources = match &settings.source_dir {
        Some(source_dir) => SourceTree::load(source_dir)?,
        None => SourceTree::default(),
    };
    let channel = Channel::new(&settings.root_dir);
    let mut session = Session::new(channel, sources);
    let result = session.patch(
        args.file.as_deref(),
        &selector_query(&args.selector),
        &args.text,
        args.after_line,
    )?;

    println!("RESULT:OK");
    println!("FILE:{}", result.file.path.display());
    println!("START:{}", result.span.start);
    println!("END:{}", result.span.end);
    Ok(0)
}

pub(crate) fn run_clean(settings: &Settings) -> Result<i32, BridgeError> {
    let report = remove_transport_files(&settings.root_dir);
    println!("RESULT:OK");
    println!("REMOVED:{}", report.removed.len());
    for (path, error) in &report.failed {
        println!(
            "FAILED_JSON:{}",
            json_string(&format!("{}: {}", path.display(), error))
        );
    }
    Ok(0)
}

pub(crate) fn selector_query(selector: &FunctionSelector) -> FunctionQuery {
    match (&selector.function, selector.line) {
        (Some(name), _) => FunctionQuery::Name(name.clone()),
        (None, line) => FunctionQuery::Line(line.unwrap_or_default()),
    }
}
