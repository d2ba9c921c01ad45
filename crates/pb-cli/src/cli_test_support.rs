use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use pb_channel::{wait_for_file, Channel};
use pb_core::Payload;
use pb_patch::SourceTree;

use crate::Session;

pub(crate) const TEST_POLL: Duration = Duration::from_millis(5);

pub(crate) fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("parent should be created");
    }
    fs::write(path, content).expect("file should be written");
}

pub(crate) fn test_session(root: &Path, sources: SourceTree) -> Session {
    Session::new(Channel::new(root).with_poll_interval(TEST_POLL), sources)
}

/// Plays the engine: answers `in<n>.txt` with `out<n>.txt` for consecutive
/// indexes starting at `first`, and returns the decoded requests it saw.
pub(crate) fn spawn_engine(root: &Path, first: u64, answers: &[&str]) -> JoinHandle<Vec<String>> {
    let root = root.to_path_buf();
    let answers = answers.iter().map(|answer| answer.to_string()).collect::<Vec<_>>();
    thread::spawn(move || {
        let never = AtomicBool::new(false);
        let mut received = Vec::new();
        for (offset, answer) in answers.iter().enumerate() {
            let sequence = first + offset as u64;
            let request = root.join(format!("in{}.txt", sequence));
            wait_for_file(&request, TEST_POLL, &never).expect("request should appear");
            let payload = pb_codec::decode(&read_complete(&request)).expect("request should decode");
            received.push(payload.to_text_lossy().into_owned());

            let document = pb_codec::encode(&Payload::from(answer.as_str())).expect("encode");
            let staging = root.join(format!("staging{}", sequence));
            fs::write(&staging, document).expect("staging write");
            fs::rename(&staging, root.join(format!("out{}.txt", sequence))).expect("rename");
        }
        received
    })
}

/// Rereads `path` until the whole document (through the postfix) has landed.
pub(crate) fn read_complete(path: &Path) -> Vec<u8> {
    loop {
        let raw = fs::read(path).expect("request should be readable");
        if raw.ends_with(pb_codec::FILE_POSTFIX.as_bytes()) {
            return raw;
        }
        thread::sleep(TEST_POLL);
    }
}
