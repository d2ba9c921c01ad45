//! Preload-file codec.
//!
//! The engine can only read text back through its preload cache: a preload
//! file is a script whose `Preload( "...")` string arguments are executed as
//! Lua once the loader reaches the user-code section. Each payload chunk is
//! placed inside a Lua long string (`[[...]]`) that is appended to an
//! accumulator, and the suffix flushes the accumulator through a single
//! side-channel call that the engine-side loader reads back.

use std::sync::OnceLock;

use pb_core::{BridgeError, Payload};
use regex::bytes::Regex;

/// Maximum number of characters carried by one `Preload` line.
pub const CHUNK_CHARS: usize = 255;

pub const FILE_PREFIX: &str = "function PreloadFiles takes nothing returns nothing\n\n\tcall PreloadStart()\n\tcall Preload( \"\")\nendfunction\n//!beginusercode\nlocal p={} local i=function(s) table.insert(p,s) end--[[\" )\n\t";

pub const FILE_POSTFIX: &str = "\n\tcall Preload( \"]]BlzSetAbilityTooltip(1095656547, table.concat(p), 0)\n//!endusercode\nfunction a takes nothing returns nothing\n//\" )\n\tcall PreloadEnd( 0.1 )\n\nendfunction\n\n";

pub const LINE_PREFIX: &str = "\n\tcall Preload( \"]]i([[";
pub const LINE_POSTFIX: &str = "]])--[[\" )";

const LONG_BRACKET_CLOSE: &str = "]]";

/// Renders `payload` as a preload file the engine-side loader accepts.
pub fn encode(payload: &Payload) -> Result<String, BridgeError> {
    let text = validate(payload)?;
    let chunks = split_chunks(text)?;

    let mut document = String::with_capacity(
        FILE_PREFIX.len()
            + FILE_POSTFIX.len()
            + text.len()
            + chunks.len() * (LINE_PREFIX.len() + LINE_POSTFIX.len()),
    );
    document.push_str(FILE_PREFIX);
    for chunk in chunks {
        document.push_str(LINE_PREFIX);
        document.push_str(chunk);
        document.push_str(LINE_POSTFIX);
    }
    document.push_str(FILE_POSTFIX);
    Ok(document)
}

/// Extracts the payload from a preload file written by the engine.
///
/// A file without any chunk lines decodes to an empty payload. A chunk opener
/// without its closing delimiter means the file was cut short.
pub fn decode(raw: &[u8]) -> Result<Payload, BridgeError> {
    let mut bytes = Vec::new();
    let mut matched = 0usize;
    for captures in chunk_regex().captures_iter(raw) {
        if let Some(chunk) = captures.get(1) {
            bytes.extend_from_slice(chunk.as_bytes());
        }
        matched += 1;
    }

    let opened = chunk_opener_regex().find_iter(raw).count();
    if opened > matched {
        return Err(BridgeError::corrupt_response(format!(
            "{} chunk line(s) opened but only {} closed",
            opened, matched
        )));
    }

    Ok(Payload::new(bytes))
}

/// Number of chunk lines `encode` emits for a payload of `chars` characters,
/// assuming no chunk boundary has to move.
pub fn chunk_count(chars: usize) -> usize {
    chars.div_ceil(CHUNK_CHARS)
}

fn validate(payload: &Payload) -> Result<&str, BridgeError> {
    if payload.is_empty() {
        return Err(BridgeError::invalid_payload("payload is empty"));
    }
    let text = payload
        .as_text()
        .ok_or_else(|| BridgeError::invalid_payload("payload is not valid UTF-8"))?;
    if text.contains(LONG_BRACKET_CLOSE) {
        return Err(BridgeError::invalid_payload(
            "payload contains `]]`, which closes the chunk string early",
        ));
    }
    if text.ends_with(']') {
        return Err(BridgeError::invalid_payload(
            "payload ends with `]`, which fuses with the chunk delimiter; append a space",
        ));
    }
    if text.starts_with(['\n', '\r']) {
        return Err(BridgeError::invalid_payload(
            "payload starts with a line break, which the engine drops",
        ));
    }
    Ok(text)
}

/// Splits on character boundaries, at most `CHUNK_CHARS` per chunk.
///
/// A boundary moves back when the chunk would end with `]` or the next chunk
/// would start with a line break. A window with no such position (a run of
/// `CHUNK_CHARS` line breaks, or a `]` right before one) cannot be encoded.
fn split_chunks(text: &str) -> Result<Vec<&str>, BridgeError> {
    let offsets = text
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(text.len()))
        .collect::<Vec<_>>();
    let char_count = offsets.len() - 1;

    let mut chunks = Vec::new();
    let mut start = 0usize;
    while start < char_count {
        let limit = (start + CHUNK_CHARS).min(char_count);
        let end = (start + 1..=limit)
            .rev()
            .find(|&end| end == char_count || is_chunk_boundary(text, offsets[end]))
            .ok_or_else(|| {
                BridgeError::invalid_payload(format!(
                    "no safe chunk boundary within {} characters of character {}; \
                     break up long runs of line breaks",
                    CHUNK_CHARS, start
                ))
            })?;
        chunks.push(&text[offsets[start]..offsets[end]]);
        start = end;
    }
    Ok(chunks)
}

fn is_chunk_boundary(text: &str, offset: usize) -> bool {
    !text[..offset].ends_with(']') && !text[offset..].starts_with(['\n', '\r'])
}

fn chunk_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r#"(?s-u)call Preload\( "\]\]i\(\[\[(.*?)\]\]\)--\[\[" \)"#)
            .expect("chunk regex")
    })
}

fn chunk_opener_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r#"call Preload\( "\]\]i\(\[\["#).expect("chunk opener regex"))
}
