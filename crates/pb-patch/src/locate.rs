use std::sync::OnceLock;

use pb_core::{BridgeError, FunctionQuery, FunctionSpan};
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Header,
    Terminator,
    Other,
}

/// Finds the span of the function selected by `query`, header line through
/// its matching `end` line inclusive.
pub fn locate(source: &str, query: &FunctionQuery) -> Result<FunctionSpan, BridgeError> {
    let lines = source.split_inclusive('\n').collect::<Vec<_>>();

    let start_line = match query {
        FunctionQuery::Line(line) => find_header_at_or_before(&lines, *line),
        FunctionQuery::Name(name) => find_named_header(&lines, name),
    }
    .ok_or_else(|| BridgeError::not_found(query))?;

    let end_line = find_matching_end(&lines, start_line).ok_or_else(|| {
        BridgeError::not_found(format!("{} (no matching `end`)", query))
    })?;

    let start = lines[..start_line].iter().map(|line| line.len()).sum::<usize>();
    let end = start
        + lines[start_line..=end_line]
            .iter()
            .map(|line| line.len())
            .sum::<usize>();

    Ok(FunctionSpan {
        start,
        end,
        text: source[start..end].to_string(),
    })
}

fn find_header_at_or_before(lines: &[&str], line_number: usize) -> Option<usize> {
    if line_number == 0 || line_number > lines.len() {
        return None;
    }
    (0..line_number)
        .rev()
        .find(|&index| classify(lines[index]) == LineKind::Header)
}

fn find_named_header(lines: &[&str], name: &str) -> Option<usize> {
    if name.is_empty() {
        return None;
    }
    let pattern = Regex::new(&format!(r"\bfunction\s+{}\b", regex::escape(name))).ok()?;
    lines.iter().position(|line| pattern.is_match(line))
}

// The start line opens depth 1 even when its header is not at line start.
fn find_matching_end(lines: &[&str], start_line: usize) -> Option<usize> {
    let mut depth = 1usize;
    for (index, line) in lines.iter().enumerate().skip(start_line + 1) {
        match classify(line) {
            LineKind::Header => depth += 1,
            LineKind::Terminator => {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            LineKind::Other => {}
        }
    }
    None
}

fn classify(line: &str) -> LineKind {
    if header_regex().is_match(line) {
        LineKind::Header
    } else if terminator_regex().is_match(line) {
        LineKind::Terminator
    } else {
        LineKind::Other
    }
}

fn header_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^\s*(?:local\s+)?function\b").expect("header regex"))
}

fn terminator_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^\s*end\b").expect("terminator regex"))
}
