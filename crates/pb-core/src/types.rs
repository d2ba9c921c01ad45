use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Literal text the engine sends back when a chunk evaluated to nothing.
pub const NIL_SENTINEL: &str = "nil";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload(Vec<u8>);

impl Payload {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn from_text(text: &str) -> Self {
        Self(text.as_bytes().to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    pub fn to_text_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }

    pub fn is_nil(&self) -> bool {
        self.0 == NIL_SENTINEL.as_bytes()
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self(text.into_bytes())
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text_lossy())
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SequenceIndex(u64);

impl SequenceIndex {
    pub const ZERO: Self = Self(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SequenceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSpan {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl FunctionSpan {
    pub fn line_count(&self) -> usize {
        self.text.split_inclusive('\n').count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionQuery {
    Name(String),
    /// 1-based line number somewhere inside the wanted function.
    Line(usize),
}

impl fmt::Display for FunctionQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "function `{}`", name),
            Self::Line(line) => write!(f, "function enclosing line {}", line),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub content: String,
}

#[cfg(test)]
mod types_tests {
    use super::*;

    #[test]
    fn payload_nil_sentinel_is_exact() {
        assert!(Payload::from("nil").is_nil());
        assert!(!Payload::from("nil\n").is_nil());
        assert!(!Payload::from("Nil").is_nil());
        assert!(!Payload::default().is_nil());
    }

    #[test]
    fn payload_text_views() {
        let payload = Payload::new(vec![0x68, 0x69, 0xff]);
        assert_eq!(payload.as_text(), None);
        assert_eq!(payload.to_text_lossy(), "hi\u{fffd}");
        assert_eq!(Payload::from("ok").as_text(), Some("ok"));
        assert_eq!(Payload::from("ok".to_string()).len(), 2);
    }

    #[test]
    fn sequence_index_advances_by_one() {
        let seq = SequenceIndex::ZERO.next().next();
        assert_eq!(seq.value(), 2);
        assert_eq!(seq.to_string(), "2");
        assert_eq!(
            serde_json::to_string(&SequenceIndex::new(7)).expect("json"),
            "7"
        );
    }

    #[test]
    fn span_line_count_handles_missing_final_newline() {
        let span = FunctionSpan {
            start: 0,
            end: 22,
            text: "function f()\n  x()\nend".to_string(),
        };
        assert_eq!(span.line_count(), 3);
        let span = FunctionSpan {
            start: 0,
            end: 23,
            text: "function f()\n  x()\nend\n".to_string(),
        };
        assert_eq!(span.line_count(), 3);
    }

    #[test]
    fn query_display_names_the_target() {
        assert_eq!(
            FunctionQuery::Name("foo".to_string()).to_string(),
            "function `foo`"
        );
        assert_eq!(
            FunctionQuery::Line(4).to_string(),
            "function enclosing line 4"
        );
    }
}
