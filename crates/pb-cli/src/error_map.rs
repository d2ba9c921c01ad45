use std::fmt::Display;
use std::io::Write;
use std::path::Path;

use pb_core::BridgeError;
use serde::Serialize;

pub(crate) fn emit_error(error: BridgeError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code());
    println!("ERROR_MSG_JSON:{}", json_string(&error.to_string()));
    1
}

pub(crate) fn write_repl_error(writer: &mut dyn Write, error: &BridgeError) -> std::io::Result<()> {
    writeln!(writer, "error[{}]: {}", error.code(), error)
}

pub(crate) fn json_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("{:?}", value))
}

/// JSON for a `*_JSON:` line; `null` if the value cannot be serialized.
pub(crate) fn json_value(value: &impl Serialize) -> String {
    serde_json::to_string(value).unwrap_or_else(|error| {
        tracing::warn!(%error, "value not serializable");
        "null".to_string()
    })
}

pub(crate) fn map_console_io(error: std::io::Error) -> BridgeError {
    BridgeError::io(Path::new("<console>"), error)
}

pub(crate) fn map_signal_setup(error: impl Display) -> BridgeError {
    BridgeError::io(
        Path::new("<signals>"),
        std::io::Error::other(error.to_string()),
    )
}

#[cfg(test)]
mod error_map_tests {
    use super::*;

    #[test]
    fn emit_error_returns_non_zero_exit_code() {
        let code = emit_error(BridgeError::invalid_payload("payload is empty"));
        assert_eq!(code, 1);
    }

    #[test]
    fn repl_errors_show_code_and_message() {
        let mut out = Vec::new();
        write_repl_error(&mut out, &BridgeError::not_found("function `x`")).expect("write");
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "error[PATCH_NOT_FOUND]: Function not found: function `x`\n"
        );
    }

    #[test]
    fn mapping_helpers_keep_error_codes() {
        assert_eq!(map_console_io(std::io::Error::other("io")).code(), "IO");
        assert_eq!(map_signal_setup("denied").code(), "IO");
        assert_eq!(json_string("a\"b\n"), "\"a\\\"b\\n\"");
    }

    #[test]
    fn json_value_serializes_spans() {
        let span = pb_core::FunctionSpan {
            start: 0,
            end: 16,
            text: "function f()\nend".to_string(),
        };
        assert_eq!(
            json_value(&span),
            r#"{"start":0,"end":16,"text":"function f()\nend"}"#
        );
    }
}
