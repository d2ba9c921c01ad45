use pb_core::{BridgeError, FunctionSpan};

/// Insert right after the function header.
pub const DEFAULT_AFTER_LINE: usize = 1;

/// Inserts `text` as a new line after line `after_line` of the function
/// (0 inserts before the header) and splices the result back into `source`.
/// Bytes outside `span` are left untouched.
pub fn inject(
    source: &str,
    span: &FunctionSpan,
    text: &str,
    after_line: usize,
) -> Result<String, BridgeError> {
    let function = source
        .get(span.start..span.end)
        .filter(|current| *current == span.text)
        .ok_or_else(|| {
            BridgeError::not_found(format!(
                "span {}..{} no longer matches the source",
                span.start, span.end
            ))
        })?;

    let mut lines = function
        .split_inclusive('\n')
        .map(str::to_string)
        .collect::<Vec<_>>();
    if after_line > lines.len() {
        return Err(BridgeError::IndexOutOfRange {
            after_line,
            line_count: lines.len(),
        });
    }

    if after_line > 0 {
        if let Some(previous) = lines.get_mut(after_line - 1) {
            if !previous.ends_with('\n') {
                previous.push('\n');
            }
        }
    }
    lines.insert(after_line, format!("{}\n", text));

    let mut patched = String::with_capacity(source.len() + text.len() + 2);
    patched.push_str(&source[..span.start]);
    for line in &lines {
        patched.push_str(line);
    }
    patched.push_str(&source[span.end..]);
    Ok(patched)
}
