//! Text helpers shared by rules and patches.
//!
//! Lines are **1-indexed**, byte offsets are **0-indexed**.

use std::borrow::Cow;

/// Convert a byte offset to a 1-indexed line number.
///
/// Offsets past the end of `content` map to the last line.
pub fn byte_offset_to_line(content: &str, offset: usize) -> u32 {
    let offset = offset.min(content.len());
    let newlines = content.as_bytes()[..offset]
        .iter()
        .filter(|&&b| b == b'\n')
        .count();
    newlines as u32 + 1
}

/// Comment out a (possibly multi-line) statement.
///
/// Every line of `statement` gets `// ` inserted after `indent`. Continuation
/// lines keep their own indentation past `indent`; a continuation line that is
/// indented less than `indent` is prefixed as-is.
pub fn comment_out(indent: &str, statement: &str) -> String {
    statement
        .split('\n')
        .map(|line| {
            let rest = line.strip_prefix(indent).unwrap_or(line);
            format!("{}// {}", indent, rest)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split `text` into its body and trailing whitespace.
pub fn split_trailing_whitespace(text: &str) -> (&str, &str) {
    let body = text.trim_end();
    (body, &text[body.len()..])
}

/// Line ending used by `text`: `"\r\n"` if its first line ends that way,
/// `"\n"` otherwise.
pub fn line_ending(text: &str) -> &'static str {
    match text.find('\n') {
        Some(pos) if text[..pos].ends_with('\r') => "\r\n",
        _ => "\n",
    }
}

/// Rewrite the `\n` line breaks of `snippet` to `eol`.
pub fn with_line_ending<'a>(snippet: &'a str, eol: &str) -> Cow<'a, str> {
    if eol == "\n" || !snippet.contains('\n') {
        Cow::Borrowed(snippet)
    } else {
        Cow::Owned(snippet.replace("\r\n", "\n").replace('\n', eol))
    }
}
