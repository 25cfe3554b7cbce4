//! Streaming JSON pretty-printer for the raw OCR transcript.
//!
//! The formatter never parses. It walks the text once, left to right,
//! tracking only the current nesting depth and whether the cursor sits inside
//! a string literal, and inserts line breaks and four-space indents around
//! structural characters. Input is assumed to be valid JSON; garbage in gives
//! garbage out rather than an error.
//!
//! Two quirks are part of the contract:
//!
//! - every `\r`, `\n` and `\t` is removed before scanning, including ones
//!   inside string literals;
//! - a closing bracket with no matching opener clamps the depth at zero
//!   instead of producing a negative indent.
//!
//! Outside string literals, a run of spaces is dropped when it directly
//! follows a break or separator space the printer emitted itself, or
//! directly precedes a closing bracket. The indentation of already formatted
//! output therefore collapses and formatting it again gives back the same
//! text. Every other space is kept, so non-JSON bodies stay readable.

const INDENT: &str = "    ";

/// Format `json` with line breaks and four-space indentation.
///
/// Returns an empty string for empty input.
///
/// ```rust
/// use edgequake_pdf2vision::pretty_print;
///
/// let out = pretty_print(r#"{"a":1,"b":[2,3]}"#);
/// assert_eq!(out, "{\n    \"a\": 1,\n    \"b\": [\n        2,\n        3\n    ]\n}");
/// ```
pub fn pretty_print(json: &str) -> String {
    if json.is_empty() {
        return String::new();
    }

    let json: String = json
        .chars()
        .filter(|c| !matches!(c, '\r' | '\n' | '\t'))
        .collect();
    let bytes = json.as_bytes();

    let mut indent: usize = 0;
    let mut quoted = false;
    // Set right after the printer emitted its own whitespace.
    let mut after_break = false;
    let mut out = String::with_capacity(json.len() * 2);

    for (i, ch) in json.char_indices() {
        if ch == ' ' && (after_break || (!quoted && closes_next(&json[i + 1..]))) {
            continue;
        }
        after_break = false;

        match ch {
            '{' | '[' => {
                out.push(ch);
                if !quoted {
                    indent += 1;
                    push_break(&mut out, indent);
                    after_break = true;
                }
            }
            '}' | ']' => {
                if !quoted {
                    indent = indent.saturating_sub(1);
                    push_break(&mut out, indent);
                }
                out.push(ch);
            }
            '"' => {
                out.push(ch);
                if !is_escaped(bytes, i) {
                    quoted = !quoted;
                }
            }
            ',' => {
                out.push(ch);
                if !quoted {
                    push_break(&mut out, indent);
                    after_break = true;
                }
            }
            ':' => {
                out.push(ch);
                if !quoted {
                    out.push(' ');
                    after_break = true;
                }
            }
            _ => out.push(ch),
        }
    }

    out
}

/// [`pretty_print`] for an optional body; `None` formats as an empty string.
pub fn pretty_print_opt(json: Option<&str>) -> String {
    json.map(pretty_print).unwrap_or_default()
}

/// True when only spaces stand between here and a closing bracket, which
/// will get a break of its own.
fn closes_next(rest: &str) -> bool {
    rest.trim_start_matches(' ').starts_with(['}', ']'])
}

fn push_break(out: &mut String, indent: usize) {
    out.push('\n');
    for _ in 0..indent {
        out.push_str(INDENT);
    }
}

/// A quote at byte `pos` is escaped when an odd number of backslashes
/// immediately precede it.
fn is_escaped(bytes: &[u8], pos: usize) -> bool {
    let backslashes = bytes[..pos]
        .iter()
        .rev()
        .take_while(|&&b| b == b'\\')
        .count();
    backslashes % 2 == 1
}
