//! Top-level function extraction for Python source files.
//!
//! The extractor covers the simplest slice of the grammar the loop needs:
//! column-zero `def` / `async def` definitions, their decorators, and their
//! indented bodies. Nested functions and non-function statements are ignored.
//! Spans are verbatim: the extracted text is byte-for-byte identical to the
//! corresponding region of the input file.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::core::types::SourceUnit;

static DEF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:async[ \t]+)?def[ \t]+([A-Za-z_][A-Za-z0-9_]*)[ \t]*\(").unwrap()
});

static DEF_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:async[ \t]+)?def\b").unwrap());

/// Malformed source file. The caller should skip the file and continue; this
/// is never fatal to the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Extract every top-level function definition from `source`.
///
/// Returns one [`SourceUnit`] per definition, in source order, each carrying
/// the exact text span (decorators included). Re-parsing the same text yields
/// the same sequence. When a name is defined twice at the top level the later
/// definition shadows the earlier one, matching Python runtime semantics; a
/// warning is logged for the discarded span.
pub fn extract_functions(
    source: &str,
    origin_module: &str,
) -> Result<Vec<SourceUnit>, ParseError> {
    let lines: Vec<&str> = source.split('\n').collect();
    let mut units: Vec<SourceUnit> = Vec::new();
    let mut pending_decorator: Option<usize> = None;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if line.starts_with('@') {
            if pending_decorator.is_none() {
                pending_decorator = Some(i);
            }
            i = balanced_end(&lines, i)
                .ok_or_else(|| ParseError::new(format!("unterminated decorator at line {}", i + 1)))?
                + 1;
            continue;
        }

        if DEF_PREFIX_RE.is_match(line) {
            let caps = DEF_RE
                .captures(line)
                .ok_or_else(|| ParseError::new(format!("malformed def at line {}", i + 1)))?;
            let name = caps.get(1).expect("def name group").as_str().to_string();
            let start = pending_decorator.take().unwrap_or(i);

            let (header_end, colon_pos) = signature_end(&lines, i).ok_or_else(|| {
                ParseError::new(format!("unterminated signature for `{name}` at line {}", i + 1))
            })?;

            let mut end = header_end;
            let mut saw_body = has_inline_body(lines[header_end], colon_pos);
            let mut j = header_end + 1;
            while j < lines.len() {
                let body_line = lines[j];
                if body_line.trim().is_empty() {
                    j += 1;
                    continue;
                }
                if !body_line.starts_with(' ') && !body_line.starts_with('\t') {
                    // Column-zero comments may sit inside a body; they end the
                    // span only when no further indented line follows.
                    if body_line.trim_start().starts_with('#') {
                        j += 1;
                        continue;
                    }
                    break;
                }
                saw_body = true;
                end = j;
                j += 1;
            }
            if !saw_body {
                return Err(ParseError::new(format!("function `{name}` has no body")));
            }

            let source_text = lines[start..=end].join("\n");
            if let Some(prev) = units.iter().position(|unit| unit.name == name) {
                warn!(function = %name, "duplicate top-level definition, later one shadows");
                units.remove(prev);
            }
            units.push(SourceUnit {
                name,
                source_text,
                origin_module: origin_module.to_string(),
            });
            i = j;
            continue;
        }

        // Any other non-blank top-level statement consumes pending decorators
        // (they belonged to a class or some construct we do not extract).
        if !line.trim().is_empty() {
            pending_decorator = None;
        }
        i += 1;
    }

    Ok(units)
}

/// Find the line holding the `:` that terminates a `def` signature, starting
/// at `start`. Returns `(line_index, colon_char_index)` or `None` when the
/// bracket nesting never closes before end of input.
fn signature_end(lines: &[&str], start: usize) -> Option<(usize, usize)> {
    let mut depth = 0i32;
    for (idx, line) in lines.iter().enumerate().skip(start) {
        let mut in_string: Option<char> = None;
        let mut escaped = false;
        for (pos, ch) in line.char_indices() {
            if let Some(quote) = in_string {
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == quote {
                    in_string = None;
                }
                continue;
            }
            match ch {
                '"' | '\'' => in_string = Some(ch),
                '#' => break,
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth -= 1,
                ':' if depth == 0 => return Some((idx, pos)),
                _ => {}
            }
        }
    }
    None
}

/// Find the last line of a bracket-balanced construct (decorator call) that
/// begins at `start`. Single-line decorators return `start` itself.
fn balanced_end(lines: &[&str], start: usize) -> Option<usize> {
    let mut depth = 0i32;
    for (idx, line) in lines.iter().enumerate().skip(start) {
        for ch in line.chars() {
            match ch {
                '#' => break,
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth -= 1,
                _ => {}
            }
        }
        if depth <= 0 {
            return Some(idx);
        }
    }
    None
}

/// True when a statement follows the signature colon on the same line
/// (`def f(): return 1`).
fn has_inline_body(line: &str, colon_pos: usize) -> bool {
    let rest = line[colon_pos + 1..].trim();
    !rest.is_empty() && !rest.starts_with('#')
}
