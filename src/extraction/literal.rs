//! Literal decoding for Python constant expressions.
//!
//! Tree-sitter hands us raw token text; this module turns the subset of
//! tokens Python treats as compile-time constants into [`LiteralValue`]s:
//! - plain and implicitly concatenated string literals (escapes decoded,
//!   raw prefixes honored)
//! - decimal, hex, octal and binary integers, floats
//! - `True`, `False`, `None`
//!
//! f-strings, byte strings and complex numbers are not constants we can
//! carry through JSON, so they decode to `None` and the caller skips them.
//!
//! Named escapes (`\N{EM DASH}`) need the Unicode name table and are kept
//! as written, like any other escape this module does not decode.

use tree_sitter::Node;

use crate::types::LiteralValue;

/// Decode a literal expression node, or `None` if it is not a constant.
pub fn literal_value(node: Node<'_>, source: &[u8]) -> Option<LiteralValue> {
    match node.kind() {
        "string" | "concatenated_string" => string_value(node, source).map(LiteralValue::Str),
        "integer" => parse_int(text(node, source)?).map(LiteralValue::Int),
        "float" => parse_float(text(node, source)?).map(LiteralValue::Float),
        "true" => Some(LiteralValue::Bool(true)),
        "false" => Some(LiteralValue::Bool(false)),
        "none" => Some(LiteralValue::None),
        // `("name")` is still a constant once the parser drops the parens
        "parenthesized_expression" => {
            let mut cursor = node.walk();
            let mut inner = node
                .named_children(&mut cursor)
                .filter(|child| child.kind() != "comment");
            match (inner.next(), inner.next()) {
                (Some(only), None) => literal_value(only, source),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Decode a string or concatenated string node to its runtime value.
pub fn string_value(node: Node<'_>, source: &[u8]) -> Option<String> {
    match node.kind() {
        "string" => single_string(node, source),
        "concatenated_string" => {
            let mut cursor = node.walk();
            let mut out = String::new();
            for part in node.named_children(&mut cursor) {
                if part.kind() == "comment" {
                    continue;
                }
                out.push_str(&single_string(part, source)?);
            }
            Some(out)
        }
        _ => None,
    }
}

fn single_string(node: Node<'_>, source: &[u8]) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }

    let mut cursor = node.walk();
    let mut start = None;
    let mut end = None;
    for child in node.children(&mut cursor) {
        match child.kind() {
            "string_start" => start = Some(child),
            "string_end" => end = Some(child),
            "interpolation" => return None,
            _ => {}
        }
    }
    let (start, end) = (start?, end?);
    if end.is_missing() {
        return None;
    }

    let opener = text(start, source)?;
    let prefix: String = opener
        .chars()
        .take_while(|c| *c != '\'' && *c != '"')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    // f-strings are never constants; byte strings have no JSON form
    if prefix.contains('f') || prefix.contains('b') {
        return None;
    }

    let body = std::str::from_utf8(source.get(start.end_byte()..end.start_byte())?).ok()?;
    if prefix.contains('r') {
        Some(body.to_string())
    } else {
        Some(unescape(body))
    }
}

fn text<'s>(node: Node<'_>, source: &'s [u8]) -> Option<&'s str> {
    node.utf8_text(source).ok()
}

/// Parse a Python integer token. Complex literals and values outside
/// `i64` yield `None`.
pub fn parse_int(token: &str) -> Option<i64> {
    let cleaned: String = token.chars().filter(|c| *c != '_').collect();
    if cleaned.ends_with(['j', 'J']) {
        return None;
    }
    let cleaned = cleaned.trim_end_matches(['l', 'L']);
    let lower = cleaned.to_ascii_lowercase();

    if let Some(hex) = lower.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()
    } else if let Some(oct) = lower.strip_prefix("0o") {
        i64::from_str_radix(oct, 8).ok()
    } else if let Some(bin) = lower.strip_prefix("0b") {
        i64::from_str_radix(bin, 2).ok()
    } else {
        lower.parse().ok()
    }
}

/// Parse a Python float token. Imaginary literals yield `None`.
pub fn parse_float(token: &str) -> Option<f64> {
    let cleaned: String = token.chars().filter(|c| *c != '_').collect();
    if cleaned.ends_with(['j', 'J']) {
        return None;
    }
    cleaned.parse().ok()
}

/// Decode backslash escapes of a non-raw Python `str` literal body.
///
/// Unknown escapes are kept verbatim, as Python does.
pub fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(next) = chars.next() else {
            out.push('\\');
            break;
        };
        match next {
            '\n' => {}
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0C}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\u{0B}'),
            '0'..='7' => {
                let mut digits = String::from(next);
                while digits.len() < 3 {
                    match chars.peek() {
                        Some(d @ '0'..='7') => {
                            digits.push(*d);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                match u32::from_str_radix(&digits, 8).ok().and_then(char::from_u32) {
                    Some(ch) => out.push(ch),
                    None => {
                        out.push('\\');
                        out.push_str(&digits);
                    }
                }
            }
            'x' => push_hex_escape(&mut out, &mut chars, 'x', 2),
            'u' => push_hex_escape(&mut out, &mut chars, 'u', 4),
            'U' => push_hex_escape(&mut out, &mut chars, 'U', 8),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    out
}

fn push_hex_escape(
    out: &mut String,
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    marker: char,
    width: usize,
) {
    let mut digits = String::with_capacity(width);
    while digits.len() < width {
        match chars.peek() {
            Some(d) if d.is_ascii_hexdigit() => {
                digits.push(*d);
                chars.next();
            }
            _ => break,
        }
    }

    let decoded = (digits.len() == width)
        .then(|| u32::from_str_radix(&digits, 16).ok())
        .flatten()
        .and_then(char::from_u32);

    match decoded {
        Some(ch) => out.push(ch),
        None => {
            out.push('\\');
            out.push(marker);
            out.push_str(&digits);
        }
    }
}

/// Normalize docstring indentation the way Python's `inspect.cleandoc` does.
///
/// Tabs expand to 8-column stops, the first line loses its leading
/// whitespace, the common indentation of the remaining lines is removed,
/// and blank lines at either end are dropped.
pub fn clean_docstring(doc: &str) -> String {
    let expanded: Vec<String> = doc.split('\n').map(expand_tabs).collect();

    // Margins count characters: indentation may be any Unicode whitespace
    let margin = expanded
        .iter()
        .skip(1)
        .filter_map(|line| {
            let content = line.trim_start();
            (!content.is_empty()).then(|| line.chars().count() - content.chars().count())
        })
        .min();

    let mut lines: Vec<String> = Vec::with_capacity(expanded.len());
    for (i, line) in expanded.into_iter().enumerate() {
        if i == 0 {
            lines.push(line.trim_start().to_string());
        } else if let Some(margin) = margin {
            lines.push(line.chars().skip(margin).collect());
        } else {
            lines.push(line);
        }
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    let leading = lines.iter().take_while(|l| l.is_empty()).count();
    lines.drain(..leading);

    lines.join("\n")
}

fn expand_tabs(line: &str) -> String {
    if !line.contains('\t') {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len() + 8);
    let mut column = 0;
    for c in line.chars() {
        if c == '\t' {
            let pad = 8 - column % 8;
            out.extend(std::iter::repeat(' ').take(pad));
            column += pad;
        } else {
            out.push(c);
            column += 1;
        }
    }
    out
}
