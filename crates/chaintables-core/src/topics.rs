//! Topic normalization.
//!
//! Exporters hand us the topics of a log in many shapes: a native list, a
//! JSON array in a CSV cell, a Python-style tuple literal, a comma-joined hex
//! string, a bare scalar, or nothing at all with the topics spread across
//! `topic0..topic3` columns. Everything funnels through [`normalize_topics`],
//! which applies a fixed precedence and never fails.

use alloy_primitives::U256;

use crate::log::{has_wide_number, TopicValue, TopicsField};

/// Run the field-level normalization steps.
///
/// Returns `None` when the field yields no topics (absent, a null marker,
/// an unparseable literal, or an empty list).
pub fn normalize_field(field: &TopicsField) -> Option<Vec<String>> {
    let topics: Vec<String> = match field {
        TopicsField::Absent => return None,
        TopicsField::Sequence(items) => items.iter().filter_map(normalize_element).collect(),
        TopicsField::Integer(v) => vec![hex_int(v)],
        TopicsField::Bytes(b) => vec![hex_bytes(b)],
        TopicsField::Text(raw) => normalize_text(raw)?,
    };
    if topics.is_empty() {
        None
    } else {
        Some(topics)
    }
}

/// Normalize a topics field, falling back to the discrete `topic0..topic3`
/// columns when the field yields nothing.
pub fn normalize_topics(field: &TopicsField, fallback: &[Option<String>; 4]) -> Vec<String> {
    if let Some(topics) = normalize_field(field) {
        return topics;
    }
    fallback
        .iter()
        .flatten()
        .map(|t| t.trim())
        .filter(|t| !is_null_marker(t))
        .map(|t| t.to_lowercase())
        .collect()
}

fn normalize_text(raw: &str) -> Option<Vec<String>> {
    let s = raw.trim();
    if is_null_marker(s) {
        return None;
    }

    if is_delimited(s) {
        let items = parse_structured(s)?;
        return Some(items.iter().filter_map(normalize_element).collect());
    }

    if s.contains(',') && s.to_ascii_lowercase().contains("0x") {
        return Some(
            s.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_lowercase)
                .collect(),
        );
    }

    Some(vec![s.to_lowercase()])
}

fn normalize_element(value: &TopicValue) -> Option<String> {
    match value {
        TopicValue::Text(s) => Some(s.trim().to_lowercase()),
        TopicValue::Integer(v) => Some(hex_int(v)),
        TopicValue::Bytes(b) => Some(hex_bytes(b)),
        TopicValue::Other => None,
    }
}

fn hex_int(v: &U256) -> String {
    format!("0x{v:x}")
}

fn hex_bytes(b: &[u8]) -> String {
    format!("0x{}", hex::encode(b))
}

fn is_null_marker(s: &str) -> bool {
    s.is_empty()
        || s.eq_ignore_ascii_case("nan")
        || s.eq_ignore_ascii_case("none")
        || s.eq_ignore_ascii_case("null")
}

fn is_delimited(s: &str) -> bool {
    (s.starts_with('[') && s.ends_with(']')) || (s.starts_with('(') && s.ends_with(')'))
}

/// JSON array first, then the literal list/tuple grammar. A JSON array with
/// integers wider than u64 is re-read with the literal grammar, which keeps
/// them exact.
fn parse_structured(s: &str) -> Option<Vec<TopicValue>> {
    if s.starts_with('[') {
        if let Ok(serde_json::Value::Array(items)) = serde_json::from_str(s) {
            if !items.iter().any(has_wide_number) {
                return Some(items.iter().map(TopicValue::from_json).collect());
            }
        }
    }
    parse_literal_list(&s[1..s.len() - 1])
}

/// Parses the inside of a list/tuple literal: comma-separated quoted strings,
/// `b'..'` byte strings and decimal or `0x` integers. `None`/`null`,
/// booleans, floats and nested containers are accepted but become [`TopicValue::Other`].
fn parse_literal_list(inner: &str) -> Option<Vec<TopicValue>> {
    let mut items = Vec::new();
    let mut rest = inner.trim_start();

    while !rest.is_empty() {
        let (item, tail) = parse_literal_item(rest)?;
        items.push(item);
        rest = tail.trim_start();
        match rest.strip_prefix(',') {
            Some(tail) => rest = tail.trim_start(),
            None if rest.is_empty() => break,
            None => return None,
        }
    }
    Some(items)
}

fn parse_literal_item(s: &str) -> Option<(TopicValue, &str)> {
    let first = s.chars().next()?;
    match first {
        '\'' | '"' => {
            let (bytes, tail) = parse_quoted(s)?;
            let text = String::from_utf8(bytes).ok()?;
            Some((TopicValue::Text(text), tail))
        }
        'b' | 'B' if s[1..].starts_with(&['\'', '"'][..]) => {
            let (bytes, tail) = parse_quoted(&s[1..])?;
            Some((TopicValue::Bytes(bytes), tail))
        }
        '[' | '(' => {
            let end = matching_close(s)?;
            Some((TopicValue::Other, &s[end + 1..]))
        }
        _ => {
            let end = s.find(',').unwrap_or(s.len());
            let token = s[..end].trim();
            Some((parse_bare_token(token)?, &s[end..]))
        }
    }
}

fn parse_bare_token(token: &str) -> Option<TopicValue> {
    if let Some(hex) = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        return U256::from_str_radix(hex, 16).ok().map(TopicValue::Integer);
    }
    if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
        return U256::from_str_radix(token, 10).ok().map(TopicValue::Integer);
    }
    let keyword = matches!(token, "None" | "True" | "False" | "null" | "true" | "false");
    if keyword || token.parse::<f64>().is_ok() {
        return Some(TopicValue::Other);
    }
    None
}

/// Parse a quoted literal starting at `s[0]`, returning its bytes and the
/// remainder after the closing quote.
fn parse_quoted(s: &str) -> Option<(Vec<u8>, &str)> {
    let quote = s.as_bytes()[0];
    let bytes = s.as_bytes();
    let mut out = Vec::new();
    let mut i = 1;

    while i < bytes.len() {
        let b = bytes[i];
        if b == quote {
            return Some((out, &s[i + 1..]));
        }
        if b != b'\\' {
            out.push(b);
            i += 1;
            continue;
        }
        let esc = *bytes.get(i + 1)?;
        match esc {
            b'n' => out.push(b'\n'),
            b't' => out.push(b'\t'),
            b'r' => out.push(b'\r'),
            b'0' => out.push(0),
            b'x' => {
                let hi = bytes.get(i + 2).copied()?;
                let lo = bytes.get(i + 3).copied()?;
                let pair = [hi, lo];
                let decoded = hex::decode(pair).ok()?;
                out.extend_from_slice(&decoded);
                i += 2;
            }
            other => out.push(other),
        }
        i += 2;
    }
    None
}

fn matching_close(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '[' | '(' => depth += 1,
            ']' | ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
