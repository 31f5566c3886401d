//! Text post-processing for model replies

use serde_json::Value;
use tracing::debug;

/// Replace literal `\uXXXX` escapes with the characters they name.
///
/// Surrogate pairs written as two escapes are joined. Escapes that do not
/// form a valid scalar value are left as written.
pub fn decode_unicode_escapes(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let mut out = String::with_capacity(text.len());
    let mut rest: &str = &text;

    while let Some(pos) = rest.find("\\u") {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        match parse_escape(tail) {
            Some(high @ 0xD800..=0xDBFF) => {
                let low = tail.get(6..).and_then(parse_escape);
                match low {
                    Some(low @ 0xDC00..=0xDFFF) => {
                        let scalar = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                        match char::from_u32(scalar) {
                            Some(c) => out.push(c),
                            None => out.push_str(&tail[..12]),
                        }
                        rest = &tail[12..];
                    }
                    _ => {
                        out.push_str(&tail[..6]);
                        rest = &tail[6..];
                    }
                }
            }
            Some(code) => {
                match char::from_u32(code) {
                    Some(c) => out.push(c),
                    None => out.push_str(&tail[..6]),
                }
                rest = &tail[6..];
            }
            None => {
                out.push_str("\\u");
                rest = &tail[2..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Parse `\uXXXX` at the start of `s`
fn parse_escape(s: &str) -> Option<u32> {
    let hex = s.strip_prefix("\\u")?.get(..4)?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

/// Locate the first JSON object embedded in free-form text.
///
/// Braces are matched while skipping string literals. If the first object is
/// never closed, the span from the first `{` to the last `}` is returned.
/// A span that is not valid JSON but becomes valid once newlines are dropped
/// and single quotes turned into double quotes is returned in that form, so
/// Python-style dict replies still parse.
pub fn extract_first_json_object(text: &str) -> Option<String> {
    let span = locate_object(text)?;
    if serde_json::from_str::<Value>(&span).is_ok() {
        return Some(span);
    }

    let normalized = span.replace(['\n', '\r'], "").replace('\'', "\"");
    if serde_json::from_str::<Value>(&normalized).is_ok() {
        debug!("Normalized quoting of extracted JSON object");
        return Some(normalized);
    }
    Some(span)
}

fn locate_object(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + c.len_utf8();
                    return Some(text[start..end].to_string());
                }
            }
            _ => {}
        }
    }

    debug!("Unbalanced JSON object in reply, falling back to outermost braces");
    let end = text.rfind('}')?;
    (end > start).then(|| text[start..=end].to_string())
}
