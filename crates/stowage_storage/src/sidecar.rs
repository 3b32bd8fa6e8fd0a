//! Sidecar attribute files for the filesystem backend.
//!
//! One `key=value` entry per line, sorted by key. Backslash, newline and
//! carriage return are escaped in keys and values; `=` is escaped in keys, as
//! is a leading `#`, `!`, space or tab.
//! Blank lines and lines starting with `#` or `!` are ignored on read.

use stowage_core::Attributes;

/// Suffix appended to a content file's name to form its sidecar.
pub const SIDECAR_SUFFIX: &str = ".attr";

/// Serialize attributes into sidecar text.
pub fn encode(attributes: &Attributes) -> String {
    let mut entries: Vec<_> = attributes.iter().collect();
    entries.sort();

    let mut out = String::new();
    for (key, value) in entries {
        out.push_str(&escape(key, true));
        out.push('=');
        out.push_str(&escape(value, false));
        out.push('\n');
    }
    out
}

/// Parse sidecar text into attributes.
pub fn decode(text: &str) -> Attributes {
    let mut attributes = Attributes::new();
    for line in text.lines() {
        let line = line.trim_start();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }

        let (key, value) = split_entry(line);
        attributes.insert(unescape(key), unescape(value));
    }
    attributes
}

fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '=' => return (&line[..i], &line[i + 1..]),
            _ => {}
        }
    }
    (line, "")
}

fn escape(s: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.chars().enumerate() {
        match c {
            // A key must not open with a comment marker or whitespace that
            // decode would skip or trim.
            '#' | '!' | ' ' | '\t' if is_key && i == 0 => {
                out.push('\\');
                out.push(c);
            }
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '=' if is_key => out.push_str("\\="),
            _ => out.push(c),
        }
    }
    out
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_sorted() {
        let mut attributes = Attributes::new();
        attributes.insert("filename".to_string(), "pic.jpg".to_string());
        attributes.insert("content-type".to_string(), "image/jpeg".to_string());

        assert_eq!(
            encode(&attributes),
            "content-type=image/jpeg\nfilename=pic.jpg\n"
        );
    }

    #[test]
    fn test_escapes_survive() {
        let mut attributes = Attributes::new();
        attributes.insert("a=b".to_string(), "line1\nline2=x\\y".to_string());
        attributes.insert("empty".to_string(), String::new());

        assert_eq!(decode(&encode(&attributes)), attributes);
    }

    #[test]
    fn test_keys_shaped_like_comments_survive() {
        let mut attributes = Attributes::new();
        attributes.insert("#tag".to_string(), "x".to_string());
        attributes.insert("!note".to_string(), "y".to_string());
        attributes.insert(" padded".to_string(), "z".to_string());
        attributes.insert("\tindent".to_string(), "t".to_string());
        attributes.insert("mid#dle".to_string(), "w".to_string());

        let text = encode(&attributes);
        assert!(text.contains("\\#tag=x\n"));
        assert!(text.contains("mid#dle=w\n"));
        assert_eq!(decode(&text), attributes);
    }

    #[test]
    fn test_decode_skips_comments() {
        let text = "#written by hand\n\n! also a comment\n  title = Hello\nflag\n";
        let attributes = decode(text);

        assert_eq!(attributes.len(), 2);
        assert_eq!(attributes["title "], " Hello");
        assert_eq!(attributes["flag"], "");
    }
}
