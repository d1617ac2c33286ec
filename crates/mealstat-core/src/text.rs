//! Body normalization: HTML to text and line splitting.
//!
//! Delivery confirmations arrive as HTML more often than not. Template
//! matching works on the sequence of non-empty, trimmed text lines, with
//! quoted reply lines (`> ...`) removed.

use std::borrow::Cow;

use crate::extract::rules::patterns::{HTML_ENTITY, HTML_NUMERIC_ENTITY, HTML_SKIPPED_BLOCK, HTML_TAG};

/// Whether the body looks like HTML markup.
pub fn is_html(body: &str) -> bool {
    HTML_TAG.is_match(body)
}

/// Convert an HTML body to text, one text node per line.
pub fn html_to_text(html: &str) -> String {
    let without_blocks = HTML_SKIPPED_BLOCK.replace_all(html, "\n");
    let without_tags = HTML_TAG.replace_all(&without_blocks, "\n");
    decode_entities(&without_tags).into_owned()
}

/// Decode the named and numeric character references found in mail bodies.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let numeric = HTML_NUMERIC_ENTITY.replace_all(text, |caps: &regex::Captures| {
        let code = if caps[1].is_empty() {
            caps[2].parse::<u32>().ok()
        } else {
            u32::from_str_radix(&caps[2], 16).ok()
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });

    let named = HTML_ENTITY.replace_all(&numeric, |caps: &regex::Captures| {
        match &caps[1] {
            "nbsp" | "ensp" | "emsp" | "thinsp" => " ",
            "amp" => "&",
            "lt" => "<",
            "gt" => ">",
            "quot" => "\"",
            "apos" | "rsquo" | "lsquo" | "prime" => "'",
            "ldquo" | "rdquo" | "bdquo" | "Prime" => "\"",
            "ndash" => "–",
            "mdash" => "—",
            "hellip" => "…",
            "bull" => "•",
            "middot" => "·",
            "laquo" => "«",
            "raquo" => "»",
            "copy" => "©",
            "reg" => "®",
            "trade" => "™",
            "times" => "×",
            "frac12" => "½",
            "zwnj" | "zwj" | "shy" => "",
            "rupee" | "inr" => "₹",
            _ => return caps[0].to_string(),
        }
        .to_string()
    });

    Cow::Owned(named.into_owned())
}

/// Split a message body into the lines templates match against.
pub fn body_lines(body: &str) -> Vec<String> {
    let text: Cow<'_, str> = if is_html(body) {
        Cow::Owned(html_to_text(body))
    } else {
        decode_entities(body)
    };

    text.lines()
        .map(normalize_line)
        .filter(|l| !l.is_empty())
        .filter(|l| !l.starts_with('>'))
        .collect()
}

/// Fold the typographic variants mail templates use into plain text, so
/// the same restaurant always yields the same name.
fn normalize_line(line: &str) -> String {
    line.chars()
        .filter_map(|c| match c {
            '\u{00a0}' | '\u{2002}' | '\u{2003}' | '\u{2009}' => Some(' '),
            '\u{2018}' | '\u{2019}' | '\u{2032}' => Some('\''),
            '\u{201c}' | '\u{201d}' | '\u{201e}' => Some('"'),
            '\u{200b}' | '\u{200c}' | '\u{200d}' | '\u{00ad}' | '\u{feff}' => None,
            c => Some(c),
        })
        .collect::<String>()
        .trim()
        .to_string()
}
