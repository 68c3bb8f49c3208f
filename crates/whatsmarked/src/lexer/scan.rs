//! Small scanning helpers and the regexes shared by the block and inline rules.

use std::sync::LazyLock;

use regex::Regex;

/// Inline raw HTML: comment, closing tag, opening tag, processing
/// instruction, declaration or CDATA section.
pub(super) static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?s)^(?:",
        r"<!--(?:-?>|.*?(?:-->|\z))",
        r"|</[a-zA-Z][\w:-]*\s*>",
        r#"|<[a-zA-Z][\w-]*(?:\s+[a-zA-Z:_][\w.:-]*(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'=<>`]+))?)*?\s*/?>"#,
        r"|<\?.*?\?>",
        r"|<![a-zA-Z]+\s.*?>",
        r"|<!\[CDATA\[.*?\]\]>",
        r")",
    ))
    .unwrap()
});

/// `<scheme:anything>` autolink.
pub(super) static AUTOLINK_URI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<([a-zA-Z][a-zA-Z0-9+.\-]{1,31}:[^\s\x00-\x1f<>]*)>").unwrap()
});

/// `<user@example.com>` autolink.
pub(super) static AUTOLINK_EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^<([a-zA-Z0-9.!#$%&'*+/=?^_`{|}~\-]+@",
        r"[a-zA-Z0-9](?:[a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?",
        r"(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?)+)>",
    ))
    .unwrap()
});

/// Bare GFM URL, before trailing punctuation is trimmed.
pub(super) static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:ftp|https?)://(?:[a-zA-Z0-9\-]+\.?)+[^\s<]*").unwrap());

/// Link reference definition on a single line.
pub(super) static DEFINITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^ {0,3}\[((?:\\.|[^\[\]\\])+)\]:[ \t]*(<[^<>\n]*>|\S+)",
        r#"(?:[ \t]+("(?:\\.|[^"\\])*"|'(?:\\.|[^'\\])*'|\((?:\\.|[^()\\])*\)))?[ \t]*$"#,
    ))
    .unwrap()
});

/// A complete opening or closing tag alone on its line (HTML block type 7).
pub(super) static HTML_TAG_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^ {0,3}(?:",
        r#"<[a-zA-Z][\w-]*(?:\s+[a-zA-Z:_][\w.:-]*(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'=<>`]+))?)*\s*/?>"#,
        r"|</[a-zA-Z][\w-]*\s*>",
        r")[ \t]*$",
    ))
    .unwrap()
});

/// Split the first line off `src`.
///
/// Returns the line without its newline and the number of bytes consumed,
/// newline included.
pub(super) fn next_line(src: &str) -> (&str, usize) {
    match src.find('\n') {
        Some(i) => (&src[..i], i + 1),
        None => (src, src.len()),
    }
}

pub(super) fn is_blank(line: &str) -> bool {
    line.bytes().all(|b| b == b' ' || b == b'\t')
}

pub(super) fn leading_spaces(line: &str) -> usize {
    line.bytes().take_while(|&b| b == b' ').count()
}

/// Number of consecutive `\n` at the start of `src`.
pub(super) fn leading_newlines(src: &str) -> usize {
    src.bytes().take_while(|&b| b == b'\n').count()
}

/// Length in bytes of the run of `c` at the start of `src`.
pub(super) fn run_len(src: &str, c: char) -> usize {
    src.chars().take_while(|&x| x == c).count() * c.len_utf8()
}

/// Byte length of the character starting at `i`.
pub(super) fn char_len_at(src: &str, i: usize) -> usize {
    src[i..].chars().next().map_or(1, char::len_utf8)
}

/// Unicode punctuation or symbol, as far as flanking rules are concerned.
///
/// Non-ASCII characters that are neither alphanumeric nor whitespace count as
/// punctuation.
pub(super) fn is_punctuation(c: char) -> bool {
    if c.is_ascii() {
        c.is_ascii_punctuation()
    } else {
        !c.is_alphanumeric() && !c.is_whitespace()
    }
}

/// Remove the backslash from escaped ASCII punctuation.
pub(super) fn unescape(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut chars = src.chars().peekable();
    while let Some(c) = chars.next() {
        match chars.peek() {
            Some(&next) if c == '\\' && next.is_ascii_punctuation() => {
                out.push(next);
                chars.next();
            }
            _ => out.push(c),
        }
    }
    out
}

/// Expand tabs in leading indentation to four spaces each.
pub(super) fn expand_leading_tabs(src: &str) -> std::borrow::Cow<'_, str> {
    if !src.contains('\t') {
        return std::borrow::Cow::Borrowed(src);
    }
    let mut out = String::with_capacity(src.len());
    for line in src.split_inclusive('\n') {
        let spaces = leading_spaces(line);
        let tabs = line[spaces..].bytes().take_while(|&b| b == b'\t').count();
        out.push_str(&line[..spaces]);
        out.push_str(&"    ".repeat(tabs));
        out.push_str(&line[spaces + tabs..]);
    }
    std::borrow::Cow::Owned(out)
}
