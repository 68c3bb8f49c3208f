//! HTML escaping.
//!
//! [`escape_html`] is the only sanitization boundary of the renderer: code
//! spans, raw HTML, code blocks, gray text and attribute values all pass
//! through it. [`escape_text`] is the softer variant used for ordinary prose,
//! where entity references written by the author are kept as they are.

/// Escape the five HTML-significant characters.
///
/// Every `&`, `<`, `>`, `"` and `'` is replaced by its entity, exactly once.
/// All other characters pass through unchanged.
///
/// # Examples
///
/// ```
/// use whatsmarked::escape_html;
///
/// assert_eq!(escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
///     "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;");
/// ```
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        push_escaped(&mut out, c);
    }
    out
}

/// Escape text for output while leaving existing entity references intact.
///
/// `&amp;`, `&#39;` and `&#x27;` stay as written; a bare `&` becomes `&amp;`.
///
/// # Examples
///
/// ```
/// use whatsmarked::escape_text;
///
/// assert_eq!(escape_text("a &amp; b & <c>"), "a &amp; b &amp; &lt;c&gt;");
/// ```
#[must_use]
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.char_indices() {
        if c == '&' && entity_len(&s[i..]).is_some() {
            out.push('&');
        } else {
            push_escaped(&mut out, c);
        }
    }
    out
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#39;"),
        _ => out.push(c),
    }
}

/// Length of the entity reference at the start of `s`, if there is one.
///
/// Accepts `&name;`, `&#1234567;` (up to seven digits) and `&#x1F600;` (up to
/// six hex digits).
fn entity_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'&') {
        return None;
    }
    let (start, limit, accept): (usize, usize, fn(&u8) -> bool) = match bytes.get(1..3) {
        Some([b'#', b'x' | b'X']) => (3, 6, u8::is_ascii_hexdigit),
        Some([b'#', _]) => (2, 7, u8::is_ascii_digit),
        _ => (1, usize::MAX, is_name_byte),
    };
    let count = bytes[start..].iter().take_while(|&b| accept(b)).count();
    if count == 0 || count > limit {
        return None;
    }
    let end = start + count;
    (bytes.get(end) == Some(&b';')).then_some(end + 1)
}

fn is_name_byte(b: &u8) -> bool {
    b.is_ascii_alphanumeric() || *b == b'_'
}
