//! WhatsApp render rules.
//!
//! These replace the stock HTML for the token kinds whose WhatsApp meaning
//! differs from Markdown's: `*x*` is bold, `_x_` is italic, headings are
//! plain text and only bare URLs become links. Everything the chat client
//! would not format falls back to [`unsupported`], which shows the source.

use std::fmt::Write;

use crate::escape::escape_html;
use crate::token::TokenKind;

/// `*x*` is bold in WhatsApp, `_x_` is italic.
pub(crate) fn em(raw: &str, inner: &str, out: &mut String) {
    if raw.starts_with('*') {
        write!(out, "<strong>{inner}</strong>").unwrap();
    } else {
        write!(out, "<em>{inner}</em>").unwrap();
    }
}

/// Double delimiters keep one visible delimiter on each side.
///
/// `__x__` renders as `_<em>x</em>_` and `**x**` as `*<strong>x</strong>*`.
pub(crate) fn strong(raw: &str, inner: &str, out: &mut String) {
    let Some(first) = raw.chars().next() else {
        out.push_str(inner);
        return;
    };
    if first == '_' {
        write!(out, "{first}<em>{inner}</em>{first}").unwrap();
    } else {
        write!(out, "{first}<strong>{inner}</strong>{first}").unwrap();
    }
}

pub(crate) fn codespan(text: &str, out: &mut String) {
    write!(out, "<code>{}</code>", escape_html(text)).unwrap();
}

pub(crate) fn checkbox(checked: bool) -> &'static str {
    if checked { "<tt>[X]</tt>" } else { "<tt>[ ]</tt>" }
}

/// Only autolinks (bare URLs, where the source is the URL itself) become
/// anchors. Any other link syntax is shown as written.
pub(crate) fn link(href: &str, text: &str, raw: &str, out: &mut String) {
    if href == raw {
        write!(
            out,
            r#"<a href="{}" target="_blank">{}</a>"#,
            escape_html(href),
            escape_html(text)
        )
        .unwrap();
    } else {
        out.push_str(&first_break(&escape_html(raw)));
    }
}

/// Raw HTML, block or inline, is shown as text.
pub(crate) fn html(text: &str, out: &mut String) {
    out.push_str(&escape_html(text));
}

/// Blank lines between blocks: the first paragraph gap is dropped, every
/// remaining newline becomes a `<br>`.
pub(crate) fn space(raw: &str, out: &mut String) {
    out.push_str(&raw.replacen("\n\n", "", 1).replace('\n', "<br>"));
}

/// Fallback for tokens the chat client does not format.
pub(crate) fn unsupported(kind: TokenKind, raw: &str, out: &mut String) {
    tracing::debug!(kind = %kind, raw, "Rendering unsupported token as source");
    out.push_str(&first_break(raw));
}

fn first_break(s: &str) -> String {
    s.replacen('\n', "<br>", 1)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn render(f: impl FnOnce(&mut String)) -> String {
        let mut out = String::new();
        f(&mut out);
        out
    }

    #[test]
    fn test_em_by_delimiter() {
        assert_eq!(render(|o| em("*b*", "b", o)), "<strong>b</strong>");
        assert_eq!(render(|o| em("_i_", "i", o)), "<em>i</em>");
    }

    #[test]
    fn test_strong_keeps_outer_delimiter() {
        assert_eq!(render(|o| strong("**t**", "t", o)), "*<strong>t</strong>*");
        assert_eq!(render(|o| strong("__t__", "t", o)), "_<em>t</em>_");
    }

    #[test]
    fn test_codespan_escapes() {
        assert_eq!(render(|o| codespan("<b>", o)), "<code>&lt;b&gt;</code>");
    }

    #[test]
    fn test_checkbox() {
        assert_eq!(checkbox(true), "<tt>[X]</tt>");
        assert_eq!(checkbox(false), "<tt>[ ]</tt>");
    }

    #[test]
    fn test_link_only_for_autolinks() {
        assert_eq!(
            render(|o| link("https://a.io", "https://a.io", "https://a.io", o)),
            r#"<a href="https://a.io" target="_blank">https://a.io</a>"#
        );
        assert_eq!(
            render(|o| link("https://a.io", "a", "[a](https://a.io)", o)),
            "[a](https://a.io)"
        );
    }

    #[test]
    fn test_link_source_is_escaped() {
        assert_eq!(
            render(|o| link("x", "<b>", "[<b>](x)\n[c](d)\ne", o)),
            "[&lt;b&gt;](x)<br>[c](d)\ne"
        );
    }

    #[test]
    fn test_html_is_text() {
        assert_eq!(
            render(|o| html("<script>x</script>", o)),
            "&lt;script&gt;x&lt;/script&gt;"
        );
    }

    #[test]
    fn test_space() {
        assert_eq!(render(|o| space("\n\n", o)), "");
        assert_eq!(render(|o| space("\n\n\n", o)), "<br>");
        assert_eq!(render(|o| space("\n\n\n\n", o)), "<br><br>");
    }

    #[test]
    fn test_unsupported_breaks_first_newline_only() {
        assert_eq!(
            render(|o| unsupported(TokenKind::Table, "| a |\n|---|\n| b |", o)),
            "| a |<br>|---|\n| b |"
        );
    }
}
