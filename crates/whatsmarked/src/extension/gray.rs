//! Gray text: `⣿muted text⣿`.

use super::{ExtensionContext, InlineExtension};
use crate::escape::escape_html;
use crate::token::ExtensionToken;

/// Gray text delimiter (U+28FF BRAILLE PATTERN DOTS-12345678).
pub(crate) const DELIMITER: char = '⣿';

/// CSS class of the rendered gray text span.
pub const GRAYTEXT_CLASS: &str = "graytext";

/// Renders `⣿text⣿` as `<span class="graytext">text</span>`.
///
/// The span stays on one line and runs to the last delimiter whose nearest
/// non-whitespace character before it is ordinary text, so `⣿a⣿ ⣿` grays
/// out `a` and leaves ` ⣿` as it is. The content is trimmed and treated as
/// plain text: no other inline syntax applies inside it.
#[derive(Clone, Copy, Debug, Default)]
pub struct GrayText;

impl InlineExtension for GrayText {
    fn name(&self) -> &'static str {
        "gray"
    }

    /// Every opener on a line shares the same closer, so only the first
    /// delimiter of each line needs checking.
    fn start(&self, src: &str) -> Option<usize> {
        let mut offset = 0;
        for line in src.split_inclusive(['\n', '\r']) {
            if let Some(open) = line.find(DELIMITER)
                && closing(&line[open + DELIMITER.len_utf8()..]).is_some()
            {
                return Some(offset + open);
            }
            offset += line.len();
        }
        None
    }

    fn tokenize(&self, src: &str, _ctx: &ExtensionContext<'_>) -> Option<ExtensionToken> {
        let rest = src.strip_prefix(DELIMITER)?;
        let end = closing(rest)?;
        Some(ExtensionToken {
            name: self.name(),
            raw: src[..DELIMITER.len_utf8() * 2 + end].to_owned(),
            text: rest[..end].trim().to_owned(),
            payload: None,
        })
    }

    fn render(&self, token: &ExtensionToken, _ctx: &ExtensionContext<'_>) -> String {
        format!(
            r#"<span class="{GRAYTEXT_CLASS}">{}</span>"#,
            escape_html(&token.text)
        )
    }
}

/// Byte index in `src` of the delimiter that closes a span opened right
/// before `src`.
fn closing(src: &str) -> Option<usize> {
    let line = src.split(['\n', '\r']).next().unwrap_or_default();
    let mut candidate = None;
    for (i, c) in line.char_indices().rev() {
        if c == DELIMITER {
            candidate = Some(i);
        } else if !c.is_whitespace() && candidate.is_some() {
            return candidate;
        }
    }
    None
}
