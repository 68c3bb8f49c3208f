//! Inline rules.
//!
//! Rules that search ahead for a closing delimiter consult a [`Lookahead`]
//! built once per run of content, so a run full of unmatched openers is still
//! tokenized in close to linear time.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::emphasis::{self, Closers, Emphasis};
use super::scan::{
    AUTOLINK_EMAIL_RE, AUTOLINK_URI_RE, TAG_RE, URL_RE, char_len_at, run_len, unescape,
};
use super::{Lexer, LinkDefinition, MAX_NESTING, normalize_label};
use crate::extension::InlineExtension;
use crate::token::Token;

/// Spans whose delimiters must not take part in emphasis: inline links,
/// code spans and anything in angle brackets.
static SKIP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\[[^\[\]]*?\]\((?:\\.|[^\\()]|\((?:\\.|[^\\()])*\))*\)",
        r"|`[^`]*?`",
        r"|<[^<>]*?>",
    ))
    .unwrap()
});

static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!?\[((?:\\.|[^\[\]\\])*)\](?:\[((?:\\.|[^\[\]\\])*)\])?").unwrap()
});

static ESCAPED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\[!-/:-@\[-`{-~]").unwrap());

/// Deepest parenthesis nesting inside a link destination.
const MAX_LINK_PARENS: usize = 32;

/// What lies ahead in a run of inline content. All positions are byte
/// offsets into `src`.
struct Lookahead<'s> {
    src: &'s str,
    masked: String,
    closers: Closers,
    /// `[` to its matching `]`, or `None` when it has none. Filled in as
    /// brackets get balanced.
    brackets: RefCell<HashMap<usize, Option<usize>>>,
    /// Start of the last backtick run of each length.
    backtick_runs: HashMap<usize, usize>,
    /// Starts of the `~` and `~~` runs that can close a strikethrough.
    tilde_closers: [Vec<usize>; 2],
    last_pi_end: Option<usize>,
    last_cdata_end: Option<usize>,
    last_angle: Option<usize>,
    /// End of the last non-whitespace character.
    content_end: usize,
    /// Last answer of each extension's `start`.
    extension_starts: Vec<Cell<NextStart>>,
}

#[derive(Clone, Copy)]
enum NextStart {
    Unknown,
    At(usize),
    Nowhere,
}

impl<'s> Lookahead<'s> {
    fn new(src: &'s str, links: &HashMap<String, LinkDefinition>, extensions: usize) -> Self {
        let masked = mask(src, links);
        let closers = Closers::new(&masked);

        let mut backtick_runs = HashMap::new();
        for (start, run) in runs(src, '`') {
            backtick_runs.insert(run, start);
        }
        let mut tilde_closers = [Vec::new(), Vec::new()];
        for (start, run) in runs(src, '~') {
            let after_text = src[..start]
                .chars()
                .next_back()
                .is_some_and(|c| !c.is_whitespace());
            if (1..=2).contains(&run) && after_text {
                tilde_closers[run - 1].push(start);
            }
        }

        Self {
            src,
            masked,
            closers,
            brackets: RefCell::new(HashMap::new()),
            backtick_runs,
            tilde_closers,
            last_pi_end: src.rfind("?>"),
            last_cdata_end: src.rfind("]]>"),
            last_angle: src.rfind('>'),
            content_end: src.trim_end().len(),
            extension_starts: vec![Cell::new(NextStart::Unknown); extensions],
        }
    }

    /// Next position at or after `from` where `extension` could match.
    fn extension_start(
        &self,
        index: usize,
        extension: &dyn InlineExtension,
        from: usize,
    ) -> Option<usize> {
        let cached = &self.extension_starts[index];
        match cached.get() {
            NextStart::At(start) if start >= from => return Some(start),
            NextStart::Nowhere => return None,
            _ => {}
        }
        let start = extension.start(&self.src[from..]).map(|start| from + start);
        cached.set(start.map_or(NextStart::Nowhere, NextStart::At));
        start
    }

    /// Index of the `]` closing the `[` at `open`. Nested brackets are
    /// balanced; escapes and code spans are skipped.
    fn closing_bracket(&self, open: usize) -> Option<usize> {
        let mut brackets = self.brackets.borrow_mut();
        if let Some(&close) = brackets.get(&open) {
            return close;
        }

        let src = self.src;
        let bytes = src.as_bytes();
        let mut pending = Vec::new();
        let mut i = open;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 1,
                b'`' => {
                    let run = run_len(&src[i..], '`');
                    let fence = &src[i..i + run];
                    if let Some(end) = src[i + run..].find(fence) {
                        i += run + end + run - 1;
                    } else {
                        i += run - 1;
                    }
                }
                b'[' => match brackets.get(&i) {
                    Some(Some(close)) => i = *close,
                    Some(None) => break,
                    None => pending.push(i),
                },
                b']' => {
                    if let Some(start) = pending.pop() {
                        brackets.insert(start, Some(i));
                    }
                    if pending.is_empty() {
                        return Some(i);
                    }
                }
                _ => {}
            }
            i += 1;
        }
        for start in pending {
            brackets.insert(start, None);
        }
        None
    }
}

impl Lexer<'_> {
    /// Split a run of inline content into tokens.
    pub(super) fn inline_tokens(&self, src: &str) -> Vec<Token> {
        self.inline_tokens_at(src, 0)
    }

    /// `depth` counts the emphasis and strikethrough spans around `src`.
    fn inline_tokens_at(&self, src: &str, depth: usize) -> Vec<Token> {
        let ahead = Lookahead::new(src, &self.links, self.grammar.extensions.len());
        let options = self.grammar.options;

        let mut tokens = Vec::new();
        let mut pos = 0;
        let mut prev_char = None;
        let mut keep_prev_char = false;

        while pos < src.len() {
            if !keep_prev_char {
                prev_char = None;
            }
            keep_prev_char = false;
            let rest = &src[pos..];

            if let Some(token) = self.extension_token(&ahead, pos) {
                pos += token.raw().len();
                tokens.push(token);
                continue;
            }

            let token = escape(rest)
                .or_else(|| tag(&ahead, pos))
                .or_else(|| link(&ahead, pos))
                .or_else(|| self.reference(&ahead, pos))
                .or_else(|| self.emphasis(&ahead, pos, prev_char))
                .or_else(|| codespan(&ahead, pos))
                .or_else(|| line_break(&ahead, pos, options.breaks))
                .or_else(|| options.gfm.then(|| strikethrough(&ahead, pos)).flatten())
                .map(|token| self.with_children(token, depth))
                .or_else(|| autolink(rest))
                .or_else(|| options.gfm.then(|| bare_url(rest)).flatten());

            if let Some(token) = token {
                pos += token.raw().len();
                match token {
                    Token::Text { raw, .. } => push_text(&mut tokens, &raw),
                    token => tokens.push(token),
                }
                continue;
            }

            let text = &rest[..self.text_len(&ahead, pos)];
            pos += text.len();
            if !text.ends_with('_') {
                prev_char = text.chars().next_back();
            }
            keep_prev_char = true;
            push_text(&mut tokens, text);
        }
        tokens
    }

    /// First registered extension that starts at `pos` and accepts it.
    fn extension_token(&self, ahead: &Lookahead<'_>, pos: usize) -> Option<Token> {
        let src = &ahead.src[pos..];
        let extensions = self.grammar.extensions.iter().enumerate();
        extensions
            .filter(|&(index, extension)| {
                ahead.extension_start(index, &**extension, pos) == Some(pos)
            })
            .find_map(|(_, extension)| {
                let token = extension.tokenize(src, &self.grammar.context)?;
                if token.raw.is_empty() || !src.starts_with(&token.raw) {
                    tracing::debug!(
                        extension = extension.name(),
                        raw = %token.raw,
                        "Discarding extension token that is not a prefix of the input"
                    );
                    return None;
                }
                Some(Token::Extension(token))
            })
    }

    /// Reference link (`[text][label]`, `[label][]` or `[label]`).
    ///
    /// An unknown label yields its first character as text, so the rest of
    /// the brackets are lexed as ordinary content.
    fn reference(&self, ahead: &Lookahead<'_>, pos: usize) -> Option<Token> {
        let src = &ahead.src[pos..];
        let image = src.starts_with('!');
        let open = usize::from(image);
        if !src[open..].starts_with('[') {
            return None;
        }
        let close = ahead.closing_bracket(pos + open)? - pos;
        let text = &src[open + 1..close];
        let after = &src[close + 1..];

        let (label, len) = if after.starts_with("[]") {
            (text, close + 3)
        } else if let Some(inner) = after.strip_prefix('[') {
            let end = simple_label_end(inner)?;
            let label = &inner[..end];
            if label.trim().is_empty() {
                return None;
            }
            (label, close + 2 + end + 1)
        } else {
            (text, close + 1)
        };
        if !is_simple_label(label) || label.trim().is_empty() {
            return None;
        }

        let raw = &src[..len];
        let Some(definition) = self.links.get(&normalize_label(label)) else {
            return Some(Token::text(&src[..1]));
        };
        Some(link_token(image, raw, definition.clone(), text))
    }

    fn emphasis(
        &self,
        ahead: &Lookahead<'_>,
        pos: usize,
        prev_char: Option<char>,
    ) -> Option<Token> {
        let src = &ahead.src[pos..];
        let masked = &ahead.masked[pos..];
        let (kind, len) = emphasis::scan(src, masked, prev_char, &ahead.closers, pos)?;
        let raw = src[..len].to_owned();
        Some(match kind {
            Emphasis::Em => Token::Em {
                text: src[1..len - 1].to_owned(),
                raw,
                tokens: Vec::new(),
            },
            Emphasis::Strong => Token::Strong {
                text: src[2..len - 2].to_owned(),
                raw,
                tokens: Vec::new(),
            },
        })
    }

    /// Lex the text of a container token into its children. Past the
    /// nesting limit the text stays plain.
    fn with_children(&self, mut token: Token, depth: usize) -> Token {
        if let Token::Em { text, tokens, .. }
        | Token::Strong { text, tokens, .. }
        | Token::Del { text, tokens, .. } = &mut token
        {
            *tokens = if depth + 1 < MAX_NESTING {
                self.inline_tokens_at(text, depth + 1)
            } else {
                vec![Token::text(text)]
            };
        }
        token
    }

    /// Length of the plain text run at `pos`.
    ///
    /// Text stops before any character that may begin another inline rule,
    /// before a bare URL, before a line break and before the next position
    /// where an extension could match.
    fn text_len(&self, ahead: &Lookahead<'_>, pos: usize) -> usize {
        let options = self.grammar.options;
        let src = &ahead.src[pos..];
        let first = char_len_at(src, 0);
        let limit = self
            .grammar
            .extensions
            .iter()
            .enumerate()
            .filter_map(|(index, extension)| {
                ahead.extension_start(index, &**extension, pos + first)
            })
            .min()
            .map_or(src.len(), |start| start - pos);
        let src = &src[..limit];

        let mut i = if src.starts_with(['`', '~']) {
            src.len() - src.trim_start_matches(['`', '~']).len()
        } else {
            first
        };
        while i < src.len() {
            let rest = &src[i..];
            if rest.starts_with(['\\', '<', '!', '[', '`', '*', '~', '_'])
                || (options.gfm
                    && ["http://", "https://", "ftp://"]
                        .iter()
                        .any(|scheme| rest.starts_with(scheme)))
            {
                break;
            }
            let spaces = run_len(rest, ' ');
            if rest[spaces..].starts_with('\n') && (options.breaks || spaces >= 2) {
                break;
            }
            i += if spaces > 0 { spaces } else { char_len_at(src, i) };
        }
        i
    }
}

/// Maximal runs of `c` in `src`, as `(start, byte length)`.
fn runs(src: &str, c: char) -> impl Iterator<Item = (usize, usize)> + '_ {
    let mut i = 0;
    std::iter::from_fn(move || {
        let start = i + src[i..].find(c)?;
        let run = run_len(&src[start..], c);
        i = start + run;
        Some((start, run))
    })
}

/// Append plain text, merging it into a preceding plain text token.
fn push_text(tokens: &mut Vec<Token>, text: &str) {
    if let Some(Token::Text {
        raw,
        text: last,
        tokens: children,
    }) = tokens.last_mut()
        && children.is_empty()
    {
        raw.push_str(text);
        last.push_str(text);
        return;
    }
    tokens.push(Token::text(text));
}

/// Copy of `src` with link references, escapes, code spans, inline links
/// and angle-bracket spans overwritten, byte for byte, by inert characters.
fn mask(src: &str, links: &HashMap<String, LinkDefinition>) -> String {
    let mut masked = src.to_owned();

    if !links.is_empty() {
        let references: Vec<_> = REFERENCE_RE
            .captures_iter(src)
            .filter(|caps| {
                let label = caps.get(2).filter(|m| !m.as_str().is_empty()).or(caps.get(1));
                label.is_some_and(|m| links.contains_key(&normalize_label(m.as_str())))
            })
            .filter_map(|caps| caps.get(0).map(|m| m.range()))
            .collect();
        for range in references {
            fill(&mut masked, range);
        }
    }

    let escapes: Vec<_> = ESCAPED_RE.find_iter(&masked).map(|m| m.range()).collect();
    for range in escapes {
        masked.replace_range(range, "++");
    }

    let skipped: Vec<_> = SKIP_RE.find_iter(&masked).map(|m| m.range()).collect();
    for range in skipped {
        fill(&mut masked, range);
    }
    masked
}

/// Overwrite a bracketed span with `[aaa]` of the same byte length.
fn fill(masked: &mut String, range: std::ops::Range<usize>) {
    let inner = range.len().saturating_sub(2);
    masked.replace_range(range, &format!("[{}]", "a".repeat(inner)));
}

fn escape(src: &str) -> Option<Token> {
    let c = src.strip_prefix('\\')?.chars().next()?;
    c.is_ascii_punctuation().then(|| Token::Escape {
        raw: src[..2].to_owned(),
        text: c.to_string(),
    })
}

fn tag(ahead: &Lookahead<'_>, pos: usize) -> Option<Token> {
    let src = &ahead.src[pos..];
    let closed = |end: Option<usize>, min: usize| end.is_some_and(|end| end >= pos + min);
    let unclosed = if src.starts_with("<![CDATA[") {
        !closed(ahead.last_cdata_end, 9)
    } else if src.starts_with("<?") {
        !closed(ahead.last_pi_end, 2)
    } else if src.starts_with("<!") && src[2..].starts_with(|c: char| c.is_ascii_alphabetic()) {
        !closed(ahead.last_angle, 3)
    } else {
        false
    };
    if unclosed {
        return None;
    }

    let raw = TAG_RE.find(src)?.as_str();
    Some(Token::Tag {
        raw: raw.to_owned(),
        text: raw.to_owned(),
    })
}

/// End of a label that may not contain unescaped brackets: the index of the
/// first `]`.
fn simple_label_end(src: &str) -> Option<usize> {
    let bytes = src.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'[' => return None,
            b']' => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

/// No unescaped brackets, and no trailing backslash that would escape the
/// closing `]`.
fn is_simple_label(label: &str) -> bool {
    let bytes = label.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if i + 1 == bytes.len() => return false,
            b'\\' => i += 1,
            b'[' | b']' => return false,
            _ => {}
        }
        i += 1;
    }
    true
}

/// Inline link or image: `[text](href "title")`.
fn link(ahead: &Lookahead<'_>, pos: usize) -> Option<Token> {
    let src = &ahead.src[pos..];
    let image = src.starts_with('!');
    let open = usize::from(image);
    if !src[open..].starts_with('[') {
        return None;
    }
    let close = ahead.closing_bracket(pos + open)? - pos;
    let text = &src[open + 1..close];
    let target = src[close + 1..].strip_prefix('(')?;
    let (href, title, len) = link_target(target)?;

    let raw = &src[..close + 2 + len];
    let definition = LinkDefinition {
        href: unescape(href),
        title: title.map(unescape),
    };
    Some(link_token(image, raw, definition, text))
}

/// Destination and optional title after `(`, up to and including `)`.
fn link_target(src: &str) -> Option<(&str, Option<&str>, usize)> {
    let mut i = src.len() - src.trim_start().len();

    let href = if src[i..].starts_with('<') {
        let end = src[i + 1..].find(['>', '<', '\n'])?;
        if src.as_bytes()[i + 1 + end] != b'>' {
            return None;
        }
        let href = &src[i + 1..i + 1 + end];
        i += end + 2;
        href
    } else {
        let start = i;
        let mut depth = 0usize;
        while let Some(c) = src[i..].chars().next() {
            match c {
                '\\' if i + 1 < src.len() => i += char_len_at(src, i + 1),
                '(' if depth == MAX_LINK_PARENS => return None,
                '(' => depth += 1,
                ')' if depth == 0 => break,
                ')' => depth -= 1,
                c if c.is_whitespace() || c.is_control() => break,
                _ => {}
            }
            i += c.len_utf8();
        }
        &src[start..i]
    };

    let spaces = src[i..].len() - src[i..].trim_start().len();
    let mut title = None;
    if spaces > 0 {
        let after = &src[i + spaces..];
        if let Some(len) = title_len(after) {
            title = Some(&after[1..len - 1]);
            i += spaces + len;
        }
    }
    i += src[i..].len() - src[i..].trim_start().len();
    src[i..].starts_with(')').then_some((href, title, i + 1))
}

/// Length of a quoted (`"…"`, `'…'`) or parenthesized link title.
/// A parenthesized title may not contain an unescaped `(`.
fn title_len(src: &str) -> Option<usize> {
    let close = match src.chars().next()? {
        '"' => '"',
        '\'' => '\'',
        '(' => ')',
        _ => return None,
    };
    let mut escaped = false;
    for (i, c) in src.char_indices().skip(1) {
        match c {
            '\\' if !escaped => escaped = true,
            c if c == close && !escaped => return Some(i + 1),
            '(' if close == ')' && !escaped => return None,
            _ => escaped = false,
        }
    }
    None
}

fn link_token(image: bool, raw: &str, definition: LinkDefinition, text: &str) -> Token {
    let LinkDefinition { href, title } = definition;
    let raw = raw.to_owned();
    let text = text.to_owned();
    if image {
        Token::Image {
            raw,
            href,
            title,
            text,
        }
    } else {
        Token::Link {
            raw,
            href,
            title,
            text,
        }
    }
}

fn codespan(ahead: &Lookahead<'_>, pos: usize) -> Option<Token> {
    let src = &ahead.src[pos..];
    let fence = run_len(src, '`');
    let closable = ahead
        .backtick_runs
        .get(&fence)
        .is_some_and(|&last| last > pos + fence);
    if fence == 0 || !closable {
        return None;
    }

    let mut i = fence;
    loop {
        let start = i + src[i..].find('`')?;
        let run = run_len(&src[start..], '`');
        if run == fence {
            let content = src[fence..start].replace('\n', " ");
            let strip = content.len() >= 2
                && content.starts_with(' ')
                && content.ends_with(' ')
                && content.contains(|c| c != ' ');
            let text = if strip {
                content[1..content.len() - 1].to_owned()
            } else {
                content
            };
            return Some(Token::Codespan {
                raw: src[..start + run].to_owned(),
                text,
            });
        }
        i = start + run;
    }
}

/// Hard line break. With `breaks` every newline inside a paragraph is one;
/// otherwise it takes two trailing spaces or a backslash. A break never ends
/// the content.
fn line_break(ahead: &Lookahead<'_>, pos: usize, breaks: bool) -> Option<Token> {
    let src = &ahead.src[pos..];
    let spaces = run_len(src, ' ');
    let len = if src[spaces..].starts_with('\n') && (breaks || spaces >= 2) {
        spaces + 1
    } else if src.starts_with("\\\n") {
        2
    } else {
        return None;
    };
    if pos + len >= ahead.content_end {
        return None;
    }
    Some(Token::Br {
        raw: src[..len].to_owned(),
    })
}

/// GFM strikethrough: `~text~` or `~~text~~`.
fn strikethrough(ahead: &Lookahead<'_>, pos: usize) -> Option<Token> {
    let src = &ahead.src[pos..];
    let fence = run_len(src, '~');
    if !(1..=2).contains(&fence) {
        return None;
    }
    let body = &src[fence..];
    if body.starts_with(char::is_whitespace) || body.is_empty() {
        return None;
    }

    let closers = &ahead.tilde_closers[fence - 1];
    let next = closers.partition_point(|&start| start <= pos + fence);
    let end = closers.get(next)? - pos - fence;
    Some(Token::Del {
        raw: src[..fence + end + fence].to_owned(),
        text: body[..end].to_owned(),
        tokens: Vec::new(),
    })
}

/// `<https://example.com>` or `<user@example.com>`.
fn autolink(src: &str) -> Option<Token> {
    if let Some(caps) = AUTOLINK_URI_RE.captures(src) {
        return Some(Token::Link {
            raw: caps[0].to_owned(),
            href: caps[1].to_owned(),
            title: None,
            text: caps[1].to_owned(),
        });
    }
    let caps = AUTOLINK_EMAIL_RE.captures(src)?;
    Some(Token::Link {
        raw: caps[0].to_owned(),
        href: format!("mailto:{}", &caps[1]),
        title: None,
        text: caps[1].to_owned(),
    })
}

/// GFM bare URL. The link's href is its raw source.
fn bare_url(src: &str) -> Option<Token> {
    let url = trim_url(URL_RE.find(src)?.as_str());
    Some(Token::Link {
        raw: url.to_owned(),
        href: url.to_owned(),
        title: None,
        text: url.to_owned(),
    })
}

/// Drop trailing punctuation, a trailing entity and unbalanced closing
/// parentheses from a bare URL.
fn trim_url(mut url: &str) -> &str {
    let opening = url.matches('(').count();
    let mut closing = url.matches(')').count();
    loop {
        let mut trimmed = url.trim_end_matches(['?', '!', '.', ',', ':', ';', '*', '_', '\'', '"', '~']);
        if let Some(body) = url.strip_suffix(';') {
            let name = body.len()
                - body
                    .trim_end_matches(|c: char| c.is_ascii_alphanumeric())
                    .len();
            if name > 0 && body[..body.len() - name].ends_with('&') {
                trimmed = &body[..body.len() - name - 1];
            }
        }
        if trimmed.ends_with(')') && opening < closing {
            trimmed = &trimmed[..trimmed.len() - 1];
            closing -= 1;
        }
        if trimmed.len() == url.len() {
            return url;
        }
        url = trimmed;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::lexer::tests::{kinds, lex_inline};
    use crate::token::TokenKind;

    #[test]
    fn test_plain_text_merges() {
        let tokens = lex_inline("hello world!");
        assert_eq!(tokens, vec![Token::text("hello world!")]);
    }

    #[test]
    fn test_escape() {
        let tokens = lex_inline(r"\*not em\*");
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Escape, TokenKind::Text, TokenKind::Escape]
        );
    }

    #[test]
    fn test_emphasis_kinds() {
        assert_eq!(kinds(&lex_inline("*a*")), vec![TokenKind::Em]);
        assert_eq!(kinds(&lex_inline("**a**")), vec![TokenKind::Strong]);
        assert_eq!(kinds(&lex_inline("snake_case_name")), vec![TokenKind::Text]);
    }

    #[test]
    fn test_emphasis_children() {
        let tokens = lex_inline("_a `b` c_");
        let Token::Em { tokens: inner, text, .. } = &tokens[0] else {
            panic!("expected em, got {tokens:?}");
        };
        assert_eq!(text, "a `b` c");
        assert_eq!(
            kinds(inner),
            vec![TokenKind::Text, TokenKind::Codespan, TokenKind::Text]
        );
    }

    #[test]
    fn test_codespan() {
        let tokens = lex_inline("`` a`b ``");
        assert_eq!(
            tokens,
            vec![Token::Codespan {
                raw: "`` a`b ``".to_owned(),
                text: "a`b".to_owned(),
            }]
        );
        assert_eq!(kinds(&lex_inline("`open")), vec![TokenKind::Text]);
    }

    #[test]
    fn test_line_break_with_breaks() {
        let tokens = lex_inline("a\nb\n");
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Text, TokenKind::Br, TokenKind::Text]
        );
        assert_eq!(tokens[2].raw(), "b\n");
    }

    #[test]
    fn test_strikethrough() {
        let tokens = lex_inline("~~gone~~ and ~also~");
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Del, TokenKind::Text, TokenKind::Del]
        );
        assert_eq!(kinds(&lex_inline("~~ spaced~~")), vec![TokenKind::Text]);
    }

    #[test]
    fn test_inline_link() {
        let tokens = lex_inline(r#"see [the docs](https://example.com/a_(b) "Title") now"#);
        assert_eq!(
            tokens[1],
            Token::Link {
                raw: r#"[the docs](https://example.com/a_(b) "Title")"#.to_owned(),
                href: "https://example.com/a_(b)".to_owned(),
                title: Some("Title".to_owned()),
                text: "the docs".to_owned(),
            }
        );
    }

    #[test]
    fn test_image() {
        let tokens = lex_inline("![alt](pic.png)");
        assert!(matches!(&tokens[0], Token::Image { href, text, .. } if href == "pic.png" && text == "alt"));
    }

    #[test]
    fn test_unknown_reference_is_text() {
        assert_eq!(lex_inline("[not a link]"), vec![Token::text("[not a link]")]);
    }

    #[test]
    fn test_bare_url() {
        let tokens = lex_inline("visit https://example.com/path, then");
        assert_eq!(
            tokens[1],
            Token::Link {
                raw: "https://example.com/path".to_owned(),
                href: "https://example.com/path".to_owned(),
                title: None,
                text: "https://example.com/path".to_owned(),
            }
        );
        assert_eq!(tokens[2], Token::text(", then"));
    }

    #[test]
    fn test_autolink() {
        let tokens = lex_inline("<mailto:me@example.com> <me@example.com>");
        assert!(matches!(&tokens[0], Token::Link { href, raw, .. }
            if href == "mailto:me@example.com" && raw == "<mailto:me@example.com>"));
        assert!(matches!(&tokens[2], Token::Link { href, .. } if href == "mailto:me@example.com"));
    }

    #[test]
    fn test_raw_html_tag() {
        let tokens = lex_inline("a <b>bold</b>");
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Text, TokenKind::Tag, TokenKind::Text, TokenKind::Tag]
        );
    }

    #[test]
    fn test_text_stops_at_extension_start() {
        let tokens = lex_inline("muted ⣿note⣿ end");
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Text, TokenKind::Extension, TokenKind::Text]
        );
        assert_eq!(tokens[0].raw(), "muted ");
    }

    #[test]
    fn test_trim_url() {
        assert_eq!(trim_url("https://a.com/x)."), "https://a.com/x");
        assert_eq!(trim_url("https://a.com/(x)"), "https://a.com/(x)");
        assert_eq!(trim_url("https://a.com/?q=1&amp;"), "https://a.com/?q=1");
        assert_eq!(trim_url("https://a.com/x&;"), "https://a.com/x&");
        assert_eq!(trim_url("https://a.com/x).);."), "https://a.com/x");
    }

    #[test]
    fn test_closing_bracket_is_remembered() {
        let links = HashMap::new();
        let ahead = Lookahead::new("[a [b] `]` [c", &links, 0);
        assert_eq!(ahead.closing_bracket(0), None);
        assert_eq!(ahead.brackets.borrow().get(&3), Some(&Some(5)));
        assert_eq!(ahead.brackets.borrow().get(&11), Some(&None));
        assert_eq!(ahead.closing_bracket(3), Some(5));

        let ahead = Lookahead::new("[[a] b]", &links, 0);
        assert_eq!(ahead.closing_bracket(1), Some(3));
        assert_eq!(ahead.closing_bracket(0), Some(6));
    }

    #[test]
    fn test_deep_emphasis_is_capped() {
        let src = format!("{}b{}", "_a ".repeat(200), " a_".repeat(200));
        let mut tokens = lex_inline(&src);
        let mut depth = 0;
        while let Some(Token::Em { tokens: inner, .. }) =
            tokens.iter().find(|t| t.kind() == TokenKind::Em)
        {
            depth += 1;
            tokens = inner.clone();
        }
        assert_eq!(depth, MAX_NESTING);
        assert_eq!(kinds(&tokens), vec![TokenKind::Text]);
    }

    #[test]
    fn test_long_unmatched_input_is_fast() {
        let units = [
            "*a ", "_a ", "**a ", "[a ", "[a](", "[a](x (", "~a ", "~~a ", "<? ", "<!a ",
            "⣿ ", "a    ", "\n",
        ];
        for unit in units {
            let src = unit.repeat(20_000);
            let started = Instant::now();
            let tokens = lex_inline(&src);
            assert!(started.elapsed().as_secs() < 2, "{unit:?}");
            assert!(!tokens.is_empty());
        }
    }

    #[test]
    fn test_link_destination_paren_depth() {
        let nested = format!("[a]({}x{})", "(".repeat(32), ")".repeat(32));
        assert_eq!(kinds(&lex_inline(&nested)), vec![TokenKind::Link]);
        let deeper = format!("[a]({}x{})", "(".repeat(33), ")".repeat(33));
        assert!(!kinds(&lex_inline(&deeper)).contains(&TokenKind::Link));
    }

    #[test]
    fn test_parenthesized_title_rejects_open_paren() {
        assert_eq!(title_len("(a) b"), Some(3));
        assert_eq!(title_len(r"(a\(b) c"), Some(6));
        assert_eq!(title_len("(a(b) c"), None);
    }

    #[test]
    fn test_mask_hides_code_and_escapes() {
        let links = HashMap::new();
        assert_eq!(mask(r"a `*` \* <x*>", &links), "a [a] ++ [aa]");
    }
}
