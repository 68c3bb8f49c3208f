//! Block-level rules.
//!
//! Rules are tried in a fixed order at the start of each line. Every rule
//! returns the token it recognized together with the number of source bytes it
//! consumed, so consecutive raw spans always tile the input.

use super::scan::{
    DEFINITION_RE, HTML_TAG_LINE_RE, expand_leading_tabs, is_blank, leading_newlines,
    leading_spaces, next_line, run_len, unescape,
};
use super::{Lexer, LinkDefinition, MAX_NESTING, normalize_label};
use crate::token::{List, ListItem, Token};

/// Tag names that open an HTML block which runs to the next blank line.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "base", "basefont", "blockquote", "body", "caption", "center",
    "col", "colgroup", "dd", "details", "dialog", "dir", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "frame", "frameset", "h1", "h2", "h3", "h4", "h5",
    "h6", "head", "header", "hr", "html", "iframe", "legend", "li", "link", "main", "menu",
    "menuitem", "meta", "nav", "noframes", "ol", "optgroup", "option", "p", "param", "search",
    "section", "summary", "table", "tbody", "td", "tfoot", "th", "thead", "title", "tr", "track",
    "ul",
];

/// Tags whose HTML block runs until the matching closing tag.
const RAW_TAGS: &[&str] = &["script", "pre", "style", "textarea"];

type Matched = Option<(Token, usize)>;

impl Lexer<'_> {
    /// Split `src` into block tokens.
    ///
    /// `top` is false inside list items, where paragraphs become tight `Text`
    /// blocks and any list marker starts a nested list.
    pub(super) fn block_tokens(&mut self, src: &str, top: bool) -> Vec<Token> {
        let src = expand_leading_tabs(src);
        let mut tokens = Vec::new();
        let mut rest: &str = &src;
        while !rest.is_empty() {
            let consumed = self.block_token(rest, top, &mut tokens);
            rest = &rest[consumed..];
        }
        tokens
    }

    fn block_token(&mut self, src: &str, top: bool, tokens: &mut Vec<Token>) -> usize {
        let blank = blank_run(src);
        if blank > 0 {
            match tokens.last_mut() {
                Some(last) if blank == 1 => last.raw_mut().push_str(&src[..blank]),
                _ => tokens.push(Token::Space {
                    raw: src[..blank].to_owned(),
                }),
            }
            return blank;
        }

        if let Some(consumed) = self.definition(src) {
            return consumed;
        }

        let (token, consumed) = indented_code(src)
            .or_else(|| fenced_code(src))
            .or_else(|| atx_heading(src))
            .or_else(|| thematic_break(src))
            .or_else(|| self.blockquote(src))
            .or_else(|| self.list(src))
            .or_else(|| html_block(src))
            .or_else(|| self.table(src))
            .unwrap_or_else(|| self.paragraph(src, top));

        tracing::trace!(kind = %token.kind(), consumed, "Block token");
        tokens.push(token);
        consumed
    }

    /// Run `f` one quote or list level deeper.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// `[label]: href "title"`. Stored for reference links, never emitted.
    fn definition(&mut self, src: &str) -> Option<usize> {
        let (line, consumed) = next_line(src);
        let caps = DEFINITION_RE.captures(line)?;
        let label = normalize_label(&caps[1]);
        if label.is_empty() {
            return None;
        }

        let href = &caps[2];
        let href = href
            .strip_prefix('<')
            .and_then(|h| h.strip_suffix('>'))
            .unwrap_or(href);
        let title = caps
            .get(3)
            .map(|m| unescape(&m.as_str()[1..m.as_str().len() - 1]));

        self.links.entry(label).or_insert_with(|| LinkDefinition {
            href: unescape(href),
            title,
        });
        Some(consumed)
    }

    fn blockquote(&mut self, src: &str) -> Matched {
        if self.depth >= MAX_NESTING {
            return None;
        }
        let mut pos = 0;
        while pos < src.len() {
            let (line, consumed) = next_line(&src[pos..]);
            let Some(content) = quote_content(line) else {
                break;
            };
            pos += consumed;

            if content.is_empty() {
                continue;
            }
            // Lazy continuation of a quoted paragraph.
            while pos < src.len() {
                let rest = &src[pos..];
                let (next, consumed) = next_line(rest);
                if is_blank(next) || self.interrupts_paragraph(next, rest, true) {
                    break;
                }
                pos += consumed;
            }
        }
        if pos == 0 {
            return None;
        }

        let raw = &src[..pos];
        let text: String = raw
            .split_inclusive('\n')
            .map(|line| quote_content(line).unwrap_or(line))
            .collect();
        let tokens = self.nested(|lexer| lexer.block_tokens(&text, true));
        Some((
            Token::Blockquote {
                raw: raw.to_owned(),
                tokens,
            },
            pos,
        ))
    }

    fn list(&mut self, src: &str) -> Matched {
        if self.depth >= MAX_NESTING {
            return None;
        }
        let (first, _) = next_line(src);
        let (head, _) = list_marker(first)?;

        let mut items = Vec::new();
        let mut loose = false;
        let mut ends_with_blank = false;
        let mut pos = 0;

        while pos < src.len() {
            let (line, consumed) = next_line(&src[pos..]);
            let Some((marker, after)) = list_marker(line) else {
                break;
            };
            if !marker.continues(&head) || is_hr(line) {
                break;
            }
            let item_start = pos;
            pos += consumed;

            let mut blank_line = is_blank(after);
            let (indent, mut contents) = if blank_line {
                (marker.width + 1, String::new())
            } else {
                let spaces = leading_spaces(after);
                let spaces = if spaces > 4 { 1 } else { spaces };
                (marker.width + spaces, after[spaces..].to_owned())
            };
            let mut previous = after;

            // An item can start with at most one blank line.
            let mut ended_early = false;
            if blank_line && pos < src.len() {
                let (next, consumed) = next_line(&src[pos..]);
                if is_blank(next) {
                    pos += consumed;
                    ended_early = true;
                }
            }

            if !ended_early {
                let max_indent = indent.saturating_sub(1).min(3);
                while pos < src.len() {
                    let (next, consumed) = next_line(&src[pos..]);
                    if ends_list_item(next, max_indent) {
                        break;
                    }
                    if leading_spaces(next) >= indent || is_blank(next) {
                        contents.push('\n');
                        contents.push_str(dedent(next, indent));
                    } else {
                        if blank_line || !continues_lazily(previous) {
                            break;
                        }
                        contents.push('\n');
                        contents.push_str(next);
                    }
                    if is_blank(next) {
                        blank_line = true;
                    }
                    pos += consumed;
                    previous = dedent(next, indent);
                }
            }

            let raw = &src[item_start..pos];
            if !loose {
                if ends_with_blank {
                    loose = true;
                } else if ends_with_blank_line(raw) {
                    ends_with_blank = true;
                }
            }

            let mut item = ListItem {
                raw: raw.to_owned(),
                task: false,
                checked: false,
                loose: false,
                text: contents,
                tokens: Vec::new(),
            };
            if self.grammar.options.gfm
                && let Some((checked, skip)) = task_marker(&item.text)
            {
                item.task = true;
                item.checked = checked;
                item.text.replace_range(..skip, "");
            }
            items.push(item);
        }

        let last = items.last_mut()?;
        last.raw.truncate(last.raw.trim_end().len());
        last.text.truncate(last.text.trim_end().len());
        let raw = src[..pos].trim_end();

        for item in &mut items {
            item.tokens = self.nested(|lexer| lexer.block_tokens(&item.text, false));
            loose = loose
                || item.tokens.iter().any(|token| {
                    matches!(token, Token::Space { raw } if raw.matches('\n').count() >= 2)
                });
        }
        for item in &mut items {
            item.loose = loose;
        }

        let list = List {
            raw: raw.to_owned(),
            ordered: head.ordered,
            start: head.start,
            loose,
            items,
        };
        Some((Token::List(list), raw.len()))
    }

    fn table(&self, src: &str) -> Matched {
        if !self.grammar.options.gfm {
            return None;
        }
        let (header, header_len) = next_line(src);
        if is_blank(header) || header_len == header.len() {
            return None;
        }
        let (delimiter, delimiter_len) = next_line(&src[header_len..]);
        if !delimiter.contains(['|', ':']) || leading_spaces(delimiter) > 3 {
            return None;
        }
        let aligns = split_cells(delimiter);
        if !aligns.iter().all(|cell| is_delimiter_cell(cell))
            || split_cells(header).len() != aligns.len()
        {
            return None;
        }

        let mut pos = header_len + delimiter_len;
        while pos < src.len() {
            let rest = &src[pos..];
            let (row, consumed) = next_line(rest);
            if is_blank(row) || leading_spaces(row) >= 4 || starts_block(row) {
                break;
            }
            pos += consumed;
        }
        pos += leading_newlines(&src[pos..]);

        Some((
            Token::Table {
                raw: src[..pos].to_owned(),
            },
            pos,
        ))
    }

    /// Paragraph (or tight `Text` block), possibly turned into a setext
    /// heading by an underline.
    fn paragraph(&self, src: &str, top: bool) -> (Token, usize) {
        let (first, mut pos) = next_line(src);
        let mut end = first.len();

        while pos < src.len() {
            let rest = &src[pos..];
            let (line, consumed) = next_line(rest);
            if let Some(depth) = setext_underline(line) {
                let consumed = pos + consumed;
                let consumed = consumed + leading_newlines(&src[consumed..]);
                let heading = Token::Heading {
                    raw: src[..consumed].to_owned(),
                    depth,
                    text: src[..end].trim().to_owned(),
                };
                return (heading, consumed);
            }
            if is_blank(line) || self.interrupts_paragraph(line, rest, top) {
                break;
            }
            end = pos + line.len();
            pos += consumed;
        }

        let raw = src[..end].to_owned();
        let text = raw.clone();
        let token = if top {
            Token::Paragraph {
                raw,
                text,
                tokens: Vec::new(),
            }
        } else {
            Token::Text {
                raw,
                text,
                tokens: Vec::new(),
            }
        };
        (token, end)
    }

    /// Whether `line` starts a block that ends the paragraph above it.
    ///
    /// At the top level only bullets and lists numbered from 1 interrupt;
    /// inside list items any marker does, which is how nested lists start.
    fn interrupts_paragraph(&self, line: &str, rest: &str, top: bool) -> bool {
        fence_open(line).is_some()
            || heading_depth(line).is_some()
            || is_hr(line)
            || quote_content(line).is_some()
            || list_marker(line).is_some_and(|(marker, after)| {
                !top || (!is_blank(after) && (!marker.ordered || marker.start == Some(1)))
            })
            || html_block_start(line).is_some_and(|(_, interrupts)| interrupts || !top)
            || self.table(rest).is_some()
    }
}

/// Run of blank lines at the start of `src`.
fn blank_run(src: &str) -> usize {
    let mut len = 0;
    while len < src.len() {
        let (line, consumed) = next_line(&src[len..]);
        if !is_blank(line) {
            break;
        }
        len += consumed;
    }
    len
}

/// Strip up to `n` leading spaces.
fn dedent(line: &str, n: usize) -> &str {
    &line[leading_spaces(line).min(n)..]
}

fn indented_code(src: &str) -> Matched {
    let mut pos = 0;
    while pos < src.len() {
        let (line, consumed) = next_line(&src[pos..]);
        let is_code = leading_spaces(line) >= 4 && line.len() > 4;
        if !is_code && !(pos > 0 && is_blank(line)) {
            break;
        }
        pos += consumed;
    }
    if pos == 0 {
        return None;
    }

    let raw = &src[..pos];
    let text = raw
        .lines()
        .map(|line| dedent(line, 4))
        .collect::<Vec<_>>()
        .join("\n");
    let text = text.trim_end_matches('\n').to_owned();
    Some((
        Token::Code {
            raw: raw.to_owned(),
            lang: None,
            text,
        },
        pos,
    ))
}

struct Fence<'a> {
    indent: usize,
    marker: char,
    len: usize,
    info: &'a str,
}

fn fence_open(line: &str) -> Option<Fence<'_>> {
    let indent = leading_spaces(line);
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let marker = rest.chars().next().filter(|c| matches!(c, '`' | '~'))?;
    let len = run_len(rest, marker);
    let info = &rest[len..];
    if len < 3 || (marker == '`' && info.contains('`')) {
        return None;
    }
    Some(Fence {
        indent,
        marker,
        len,
        info,
    })
}

fn closes_fence(line: &str, fence: &Fence<'_>) -> bool {
    let indent = leading_spaces(line);
    if indent > 3 {
        return false;
    }
    let rest = &line[indent..];
    run_len(rest, fence.marker) >= fence.len
        && rest
            .trim_start_matches(['`', '~'])
            .bytes()
            .all(|b| b == b' ')
}

fn fenced_code(src: &str) -> Matched {
    let (first, mut pos) = next_line(src);
    let fence = fence_open(first)?;

    let mut lines = Vec::new();
    let mut end = src.len();
    while pos < src.len() {
        let (line, consumed) = next_line(&src[pos..]);
        if closes_fence(line, &fence) {
            end = pos + line.len();
            break;
        }
        lines.push(dedent(line, fence.indent));
        pos += consumed;
    }

    let lang = unescape(fence.info.trim());
    Some((
        Token::Code {
            raw: src[..end].to_owned(),
            lang: (!lang.is_empty()).then_some(lang),
            text: lines.join("\n"),
        },
        end,
    ))
}

/// Depth of an ATX heading line (`# title`).
fn heading_depth(line: &str) -> Option<u8> {
    let indent = leading_spaces(line);
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let depth = run_len(rest, '#');
    let after = &rest[depth..];
    if !(1..=6).contains(&depth) || !(after.is_empty() || after.starts_with([' ', '\t'])) {
        return None;
    }
    u8::try_from(depth).ok()
}

fn atx_heading(src: &str) -> Matched {
    let (line, consumed) = next_line(src);
    let depth = heading_depth(line)?;

    let content = line.trim_start()[usize::from(depth)..].trim();
    let mut text = content;
    if content.ends_with('#') {
        let stripped = content.trim_end_matches('#');
        if stripped.is_empty() || stripped.ends_with(' ') {
            text = stripped.trim();
        }
    }

    let consumed = consumed + leading_newlines(&src[consumed..]);
    Some((
        Token::Heading {
            raw: src[..consumed].to_owned(),
            depth,
            text: text.to_owned(),
        },
        consumed,
    ))
}

/// Body of a thematic break once indentation is removed: three or more of
/// the same `-`, `_` or `*`, optionally separated by spaces.
fn is_hr_body(rest: &str) -> bool {
    let Some(c) = rest.chars().next().filter(|c| matches!(c, '-' | '_' | '*')) else {
        return false;
    };
    rest.chars().all(|x| x == c || x == ' ' || x == '\t') && rest.matches(c).count() >= 3
}

fn is_hr(line: &str) -> bool {
    let indent = leading_spaces(line);
    indent <= 3 && is_hr_body(&line[indent..])
}

fn thematic_break(src: &str) -> Matched {
    let (line, consumed) = next_line(src);
    if !is_hr(line) {
        return None;
    }
    let consumed = consumed + leading_newlines(&src[consumed..]);
    Some((
        Token::Hr {
            raw: src[..consumed].to_owned(),
        },
        consumed,
    ))
}

/// `=` or `-` underline of a setext heading.
fn setext_underline(line: &str) -> Option<u8> {
    let indent = leading_spaces(line);
    if indent > 3 {
        return None;
    }
    let rest = line[indent..].trim_end_matches(' ');
    let c = rest.chars().next()?;
    let depth = match c {
        '=' => 1,
        '-' => 2,
        _ => return None,
    };
    rest.chars().all(|x| x == c).then_some(depth)
}

/// Content of a quoted line with `>` and one following space removed.
fn quote_content(line: &str) -> Option<&str> {
    let indent = leading_spaces(line);
    if indent > 3 {
        return None;
    }
    let rest = line[indent..].strip_prefix('>')?;
    Some(rest.strip_prefix([' ', '\t']).unwrap_or(rest))
}

struct ListMarker {
    ordered: bool,
    /// Bullet character, or the delimiter (`.` or `)`) of an ordered marker.
    delimiter: char,
    start: Option<u32>,
    /// Indentation plus marker.
    width: usize,
}

impl ListMarker {
    fn continues(&self, head: &Self) -> bool {
        self.ordered == head.ordered && self.delimiter == head.delimiter
    }
}

/// Bullet (`-`, `*`, `+`) or ordered (`1.`, `1)`) marker followed by a space,
/// a tab or the end of the line. Returns the marker and the rest of the line.
fn list_marker(line: &str) -> Option<(ListMarker, &str)> {
    let indent = leading_spaces(line);
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let (len, ordered, delimiter, start) = match *rest.as_bytes().first()? {
        b @ (b'*' | b'+' | b'-') => (1, false, char::from(b), None),
        b'0'..=b'9' => {
            let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
            let delimiter = rest[digits..]
                .chars()
                .next()
                .filter(|c| matches!(c, '.' | ')'))?;
            if digits > 9 {
                return None;
            }
            (digits + 1, true, delimiter, rest[..digits].parse().ok())
        }
        _ => return None,
    };

    let after = &rest[len..];
    if !(after.is_empty() || after.starts_with([' ', '\t'])) {
        return None;
    }
    let marker = ListMarker {
        ordered,
        delimiter,
        start,
        width: indent + len,
    };
    Some((marker, after))
}

/// Whether `line`, indented by at most `max_indent`, starts a block that ends
/// the current list item.
fn ends_list_item(line: &str, max_indent: usize) -> bool {
    let indent = leading_spaces(line);
    if indent > max_indent {
        return false;
    }
    let rest = &line[indent..];
    rest.starts_with("```")
        || rest.starts_with("~~~")
        || rest.starts_with('#')
        || starts_html(rest)
        || list_marker(rest).is_some()
        || is_hr_body(rest)
}

/// `<` followed by a tag-like line or a comment opener.
fn starts_html(rest: &str) -> bool {
    let Some(after) = rest.strip_prefix('<') else {
        return false;
    };
    after.starts_with("!--")
        || (after.starts_with(|c: char| c.is_ascii_alphabetic()) && after.contains('>'))
}

/// Whether a line can be followed by a lazy continuation line inside a list
/// item: only paragraph text can.
fn continues_lazily(previous: &str) -> bool {
    leading_spaces(previous) < 4
        && fence_open(previous).is_none()
        && !previous.trim_start().starts_with('#')
        && !is_hr(previous)
}

fn ends_with_blank_line(raw: &str) -> bool {
    raw.trim_end_matches([' ', '\t'])
        .strip_suffix('\n')
        .is_some_and(|rest| rest.trim_end_matches([' ', '\t']).ends_with('\n'))
}

/// `[ ] ` or `[x] ` at the start of an item. Returns whether the box is
/// checked and how many bytes the marker and following spaces take.
fn task_marker(text: &str) -> Option<(bool, usize)> {
    let [b'[', mark @ (b' ' | b'x' | b'X'), b']', b' ', ..] = text.as_bytes() else {
        return None;
    };
    Some((*mark != b' ', 3 + run_len(&text[3..], ' ')))
}

enum HtmlBlockEnd {
    /// Line containing this lowercase marker, inclusive.
    Marker(String),
    BlankLine,
}

/// Recognize the start of an HTML block. The flag tells whether this kind of
/// block may interrupt a paragraph.
fn html_block_start(line: &str) -> Option<(HtmlBlockEnd, bool)> {
    let indent = leading_spaces(line);
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let lower = rest.to_ascii_lowercase();
    let after = lower.strip_prefix('<')?;

    let tag_ends = |name: &str, tail: &str| {
        tail.strip_prefix(name).is_some_and(|t| {
            t.is_empty() || t.starts_with(|c: char| c.is_ascii_whitespace() || c == '>')
                || t.starts_with("/>")
        })
    };

    if let Some(tag) = RAW_TAGS.iter().find(|tag| tag_ends(tag, after)) {
        return Some((HtmlBlockEnd::Marker(format!("</{tag}>")), true));
    }
    if after.starts_with("!--") {
        return Some((HtmlBlockEnd::Marker("-->".to_owned()), true));
    }
    if after.starts_with('?') {
        return Some((HtmlBlockEnd::Marker("?>".to_owned()), true));
    }
    if after.starts_with("![cdata[") {
        return Some((HtmlBlockEnd::Marker("]]>".to_owned()), true));
    }
    if after.starts_with('!') && after[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Some((HtmlBlockEnd::Marker(">".to_owned()), true));
    }
    let name = after.strip_prefix('/').unwrap_or(after);
    if BLOCK_TAGS.iter().any(|tag| tag_ends(tag, name)) {
        return Some((HtmlBlockEnd::BlankLine, true));
    }
    HTML_TAG_LINE_RE
        .is_match(line)
        .then_some((HtmlBlockEnd::BlankLine, false))
}

fn html_block(src: &str) -> Matched {
    let (first, _) = next_line(src);
    let (end, _) = html_block_start(first)?;

    let mut pos = 0;
    while pos < src.len() {
        let (line, consumed) = next_line(&src[pos..]);
        match &end {
            HtmlBlockEnd::BlankLine if is_blank(line) => break,
            HtmlBlockEnd::BlankLine => pos += consumed,
            HtmlBlockEnd::Marker(marker) => {
                pos += consumed;
                if line.to_ascii_lowercase().contains(marker.as_str()) {
                    break;
                }
            }
        }
    }

    let raw = src[..pos].to_owned();
    Some((
        Token::Html {
            text: raw.clone(),
            raw,
        },
        pos,
    ))
}

/// Whether a table row line is really the start of another block.
fn starts_block(line: &str) -> bool {
    fence_open(line).is_some()
        || heading_depth(line).is_some()
        || is_hr(line)
        || quote_content(line).is_some()
        || list_marker(line).is_some_and(|(_, after)| !is_blank(after))
        || html_block_start(line).is_some_and(|(_, interrupts)| interrupts)
}

/// Cells of a table row, with outer pipes dropped. Escaped pipes do not split.
fn split_cells(row: &str) -> Vec<&str> {
    let row = row.trim();
    let row = row.strip_prefix('|').unwrap_or(row);
    let row = match row.strip_suffix('|') {
        Some(stripped) if !stripped.ends_with('\\') => stripped,
        _ => row,
    };

    let mut cells = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, b) in row.bytes().enumerate() {
        match b {
            b'\\' => escaped = !escaped,
            b'|' if !escaped => {
                cells.push(row[start..i].trim());
                start = i + 1;
            }
            _ => escaped = false,
        }
    }
    cells.push(row[start..].trim());
    cells
}

fn is_delimiter_cell(cell: &str) -> bool {
    let cell = cell.strip_prefix(':').unwrap_or(cell);
    let cell = cell.strip_suffix(':').unwrap_or(cell);
    !cell.is_empty() && cell.bytes().all(|b| b == b'-')
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::lexer::tests::{kinds, lex};
    use crate::token::TokenKind;

    #[test]
    fn test_blank_lines() {
        let tokens = lex("a\n\n\nb");
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Paragraph, TokenKind::Space, TokenKind::Paragraph]
        );
        assert_eq!(tokens[1].raw(), "\n\n\n");
    }

    #[test]
    fn test_single_newline_folds_into_previous_token() {
        let tokens = lex("# Title\n> quote\n\n- a\n");
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Heading, TokenKind::Blockquote, TokenKind::List]
        );
        assert_eq!(tokens[1].raw(), "> quote\n\n");
        assert_eq!(tokens[2].raw(), "- a\n");
    }

    #[test]
    fn test_paragraph_lines_join() {
        let tokens = lex("one\ntwo\nthree");
        assert_eq!(kinds(&tokens), vec![TokenKind::Paragraph]);
        let Token::Paragraph { text, .. } = &tokens[0] else {
            unreachable!();
        };
        assert_eq!(text, "one\ntwo\nthree");
    }

    #[test]
    fn test_atx_heading() {
        let tokens = lex("## Title ##\n\ntext");
        assert!(matches!(
            &tokens[0],
            Token::Heading { depth: 2, text, raw } if text == "Title" && raw == "## Title ##\n\n"
        ));
        assert_eq!(kinds(&lex("#hashtag")), vec![TokenKind::Paragraph]);
    }

    #[test]
    fn test_setext_heading() {
        let tokens = lex("Title\n===\nnext");
        assert!(matches!(
            &tokens[0],
            Token::Heading { depth: 1, text, raw } if text == "Title" && raw == "Title\n===\n"
        ));
        assert!(matches!(&lex("Sub\n---")[0], Token::Heading { depth: 2, .. }));
    }

    #[test]
    fn test_thematic_break() {
        assert_eq!(kinds(&lex("* * *")), vec![TokenKind::Hr]);
        assert_eq!(
            kinds(&lex("a\n\n___\n\nb")),
            vec![
                TokenKind::Paragraph,
                TokenKind::Space,
                TokenKind::Hr,
                TokenKind::Paragraph
            ]
        );
    }

    #[test]
    fn test_fenced_code() {
        let tokens = lex("```rust\nfn main() {}\n```\nafter");
        assert_eq!(
            tokens[0],
            Token::Code {
                raw: "```rust\nfn main() {}\n```\n".to_owned(),
                lang: Some("rust".to_owned()),
                text: "fn main() {}".to_owned(),
            }
        );
        assert_eq!(tokens[1].kind(), TokenKind::Paragraph);
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        let tokens = lex("~~~\ncode\nmore");
        assert!(matches!(&tokens[0], Token::Code { text, .. } if text == "code\nmore"));
    }

    #[test]
    fn test_indented_code_does_not_interrupt_paragraph() {
        assert_eq!(kinds(&lex("text\n    more")), vec![TokenKind::Paragraph]);
        let tokens = lex("    let x = 1;\n      y");
        assert!(matches!(&tokens[0], Token::Code { text, .. } if text == "let x = 1;\n  y"));
    }

    #[test]
    fn test_blockquote_lazy_continuation() {
        let tokens = lex("> quoted\nlazy\n\nout");
        let Token::Blockquote { raw, tokens: inner } = &tokens[0] else {
            panic!("expected blockquote, got {tokens:?}");
        };
        assert_eq!(raw, "> quoted\nlazy\n");
        assert!(matches!(&inner[0], Token::Paragraph { text, .. } if text == "quoted\nlazy"));
    }

    #[test]
    fn test_blockquotes_split_on_blank_line() {
        assert_eq!(
            kinds(&lex("> a\n\n> b")),
            vec![TokenKind::Blockquote, TokenKind::Blockquote]
        );
    }

    #[test]
    fn test_deep_blockquote_is_capped() {
        let tokens = lex(&"> ".repeat(50_000));
        let mut depth = 0;
        let mut current = &tokens[0];
        while let Token::Blockquote { tokens: inner, .. } = current {
            depth += 1;
            current = &inner[0];
        }
        assert_eq!(depth, MAX_NESTING);
        assert!(matches!(current, Token::Paragraph { text, .. } if text.starts_with("> >")));
    }

    #[test]
    fn test_deep_list_is_capped() {
        let src = format!("{}x", "- ".repeat(10_000));
        let mut depth = 0;
        let mut tokens = lex(&src);
        while let Some(Token::List(list)) = tokens.first() {
            depth += 1;
            tokens = list.items[0].tokens.clone();
        }
        assert_eq!(depth, MAX_NESTING);
        assert!(matches!(&tokens[0], Token::Text { text, .. } if text.ends_with("- x")));
    }

    #[test]
    fn test_tight_list() {
        let tokens = lex("- a\n- b\n- c");
        let Token::List(list) = &tokens[0] else {
            panic!("expected list, got {tokens:?}");
        };
        assert!(!list.ordered);
        assert!(!list.loose);
        assert_eq!(list.items.len(), 3);
        assert_eq!(list.items[0].raw, "- a\n");
        assert_eq!(list.items[2].raw, "- c");
        assert_eq!(kinds(&list.items[0].tokens), vec![TokenKind::Text]);
    }

    #[test]
    fn test_loose_list() {
        let tokens = lex("1. a\n\n2. b");
        let Token::List(list) = &tokens[0] else {
            panic!("expected list, got {tokens:?}");
        };
        assert!(list.ordered);
        assert_eq!(list.start, Some(1));
        assert!(list.loose);
        assert!(list.items.iter().all(|item| item.loose));
    }

    #[test]
    fn test_list_changes_with_bullet() {
        assert_eq!(
            kinds(&lex("- a\n+ b")),
            vec![TokenKind::List, TokenKind::List]
        );
    }

    #[test]
    fn test_nested_list() {
        let tokens = lex("- a\n  - b\n- c");
        let Token::List(list) = &tokens[0] else {
            panic!("expected list, got {tokens:?}");
        };
        assert_eq!(list.items.len(), 2);
        assert_eq!(list.items[0].text, "a\n- b");
        assert_eq!(
            kinds(&list.items[0].tokens),
            vec![TokenKind::Text, TokenKind::List]
        );
    }

    #[test]
    fn test_task_items() {
        let tokens = lex("- [x] done\n- [ ] todo\n- [y] plain");
        let Token::List(list) = &tokens[0] else {
            panic!("expected list, got {tokens:?}");
        };
        let tasks: Vec<_> = list
            .items
            .iter()
            .map(|item| (item.task, item.checked, item.text.as_str()))
            .collect();
        assert_eq!(
            tasks,
            vec![
                (true, true, "done"),
                (true, false, "todo"),
                (false, false, "[y] plain")
            ]
        );
    }

    #[test]
    fn test_ordered_list_interrupts_only_from_one() {
        assert_eq!(
            kinds(&lex("text\n1. item")),
            vec![TokenKind::Paragraph, TokenKind::List]
        );
        assert_eq!(kinds(&lex("text\n2. item")), vec![TokenKind::Paragraph]);
    }

    #[test]
    fn test_table() {
        let src = "| a | b |\n|---|:-:|\n| 1 | 2 |\n\nafter";
        let tokens = lex(src);
        assert_eq!(
            tokens[0],
            Token::Table {
                raw: "| a | b |\n|---|:-:|\n| 1 | 2 |\n\n".to_owned()
            }
        );
        assert_eq!(tokens[1].kind(), TokenKind::Paragraph);
    }

    #[test]
    fn test_table_needs_matching_cells() {
        assert_eq!(kinds(&lex("a | b\n--|--|--")), vec![TokenKind::Paragraph]);
    }

    #[test]
    fn test_html_block() {
        let tokens = lex("<div>\n*hi*\n</div>\n\ntext");
        assert!(matches!(&tokens[0], Token::Html { raw, .. } if raw == "<div>\n*hi*\n</div>\n"));
        let tokens = lex("<!-- a\n\nb -->\nc");
        assert!(matches!(&tokens[0], Token::Html { raw, .. } if raw == "<!-- a\n\nb -->\n"));
    }

    #[test]
    fn test_split_cells() {
        assert_eq!(split_cells("| a | b \\| c |"), vec!["a", "b \\| c"]);
        assert_eq!(split_cells("a|b"), vec!["a", "b"]);
    }

    #[test]
    fn test_definition_is_not_emitted() {
        let tokens = lex("[a]: https://example.com\n\ntext");
        assert_eq!(kinds(&tokens), vec![TokenKind::Space, TokenKind::Paragraph]);
    }
}
