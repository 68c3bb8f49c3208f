//! Markdown tokenizer.
//!
//! Lexing runs in two phases, like most Markdown parsers: the block phase
//! splits the source into paragraphs, quotes, lists and the like, collecting
//! link reference definitions on the way; the inline phase then tokenizes the
//! text of every paragraph once all definitions are known.
//!
//! Inline extensions are tried before every built-in inline rule wherever
//! they report a possible start, and plain text never runs past the next
//! such position.
//!
//! Quotes, lists and emphasis nest at most `MAX_NESTING` levels deep.

mod block;
mod emphasis;
mod inline;
mod scan;

use std::borrow::Cow;
use std::collections::HashMap;

use crate::extension::{ExtensionContext, InlineExtension};
use crate::options::ParseOptions;
use crate::token::Token;

/// Everything that shapes how a source string is tokenized and rendered.
#[derive(Clone, Copy)]
pub(crate) struct Grammar<'a> {
    pub(crate) options: &'a ParseOptions,
    pub(crate) extensions: &'a [Box<dyn InlineExtension>],
    pub(crate) context: ExtensionContext<'a>,
}

/// Target of a link reference definition (`[label]: href "title"`).
#[derive(Clone, Debug)]
struct LinkDefinition {
    href: String,
    title: Option<String>,
}

/// Deepest nesting of quotes, lists and emphasis that is still parsed as
/// such. Anything nested deeper is kept as plain text.
const MAX_NESTING: usize = 64;

pub(crate) struct Lexer<'a> {
    grammar: Grammar<'a>,
    links: HashMap<String, LinkDefinition>,
    /// Current quote and list nesting of the block phase.
    depth: usize,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(grammar: Grammar<'a>) -> Self {
        Self {
            grammar,
            links: HashMap::new(),
            depth: 0,
        }
    }

    /// Tokenize a whole document: blocks first, then their inline content.
    pub(crate) fn lex(mut self, src: &str) -> Vec<Token> {
        let src = normalize_newlines(src);
        let mut tokens = self.block_tokens(&src, true);
        self.lex_inline_content(&mut tokens);
        tokens
    }

    /// Tokenize `src` as a single run of inline content.
    pub(crate) fn lex_inline(&self, src: &str) -> Vec<Token> {
        self.inline_tokens(&normalize_newlines(src))
    }

    fn lex_inline_content(&self, tokens: &mut [Token]) {
        for token in tokens {
            match token {
                Token::Paragraph { text, tokens, .. } | Token::Text { text, tokens, .. } => {
                    *tokens = self.inline_tokens(text);
                }
                Token::Blockquote { tokens, .. } => self.lex_inline_content(tokens),
                Token::List(list) => {
                    for item in &mut list.items {
                        self.lex_inline_content(&mut item.tokens);
                    }
                }
                _ => {}
            }
        }
    }
}

/// Normalize `\r\n` and lone `\r` to `\n`.
fn normalize_newlines(src: &str) -> Cow<'_, str> {
    if src.contains('\r') {
        Cow::Owned(src.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(src)
    }
}

/// Normalize a link label for lookup: case-folded, inner whitespace collapsed.
fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
