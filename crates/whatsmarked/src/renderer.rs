//! Token stream to HTML.
//!
//! Block and inline tokens are dispatched by kind. Kinds with a WhatsApp
//! meaning go through [`crate::rules`]; the rest use plain Markdown HTML.
//! A token that shows up where its kind does not belong is rendered as
//! unsupported.

use std::fmt::Write;

use crate::escape::{escape_html, escape_text};
use crate::lexer::{Grammar, Lexer};
use crate::rules;
use crate::token::{ExtensionToken, List, ListItem, Token};

pub(crate) struct Renderer<'a> {
    grammar: Grammar<'a>,
}

impl<'a> Renderer<'a> {
    pub(crate) fn new(grammar: Grammar<'a>) -> Self {
        Self { grammar }
    }

    /// Render block tokens.
    ///
    /// Consecutive block text tokens are joined line by line and, when `top`
    /// is set, wrapped in a single paragraph.
    pub(crate) fn parse(&self, tokens: &[Token], top: bool) -> String {
        let mut out = String::new();
        let mut tokens = tokens.iter().peekable();
        while let Some(token) = tokens.next() {
            if !matches!(token, Token::Text { .. }) {
                self.block(token, &mut out);
                continue;
            }
            let mut body = self.block_text(token);
            while let Some(next) = tokens.next_if(|t| matches!(t, Token::Text { .. })) {
                body.push('\n');
                body.push_str(&self.block_text(next));
            }
            if top {
                writeln!(out, "<p>{body}</p>").unwrap();
            } else {
                out.push_str(&body);
            }
        }
        out
    }

    pub(crate) fn parse_inline(&self, tokens: &[Token]) -> String {
        let mut out = String::new();
        for token in tokens {
            self.inline(token, &mut out);
        }
        out
    }

    fn block(&self, token: &Token, out: &mut String) {
        match token {
            Token::Space { raw } => rules::space(raw, out),
            Token::Hr { .. } => out.push_str("<hr>\n"),
            Token::Heading { raw, .. } => {
                // Headings have no WhatsApp meaning; the marker stays visible.
                let tokens = Lexer::new(self.grammar).lex_inline(raw);
                out.push_str(&self.parse_inline(&tokens));
            }
            Token::Code { lang, text, .. } => code_block(lang.as_deref(), text, out),
            Token::Blockquote { tokens, .. } => {
                out.push_str("<blockquote>\n");
                out.push_str(&self.parse(tokens, true));
                out.push_str("</blockquote>\n");
            }
            Token::List(list) => self.list(list, out),
            Token::Html { text, .. } => rules::html(text, out),
            Token::Paragraph { tokens, .. } => {
                writeln!(out, "<p>{}</p>", self.parse_inline(tokens)).unwrap();
            }
            _ => rules::unsupported(token.kind(), token.raw(), out),
        }
    }

    fn block_text(&self, token: &Token) -> String {
        match token {
            Token::Text { text, tokens, .. } if tokens.is_empty() => text.clone(),
            Token::Text { tokens, .. } => self.parse_inline(tokens),
            _ => String::new(),
        }
    }

    fn list(&self, list: &List, out: &mut String) {
        let tag = if list.ordered { "ol" } else { "ul" };
        match list.start {
            Some(start) if list.ordered && start != 1 => {
                writeln!(out, r#"<ol start="{start}">"#).unwrap();
            }
            _ => writeln!(out, "<{tag}>").unwrap(),
        }
        for item in &list.items {
            self.list_item(item, out);
        }
        writeln!(out, "</{tag}>").unwrap();
    }

    fn list_item(&self, item: &ListItem, out: &mut String) {
        out.push_str("<li>");
        if !item.task {
            out.push_str(&self.parse(&item.tokens, item.loose));
        } else if !item.loose {
            out.push_str(rules::checkbox(item.checked));
            out.push(' ');
            out.push_str(&self.parse(&item.tokens, false));
        } else if let Some((Token::Paragraph { tokens, .. }, rest)) = item.tokens.split_first() {
            writeln!(
                out,
                "<p>{} {}</p>",
                rules::checkbox(item.checked),
                self.parse_inline(tokens)
            )
            .unwrap();
            out.push_str(&self.parse(rest, true));
        } else {
            // Leading block text joins the paragraph that holds the checkbox.
            let texts = item
                .tokens
                .iter()
                .take_while(|t| matches!(t, Token::Text { .. }))
                .count();
            let (head, rest) = item.tokens.split_at(texts);
            let mut body = format!("{} ", rules::checkbox(item.checked));
            for token in head {
                body.push('\n');
                body.push_str(&self.block_text(token));
            }
            writeln!(out, "<p>{body}</p>").unwrap();
            out.push_str(&self.parse(rest, true));
        }
        out.push_str("</li>\n");
    }

    fn inline(&self, token: &Token, out: &mut String) {
        match token {
            Token::Text { text, tokens, .. } => {
                if tokens.is_empty() {
                    out.push_str(&escape_text(text));
                } else {
                    out.push_str(&self.parse_inline(tokens));
                }
            }
            Token::Escape { text, .. } => out.push_str(&escape_html(text)),
            Token::Tag { text, .. } => rules::html(text, out),
            Token::Link { raw, href, text, .. } => rules::link(href, text, raw, out),
            Token::Image {
                href, title, text, ..
            } => image(href, title.as_deref(), text, out),
            Token::Strong { raw, tokens, .. } => rules::strong(raw, &self.parse_inline(tokens), out),
            Token::Em { raw, tokens, .. } => rules::em(raw, &self.parse_inline(tokens), out),
            Token::Codespan { text, .. } => rules::codespan(text, out),
            Token::Br { .. } => out.push_str("<br>"),
            Token::Del { tokens, .. } => {
                write!(out, "<del>{}</del>", self.parse_inline(tokens)).unwrap();
            }
            Token::Extension(extension) => self.extension(extension, out),
            _ => rules::unsupported(token.kind(), token.raw(), out),
        }
    }

    fn extension(&self, token: &ExtensionToken, out: &mut String) {
        match self
            .grammar
            .extensions
            .iter()
            .find(|extension| extension.name() == token.name)
        {
            Some(extension) => out.push_str(&extension.render(token, &self.grammar.context)),
            None => {
                tracing::debug!(name = token.name, "No renderer registered for extension token");
                out.push_str(&escape_html(&token.raw));
            }
        }
    }
}

fn code_block(lang: Option<&str>, text: &str, out: &mut String) {
    let code = escape_html(&format!("{}\n", text.strip_suffix('\n').unwrap_or(text)));
    match lang.and_then(|lang| lang.split_whitespace().next()) {
        Some(lang) => writeln!(
            out,
            r#"<pre><code class="language-{}">{code}</code></pre>"#,
            escape_html(lang)
        )
        .unwrap(),
        None => writeln!(out, "<pre><code>{code}</code></pre>").unwrap(),
    }
}

fn image(href: &str, title: Option<&str>, text: &str, out: &mut String) {
    write!(
        out,
        r#"<img src="{}" alt="{}""#,
        escape_html(href),
        escape_html(text)
    )
    .unwrap();
    if let Some(title) = title.filter(|title| !title.is_empty()) {
        write!(out, r#" title="{}""#, escape_html(title)).unwrap();
    }
    out.push('>');
}
