//! The configured rendering pipeline.
//!
//! [`Whatsmarked`] bundles the parse options, the inline extensions and the
//! optional mention resolver. Configure it once and share it: rendering only
//! needs `&self`, and the resolver can be swapped at runtime.

use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use crate::escape::escape_html;
use crate::extension::{ExtensionContext, GrayText, InlineExtension, Mention, MentionResolver};
use crate::lexer::{Grammar, Lexer};
use crate::options::ParseOptions;
use crate::renderer::Renderer;
use crate::token::Token;

/// Container class for block rendering.
pub const CLASS_BLOCK: &str = "whatsmarked";

/// Container class for single-line rendering.
pub const CLASS_ONELINE: &str = "whatsmarkedOneline";

/// WhatsApp-flavoured Markdown renderer.
///
/// # Examples
///
/// ```
/// use whatsmarked::Whatsmarked;
///
/// let pipeline = Whatsmarked::new();
/// assert_eq!(pipeline.parse("*hi* ⣿there⣿"),
///     "<p><strong>hi</strong> <span class=\"graytext\">there</span></p>\n");
/// ```
pub struct Whatsmarked {
    options: ParseOptions,
    extensions: Vec<Box<dyn InlineExtension>>,
    mention_resolver: RwLock<Option<Arc<dyn MentionResolver>>>,
}

impl Default for Whatsmarked {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Whatsmarked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Whatsmarked")
            .field("options", &self.options)
            .field(
                "extensions",
                &self.extensions.iter().map(|e| e.name()).collect::<Vec<_>>(),
            )
            .field("mention_resolver", &self.has_mention_resolver())
            .finish()
    }
}

impl Whatsmarked {
    /// Pipeline with default options and the gray text and mention
    /// extensions installed.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(ParseOptions::default())
    }

    #[must_use]
    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            options,
            extensions: vec![Box::new(GrayText), Box::new(Mention)],
            mention_resolver: RwLock::new(None),
        }
    }

    /// Register an additional inline extension.
    ///
    /// Extensions are tried in registration order, before any built-in rule.
    #[must_use]
    pub fn with_extension(mut self, extension: impl InlineExtension + 'static) -> Self {
        self.extensions.push(Box::new(extension));
        self
    }

    #[must_use]
    pub fn with_mention_resolver(mut self, resolver: impl MentionResolver + 'static) -> Self {
        *self
            .mention_resolver
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(resolver));
        self
    }

    /// Install or replace the mention resolver.
    ///
    /// Until a resolver is installed, `@[...]` mentions are plain text.
    pub fn set_mention_resolver(&self, resolver: impl MentionResolver + 'static) {
        *self
            .mention_resolver
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(resolver));
    }

    pub fn clear_mention_resolver(&self) {
        *self
            .mention_resolver
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn has_mention_resolver(&self) -> bool {
        self.mention_resolver().is_some()
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Tokenize a document.
    pub fn lex(&self, src: &str) -> Vec<Token> {
        self.with_grammar(|grammar| Lexer::new(grammar).lex(src))
    }

    /// Tokenize `src` as inline content only.
    pub fn lex_inline(&self, src: &str) -> Vec<Token> {
        self.with_grammar(|grammar| Lexer::new(grammar).lex_inline(src))
    }

    /// Render a document to HTML.
    pub fn parse(&self, src: &str) -> String {
        self.with_grammar(|grammar| {
            let tokens = Lexer::new(grammar).lex(src);
            Renderer::new(grammar).parse(&tokens, true)
        })
    }

    /// Render `src` as inline content: no paragraphs, lists or quotes.
    pub fn parse_inline(&self, src: &str) -> String {
        self.with_grammar(|grammar| {
            let tokens = Lexer::new(grammar).lex_inline(src);
            Renderer::new(grammar).parse_inline(&tokens)
        })
    }

    /// Render chat text into a classed container.
    ///
    /// Returns `None` for missing or empty text. A non-empty `class_name`
    /// replaces the default class, which depends on `oneline`.
    ///
    /// # Examples
    ///
    /// ```
    /// use whatsmarked::Whatsmarked;
    ///
    /// let pipeline = Whatsmarked::new();
    /// let container = pipeline.render(Some("_hi_"), true, None).unwrap();
    /// assert_eq!(container.to_html(), r#"<div class="whatsmarkedOneline"><em>hi</em></div>"#);
    /// assert!(pipeline.render(Some(""), false, None).is_none());
    /// ```
    pub fn render(
        &self,
        text: Option<&str>,
        oneline: bool,
        class_name: Option<&str>,
    ) -> Option<Container> {
        let text = text.filter(|text| !text.is_empty())?;
        let text = space_blockquotes(text);
        let html = if oneline {
            self.parse_inline(&text)
        } else {
            self.parse(&text)
        };
        let default_class = if oneline { CLASS_ONELINE } else { CLASS_BLOCK };
        let class_name = class_name
            .filter(|class_name| !class_name.is_empty())
            .unwrap_or(default_class);
        tracing::trace!(class_name, oneline, len = text.len(), "Rendered chat text");
        Some(Container {
            class_name: class_name.to_owned(),
            html,
        })
    }

    fn mention_resolver(&self) -> Option<Arc<dyn MentionResolver>> {
        self.mention_resolver
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Arc::clone)
    }

    fn with_grammar<T>(&self, f: impl FnOnce(Grammar<'_>) -> T) -> T {
        let resolver = self.mention_resolver();
        f(Grammar {
            options: &self.options,
            extensions: &self.extensions,
            context: ExtensionContext {
                mention_resolver: resolver.as_deref(),
            },
        })
    }
}

/// Rendered chat text and the class of the element that wraps it.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Container {
    pub class_name: String,
    /// Rendered markup, to be inserted without further escaping.
    pub html: String,
}

impl Container {
    /// Wrap the markup in a `<div>` carrying the class.
    #[must_use]
    pub fn to_html(&self) -> String {
        format!(
            r#"<div class="{}">{}</div>"#,
            escape_html(&self.class_name),
            self.html
        )
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

/// Add a blank line after every quote line that is directly followed by
/// another line, so consecutive `>` lines render as separate quotes.
fn space_blockquotes(text: &str) -> Cow<'_, str> {
    if !text.lines().any(|line| line.starts_with('>')) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 16);
    let mut lines = text.split_inclusive('\n').peekable();
    while let Some(line) = lines.next() {
        out.push_str(line);
        if line.starts_with('>')
            && line.ends_with('\n')
            && !lines.peek().is_some_and(|next| next.starts_with('\n'))
        {
            out.push('\n');
        }
    }
    Cow::Owned(out)
}

static GLOBAL: LazyLock<Whatsmarked> = LazyLock::new(Whatsmarked::new);

/// Process-wide pipeline with default options.
pub fn global() -> &'static Whatsmarked {
    &GLOBAL
}

/// Render with the [`global`] pipeline.
pub fn render(text: Option<&str>, oneline: bool, class_name: Option<&str>) -> Option<Container> {
    GLOBAL.render(text, oneline, class_name)
}

/// Install the mention resolver of the [`global`] pipeline.
pub fn set_mention_resolver(resolver: impl MentionResolver + 'static) {
    GLOBAL.set_mention_resolver(resolver);
}

#[cfg(test)]
mod tests {
    // Pipelines are shared across threads, e.g. behind `global()`
    static_assertions::assert_impl_all!(super::Whatsmarked: Send, Sync);

    use pretty_assertions::assert_eq;
    use serde_json::Value;

    use super::*;

    #[test]
    fn test_space_blockquotes() {
        assert_eq!(space_blockquotes("> a\n> b"), "> a\n\n> b");
        assert_eq!(space_blockquotes("> a\n\n> b\n"), "> a\n\n> b\n\n");
        assert_eq!(space_blockquotes("a\n> b"), "a\n> b");
        assert!(matches!(space_blockquotes("a\nb"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_render_none_for_empty() {
        let pipeline = Whatsmarked::new();
        assert_eq!(pipeline.render(None, false, None), None);
        assert_eq!(pipeline.render(Some(""), true, None), None);
    }

    #[test]
    fn test_class_names() {
        let pipeline = Whatsmarked::new();
        let class = |oneline, class_name| {
            pipeline
                .render(Some("x"), oneline, class_name)
                .map(|c| c.class_name)
        };
        assert_eq!(class(false, None).as_deref(), Some(CLASS_BLOCK));
        assert_eq!(class(true, None).as_deref(), Some(CLASS_ONELINE));
        assert_eq!(class(true, Some("bubble")).as_deref(), Some("bubble"));
        assert_eq!(class(false, Some("")).as_deref(), Some(CLASS_BLOCK));
    }

    #[test]
    fn test_container_html_escapes_class() {
        let container = Container {
            class_name: "a\"b".to_owned(),
            html: "<p>x</p>".to_owned(),
        };
        assert_eq!(
            container.to_string(),
            r#"<div class="a&quot;b"><p>x</p></div>"#
        );
    }

    #[test]
    fn test_resolver_can_be_swapped() {
        let pipeline = Whatsmarked::new();
        assert!(!pipeline.has_mention_resolver());
        pipeline.set_mention_resolver(|_: &Value| "M".to_owned());
        assert!(pipeline.has_mention_resolver());
        assert_eq!(pipeline.parse_inline("@[eyJhIjoxfQ==]"), "M");
        pipeline.clear_mention_resolver();
        assert_eq!(pipeline.parse_inline("@[eyJhIjoxfQ==]"), "@[eyJhIjoxfQ==]");
    }

    #[test]
    fn test_debug_lists_extensions() {
        let debug = format!("{:?}", Whatsmarked::new());
        assert!(debug.contains(r#"["gray", "mention"]"#));
    }
}
