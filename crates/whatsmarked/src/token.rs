//! Token tree produced by the lexer.
//!
//! Tokens are transient: they are created for one render call and dropped
//! afterwards. Every token keeps `raw`, the exact slice of source it consumed,
//! because several render rules work on the source rather than on the parsed
//! structure.

use std::fmt;

use serde_json::Value;

/// Kind tag of a [`Token`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Space,
    Code,
    Heading,
    Hr,
    Blockquote,
    List,
    Html,
    Table,
    Paragraph,
    Text,
    Escape,
    Tag,
    Link,
    Image,
    Strong,
    Em,
    Codespan,
    Br,
    Del,
    Extension,
}

impl TokenKind {
    /// Whether tokens of this kind appear inside a line of text.
    ///
    /// `Text` is both: it is the leaf of inline content and also the block
    /// used for tight list items.
    #[must_use]
    pub fn is_inline(self) -> bool {
        matches!(
            self,
            Self::Text
                | Self::Escape
                | Self::Tag
                | Self::Link
                | Self::Image
                | Self::Strong
                | Self::Em
                | Self::Codespan
                | Self::Br
                | Self::Del
                | Self::Extension
        )
    }

    /// Whether tokens of this kind can appear at block level.
    #[must_use]
    pub fn is_block(self) -> bool {
        self == Self::Text || !self.is_inline()
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Space => "space",
            Self::Code => "code",
            Self::Heading => "heading",
            Self::Hr => "hr",
            Self::Blockquote => "blockquote",
            Self::List => "list",
            Self::Html => "html",
            Self::Table => "table",
            Self::Paragraph => "paragraph",
            Self::Text => "text",
            Self::Escape => "escape",
            Self::Tag => "tag",
            Self::Link => "link",
            Self::Image => "image",
            Self::Strong => "strong",
            Self::Em => "em",
            Self::Codespan => "codespan",
            Self::Br => "br",
            Self::Del => "del",
            Self::Extension => "extension",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified span of source text.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    /// Run of blank lines between blocks.
    Space { raw: String },
    /// Indented or fenced code block.
    Code {
        raw: String,
        lang: Option<String>,
        text: String,
    },
    /// ATX (`# title`) or setext (`title\n===`) heading.
    Heading { raw: String, depth: u8, text: String },
    /// Thematic break.
    Hr { raw: String },
    Blockquote { raw: String, tokens: Vec<Token> },
    List(List),
    /// Block-level raw HTML.
    Html { raw: String, text: String },
    /// GFM table. Only the source is kept; tables are never rendered as such.
    Table { raw: String },
    Paragraph {
        raw: String,
        text: String,
        tokens: Vec<Token>,
    },
    /// Plain text. At block level (tight list items) `tokens` holds the
    /// inline content; inline text has no children.
    Text {
        raw: String,
        text: String,
        tokens: Vec<Token>,
    },
    /// Backslash escape; `text` is the escaped character.
    Escape { raw: String, text: String },
    /// Inline raw HTML: tag, comment, declaration or CDATA.
    Tag { raw: String, text: String },
    Link {
        raw: String,
        href: String,
        title: Option<String>,
        text: String,
    },
    Image {
        raw: String,
        href: String,
        title: Option<String>,
        text: String,
    },
    Strong {
        raw: String,
        text: String,
        tokens: Vec<Token>,
    },
    Em {
        raw: String,
        text: String,
        tokens: Vec<Token>,
    },
    Codespan { raw: String, text: String },
    Br { raw: String },
    Del {
        raw: String,
        text: String,
        tokens: Vec<Token>,
    },
    /// Token produced by an inline grammar extension.
    Extension(ExtensionToken),
}

impl Token {
    #[must_use]
    pub fn kind(&self) -> TokenKind {
        match self {
            Self::Space { .. } => TokenKind::Space,
            Self::Code { .. } => TokenKind::Code,
            Self::Heading { .. } => TokenKind::Heading,
            Self::Hr { .. } => TokenKind::Hr,
            Self::Blockquote { .. } => TokenKind::Blockquote,
            Self::List(_) => TokenKind::List,
            Self::Html { .. } => TokenKind::Html,
            Self::Table { .. } => TokenKind::Table,
            Self::Paragraph { .. } => TokenKind::Paragraph,
            Self::Text { .. } => TokenKind::Text,
            Self::Escape { .. } => TokenKind::Escape,
            Self::Tag { .. } => TokenKind::Tag,
            Self::Link { .. } => TokenKind::Link,
            Self::Image { .. } => TokenKind::Image,
            Self::Strong { .. } => TokenKind::Strong,
            Self::Em { .. } => TokenKind::Em,
            Self::Codespan { .. } => TokenKind::Codespan,
            Self::Br { .. } => TokenKind::Br,
            Self::Del { .. } => TokenKind::Del,
            Self::Extension(_) => TokenKind::Extension,
        }
    }

    /// Source text consumed by this token.
    #[must_use]
    pub fn raw(&self) -> &str {
        match self {
            Self::Space { raw }
            | Self::Code { raw, .. }
            | Self::Heading { raw, .. }
            | Self::Hr { raw }
            | Self::Blockquote { raw, .. }
            | Self::Html { raw, .. }
            | Self::Table { raw }
            | Self::Paragraph { raw, .. }
            | Self::Text { raw, .. }
            | Self::Escape { raw, .. }
            | Self::Tag { raw, .. }
            | Self::Link { raw, .. }
            | Self::Image { raw, .. }
            | Self::Strong { raw, .. }
            | Self::Em { raw, .. }
            | Self::Codespan { raw, .. }
            | Self::Br { raw }
            | Self::Del { raw, .. } => raw,
            Self::List(list) => &list.raw,
            Self::Extension(token) => &token.raw,
        }
    }

    pub(crate) fn raw_mut(&mut self) -> &mut String {
        match self {
            Self::Space { raw }
            | Self::Code { raw, .. }
            | Self::Heading { raw, .. }
            | Self::Hr { raw }
            | Self::Blockquote { raw, .. }
            | Self::Html { raw, .. }
            | Self::Table { raw }
            | Self::Paragraph { raw, .. }
            | Self::Text { raw, .. }
            | Self::Escape { raw, .. }
            | Self::Tag { raw, .. }
            | Self::Link { raw, .. }
            | Self::Image { raw, .. }
            | Self::Strong { raw, .. }
            | Self::Em { raw, .. }
            | Self::Codespan { raw, .. }
            | Self::Br { raw }
            | Self::Del { raw, .. } => raw,
            Self::List(list) => &mut list.raw,
            Self::Extension(token) => &mut token.raw,
        }
    }

    /// Create a plain inline text token.
    pub(crate) fn text(raw: &str) -> Self {
        Self::Text {
            raw: raw.to_owned(),
            text: raw.to_owned(),
            tokens: Vec::new(),
        }
    }
}

/// Bullet or ordered list.
#[derive(Clone, Debug, PartialEq)]
pub struct List {
    pub raw: String,
    pub ordered: bool,
    /// First number of an ordered list.
    pub start: Option<u32>,
    /// Loose lists wrap item content in paragraphs.
    pub loose: bool,
    pub items: Vec<ListItem>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListItem {
    pub raw: String,
    /// Item starts with a GFM task marker (`[ ]` or `[x]`).
    pub task: bool,
    pub checked: bool,
    pub loose: bool,
    /// Item content with the marker, indentation and task box removed.
    pub text: String,
    pub tokens: Vec<Token>,
}

/// Output of an [`InlineExtension`](crate::InlineExtension) tokenizer.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtensionToken {
    /// Name of the extension that produced the token.
    pub name: &'static str,
    /// Source consumed; must be a prefix of the text the tokenizer was given.
    pub raw: String,
    pub text: String,
    /// Structured data carried by the token (the decoded mention object).
    pub payload: Option<Value>,
}
