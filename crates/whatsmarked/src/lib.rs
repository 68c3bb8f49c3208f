//! WhatsApp-flavoured Markdown to HTML.
//!
//! Chat messages use a Markdown dialect where `*x*` means bold, `_x_` means
//! italic and headings, reference links and raw HTML carry no formatting.
//! This crate tokenizes such text with a GFM-style lexer and renders it with
//! WhatsApp semantics:
//!
//! - `*bold*`, `_italic_`, `~~strike~~` and `` `code` `` spans
//! - bare `https://` URLs become links, any other link syntax stays as typed
//! - raw HTML is always escaped
//! - `⣿gray text⣿` becomes a muted span
//! - `@[base64 JSON]` mentions are resolved by a caller-provided
//!   [`MentionResolver`]
//!
//! Extra inline syntax can be plugged in with [`InlineExtension`].
//!
//! # Example
//!
//! ```
//! use whatsmarked::Whatsmarked;
//!
//! let pipeline = Whatsmarked::new();
//! let container = pipeline
//!     .render(Some("*Hello* _there_\nsee https://example.com"), false, None)
//!     .unwrap();
//!
//! assert_eq!(container.class_name, "whatsmarked");
//! assert_eq!(
//!     container.html,
//!     "<p><strong>Hello</strong> <em>there</em><br>see \
//!      <a href=\"https://example.com\" target=\"_blank\">https://example.com</a></p>\n"
//! );
//! ```

mod escape;
pub mod extension;
mod lexer;
mod options;
mod pipeline;
mod renderer;
mod rules;
mod token;

pub use escape::{escape_html, escape_text};
pub use extension::{
    ExtensionContext, GRAYTEXT_CLASS, GrayText, InlineExtension, Mention, MentionError,
    MentionResolver, decode_payload,
};
pub use options::ParseOptions;
pub use pipeline::{
    CLASS_BLOCK, CLASS_ONELINE, Container, Whatsmarked, global, render, set_mention_resolver,
};
pub use token::{ExtensionToken, List, ListItem, Token, TokenKind};
