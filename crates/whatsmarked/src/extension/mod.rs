//! Inline grammar extensions.
//!
//! An extension is a start finder, a tokenizer and a renderer. The lexer tries
//! registered extensions, in registration order, before any built-in inline
//! rule at every position they report as a possible start. Plain text stops
//! right before the nearest such position, so an extension never has to look
//! for its syntax in the middle of a text run.
//!
//! Two extensions ship with the crate and are registered by default:
//!
//! - [`GrayText`]: `⣿muted text⣿`
//! - [`Mention`]: `@[<base64 JSON>]`, rendered by a [`MentionResolver`]
//!
//! # Example
//!
//! ```
//! use whatsmarked::{ExtensionContext, ExtensionToken, InlineExtension, Whatsmarked};
//!
//! struct Shout;
//!
//! impl InlineExtension for Shout {
//!     fn name(&self) -> &'static str { "shout" }
//!
//!     fn start(&self, src: &str) -> Option<usize> { src.find("!!") }
//!
//!     fn tokenize(&self, src: &str, _ctx: &ExtensionContext<'_>) -> Option<ExtensionToken> {
//!         let rest = src.strip_prefix("!!")?;
//!         let end = rest.find("!!")?;
//!         Some(ExtensionToken {
//!             name: "shout",
//!             raw: src[..end + 4].to_owned(),
//!             text: rest[..end].to_uppercase(),
//!             payload: None,
//!         })
//!     }
//!
//!     fn render(&self, token: &ExtensionToken, _ctx: &ExtensionContext<'_>) -> String {
//!         format!("<b>{}</b>", whatsmarked::escape_html(&token.text))
//!     }
//! }
//!
//! let pipeline = Whatsmarked::new().with_extension(Shout);
//! assert_eq!(pipeline.parse_inline("say !!hi!!"), "say <b>HI</b>");
//! ```

mod gray;
mod mention;

pub use gray::{GRAYTEXT_CLASS, GrayText};
pub use mention::{Mention, MentionError, MentionResolver, decode_payload};

use crate::token::ExtensionToken;

/// Process-wide capabilities an extension may consult.
///
/// The context is captured once per render call, so the tokenizer and the
/// renderer of a call always see the same resolver.
#[derive(Clone, Copy, Default)]
pub struct ExtensionContext<'a> {
    /// Registered mention renderer, if any.
    pub mention_resolver: Option<&'a dyn MentionResolver>,
}

/// A custom inline token recognizer with its own renderer.
pub trait InlineExtension: Send + Sync {
    /// Name stamped on the tokens this extension produces.
    fn name(&self) -> &'static str;

    /// Byte index of the first position in `src` where this extension could
    /// match, or `None` if it cannot match anywhere in `src`.
    ///
    /// [`tokenize`](Self::tokenize) is only offered positions reported here,
    /// and the lexer reuses an answer until it has moved past it.
    fn start(&self, src: &str) -> Option<usize>;

    /// Try to match at the very start of `src`.
    ///
    /// Returning `None` declines the position; the built-in rules then get
    /// their turn. A returned token's `raw` must be a non-empty prefix of `src`.
    fn tokenize(&self, src: &str, ctx: &ExtensionContext<'_>) -> Option<ExtensionToken>;

    /// Render a token previously produced by [`tokenize`](Self::tokenize).
    fn render(&self, token: &ExtensionToken, ctx: &ExtensionContext<'_>) -> String;
}
