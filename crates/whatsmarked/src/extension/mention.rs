//! Mentions: `@[<base64-encoded JSON object>]`.
//!
//! The payload is opaque to the renderer. A host application registers a
//! [`MentionResolver`] that turns the decoded object into HTML; without one
//! the syntax is not recognized at all and stays literal text.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde_json::Value;

use super::{ExtensionContext, InlineExtension};
use crate::escape::escape_html;
use crate::token::ExtensionToken;

/// Opening of a mention. `eyJ` is how `{"` starts once base64-encoded, so
/// only JSON objects can be mentioned.
const PREFIX: &str = "@[eyJ";

/// Standard alphabet, padding optional, non-zero trailing bits tolerated.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Turns a decoded mention payload into HTML.
///
/// The returned string is inserted verbatim; the resolver owns the safety of
/// its output. Any `Fn(&Value) -> String` closure that is `Send + Sync` is a
/// resolver.
///
/// # Example
///
/// ```
/// use whatsmarked::{Whatsmarked, escape_html};
///
/// let pipeline = Whatsmarked::new().with_mention_resolver(|payload: &serde_json::Value| {
///     let name = payload["name"].as_str().unwrap_or("someone");
///     format!(r#"<span class="mention">@{}</span>"#, escape_html(name))
/// });
///
/// // {"name":"Ana"}
/// let html = pipeline.parse_inline("hi @[eyJuYW1lIjoiQW5hIn0=]");
/// assert_eq!(html, r#"hi <span class="mention">@Ana</span>"#);
/// ```
pub trait MentionResolver: Send + Sync {
    fn render(&self, payload: &Value) -> String;
}

impl<F> MentionResolver for F
where
    F: Fn(&Value) -> String + Send + Sync,
{
    fn render(&self, payload: &Value) -> String {
        self(payload)
    }
}

/// Why a mention payload could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum MentionError {
    #[error("mention payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("mention payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode a mention payload: base64 first, then JSON.
///
/// Surrounding ASCII whitespace is ignored and padding is optional.
///
/// # Examples
///
/// ```
/// use whatsmarked::decode_payload;
///
/// let payload = decode_payload("eyJhIjoxfQ==").unwrap();
/// assert_eq!(payload, serde_json::json!({"a": 1}));
/// assert!(decode_payload("eyJ!").is_err());
/// ```
pub fn decode_payload(encoded: &str) -> Result<Value, MentionError> {
    let bytes = PAYLOAD_ENGINE.decode(encoded.trim_ascii())?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Recognizes `@[eyJ…]` and renders it through the registered resolver.
#[derive(Clone, Copy, Debug, Default)]
pub struct Mention;

impl InlineExtension for Mention {
    fn name(&self) -> &'static str {
        "mention"
    }

    fn start(&self, src: &str) -> Option<usize> {
        src.find(PREFIX)
    }

    fn tokenize(&self, src: &str, ctx: &ExtensionContext<'_>) -> Option<ExtensionToken> {
        if ctx.mention_resolver.is_none() || !src.starts_with(PREFIX) {
            return None;
        }

        // Base64 text, optional trailing blanks, then `]`.
        let body = &src[2..];
        let payload = body
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='))
            .count();
        let close = payload
            + body[payload..]
                .bytes()
                .take_while(|b| matches!(b, b' ' | b'\t' | b'\x0c'))
                .count();
        if !body[close..].starts_with(']') {
            return None;
        }
        let encoded = &body[..close];

        match decode_payload(encoded) {
            Ok(payload) => Some(ExtensionToken {
                name: self.name(),
                raw: src[..close + 3].to_owned(),
                text: encoded.to_owned(),
                payload: Some(payload),
            }),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring malformed mention");
                None
            }
        }
    }

    fn render(&self, token: &ExtensionToken, ctx: &ExtensionContext<'_>) -> String {
        match (ctx.mention_resolver, &token.payload) {
            (Some(resolver), Some(payload)) => resolver.render(payload),
            _ => escape_html(&token.raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn bold_x(_: &Value) -> String {
        "<b>X</b>".to_owned()
    }

    fn with_resolver<T>(f: impl FnOnce(&ExtensionContext<'_>) -> T) -> T {
        let resolver = bold_x;
        let ctx = ExtensionContext {
            mention_resolver: Some(&resolver),
        };
        f(&ctx)
    }

    #[test]
    fn test_decode_payload_with_and_without_padding() {
        assert_eq!(decode_payload("eyJhIjoxfQ==").unwrap(), json!({"a": 1}));
        assert_eq!(decode_payload("eyJhIjoxfQ").unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_decode_payload_errors() {
        assert!(matches!(
            decode_payload("eyJ*"),
            Err(MentionError::Base64(_))
        ));
        // "{\"a" without the rest of the object
        assert!(matches!(decode_payload("eyJh"), Err(MentionError::Json(_))));
    }

    #[test]
    fn test_inert_without_resolver() {
        let token = Mention.tokenize("@[eyJhIjoxfQ==]", &ExtensionContext::default());
        assert!(token.is_none());
    }

    #[test]
    fn test_tokenize_with_resolver() {
        let token = with_resolver(|ctx| Mention.tokenize("@[eyJhIjoxfQ==] rest", ctx)).unwrap();
        assert_eq!(token.raw, "@[eyJhIjoxfQ==]");
        assert_eq!(token.payload, Some(json!({"a": 1})));
    }

    #[test]
    fn test_malformed_payload_declines() {
        assert!(with_resolver(|ctx| Mention.tokenize("@[eyJhIjox]", ctx)).is_none());
        assert!(with_resolver(|ctx| Mention.tokenize("@[eyJ%%%]", ctx)).is_none());
    }

    #[test]
    fn test_requires_closing_bracket_on_same_line() {
        assert!(with_resolver(|ctx| Mention.tokenize("@[eyJhIjoxfQ==", ctx)).is_none());
        assert!(with_resolver(|ctx| Mention.tokenize("@[eyJhIjox\nfQ==]", ctx)).is_none());
    }

    #[test]
    fn test_trailing_blanks_before_bracket() {
        let token = with_resolver(|ctx| Mention.tokenize("@[eyJhIjoxfQ== ]", ctx)).unwrap();
        assert_eq!(token.raw, "@[eyJhIjoxfQ== ]");
        assert!(with_resolver(|ctx| Mention.tokenize("@[eyJh IjoxfQ==]", ctx)).is_none());
    }

    #[test]
    fn test_unclosed_prefixes_stop_at_next_mention() {
        let src = "@[eyJ ".repeat(20_000);
        assert!(with_resolver(|ctx| Mention.tokenize(&src, ctx)).is_none());
        let src = format!("@[eyJ{}", "@[eyJhIjoxfQ]");
        assert!(with_resolver(|ctx| Mention.tokenize(&src, ctx)).is_none());
        assert!(with_resolver(|ctx| Mention.tokenize(&src[5..], ctx)).is_some());
    }

    #[test]
    fn test_requires_object_prefix() {
        // "[1]" encodes to "WzFd"
        assert!(with_resolver(|ctx| Mention.tokenize("@[WzFd]", ctx)).is_none());
        assert_eq!(Mention.start("x @[WzFd] @[eyJ"), Some(10));
    }

    #[test]
    fn test_render_delegates_to_resolver() {
        let html = with_resolver(|ctx| {
            let token = Mention.tokenize("@[eyJhIjoxfQ==]", ctx).unwrap();
            Mention.render(&token, ctx)
        });
        assert_eq!(html, "<b>X</b>");
    }
}
