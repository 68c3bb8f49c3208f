//! Parse options.

/// Grammar switches shared by every render call of a pipeline.
///
/// Both switches default to on, which is the WhatsApp-compatible setup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ParseOptions {
    /// GitHub Flavored Markdown: tables, task-list boxes, `~~strike~~` and
    /// bare `https://` links.
    pub gfm: bool,
    /// Treat every newline inside a paragraph as a hard line break.
    pub breaks: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            gfm: true,
            breaks: true,
        }
    }
}

impl ParseOptions {
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    #[must_use]
    pub fn with_breaks(mut self, enabled: bool) -> Self {
        self.breaks = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_enable_everything() {
        let options = ParseOptions::default();
        assert!(options.gfm);
        assert!(options.breaks);
    }

    #[test]
    fn test_builders() {
        let options = ParseOptions::default().with_gfm(false).with_breaks(false);
        assert_eq!(
            options,
            ParseOptions {
                gfm: false,
                breaks: false
            }
        );
    }
}
