use crate::error::IngestError;
use log::{debug, warn};
use regex::Regex;
use std::sync::LazyLock;

/// Default maximum number of characters sent to the LLM
pub const DEFAULT_MAX_INPUT_LENGTH: usize = 5000;

static HASHTAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#\w+").unwrap());
static MENTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@\w+").unwrap());
static HORIZONTAL_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());
static EXTRA_NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());
static SPACE_AROUND_NEWLINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" *\n *").unwrap());
static DOTS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.{3,}").unwrap());
static BANGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!{2,}").unwrap());

/// Normalizes raw recipe text (captions, pasted notes) before it is sent anywhere.
#[derive(Debug, Clone)]
pub struct TextPreprocessor {
    max_length: usize,
}

impl Default for TextPreprocessor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_INPUT_LENGTH)
    }
}

impl TextPreprocessor {
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Clean `text` for extraction.
    ///
    /// Fails with [`IngestError::EmptyInput`] only when the trimmed input is empty;
    /// a caption made entirely of hashtags is accepted and comes back empty.
    pub fn process(&self, text: &str) -> Result<String, IngestError> {
        if text.trim().is_empty() {
            return Err(IngestError::EmptyInput);
        }

        let cleaned = self.clean(text);
        if cleaned.chars().count() != text.chars().count() {
            debug!(
                "Text preprocessing: {} -> {} chars",
                text.chars().count(),
                cleaned.chars().count()
            );
        }
        Ok(cleaned)
    }

    fn clean(&self, text: &str) -> String {
        // Social media artifacts first, so the whitespace they leave behind is collapsed too
        let text = HASHTAG.replace_all(text, "");
        let text = MENTION.replace_all(&text, "");

        let text = text.replace("\r\n", "\n");
        let text = HORIZONTAL_SPACE.replace_all(&text, " ");
        let text = SPACE_AROUND_NEWLINE.replace_all(&text, "\n");
        let text = EXTRA_NEWLINES.replace_all(&text, "\n\n");

        let text = DOTS.replace_all(&text, "...");
        let text = BANGS.replace_all(&text, "!");

        self.truncate(text.trim())
    }

    /// Cut to `max_length` characters, preferring a sentence or line boundary in the last 20%.
    fn truncate(&self, text: &str) -> String {
        let original_length = text.chars().count();
        if original_length <= self.max_length {
            return text.to_string();
        }

        let byte_limit = text
            .char_indices()
            .nth(self.max_length)
            .map(|(idx, _)| idx)
            .unwrap_or(text.len());
        let truncated = &text[..byte_limit];

        let boundary = truncated
            .char_indices()
            .filter(|(_, c)| *c == '.' || *c == '\n')
            .map(|(idx, c)| (idx, c.len_utf8()))
            .last()
            .filter(|(idx, _)| truncated[..*idx].chars().count() * 5 > self.max_length * 4);

        match boundary {
            Some((idx, len)) => {
                let result = truncated[..idx + len].trim_end().to_string();
                warn!(
                    "Input text truncated from {} to {} chars at sentence boundary",
                    original_length,
                    result.chars().count()
                );
                result
            }
            None => {
                warn!(
                    "Input text truncated from {} to {} chars (no good sentence boundary found)",
                    original_length, self.max_length
                );
                truncated.to_string()
            }
        }
    }
}
