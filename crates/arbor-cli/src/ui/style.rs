//! Message styling for CLI output.
//!
//! Provides consistent prefixes, colors, and formatting for all CLI
//! messages.
//!
//! ## Message Types
//!
//! | Prefix | Meaning | Color |
//! |--------|---------|-------|
//! | `[ok]` | Success | Green |
//! | `[err]` | Error | Red |
//! | `[warn]` | Warning | Yellow |
//! | `[info]` | Information | Blue |
//! | `[hint]` | Suggestion | Cyan |

use owo_colors::OwoColorize;

use super::color::ColorMode;

/// Message severity/type for CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// Success - operation completed successfully
    Ok,
    /// Error - operation failed, cannot continue
    Err,
    /// Warning - operation succeeded with caveats
    Warn,
    /// Information - neutral status or progress update
    Info,
    /// Hint - actionable next step or tip
    Hint,
}

impl MessageType {
    /// Returns the prefix text for this message type.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Ok => "[ok]",
            Self::Err => "[err]",
            Self::Warn => "[warn]",
            Self::Info => "[info]",
            Self::Hint => "[hint]",
        }
    }
}

/// Main styling interface for CLI output.
#[derive(Debug, Clone)]
pub struct Style {
    color_mode: ColorMode,
}

impl Default for Style {
    fn default() -> Self {
        Self::new(ColorMode::Auto)
    }
}

impl Style {
    /// Create a Style instance with an explicit color mode.
    pub fn new(color_mode: ColorMode) -> Self {
        Self { color_mode }
    }

    /// Check if colors are enabled.
    pub fn colors_enabled(&self) -> bool {
        self.color_mode.is_enabled()
    }

    /// Format a simple message with a type prefix.
    ///
    /// # Example
    ///
    /// ```
    /// use arbor_cli::ui::{ColorMode, MessageType, Style};
    ///
    /// let style = Style::new(ColorMode::Never);
    /// assert_eq!(style.message(MessageType::Ok, "Done"), "[ok] Done");
    /// ```
    pub fn message(&self, msg_type: MessageType, text: &str) -> String {
        let prefix = msg_type.prefix();
        if self.colors_enabled() {
            let colored_prefix = match msg_type {
                MessageType::Ok => prefix.green().to_string(),
                MessageType::Err => prefix.red().to_string(),
                MessageType::Warn => prefix.yellow().to_string(),
                MessageType::Info => prefix.blue().to_string(),
                MessageType::Hint => prefix.cyan().to_string(),
            };
            format!("{} {}", colored_prefix, text)
        } else {
            format!("{} {}", prefix, text)
        }
    }

    /// Format a structured error with optional cause and hint.
    pub fn error_with_context(
        &self,
        summary: &str,
        cause: Option<&str>,
        hint: Option<&str>,
    ) -> String {
        let mut out = self.message(MessageType::Err, summary);
        if let Some(cause) = cause {
            out.push('\n');
            out.push_str(&format!("     cause: {}", cause));
        }
        if let Some(hint) = hint {
            out.push('\n');
            out.push_str(&self.message(MessageType::Hint, hint));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_without_colors() {
        let style = Style::new(ColorMode::Never);
        assert_eq!(style.message(MessageType::Ok, "Done"), "[ok] Done");
        assert_eq!(style.message(MessageType::Err, "Boom"), "[err] Boom");
    }

    #[test]
    fn test_error_with_context_layout() {
        let style = Style::new(ColorMode::Never);
        let out = style.error_with_context("failed", Some("root cause"), Some("try --init"));
        assert!(out.starts_with("[err] failed"));
        assert!(out.contains("cause: root cause"));
        assert!(out.contains("[hint] try --init"));
    }
}
