//! Terminal colors for human output.
//!
//! Respects `NO_COLOR`, `FORCE_COLOR`, `TERM=dumb` and piped stdout.

use std::io::IsTerminal;

use colored::{ColoredString, Colorize};

/// Level of color support detected for the terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSupport {
    None,
    Basic,
}

impl ColorSupport {
    #[must_use]
    pub fn detect() -> Self {
        Self::from_env(
            |key| std::env::var(key).ok(),
            std::io::stdout().is_terminal(),
        )
    }

    fn from_env(env: impl Fn(&str) -> Option<String>, is_tty: bool) -> Self {
        if env("NO_COLOR").is_some() {
            return Self::None;
        }
        if env("FORCE_COLOR").is_some() {
            return Self::Basic;
        }
        if !is_tty || env("TERM").is_some_and(|term| term == "dumb") {
            return Self::None;
        }
        Self::Basic
    }

    #[must_use]
    pub const fn has_color(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl Default for ColorSupport {
    fn default() -> Self {
        Self::detect()
    }
}

/// Pre-built styles
pub struct HriStyles;

impl HriStyles {
    pub fn success<S: AsRef<str>>(text: S) -> ColoredString {
        text.as_ref().green().bold()
    }

    pub fn warning<S: AsRef<str>>(text: S) -> ColoredString {
        text.as_ref().yellow()
    }

    pub fn muted<S: AsRef<str>>(text: S) -> ColoredString {
        text.as_ref().bright_black()
    }

    pub fn bold<S: AsRef<str>>(text: S) -> ColoredString {
        text.as_ref().bold()
    }

    pub fn candidate_id<S: AsRef<str>>(text: S) -> ColoredString {
        text.as_ref().cyan()
    }

    /// Green from 0.8, yellow from 0.5, red below.
    pub fn score<S: AsRef<str>>(text: S, value: f32) -> ColoredString {
        if value >= 0.8 {
            text.as_ref().green().bold()
        } else if value >= 0.5 {
            text.as_ref().yellow()
        } else {
            text.as_ref().red()
        }
    }
}

/// Apply a style only when the terminal supports color.
pub fn styled<S, F>(text: S, style_fn: F, support: ColorSupport) -> String
where
    S: AsRef<str>,
    F: FnOnce(S) -> ColoredString,
{
    if support.has_color() {
        style_fn(text).to_string()
    } else {
        text.as_ref().to_string()
    }
}

#[must_use]
pub fn format_score(value: f32, support: ColorSupport) -> String {
    let text = format!("{value:.3}");
    if support.has_color() {
        HriStyles::score(&text, value).to_string()
    } else {
        text
    }
}
