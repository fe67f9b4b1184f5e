//! Syntax highlighting for code shown in the frontend.
//!
//! Grammar lookup and rendering are delegated to `syntect`'s bundled
//! grammars and themes. Lookup accepts a language name or file extension,
//! case-insensitively (`"python"`, `"Python"`, `"py"`).

use crate::error::highlight::HighlightError;

use common::ErrorLocation;

use std::panic::Location;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{ClassStyle, ClassedHTMLGenerator, highlighted_html_for_string};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

pub const DEFAULT_THEME: &str = "base16-ocean.dark";

/// How the produced markup carries colors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightStyle {
    /// `<span class="...">` markup, styled by a stylesheet on the page.
    #[default]
    Classed,
    /// `<pre style=...>` markup with colors from a theme.
    Inline,
}

#[derive(Debug, Clone)]
pub struct Highlighter {
    style: HighlightStyle,
    theme: String,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self {
            style: HighlightStyle::default(),
            theme: DEFAULT_THEME.to_string(),
        }
    }
}

impl Highlighter {
    pub fn new(style: HighlightStyle, theme: impl Into<String>) -> Self {
        Self {
            style,
            theme: theme.into(),
        }
    }

    pub fn style(&self) -> HighlightStyle {
        self.style
    }

    /// Render `code` as markup for `language`.
    ///
    /// # Errors
    ///
    /// * [`HighlightError::UnknownLanguage`] - no bundled grammar matches
    /// * [`HighlightError::UnknownTheme`] - inline style with an unknown theme
    /// * [`HighlightError::Render`] - the library failed mid-render
    #[track_caller]
    pub fn highlight(&self, code: &str, language: &str) -> Result<String, HighlightError> {
        let syntax = find_syntax(language)?;

        match self.style {
            HighlightStyle::Classed => render_classed(code, syntax),
            HighlightStyle::Inline => {
                let theme = find_theme(&self.theme)?;
                Ok(highlighted_html_for_string(code, &SYNTAX_SET, syntax, theme)?)
            }
        }
    }
}

/// Highlight with the default (class-based) markup.
#[track_caller]
pub fn highlight_code(code: &str, language: &str) -> Result<String, HighlightError> {
    Highlighter::default().highlight(code, language)
}

/// Names of every bundled grammar.
pub fn languages() -> Vec<&'static str> {
    SYNTAX_SET
        .syntaxes()
        .iter()
        .map(|syntax| syntax.name.as_str())
        .collect()
}

/// Names of every bundled theme, sorted.
pub fn themes() -> Vec<&'static str> {
    THEME_SET.themes.keys().map(String::as_str).collect()
}

#[track_caller]
fn find_syntax(language: &str) -> Result<&'static SyntaxReference, HighlightError> {
    SYNTAX_SET
        .find_syntax_by_token(language)
        .ok_or_else(|| HighlightError::UnknownLanguage {
            language: language.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
}

#[track_caller]
fn find_theme(name: &str) -> Result<&'static Theme, HighlightError> {
    THEME_SET
        .themes
        .get(name)
        .ok_or_else(|| HighlightError::UnknownTheme {
            theme: name.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
}

fn render_classed(code: &str, syntax: &SyntaxReference) -> Result<String, HighlightError> {
    let mut generator =
        ClassedHTMLGenerator::new_with_class_style(syntax, &SYNTAX_SET, ClassStyle::Spaced);

    for line in LinesWithEndings::from(code) {
        generator.parse_html_for_line_which_includes_newline(line)?;
    }

    Ok(generator.finalize())
}
