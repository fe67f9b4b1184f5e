use crate::error::highlight::HighlightError;
use crate::highlight::{
    DEFAULT_THEME, HighlightStyle, Highlighter, highlight_code, languages, themes,
};

use syntect::highlighting::ThemeSet;
use syntect::html::{ClassStyle, ClassedHTMLGenerator, highlighted_html_for_string};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

const PYTHON: &str = "def add(a, b):\n    return a + b\n";

fn syntect_classed(code: &str, token: &str) -> String {
    let syntaxes = SyntaxSet::load_defaults_newlines();
    let syntax = syntaxes.find_syntax_by_token(token).unwrap();
    let mut generator =
        ClassedHTMLGenerator::new_with_class_style(syntax, &syntaxes, ClassStyle::Spaced);
    for line in LinesWithEndings::from(code) {
        generator
            .parse_html_for_line_which_includes_newline(line)
            .unwrap();
    }
    generator.finalize()
}

/// **VALUE**: Output is exactly what the library produces for the same grammar.
///
/// **BUG THIS CATCHES**: Would catch the wrapper post-processing the markup or picking a
/// different grammar than the one the caller named.
#[test]
fn given_python_source_when_highlighted_then_matches_library_output() {
    // WHEN
    let html = highlight_code(PYTHON, "python").unwrap();

    // THEN
    assert_eq!(html, syntect_classed(PYTHON, "python"));
    assert!(html.contains("<span class=\""));
    assert!(html.contains("add"));
}

#[test]
fn given_language_aliases_when_highlighted_then_same_grammar() {
    let by_name = highlight_code(PYTHON, "python").unwrap();

    assert_eq!(highlight_code(PYTHON, "py").unwrap(), by_name);
    assert_eq!(highlight_code(PYTHON, "Python").unwrap(), by_name);
}

#[test]
fn given_unknown_language_when_highlighted_then_error_names_it() {
    let result = highlight_code("x", "not-a-language");

    match result {
        Err(HighlightError::UnknownLanguage { language, .. }) => {
            assert_eq!(language, "not-a-language")
        }
        other => panic!("Expected UnknownLanguage, got {other:?}"),
    }
}

#[test]
fn given_empty_code_when_highlighted_then_ok() {
    assert!(highlight_code("", "rust").is_ok());
}

#[test]
fn given_inline_style_when_highlighted_then_matches_themed_library_output() {
    // GIVEN
    let highlighter = Highlighter::new(HighlightStyle::Inline, DEFAULT_THEME);
    let syntaxes = SyntaxSet::load_defaults_newlines();
    let themes = ThemeSet::load_defaults();
    let expected = highlighted_html_for_string(
        PYTHON,
        &syntaxes,
        syntaxes.find_syntax_by_token("py").unwrap(),
        &themes.themes[DEFAULT_THEME],
    )
    .unwrap();

    // WHEN
    let html = highlighter.highlight(PYTHON, "py").unwrap();

    // THEN
    assert_eq!(html, expected);
    assert!(html.starts_with("<pre style="));
}

#[test]
fn given_inline_style_with_unknown_theme_when_highlighted_then_error() {
    let highlighter = Highlighter::new(HighlightStyle::Inline, "no-such-theme");

    assert!(matches!(
        highlighter.highlight(PYTHON, "python"),
        Err(HighlightError::UnknownTheme { .. })
    ));
}

#[test]
fn given_bundled_assets_when_listed_then_include_defaults() {
    assert!(languages().contains(&"Python"));
    assert!(themes().contains(&DEFAULT_THEME));
    assert_eq!(Highlighter::default().style(), HighlightStyle::Classed);
}
