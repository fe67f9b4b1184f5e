use crate::ErrorLocation;
use std::panic::Location;

/// **VALUE**: Verifies that `ErrorLocation::from()` captures file, line, and column.
///
/// **WHY THIS MATTERS**: Every error variant in the workspace carries an ErrorLocation.
/// If capture breaks, every logged error loses the call site.
#[test]
fn given_location_caller_when_error_location_created_then_captures_file_line_column() {
    // GIVEN / WHEN: Capturing the current caller location
    let location = ErrorLocation::from(Location::caller());

    // THEN: File, line and column are populated
    assert!(
        location.file.contains("error_location.rs"),
        "Should capture file path"
    );
    assert_eq!(location.line, 11, "Should capture correct line number");
    assert!(location.column > 0, "Should capture column number");
}

/// **VALUE**: Verifies the `[file:line:column]` display format used in every error message.
#[test]
fn given_error_location_when_formatted_then_produces_bracketed_format() {
    // GIVEN: An ErrorLocation
    let location = ErrorLocation::from(Location::caller());

    // WHEN: Formatting as string
    let formatted = location.to_string();

    // THEN: Bracketed, with exactly two separators
    assert!(formatted.starts_with('['));
    assert!(formatted.ends_with(']'));
    assert!(formatted.contains(&location.line.to_string()));
    assert_eq!(formatted.matches(':').count(), 2);
}

/// **VALUE**: Verifies `#[track_caller]` helpers report their caller, not themselves.
///
/// **BUG THIS CATCHES**: Would catch a missing `#[track_caller]` on error constructors,
/// which makes every error point at the constructor instead of the failing call site.
#[test]
fn given_multiple_call_sites_when_capturing_location_then_each_has_unique_line() {
    #[track_caller]
    fn capture_location() -> ErrorLocation {
        ErrorLocation::from(Location::caller())
    }

    let loc1 = capture_location();
    let loc2 = capture_location();

    assert_eq!(loc1.file, loc2.file);
    assert_eq!(loc1.line + 1, loc2.line, "Lines should be sequential");
}
