use super::*;
use std::error::Error;

#[test]
fn test_path_display() {
    assert_eq!(PatternPath::default().to_string(), "<root>");
    let path = PatternPath::from(vec![PathStep::Item(0), PathStep::Alt(2), PathStep::Repeat]);
    assert_eq!(path.to_string(), "item 0 / alt 2 / repeat");
    assert_eq!(path.steps().len(), 3);
}

#[test]
fn test_compile_error_display_includes_path() {
    let err = CompileError {
        kind: CompileErrorKind::UndeclaredBackRef { name: "F3".into() },
        path: PatternPath::from(vec![PathStep::Item(2)]),
    };
    assert_eq!(err.to_string(), "backreference to undeclared capture `F3` (at item 2)");
}

#[test]
fn test_search_error_conversions_keep_source() {
    let err: SearchError = CaptureError::EmptyCapture { name: "x".into() }.into();
    assert_eq!(err.to_string(), "capture `x` is empty");
    assert!(err.source().is_some());

    let err: SearchError = PredicateError {
        check: "not_null".into(),
        message: "boom".into(),
    }
    .into();
    assert_eq!(err.to_string(), "check `not_null` failed: boom");

    let err = SearchError::callback("stop here");
    assert_eq!(err.to_string(), "match callback failed: stop here");
    assert!(err.source().is_none());
}

#[test]
fn test_capture_error_display() {
    let err = CaptureError::CyclicReplace { name: "body".into() };
    assert_eq!(err.to_string(), "replacement for capture `body` contains its own sequence");
}
