//! Tests for the domain error payload.

use super::*;
use rstest::rstest;
use serde_json::json;

#[rstest]
#[case(Error::invalid_input("bad"), ErrorCode::InvalidInput)]
#[case(Error::invalid_state("bad"), ErrorCode::InvalidState)]
#[case(Error::invalid_temporal("bad"), ErrorCode::InvalidTemporal)]
#[case(Error::not_found("bad"), ErrorCode::NotFound)]
#[case(Error::forbidden("bad"), ErrorCode::Forbidden)]
#[case(Error::unauthorized("bad"), ErrorCode::Unauthorized)]
#[case(Error::conflict("bad"), ErrorCode::Conflict)]
#[case(Error::dependency("bad"), ErrorCode::DependencyFailure)]
fn constructors_set_code(#[case] error: Error, #[case] expected: ErrorCode) {
    assert_eq!(error.code(), expected);
}

#[rstest]
fn try_new_rejects_empty_messages() {
    let result = Error::try_new(ErrorCode::InvalidInput, "   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyMessage)));
}

#[rstest]
fn new_falls_back_to_generic_message() {
    let error = Error::new(ErrorCode::NotFound, "");
    assert_eq!(error.message(), "not found");
}

#[rstest]
fn serializes_code_in_snake_case() {
    let error = Error::invalid_temporal("too early").with_details(json!({"field": "date"}));
    let value = serde_json::to_value(&error).expect("serialize error");
    assert_eq!(value["code"], "invalid_temporal");
    assert_eq!(value["message"], "too early");
    assert_eq!(value["details"]["field"], "date");
}

#[rstest]
fn deserialize_rejects_blank_message() {
    let payload = json!({"code": "not_found", "message": " "});
    let result: Result<Error, _> = serde_json::from_value(payload);
    assert!(result.is_err());
}

#[rstest]
fn display_uses_message() {
    let error = Error::dependency("media store unavailable");
    assert_eq!(error.to_string(), "media store unavailable");
}
