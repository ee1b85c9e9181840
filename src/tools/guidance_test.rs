use crate::client::{ApiError, ApiErrorKind};
use crate::tools::test_support::status_error;
use crate::tools::{Guidance, ToolError};

const GUIDE: Guidance = Guidance::new("update_contact", "update the contact", "contact")
    .lookup("search_contacts")
    .conflict("Another contact already uses this email or phone.")
    .validation("phone numbers must be E.164.");

const BARE: Guidance = Guidance::new("get_timezones", "list timezones", "location");

#[test]
fn test_not_found_names_subject_and_lookup() {
    let text = GUIDE.explain(ApiErrorKind::NotFound, Some("c-42"));

    assert!(text.starts_with("Could not update the contact: contact 'c-42' was not found."));
    assert!(text.ends_with("Use search_contacts to find a current ID."));
}

#[test]
fn test_not_found_without_subject_or_lookup() {
    let text = BARE.explain(ApiErrorKind::NotFound, None);

    assert!(text.contains("the requested location"));
    assert!(!text.contains("Use "));
}

#[test]
fn test_permission_guidance_for_401_and_403() {
    for kind in [ApiErrorKind::Unauthorized, ApiErrorKind::Forbidden] {
        let text = GUIDE.explain(kind, Some("c-42"));
        assert!(text.starts_with("Permission denied while trying to update the contact."));
        assert!(text.contains("scopes"));
    }
}

#[test]
fn test_conflict_and_validation_hints() {
    assert!(
        GUIDE
            .explain(ApiErrorKind::Conflict, None)
            .ends_with("Another contact already uses this email or phone.")
    );
    assert!(
        GUIDE
            .explain(ApiErrorKind::Validation, None)
            .ends_with("Common mistakes: phone numbers must be E.164.")
    );
    assert!(BARE.explain(ApiErrorKind::Validation, None).contains("missing required fields"));
}

#[test]
fn test_other_statuses_get_generic_wrap() {
    assert_eq!(BARE.explain(ApiErrorKind::Server, None), "Failed to list timezones.");
    assert!(BARE.explain(ApiErrorKind::RateLimited, None).contains("rate limit"));
}

#[test]
fn test_decorate_keeps_original_error() {
    let err = GUIDE.decorate(Some("c-42"), status_error(409, "duplicate email"));

    let ToolError::Api {
        tool,
        kind,
        status,
        message,
        source,
    } = &err
    else {
        panic!("expected an API error");
    };
    assert_eq!(tool, "update_contact");
    assert_eq!(*kind, ApiErrorKind::Conflict);
    assert_eq!(*status, Some(409));
    assert!(message.ends_with("(Details: HighLevel API error (409): duplicate email)"));
    assert!(matches!(source, ApiError::Status { status: 409, .. }));
}

#[test]
fn test_decorate_transport_failure_has_no_status() {
    let err = GUIDE.decorate(
        None,
        ApiError::InvalidResponse {
            message: "expected JSON".to_string(),
        },
    );

    assert_eq!(err.status(), None);
    assert_eq!(err.kind(), Some(ApiErrorKind::Other));
    assert!(err.to_string().starts_with("Failed to update the contact."));
}
