//! Field-level validation of submit requests.

use crate::error::FieldError;
use courier_core::{SubmissionMetadata, validate_callback_url};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use url::Url;

/// Raw text fields collected from the multipart form before validation.
#[derive(Debug, Clone, Default)]
pub struct RawSubmission {
    pub submission_reference: Option<String>,
    pub callback_url: Option<String>,
    pub store: Option<String>,
    pub source: Option<String>,
    pub time_of_receipt: Option<String>,
    pub form_id: Option<String>,
    pub customer_id: Option<String>,
    pub submission_mark: Option<String>,
    pub cas_key: Option<String>,
    pub classification_type: Option<String>,
    pub business_area: Option<String>,
}

impl RawSubmission {
    /// Record a text field by its multipart name. Unknown names are ignored.
    pub fn set_field(&mut self, name: &str, value: String) {
        match name {
            "submissionReference" => self.submission_reference = Some(value),
            "callbackUrl" => self.callback_url = Some(value),
            "metadata.store" => self.store = Some(value),
            "metadata.source" => self.source = Some(value),
            "metadata.timeOfReceipt" => self.time_of_receipt = Some(value),
            "metadata.formId" => self.form_id = Some(value),
            "metadata.customerId" => self.customer_id = Some(value),
            "metadata.submissionMark" => self.submission_mark = Some(value),
            "metadata.casKey" => self.cas_key = Some(value),
            "metadata.classificationType" => self.classification_type = Some(value),
            "metadata.businessArea" => self.business_area = Some(value),
            _ => {}
        }
    }
}

/// A submit request that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedSubmission {
    /// Caller-supplied reference; empty strings were treated as absent.
    pub submission_reference: Option<String>,
    pub callback_url: Url,
    pub metadata: SubmissionMetadata,
}

/// Validate the collected form fields, accumulating every field error
/// rather than stopping at the first.
pub fn validate(
    raw: &RawSubmission,
    allow_localhost: bool,
) -> Result<ValidatedSubmission, Vec<FieldError>> {
    let mut errors = Vec::new();

    // Empty reference is treated as absent.
    let submission_reference = raw
        .submission_reference
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let callback_url = match raw.callback_url.as_deref() {
        None | Some("") => {
            errors.push(FieldError::required("callbackUrl"));
            None
        }
        Some(value) => match validate_callback_url(value, allow_localhost) {
            Ok(url) => Some(url),
            Err(e) => {
                errors.push(FieldError::new("callbackUrl", e.code()));
                None
            }
        },
    };

    let store = parse_field(&mut errors, "metadata.store", raw.store.as_deref(), |s| {
        s.parse::<bool>().ok()
    });

    let time_of_receipt = parse_field(
        &mut errors,
        "metadata.timeOfReceipt",
        raw.time_of_receipt.as_deref(),
        |s| OffsetDateTime::parse(s, &Rfc3339).ok(),
    );

    let source = non_empty(&mut errors, "metadata.source", raw.source.as_deref());
    let form_id = non_empty(&mut errors, "metadata.formId", raw.form_id.as_deref());
    let customer_id = non_empty(&mut errors, "metadata.customerId", raw.customer_id.as_deref());
    let submission_mark = non_empty(
        &mut errors,
        "metadata.submissionMark",
        raw.submission_mark.as_deref(),
    );
    let cas_key = non_empty(&mut errors, "metadata.casKey", raw.cas_key.as_deref());
    let classification_type = non_empty(
        &mut errors,
        "metadata.classificationType",
        raw.classification_type.as_deref(),
    );
    let business_area = non_empty(
        &mut errors,
        "metadata.businessArea",
        raw.business_area.as_deref(),
    );

    if !errors.is_empty() {
        return Err(errors);
    }

    // All unwraps guarded by the error check above.
    Ok(ValidatedSubmission {
        submission_reference,
        callback_url: callback_url.unwrap(),
        metadata: SubmissionMetadata {
            store: store.unwrap(),
            source: source.unwrap(),
            time_of_receipt: time_of_receipt.unwrap(),
            form_id: form_id.unwrap(),
            customer_id: customer_id.unwrap(),
            submission_mark: submission_mark.unwrap(),
            cas_key: cas_key.unwrap(),
            classification_type: classification_type.unwrap(),
            business_area: business_area.unwrap(),
        },
    })
}

fn parse_field<T>(
    errors: &mut Vec<FieldError>,
    field: &str,
    value: Option<&str>,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Option<T> {
    match value {
        None | Some("") => {
            errors.push(FieldError::required(field));
            None
        }
        Some(value) => match parse(value) {
            Some(parsed) => Some(parsed),
            None => {
                errors.push(FieldError::invalid(field));
                None
            }
        },
    }
}

fn non_empty(errors: &mut Vec<FieldError>, field: &str, value: Option<&str>) -> Option<String> {
    match value.map(str::trim) {
        None | Some("") => {
            errors.push(FieldError::required(field));
            None
        }
        Some(value) => Some(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_raw() -> RawSubmission {
        let mut raw = RawSubmission::default();
        raw.set_field("callbackUrl", "http://callback.mdtp/notify".to_string());
        raw.set_field("metadata.store", "true".to_string());
        raw.set_field("metadata.source", "dms".to_string());
        raw.set_field(
            "metadata.timeOfReceipt",
            "2026-01-15T09:30:00.123456789Z".to_string(),
        );
        raw.set_field("metadata.formId", "FORM-1".to_string());
        raw.set_field("metadata.customerId", "CUST-1".to_string());
        raw.set_field("metadata.submissionMark", "MARK-1".to_string());
        raw.set_field("metadata.casKey", "CAS-1".to_string());
        raw.set_field("metadata.classificationType", "CLASS-1".to_string());
        raw.set_field("metadata.businessArea", "AREA-1".to_string());
        raw
    }

    #[test]
    fn accepts_valid_form() {
        let validated = validate(&valid_raw(), false).unwrap();
        assert!(validated.submission_reference.is_none());
        assert_eq!(validated.metadata.form_id, "FORM-1");
        assert!(validated.metadata.store);
        // Nanosecond precision survives parsing.
        assert_eq!(validated.metadata.time_of_receipt.nanosecond(), 123_456_789);
    }

    #[test]
    fn empty_reference_is_absent() {
        let mut raw = valid_raw();
        raw.set_field("submissionReference", "".to_string());
        let validated = validate(&raw, false).unwrap();
        assert!(validated.submission_reference.is_none());

        raw.set_field("submissionReference", "REF-9".to_string());
        let validated = validate(&raw, false).unwrap();
        assert_eq!(validated.submission_reference.as_deref(), Some("REF-9"));
    }

    #[test]
    fn bad_time_of_receipt_is_reported_by_field() {
        let mut raw = valid_raw();
        raw.set_field("metadata.timeOfReceipt", "foobar".to_string());
        let errors = validate(&raw, false).unwrap_err();
        assert!(
            errors
                .iter()
                .any(|e| e.field == "metadata.timeOfReceipt"
                    && e.code == "metadata.timeOfReceipt.invalid")
        );
    }

    #[test]
    fn callback_url_codes_are_specific() {
        let mut raw = valid_raw();
        raw.set_field("callbackUrl", "http://foo.com/x".to_string());
        let errors = validate(&raw, false).unwrap_err();
        assert_eq!(errors[0].code, "callbackUrl.invalidHost");

        raw.set_field("callbackUrl", "foobar".to_string());
        let errors = validate(&raw, false).unwrap_err();
        assert_eq!(errors[0].code, "callbackUrl.invalid");
    }

    #[test]
    fn multiple_errors_accumulate() {
        let mut raw = valid_raw();
        raw.source = None;
        raw.set_field("metadata.store", "not-a-bool".to_string());
        let errors = validate(&raw, false).unwrap_err();
        assert!(errors.iter().any(|e| e.code == "metadata.source.required"));
        assert!(errors.iter().any(|e| e.code == "metadata.store.invalid"));
    }
}
