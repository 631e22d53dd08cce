//! Test data builders.

use courier_core::SubmissionStatus;
use courier_metadata::models::SubmissionRow;
use time::macros::datetime;

/// Boundary used by [`multipart_body`].
pub const MULTIPART_BOUNDARY: &str = "courier-test-boundary";

/// A minimal PDF-looking payload.
pub fn sample_pdf() -> Vec<u8> {
    b"%PDF-1.7\n1 0 obj\n<< /Type /Catalog >>\nendobj\ntrailer\n%%EOF\n".to_vec()
}

/// A complete, valid set of submit form fields.
pub fn valid_fields(callback_url: &str) -> Vec<(String, String)> {
    vec![
        ("callbackUrl".to_string(), callback_url.to_string()),
        ("metadata.store".to_string(), "true".to_string()),
        ("metadata.source".to_string(), "dms".to_string()),
        (
            "metadata.timeOfReceipt".to_string(),
            "2026-01-15T09:30:00Z".to_string(),
        ),
        ("metadata.formId".to_string(), "FORM-1".to_string()),
        ("metadata.customerId".to_string(), "CUST-1".to_string()),
        ("metadata.submissionMark".to_string(), "MARK-1".to_string()),
        ("metadata.casKey".to_string(), "CAS-1".to_string()),
        (
            "metadata.classificationType".to_string(),
            "CLASS-1".to_string(),
        ),
        ("metadata.businessArea".to_string(), "AREA-1".to_string()),
    ]
}

/// Assemble a multipart/form-data body from text fields plus an optional
/// PDF part named "form".
pub fn multipart_body(fields: &[(String, String)], file: Option<&[u8]>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(file) = file {
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"form\"; filename=\"form.pdf\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(file);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    body
}

/// A submission row ready for direct insertion, in the given status.
pub fn sample_row(owner: &str, id: &str, status: SubmissionStatus) -> SubmissionRow {
    SubmissionRow {
        owner: owner.to_string(),
        id: id.to_string(),
        sdes_correlation_id: format!("corr-{owner}-{id}"),
        callback_url: "http://callback.mdtp/notify".to_string(),
        status: status.as_str().to_string(),
        object_location: format!("corr-{owner}-{id}.zip"),
        object_content_length: 4,
        // Base64 MD5 of "test".
        object_content_md5: "CY9rzUYh03PK3k6DJie09g==".to_string(),
        object_last_modified: datetime!(2026-01-15 11:00:00 UTC),
        failure_reason: None,
        failure_count: 0,
        locked_at: None,
        // Ignored on insert; the store stamps its own clock.
        created_at: datetime!(2026-01-15 11:00:00 UTC),
        last_updated: datetime!(2026-01-15 11:00:00 UTC),
    }
}
