//! Submission archive assembly.
//!
//! Each submission becomes a zip holding the uploaded PDF and a routing
//! metadata XML built from the request fields. Assembly happens in the
//! caller's scratch directory; the zip bytes are returned for upload.

use anyhow::Context;
use bytes::Bytes;
use courier_core::{METADATA_ENTRY_NAME, PDF_ENTRY_NAME, SubmissionMetadata};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

#[derive(Debug, Serialize)]
#[serde(rename = "submission", rename_all = "camelCase")]
struct SubmissionXml<'a> {
    reference: &'a str,
    correlation_id: &'a str,
    metadata: MetadataXml<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MetadataXml<'a> {
    store: bool,
    source: &'a str,
    time_of_receipt: String,
    form_id: &'a str,
    customer_id: &'a str,
    submission_mark: &'a str,
    cas_key: &'a str,
    classification_type: &'a str,
    business_area: &'a str,
}

/// Render the routing metadata XML document.
pub fn render_metadata_xml(
    reference: &str,
    correlation_id: &str,
    metadata: &SubmissionMetadata,
) -> anyhow::Result<String> {
    let doc = SubmissionXml {
        reference,
        correlation_id,
        metadata: MetadataXml {
            store: metadata.store,
            source: &metadata.source,
            time_of_receipt: metadata
                .time_of_receipt
                .format(&Rfc3339)
                .context("failed to format timeOfReceipt")?,
            form_id: &metadata.form_id,
            customer_id: &metadata.customer_id,
            submission_mark: &metadata.submission_mark,
            cas_key: &metadata.cas_key,
            classification_type: &metadata.classification_type,
            business_area: &metadata.business_area,
        },
    };

    let body = quick_xml::se::to_string(&doc).context("failed to serialize metadata xml")?;
    Ok(format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>{body}"))
}

/// Build the submission archive in `workdir` and return its bytes.
///
/// The caller owns `workdir` and its cleanup; everything written here stays
/// inside it.
pub async fn build_submission_archive(
    workdir: &Path,
    reference: &str,
    correlation_id: &str,
    metadata: &SubmissionMetadata,
    pdf: &Bytes,
) -> anyhow::Result<Bytes> {
    let xml = render_metadata_xml(reference, correlation_id, metadata)?;

    let pdf_path = workdir.join(PDF_ENTRY_NAME);
    let xml_path = workdir.join(METADATA_ENTRY_NAME);
    tokio::fs::write(&pdf_path, pdf)
        .await
        .context("failed to write pdf to workdir")?;
    tokio::fs::write(&xml_path, xml.as_bytes())
        .await
        .context("failed to write metadata xml to workdir")?;

    let zip_path = workdir.join(format!("{correlation_id}.zip"));
    let zip_target = zip_path.clone();
    tokio::task::spawn_blocking(move || build_zip(&zip_target, &pdf_path, &xml_path))
        .await
        .context("zip task panicked")??;

    let bytes = tokio::fs::read(&zip_path)
        .await
        .context("failed to read finished archive")?;
    Ok(Bytes::from(bytes))
}

fn build_zip(zip_path: &PathBuf, pdf_path: &Path, xml_path: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(zip_path).context("failed to create archive")?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, path) in [(PDF_ENTRY_NAME, pdf_path), (METADATA_ENTRY_NAME, xml_path)] {
        zip.start_file(name, options)
            .with_context(|| format!("failed to start archive entry {name}"))?;
        let content = std::fs::read(path)
            .with_context(|| format!("failed to read archive input {}", path.display()))?;
        zip.write_all(&content)
            .with_context(|| format!("failed to write archive entry {name}"))?;
    }

    zip.finish().context("failed to finish archive")?;
    Ok(())
}
