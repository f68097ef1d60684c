//! Attachment materializer
//!
//! Inline attachments arrive as `data:` URIs
//! (`data:[<mediatype>][;base64],<payload>`). Everything else is an external
//! reference that the generated page links to directly, so nothing is
//! written for it.

use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::debug;

use crate::errors::PagesmithError;
use crate::filesys::workdir::WorkDir;
use crate::models::task::Attachment;

/// Decoded source of an attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentSource {
    /// Inline payload, already decoded
    Inline(Vec<u8>),
    /// External reference, left as is
    External(String),
}

/// Decode an attachment URL into its source
pub fn decode_source(attachment: &Attachment) -> Result<AttachmentSource, PagesmithError> {
    let Some(rest) = attachment.url.strip_prefix("data:") else {
        return Ok(AttachmentSource::External(attachment.url.clone()));
    };

    let (header, payload) = rest.split_once(',').ok_or_else(|| {
        PagesmithError::materialization(&attachment.name, "data URI has no ',' separator")
    })?;

    let is_base64 = header
        .split(';')
        .skip(1)
        .any(|param| param.trim().eq_ignore_ascii_case("base64"));

    if is_base64 {
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| PagesmithError::materialization(&attachment.name, e.to_string()))?;
        Ok(AttachmentSource::Inline(bytes))
    } else {
        Ok(AttachmentSource::Inline(payload.as_bytes().to_vec()))
    }
}

/// Write every inline attachment into the working directory.
///
/// Returns the relative paths that were written.
pub async fn materialize_attachments(
    workdir: &WorkDir,
    attachments: &[Attachment],
) -> Result<Vec<PathBuf>, PagesmithError> {
    let mut written = Vec::new();

    for attachment in attachments {
        match decode_source(attachment)? {
            AttachmentSource::Inline(bytes) => {
                let file = workdir.file(&attachment.name)?;
                file.write_bytes(&bytes).await.map_err(|e| {
                    PagesmithError::materialization(&attachment.name, e.to_string())
                })?;
                debug!("Materialized attachment {} ({} bytes)", attachment.name, bytes.len());
                written.push(
                    file.path()
                        .strip_prefix(workdir.path())
                        .map(|p| p.to_path_buf())
                        .unwrap_or_else(|_| PathBuf::from(&attachment.name)),
                );
            }
            AttachmentSource::External(url) => {
                debug!("Attachment {} is an external reference: {}", attachment.name, url);
            }
        }
    }

    Ok(written)
}
