use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::content_extraction::AttachmentPart;
use crate::adapters::sqlite::messages::NewAttachment;
use crate::config::StorageLayout;
use crate::types::error::{MailvaultError, Result};

const MESSAGE_KEY_LEN: usize = 16;

/// Lowercase hex SHA-256
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Short filesystem-safe key derived from the natural message key
pub fn message_key(natural_key: &str) -> String {
    let mut hex = sha256_hex(natural_key.as_bytes());
    hex.truncate(MESSAGE_KEY_LEN);
    hex
}

/// Replace everything but alphanumerics, `.`, `-`, `_` and space with `_`
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `raw/YYYY/MM/<key>.eml`, or `raw/unknown/<key>.eml` without a usable date
pub fn raw_blob_path(layout: &StorageLayout, message_key: &str, date_epoch: i64) -> PathBuf {
    let bucket = if date_epoch != 0 {
        chrono::DateTime::from_timestamp(date_epoch, 0).map(|dt| dt.format("%Y/%m").to_string())
    } else {
        None
    };

    let dir = match bucket {
        Some(year_month) => layout.raw_dir.join(year_month),
        None => layout.raw_dir.join("unknown"),
    };
    dir.join(format!("{}.eml", message_key))
}

/// Directory holding one message's attachments, fanned out by key prefix
pub fn attachment_dir(layout: &StorageLayout, message_key: &str) -> PathBuf {
    let prefix: String = message_key.chars().take(2).collect();
    layout.attachments_dir.join(prefix).join(message_key)
}

/// Write `bytes` to `path`, creating parent directories, and remember the path.
///
/// Only paths already in `written` may be overwritten; any other existing
/// file belongs to someone else and is left untouched with an error.
fn write_tracked(path: &Path, bytes: &[u8], written: &mut Vec<PathBuf>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    if written.iter().any(|p| p == path) {
        fs::write(path, bytes)?;
        return Ok(());
    }

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| MailvaultError::Io(format!("Refusing to write {:?}: {}", path, e)))?;
    written.push(path.to_path_buf());
    file.write_all(bytes)?;
    Ok(())
}

/// Persist the raw message blob
pub fn write_raw(
    layout: &StorageLayout,
    message_key: &str,
    date_epoch: i64,
    raw: &[u8],
    written: &mut Vec<PathBuf>,
) -> Result<PathBuf> {
    let path = raw_blob_path(layout, message_key, date_epoch);
    write_tracked(&path, raw, written)?;
    Ok(path)
}

/// Write attachment payloads to disk and describe them for the store.
///
/// A copy named `<key>_<filename>` also goes to the export directory when one
/// is configured and present. Same-named attachments of one message overwrite
/// each other on disk; files of any other message are never overwritten.
pub fn store_attachments(
    parts: &[AttachmentPart],
    message_key: &str,
    layout: &StorageLayout,
    written: &mut Vec<PathBuf>,
) -> Result<Vec<NewAttachment>> {
    let dir = attachment_dir(layout, message_key);
    let export_dir = layout.export_dir.as_deref().filter(|d| d.is_dir());

    let mut records = Vec::with_capacity(parts.len());
    for part in parts {
        let safe_name = sanitize_filename(&part.filename);
        let local_path = dir.join(&safe_name);
        write_tracked(&local_path, &part.payload, written)?;

        let mut exported = false;
        if let Some(export_dir) = export_dir {
            let export_path = export_dir.join(format!("{}_{}", message_key, safe_name));
            match write_tracked(&export_path, &part.payload, written) {
                Ok(()) => exported = true,
                Err(e) => warn!("Failed to export {} to {:?}: {}", part.filename, export_dir, e),
            }
        }

        debug!("Stored attachment {} ({} bytes)", safe_name, part.payload.len());
        records.push(NewAttachment {
            filename: part.filename.clone(),
            content_type: part.content_type.clone(),
            size_bytes: part.payload.len() as u64,
            content_hash: sha256_hex(&part.payload),
            local_path: local_path.to_string_lossy().into_owned(),
            paperless_exported: exported,
        });
    }

    Ok(records)
}

/// Best-effort removal of files written for a message that failed to commit
pub fn remove_files(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = fs::remove_file(path) {
            warn!("Failed to remove {:?}: {}", path, e);
        }
    }
}
