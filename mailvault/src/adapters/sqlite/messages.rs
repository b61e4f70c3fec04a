use rusqlite::{params, OptionalExtension, TransactionBehavior};

use super::DbPool;
use crate::types::error::Result;

/// Represents a message ready to be stored in the database.
/// Decoupled from Gmail: any source can produce one.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub message_id: String,
    pub header_message_id: Option<String>,
    pub gmail_id: String,
    pub message_key: String,
    pub thread_id: String,
    pub subject: String,
    pub sender: String,
    pub recipients: String,
    pub date: String,
    pub date_epoch: i64,
    pub labels: String,     // JSON
    pub snippet: String,
    pub body_text: String,
    pub raw_path: String,
    pub backed_up_at: String,
}

/// An attachment already written to disk, ready for its row
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub filename: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub content_hash: String,
    pub local_path: String,
    pub paperless_exported: bool,
}

/// Whether a message with this Gmail id has already been archived
pub fn exists(pool: &DbPool, gmail_id: &str) -> Result<bool> {
    let conn = pool.get()?;
    let found = conn
        .query_row(
            "SELECT 1 FROM messages WHERE gmail_id = ?1",
            params![gmail_id],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Whether the natural key is already owned by some archived message
pub fn natural_key_taken(pool: &DbPool, message_id: &str) -> Result<bool> {
    let conn = pool.get()?;
    let found = conn
        .query_row(
            "SELECT 1 FROM messages WHERE message_id = ?1",
            params![message_id],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Insert a message and its attachments in one IMMEDIATE transaction.
///
/// The FTS triggers fire inside the same transaction, so either the message
/// row, every attachment row and the index entry are committed, or nothing is.
pub fn insert_message(pool: &DbPool, msg: &NewMessage, attachments: &[NewAttachment]) -> Result<()> {
    let mut conn = pool.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    tx.execute(
        "INSERT INTO messages (
            message_id, header_message_id, gmail_id, message_key, thread_id,
            subject, sender, recipients, date, date_epoch,
            labels, snippet, body_text, has_attachments, attachment_count,
            raw_path, backed_up_at, deleted_from_gmail
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8, ?9, ?10,
            ?11, ?12, ?13, ?14, ?15,
            ?16, ?17, 0
        )",
        params![
            msg.message_id,
            msg.header_message_id,
            msg.gmail_id,
            msg.message_key,
            msg.thread_id,
            msg.subject,
            msg.sender,
            msg.recipients,
            msg.date,
            msg.date_epoch,
            msg.labels,
            msg.snippet,
            msg.body_text,
            !attachments.is_empty() as i32,
            attachments.len() as i64,
            msg.raw_path,
            msg.backed_up_at,
        ],
    )?;

    for att in attachments {
        tx.execute(
            "INSERT INTO attachments (
                message_id, filename, content_type, size_bytes,
                content_hash, local_path, paperless_exported
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                msg.message_id,
                att.filename,
                att.content_type,
                att.size_bytes as i64,
                att.content_hash,
                att.local_path,
                att.paperless_exported as i32,
            ],
        )?;
    }

    tx.commit()?;
    Ok(())
}

/// Flip the remotely-deleted flag for a Gmail id.
///
/// Returns false when no archived row matches (never synced) or the flag was
/// already set; the flag only ever moves from 0 to 1.
pub fn mark_remotely_deleted(pool: &DbPool, gmail_id: &str) -> Result<bool> {
    let conn = pool.get()?;
    let rows = conn.execute(
        "UPDATE messages SET deleted_from_gmail = 1 WHERE gmail_id = ?1 AND deleted_from_gmail = 0",
        params![gmail_id],
    )?;
    Ok(rows > 0)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::adapters::sqlite::db;

    pub(crate) fn sample_message(gmail_id: &str, message_id: &str) -> NewMessage {
        NewMessage {
            message_id: message_id.to_string(),
            header_message_id: Some(message_id.to_string()),
            gmail_id: gmail_id.to_string(),
            message_key: format!("key{}", gmail_id),
            thread_id: "thread-1".to_string(),
            subject: "Quarterly invoice".to_string(),
            sender: "billing@example.com".to_string(),
            recipients: "me@example.com".to_string(),
            date: "Mon, 2 Mar 2026 10:00:00 +0000".to_string(),
            date_epoch: 1_772_445_600,
            labels: "[\"Label_1\"]".to_string(),
            snippet: "Your invoice is attached".to_string(),
            body_text: "Please find the zeppelin invoice attached.".to_string(),
            raw_path: "/data/raw/2026/03/x.eml".to_string(),
            backed_up_at: "2026-03-02T10:05:00+00:00".to_string(),
        }
    }

    pub(crate) fn sample_attachment(hash: &str) -> NewAttachment {
        NewAttachment {
            filename: "invoice.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            size_bytes: 1024,
            content_hash: hash.to_string(),
            local_path: "/data/attachments/ke/key1/invoice.pdf".to_string(),
            paperless_exported: false,
        }
    }

    fn count(pool: &DbPool, sql: &str) -> i64 {
        pool.get().unwrap().query_row(sql, [], |row| row.get(0)).unwrap()
    }

    #[test]
    fn test_insert_and_exists() {
        let pool = db::in_memory().expect("Failed to create database");
        let msg = sample_message("g1", "<a@example.com>");

        assert!(!exists(&pool, "g1").unwrap());
        insert_message(&pool, &msg, &[sample_attachment(&"a".repeat(64))]).unwrap();

        assert!(exists(&pool, "g1").unwrap());
        assert!(natural_key_taken(&pool, "<a@example.com>").unwrap());
        assert_eq!(count(&pool, "SELECT attachment_count FROM messages"), 1);
        assert_eq!(count(&pool, "SELECT has_attachments FROM messages"), 1);
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM attachments"), 1);
    }

    #[test]
    fn test_duplicate_gmail_id_rejected() {
        let pool = db::in_memory().unwrap();
        insert_message(&pool, &sample_message("g1", "<a@example.com>"), &[]).unwrap();

        let mut dup = sample_message("g1", "<b@example.com>");
        dup.message_key = "other".to_string();
        assert!(insert_message(&pool, &dup, &[]).is_err());
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM messages"), 1);
    }

    #[test]
    fn test_failed_attachment_rolls_back_everything() {
        let pool = db::in_memory().unwrap();
        let msg = sample_message("g1", "<a@example.com>");

        // Second attachment violates the hash CHECK constraint
        let attachments = vec![sample_attachment(&"a".repeat(64)), sample_attachment("short")];
        assert!(insert_message(&pool, &msg, &attachments).is_err());

        assert!(!exists(&pool, "g1").unwrap());
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM messages"), 0);
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM attachments"), 0);
        assert_eq!(
            count(&pool, "SELECT COUNT(*) FROM messages_fts WHERE messages_fts MATCH 'zeppelin'"),
            0
        );
    }

    #[test]
    fn test_mark_remotely_deleted_is_monotonic() {
        let pool = db::in_memory().unwrap();
        insert_message(&pool, &sample_message("g1", "<a@example.com>"), &[]).unwrap();

        assert!(mark_remotely_deleted(&pool, "g1").unwrap());
        assert!(!mark_remotely_deleted(&pool, "g1").unwrap());
        assert!(!mark_remotely_deleted(&pool, "never-synced").unwrap());
        assert_eq!(count(&pool, "SELECT deleted_from_gmail FROM messages"), 1);
    }
}
