use rusqlite::Connection;

use crate::types::error::Result;

pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch("
        -- One row per archived email
        CREATE TABLE IF NOT EXISTS messages (
            id                  INTEGER PRIMARY KEY,    -- stable rowid for the FTS index
            message_id          TEXT NOT NULL UNIQUE,   -- natural key: Message-ID header, or gmail_id on collision
            header_message_id   TEXT,                   -- raw Message-ID header (not unique)
            gmail_id            TEXT NOT NULL UNIQUE,   -- remote id, the sync idempotency key
            message_key         TEXT NOT NULL UNIQUE,   -- sha256(message_id)[..16], names files on disk
            thread_id           TEXT,
            subject             TEXT,
            sender              TEXT,
            recipients          TEXT,
            date                TEXT,                   -- Date header as received
            date_epoch          INTEGER NOT NULL DEFAULT 0,  -- unix seconds, 0 when unparsable
            labels              TEXT DEFAULT '[]',      -- JSON array of Gmail label ids at capture
            snippet             TEXT,
            body_text           TEXT,
            has_attachments     INTEGER DEFAULT 0,
            attachment_count    INTEGER DEFAULT 0,
            raw_path            TEXT,
            backed_up_at        TEXT NOT NULL,          -- RFC 3339
            deleted_from_gmail  INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_messages_date_epoch ON messages(date_epoch DESC);
        CREATE INDEX IF NOT EXISTS idx_messages_header_id  ON messages(header_message_id);

        CREATE TABLE IF NOT EXISTS attachments (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            message_id          TEXT NOT NULL REFERENCES messages(message_id),
            filename            TEXT NOT NULL,
            content_type        TEXT,
            size_bytes          INTEGER NOT NULL,
            content_hash        TEXT NOT NULL CHECK (length(content_hash) = 64),  -- sha256 hex
            local_path          TEXT NOT NULL,
            paperless_exported  INTEGER DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_attachments_message ON attachments(message_id);

        -- Append-only audit log of retention passes
        CREATE TABLE IF NOT EXISTS cleanup_runs (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            run_at          TEXT NOT NULL,
            cutoff_date     TEXT NOT NULL,
            retention_days  INTEGER NOT NULL,
            emails_deleted  INTEGER NOT NULL,
            emails_kept     INTEGER NOT NULL
        );

        CREATE VIRTUAL TABLE IF NOT EXISTS messages_fts USING fts5(
            subject,
            sender,
            recipients,
            body_text,
            content=messages,
            content_rowid=id
        );

        CREATE TRIGGER IF NOT EXISTS messages_ai AFTER INSERT ON messages BEGIN
            INSERT INTO messages_fts(rowid, subject, sender, recipients, body_text)
            VALUES (new.id, new.subject, new.sender, new.recipients, new.body_text);
        END;

        CREATE TRIGGER IF NOT EXISTS messages_ad AFTER DELETE ON messages BEGIN
            INSERT INTO messages_fts(messages_fts, rowid, subject, sender, recipients, body_text)
            VALUES ('delete', old.id, old.subject, old.sender, old.recipients, old.body_text);
        END;

        CREATE TRIGGER IF NOT EXISTS messages_au AFTER UPDATE OF subject, sender, recipients, body_text ON messages BEGIN
            INSERT INTO messages_fts(messages_fts, rowid, subject, sender, recipients, body_text)
            VALUES ('delete', old.id, old.subject, old.sender, old.recipients, old.body_text);
            INSERT INTO messages_fts(rowid, subject, sender, recipients, body_text)
            VALUES (new.id, new.subject, new.sender, new.recipients, new.body_text);
        END;

        -- Audit rows are never rewritten
        CREATE TRIGGER IF NOT EXISTS cleanup_runs_no_update BEFORE UPDATE ON cleanup_runs BEGIN
            SELECT RAISE(ABORT, 'cleanup_runs is append-only');
        END;

        CREATE TRIGGER IF NOT EXISTS cleanup_runs_no_delete BEFORE DELETE ON cleanup_runs BEGIN
            SELECT RAISE(ABORT, 'cleanup_runs is append-only');
        END;
    ")?;

    Ok(())
}
