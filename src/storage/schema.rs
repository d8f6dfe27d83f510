//! Mail table definitions

use crate::Result;
use rusqlite::Connection;

/// Create the mail tables and indexes if they do not exist
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS mail (
            message_id INTEGER PRIMARY KEY AUTOINCREMENT,
            sender_id INTEGER NOT NULL,
            sender_name TEXT NOT NULL,
            receiver_id INTEGER NOT NULL,
            receiver_name TEXT NOT NULL,
            expire_time INTEGER NOT NULL,
            topic TEXT NOT NULL,
            body TEXT NOT NULL,
            price INTEGER NOT NULL DEFAULT 0,
            type INTEGER NOT NULL DEFAULT 0,
            unread INTEGER NOT NULL DEFAULT 1,
            returnable INTEGER NOT NULL DEFAULT 1,
            systemMsg1 INTEGER NOT NULL DEFAULT 0,
            systemMsg2 INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS character_mail (
            char_id INTEGER NOT NULL,
            message_id INTEGER NOT NULL,
            is_sender INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS mail_attachments (
            message_id INTEGER NOT NULL,
            item_id INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_mail_expire_time ON mail(expire_time);
        CREATE INDEX IF NOT EXISTS idx_character_mail_owner ON character_mail(char_id, is_sender);
        CREATE INDEX IF NOT EXISTS idx_mail_attachments_message ON mail_attachments(message_id);
        "#,
    )?;

    Ok(())
}
