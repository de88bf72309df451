use rusqlite::params;
use studio_shared::models::Message;
use studio_shared::{AccountId, MessageId};

use crate::database::{format_ts, not_found, parse_ts, parse_uuid, Database};
use crate::error::{Result, StoreError};

const MESSAGE_COLUMNS: &str = "id, sender_id, receiver_id, guest_name, content, created_at";

impl Database {
    pub fn insert_message(&self, message: &Message) -> Result<()> {
        self.conn().execute(
            "INSERT INTO messages (id, sender_id, receiver_id, guest_name, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                message.id.to_string(),
                message.sender_id.map(|s| s.to_string()),
                message.receiver_id.to_string(),
                message.guest_name,
                message.content,
                format_ts(&message.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_message_by_id(&self, id: MessageId) -> Result<Message> {
        self.conn()
            .query_row(
                &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"),
                params![id.to_string()],
                row_to_message,
            )
            .map_err(not_found)
    }

    /// Everything `account` sent or received, newest first.
    pub fn get_messages_involving(&self, account: AccountId) -> Result<Vec<Message>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE sender_id = ?1 OR receiver_id = ?1
             ORDER BY created_at DESC, rowid DESC"
        ))?;

        let rows = stmt.query_map(params![account.to_string()], row_to_message)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// The thread between two accounts, oldest first.
    pub fn get_conversation(&self, a: AccountId, b: AccountId) -> Result<Vec<Message>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE (sender_id = ?1 AND receiver_id = ?2)
                OR (sender_id = ?2 AND receiver_id = ?1)
             ORDER BY created_at ASC, rowid ASC"
        ))?;

        let rows = stmt.query_map(params![a.to_string(), b.to_string()], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let id_str: String = row.get(0)?;
    let sender_str: Option<String> = row.get(1)?;
    let receiver_str: String = row.get(2)?;
    let ts_str: String = row.get(5)?;

    let sender_id = sender_str
        .map(|s| parse_uuid(1, &s).map(AccountId))
        .transpose()?;

    Ok(Message {
        id: MessageId(parse_uuid(0, &id_str)?),
        sender_id,
        receiver_id: AccountId(parse_uuid(2, &receiver_str)?),
        guest_name: row.get(3)?,
        content: row.get(4)?,
        created_at: parse_ts(5, &ts_str)?,
    })
}
