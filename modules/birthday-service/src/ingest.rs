//! Ingestion of birthday entries from inbound chat messages.

use crate::db::Db;
use crate::parser;
use birthday_types::IncomingMessage;

/// Handle one inbound message. Fire-and-forget: failures are logged, never
/// surfaced back to the sender.
///
/// Only self-chat messages from the trusted identity are processed — sender
/// and recipient must both equal `expected_sender`. Anything else is ignored
/// with no side effect.
pub fn handle_incoming(db: &Db, expected_sender: &str, msg: &IncomingMessage) {
    if msg.from != expected_sender || msg.to != expected_sender {
        return;
    }

    let fields = parser::parse_fields(&msg.body);

    // Missing keys stay absent; there is no required-field check.
    let name = fields.get("name").map(String::as_str);
    let phone = fields.get("phone").map(String::as_str);
    let birthday = fields.get("birthday").map(String::as_str);

    match db.insert_birthday(name, phone, birthday) {
        Ok(record) => {
            log::info!(
                "[BIRTHDAY_BOT] Saved birthday entry #{} for {}",
                record.id,
                record.name.as_deref().unwrap_or("(unnamed)")
            );
        }
        Err(e) => {
            log::error!("[BIRTHDAY_BOT] Failed to save birthday entry: {}", e);
        }
    }
}
