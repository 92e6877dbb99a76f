use rusqlite::Connection;

use crate::error::Result;

/// Initialise the schedules schema in `conn`.
///
/// Safe to call on every startup — uses `IF NOT EXISTS` throughout.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schedules (
            id          TEXT    NOT NULL PRIMARY KEY,
            user_id     INTEGER NOT NULL,
            guild_id    INTEGER NOT NULL,
            channel_id  INTEGER NOT NULL,
            send_at     TEXT    NOT NULL,   -- RFC 3339, always UTC
            content     TEXT    NOT NULL,
            attachment  TEXT,               -- stored file path, or NULL
            created_at  TEXT    NOT NULL,
            updated_at  TEXT    NOT NULL
        ) STRICT;

        -- Efficient polling: SELECT … WHERE send_at <= ?
        CREATE INDEX IF NOT EXISTS idx_schedules_send_at ON schedules (send_at);
        -- Per-member listing in creation order.
        CREATE INDEX IF NOT EXISTS idx_schedules_user ON schedules (user_id, created_at);
        ",
    )?;
    Ok(())
}
