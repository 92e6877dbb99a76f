use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::{debug, instrument};
use uuid::Uuid;

use courier_core::types::{ChannelId, GuildId, ScheduleId, UserId};

use crate::db::init_db;
use crate::error::{Result, StoreError};
use crate::types::{MessageUpdate, NewMessage, ScheduledMessage};

/// Upper bound on rows returned by [`MessageStore::list_by_user`].
pub const LIST_LIMIT: usize = 100;

const SELECT_COLUMNS: &str = "id, user_id, guild_id, channel_id, send_at, content, attachment,
                    created_at, updated_at";

/// Thread-safe store for scheduled messages.
///
/// Wraps a single SQLite connection in a `Mutex` — sufficient for the
/// single-node target; swap in a pool if contention ever warrants it.
pub struct MessageStore {
    db: Mutex<Connection>,
}

impl MessageStore {
    /// Wrap an already-open connection, initialising the schema if needed.
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    /// Persist a new record, assigning its id and audit stamps.
    #[instrument(skip(self, new), fields(user = %new.user_id, guild = %new.guild_id))]
    pub fn create(&self, new: NewMessage) -> Result<ScheduledMessage> {
        let id = ScheduleId(Uuid::new_v4().to_string());
        let now = Utc::now().to_rfc3339();

        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO schedules
             (id, user_id, guild_id, channel_id, send_at, content, attachment,
              created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            rusqlite::params![
                id.as_str(),
                new.user_id.0 as i64,
                new.guild_id.0 as i64,
                new.channel_id.0 as i64,
                new.send_at.to_rfc3339(),
                new.content,
                new.attachment
                    .as_ref()
                    .map(|p| p.to_string_lossy().into_owned()),
                now,
            ],
        )?;
        debug!(schedule_id = %id, "schedule row inserted");

        Ok(ScheduledMessage {
            id,
            user_id: new.user_id,
            guild_id: new.guild_id,
            channel_id: new.channel_id,
            send_at: new.send_at,
            content: new.content,
            attachment: new.attachment,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Fetch a single record, `None` when the id no longer exists.
    pub fn get(&self, id: &ScheduleId) -> Result<Option<ScheduledMessage>> {
        let db = self.db.lock().unwrap();
        match db.query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM schedules WHERE id = ?1"),
            rusqlite::params![id.as_str()],
            row_to_message,
        ) {
            Ok(m) => Ok(Some(m)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Database(e)),
        }
    }

    /// List a member's pending messages in creation order, capped at
    /// [`LIST_LIMIT`] rows.
    pub fn list_by_user(&self, user: UserId) -> Result<Vec<ScheduledMessage>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM schedules
             WHERE user_id = ?1 ORDER BY created_at LIMIT ?2"
        ))?;
        let rows = stmt.query_map(
            rusqlite::params![user.0 as i64, LIST_LIMIT as i64],
            row_to_message,
        )?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Number of live records in a guild.
    ///
    /// Queried fresh on every call — the capacity check must never see a
    /// stale count.
    pub fn count_in_guild(&self, guild: GuildId) -> Result<u64> {
        let db = self.db.lock().unwrap();
        let n: i64 = db.query_row(
            "SELECT COUNT(*) FROM schedules WHERE guild_id = ?1",
            rusqlite::params![guild.0 as i64],
            |row| row.get(0),
        )?;
        Ok(n as u64)
    }

    /// Snapshot of every record due at `now` (`send_at <= now`).
    ///
    /// A row stays due on every later call until it is deleted; the dispatch
    /// loop deletes each one after its single delivery attempt.
    pub fn fetch_due(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledMessage>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare_cached(&format!(
            "SELECT {SELECT_COLUMNS} FROM schedules
             WHERE send_at <= ?1 ORDER BY send_at"
        ))?;
        let rows = stmt.query_map(rusqlite::params![now.to_rfc3339()], row_to_message)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Merge the supplied fields into an existing record.
    ///
    /// A vanished id is a silent no-op: the record may have been delivered
    /// (and deleted) while an edit session was still open. An empty update
    /// makes no store call at all.
    #[instrument(skip(self, update), fields(schedule_id = %id))]
    pub fn update_fields(&self, id: &ScheduleId, update: &MessageUpdate) -> Result<()> {
        if update.is_empty() {
            return Ok(());
        }

        let mut sets: Vec<&str> = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        if let Some(send_at) = update.send_at {
            sets.push("send_at = ?");
            params.push(Box::new(send_at.to_rfc3339()));
        }
        if let Some(ref content) = update.content {
            sets.push("content = ?");
            params.push(Box::new(content.clone()));
        }
        if let Some(ref attachment) = update.attachment {
            sets.push("attachment = ?");
            params.push(Box::new(
                attachment
                    .as_ref()
                    .map(|p| p.to_string_lossy().into_owned()),
            ));
        }
        sets.push("updated_at = ?");
        params.push(Box::new(Utc::now().to_rfc3339()));
        params.push(Box::new(id.as_str().to_string()));

        let sql = format!("UPDATE schedules SET {} WHERE id = ?", sets.join(", "));
        let refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|b| b.as_ref()).collect();

        let db = self.db.lock().unwrap();
        let changed = db.execute(&sql, refs.as_slice())?;
        if changed == 0 {
            debug!("update on vanished schedule ignored");
        }
        Ok(())
    }

    /// Delete a record. Deleting an id that is already gone is not an error.
    #[instrument(skip(self), fields(schedule_id = %id))]
    pub fn delete_by_id(&self, id: &ScheduleId) -> Result<()> {
        let db = self.db.lock().unwrap();
        let n = db.execute(
            "DELETE FROM schedules WHERE id = ?1",
            rusqlite::params![id.as_str()],
        )?;
        if n == 0 {
            debug!("delete on vanished schedule ignored");
        }
        Ok(())
    }
}

/// Map a SQLite row to a `ScheduledMessage`.
fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<ScheduledMessage> {
    let send_at_raw: String = row.get(4)?;
    let send_at = DateTime::parse_from_rfc3339(&send_at_raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;
    let attachment: Option<String> = row.get(6)?;

    Ok(ScheduledMessage {
        id: ScheduleId(row.get(0)?),
        user_id: UserId(row.get::<_, i64>(1)? as u64),
        guild_id: GuildId(row.get::<_, i64>(2)? as u64),
        channel_id: ChannelId(row.get::<_, i64>(3)? as u64),
        send_at,
        content: row.get(5)?,
        attachment: attachment.map(PathBuf::from),
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}
